//! Core domain types for contentcrew.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ContentCrewError;

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// Store-assigned identifier of a persisted content record.
///
/// Ids increase monotonically and are never reused, even after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

// ---------------------------------------------------------------------------
// ContentRecord
// ---------------------------------------------------------------------------

/// A persisted artifact of one completed pipeline run. Never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: RecordId,
    pub topic: String,
    /// Calendar date of creation.
    pub date: NaiveDate,
    /// Final pipeline text.
    pub content: String,
}

impl ContentRecord {
    /// Listing view of this record (content body dropped).
    pub fn summary(&self) -> ContentSummary {
        ContentSummary {
            id: self.id,
            topic: self.topic.clone(),
            date: self.date,
        }
    }
}

/// A record as returned by listing: everything except the content body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub id: RecordId,
    pub topic: String,
    pub date: NaiveDate,
}

impl std::fmt::Display for ContentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} – {} ({})", self.id, self.topic, self.date)
    }
}

/// Ordering for record listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    /// Oldest first (insertion order).
    #[default]
    Inserted,
    /// Newest first.
    Newest,
}

// ---------------------------------------------------------------------------
// Framework
// ---------------------------------------------------------------------------

/// Copywriting framework requested by the front-end.
///
/// The orchestrator never branches on this; it is only bound as the
/// `{framework}` template variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Framework {
    /// Attention, Interest, Desire, Action.
    #[serde(rename = "AIDA")]
    Aida,
    /// Problem, Agitate, Solution.
    #[serde(rename = "PAS")]
    Pas,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aida => "AIDA",
            Self::Pas => "PAS",
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Framework {
    type Err = ContentCrewError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AIDA" => Ok(Self::Aida),
            "PAS" => Ok(Self::Pas),
            other => Err(ContentCrewError::invalid_input(format!(
                "unknown framework '{other}': expected AIDA or PAS"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// PresetName
// ---------------------------------------------------------------------------

/// Built-in pipeline shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetName {
    /// Long-form blog post, no web grounding.
    Blog,
    /// Short social-media post grounded in web insights.
    Social,
}

impl PresetName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::Social => "social",
        }
    }
}

impl std::fmt::Display for PresetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = ContentCrewError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blog" => Ok(Self::Blog),
            "social" => Ok(Self::Social),
            other => Err(ContentCrewError::invalid_input(format!(
                "unknown preset '{other}': expected blog or social"
            ))),
        }
    }
}
