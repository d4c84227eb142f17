//! Markdown file artifacts for persisted runs.
//!
//! One file per persisted run, written under a dedicated output directory:
//! ```text
//! <output_dir>/
//! ├── 2026-10-19_electric_bikes.md
//! └── 2026-10-20_caf__com_leite.md
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, instrument};

use contentcrew_shared::{ContentCrewError, Result};

/// Replace every non-alphanumeric character of `topic` with `_`.
pub fn topic_slug(topic: &str) -> String {
    topic
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Deterministic file name: `<YYYY-MM-DD>_<slug>.md`.
pub fn artifact_file_name(date: NaiveDate, topic: &str) -> String {
    format!("{}_{}.md", date.format("%Y-%m-%d"), topic_slug(topic))
}

/// Write `content` to `<output_dir>/<artifact_file_name>`, creating the
/// directory if needed. An existing file for the same date and topic is
/// replaced. Returns the written path.
#[instrument(skip(content), fields(bytes = content.len()))]
pub fn write_artifact(
    output_dir: &Path,
    date: NaiveDate,
    topic: &str,
    content: &str,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|e| ContentCrewError::io(output_dir, e))?;

    let path = output_dir.join(artifact_file_name(date, topic));
    std::fs::write(&path, content).map_err(|e| ContentCrewError::io(&path, e))?;

    info!(path = %path.display(), "artifact written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn slug_replaces_non_alphanumerics() {
        assert_eq!(topic_slug("electric bikes"), "electric_bikes");
        assert_eq!(topic_slug("AI/ML: what's next?"), "AI_ML__what_s_next_");
        assert_eq!(topic_slug("  café com leite "), "café_com_leite");
    }

    #[test]
    fn file_name_is_date_then_slug() {
        assert_eq!(
            artifact_file_name(date(), "electric bikes"),
            "2026-10-19_electric_bikes.md"
        );
    }

    #[test]
    fn write_creates_directory_and_file() {
        let dir = std::env::temp_dir()
            .join(format!("cc_artifacts_{}", Uuid::now_v7()))
            .join("posts");

        let path = write_artifact(&dir, date(), "electric bikes", "# Post\n").unwrap();
        assert_eq!(path, dir.join("2026-10-19_electric_bikes.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Post\n");

        // Same date + topic overwrites.
        write_artifact(&dir, date(), "electric bikes", "# Edited\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Edited\n");
    }

    #[test]
    fn write_failure_is_surfaced() {
        let blocker = std::env::temp_dir().join(format!("cc_blocker_{}", Uuid::now_v7()));
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = write_artifact(&blocker, date(), "t", "c").unwrap_err();
        assert!(matches!(err, ContentCrewError::Io { .. }));
    }
}
