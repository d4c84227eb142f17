//! Roles, stages, and pipeline definitions.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s plus an explicit
//! upstream-id adjacency list. Each stage is bound to one [`Role`]. All three
//! are immutable once built; templates are re-rendered on every run.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use contentcrew_shared::{ContentCrewError, Result};

use crate::template::{is_identifier, placeholders};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// A named persona applied to a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    name: String,
    goal_template: String,
    backstory_template: String,
}

impl Role {
    pub fn new(
        name: impl Into<String>,
        goal_template: impl Into<String>,
        backstory_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            goal_template: goal_template.into(),
            backstory_template: backstory_template.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn goal_template(&self) -> &str {
        &self.goal_template
    }

    pub fn backstory_template(&self) -> &str {
        &self.backstory_template
    }

    /// Roles never hand work to one another.
    pub fn delegation_allowed(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One templated generation step.
#[derive(Debug, Clone)]
pub struct Stage {
    id: String,
    role: Arc<Role>,
    description_template: String,
    expected_output: String,
    upstream: Vec<String>,
}

impl Stage {
    /// Create a stage with no upstream dependencies.
    ///
    /// `expected_output` is passed to generation as a quality hint only.
    pub fn new(
        id: impl Into<String>,
        role: Arc<Role>,
        description_template: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            description_template: description_template.into(),
            expected_output: expected_output.into(),
            upstream: Vec::new(),
        }
    }

    /// Declare that this stage consumes the output of `upstream_id`.
    pub fn after(mut self, upstream_id: impl Into<String>) -> Self {
        self.upstream.push(upstream_id.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn description_template(&self) -> &str {
        &self.description_template
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn upstream_stage_ids(&self) -> &[String] {
        &self.upstream
    }

    /// Every placeholder referenced by the role and description templates.
    pub fn referenced_variables(&self) -> impl Iterator<Item = &str> {
        placeholders(self.role.goal_template())
            .chain(placeholders(self.role.backstory_template()))
            .chain(placeholders(&self.description_template))
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// An ordered, validated list of stages whose upstream links form a DAG
/// consistent with the declared order.
#[derive(Debug, Clone)]
pub struct Pipeline {
    name: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Build a pipeline from stages in execution order.
    ///
    /// Rejects (as [`ContentCrewError::Config`]):
    /// - an empty stage list
    /// - stage ids that are duplicated or not `[A-Za-z_][A-Za-z0-9_]*`
    /// - two different roles sharing a name
    /// - upstream ids that do not name an earlier stage
    /// - templates that reference another stage's output without declaring
    ///   it as an upstream
    pub fn new(name: impl Into<String>, stages: Vec<Stage>) -> Result<Self> {
        let name = name.into();
        if stages.is_empty() {
            return Err(ContentCrewError::config(format!(
                "pipeline '{name}' has no stages"
            )));
        }

        let all_ids: HashSet<&str> = stages.iter().map(|s| s.id()).collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut roles: HashMap<&str, &Role> = HashMap::new();

        for stage in &stages {
            let id = stage.id();
            if !is_identifier(id) {
                return Err(ContentCrewError::config(format!(
                    "stage id '{id}' must match [A-Za-z_][A-Za-z0-9_]*"
                )));
            }

            if let Some(existing) = roles.insert(stage.role().name(), stage.role()) {
                if existing != stage.role() {
                    return Err(ContentCrewError::config(format!(
                        "two different roles are named '{}'",
                        stage.role().name()
                    )));
                }
            }

            for upstream in stage.upstream_stage_ids() {
                if !seen.contains(upstream.as_str()) {
                    return Err(ContentCrewError::config(format!(
                        "stage '{id}' depends on '{upstream}', which is not an earlier stage"
                    )));
                }
            }

            for var in stage.referenced_variables() {
                if all_ids.contains(var) && !stage.upstream_stage_ids().iter().any(|u| u == var) {
                    return Err(ContentCrewError::config(format!(
                        "stage '{id}' references the output of '{var}' without depending on it"
                    )));
                }
            }

            if !seen.insert(id) {
                return Err(ContentCrewError::config(format!(
                    "duplicate stage id '{id}'"
                )));
            }
        }

        Ok(Self { name, stages })
    }

    /// Build a simple chain: each stage depends on exactly the one before it.
    ///
    /// Any upstream links already declared on the stages are replaced.
    pub fn chain(name: impl Into<String>, stages: Vec<Stage>) -> Result<Self> {
        let mut previous: Option<String> = None;
        let linked = stages
            .into_iter()
            .map(|mut stage| {
                stage.upstream = previous.iter().cloned().collect();
                previous = Some(stage.id.clone());
                stage
            })
            .collect();
        Self::new(name, linked)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id() == id)
    }

    /// The stage whose output is the pipeline result.
    pub fn terminal_stage(&self) -> &Stage {
        // `new` guarantees at least one stage.
        &self.stages[self.stages.len() - 1]
    }

    /// Variables a caller must bind: referenced placeholders that are not
    /// satisfied by upstream stage outputs.
    pub fn external_variables(&self) -> BTreeSet<String> {
        self.stages
            .iter()
            .flat_map(|stage| {
                stage
                    .referenced_variables()
                    .filter(|var| !stage.upstream_stage_ids().iter().any(|u| u == var))
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Whether any stage references `{name}` as an external variable.
    pub fn requires_variable(&self, name: &str) -> bool {
        self.external_variables().contains(name)
    }
}
