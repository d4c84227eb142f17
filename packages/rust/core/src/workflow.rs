//! End-to-end `generate` flow: topic → grounding → pipeline → persistence.
//!
//! Generation success and persistence success are decoupled: once the
//! pipeline has produced content it is always returned, and any store or
//! file failure is reported alongside it.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use tracing::{info, instrument, warn};

use contentcrew_providers::{GenerationParams, GenerationService, InsightService};
use contentcrew_shared::{ContentCrewError, Framework, RecordId, Result};
use contentcrew_storage::ContentStore;

use crate::artifact;
use crate::crew::Pipeline;
use crate::insights::{self, WEB_INSIGHTS_VAR};
use crate::pipeline::{GenerationContext, ProgressReporter};
use crate::template::Variables;

/// Variable name the topic is bound to.
pub const TOPIC_VAR: &str = "topic";

/// Variable name the copy framework is bound to.
pub const FRAMEWORK_VAR: &str = "framework";

/// Service handles, constructed once by the front-end.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub generation: &'a dyn GenerationService,
    /// `None` means retrieval is unavailable; grounding then yields "".
    pub insights: Option<&'a dyn InsightService>,
    pub params: &'a GenerationParams,
}

impl<'a> Services<'a> {
    pub fn generation_context(&self) -> GenerationContext<'a> {
        GenerationContext::new(self.generation, self.params)
    }
}

/// Where persisted runs go.
pub struct Persistence<'a> {
    pub store: &'a ContentStore,
    pub output_dir: PathBuf,
}

/// One `generate` invocation.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub topic: String,
    /// Bound as `{framework}` when present.
    pub framework: Option<Framework>,
    /// Gather web insights and bind `{web_insights}`.
    pub grounding: bool,
    /// Snippet cap for grounding.
    pub insight_count: usize,
    /// Write a content record and a file artifact.
    pub persist: bool,
}

impl GenerateRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            framework: None,
            grounding: false,
            insight_count: insights::DEFAULT_INSIGHT_COUNT,
            persist: true,
        }
    }
}

/// Result of a successful pipeline run.
#[derive(Debug)]
pub struct GenerateOutcome {
    /// Final pipeline text.
    pub content: String,
    /// Grounding text, if grounding was requested.
    pub web_insights: Option<String>,
    /// Id of the stored record, if the store write succeeded.
    pub record_id: Option<RecordId>,
    /// Path of the file artifact, if the file write succeeded.
    pub artifact_path: Option<PathBuf>,
    /// Store/file failures. Never invalidate `content`.
    pub persistence_errors: Vec<ContentCrewError>,
    pub elapsed: Duration,
}

impl GenerateOutcome {
    pub fn fully_persisted(&self) -> bool {
        self.record_id.is_some() && self.artifact_path.is_some()
    }
}

/// Bind the run variables for `request`. Fails on an empty topic.
pub fn build_variables(request: &GenerateRequest, web_insights: Option<&str>) -> Result<Variables> {
    let topic = request.topic.trim();
    if topic.is_empty() {
        return Err(ContentCrewError::invalid_input("topic must not be empty"));
    }

    let mut variables = Variables::new();
    variables.insert(TOPIC_VAR.to_string(), topic.to_string());
    if let Some(framework) = request.framework {
        variables.insert(FRAMEWORK_VAR.to_string(), framework.to_string());
    }
    if let Some(text) = web_insights {
        variables.insert(WEB_INSIGHTS_VAR.to_string(), text.to_string());
    }
    Ok(variables)
}

/// Run the whole flow for one topic.
///
/// Errors only for invalid input or a pipeline failure (wrapped with the
/// failing stage). Retrieval problems are absorbed; persistence problems are
/// reported in [`GenerateOutcome::persistence_errors`].
#[instrument(skip_all, fields(pipeline = %pipeline.name(), topic = %request.topic))]
pub async fn generate(
    pipeline: &Pipeline,
    services: Services<'_>,
    persistence: &Persistence<'_>,
    request: &GenerateRequest,
    progress: &dyn ProgressReporter,
) -> Result<GenerateOutcome> {
    let started = Instant::now();

    // Reject before any service call.
    build_variables(request, None)?;
    let topic = request.topic.trim();

    let web_insights = if request.grounding {
        progress.phase("Gathering web insights");
        Some(insights::gather_insights_opt(services.insights, topic, request.insight_count).await)
    } else {
        None
    };

    let variables = build_variables(request, web_insights.as_deref())?;

    progress.phase("Generating content");
    let content = pipeline
        .run(services.generation_context(), variables, progress)
        .await?;

    let mut outcome = GenerateOutcome {
        content,
        web_insights,
        record_id: None,
        artifact_path: None,
        persistence_errors: Vec::new(),
        elapsed: Duration::ZERO,
    };

    if request.persist {
        progress.phase("Saving content");
        persist(persistence, topic, Local::now().date_naive(), &mut outcome).await;
    }

    outcome.elapsed = started.elapsed();
    info!(
        record_id = outcome.record_id.map(|id| id.0),
        artifact = outcome.artifact_path.as_ref().map(|p| p.display().to_string()),
        persistence_errors = outcome.persistence_errors.len(),
        elapsed_ms = outcome.elapsed.as_millis(),
        "generate complete"
    );

    Ok(outcome)
}

/// Write the record and the file artifact, both dated `date`; collect
/// failures instead of returning them.
async fn persist(
    persistence: &Persistence<'_>,
    topic: &str,
    date: NaiveDate,
    outcome: &mut GenerateOutcome,
) {
    match persistence.store.create_on(topic, &outcome.content, date).await {
        Ok(id) => outcome.record_id = Some(id),
        Err(e) => {
            warn!(error = %e, "failed to store content record");
            outcome.persistence_errors.push(e);
        }
    }

    match artifact::write_artifact(&persistence.output_dir, date, topic, &outcome.content) {
        Ok(path) => outcome.artifact_path = Some(path),
        Err(e) => {
            warn!(error = %e, "failed to write content artifact");
            outcome.persistence_errors.push(e);
        }
    }
}
