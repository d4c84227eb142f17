//! Pipeline execution: render each stage's prompt, call the generation
//! service once per stage, and feed outputs forward.
//!
//! Stages run strictly sequentially in declared order. The first failure
//! aborts the run and is returned wrapped with the failing stage's id; no
//! partial output escapes.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use contentcrew_providers::{GenerationParams, GenerationService};
use contentcrew_shared::{ContentCrewError, Result};

use crate::crew::{Pipeline, Stage};
use crate::template::{Variables, render_with};

/// Generation handle plus the sampling parameters every call uses.
#[derive(Clone, Copy)]
pub struct GenerationContext<'a> {
    pub service: &'a dyn GenerationService,
    pub params: &'a GenerationParams,
}

impl<'a> GenerationContext<'a> {
    pub fn new(service: &'a dyn GenerationService, params: &'a GenerationParams) -> Self {
        Self { service, params }
    }
}

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Lifecycle of one stage within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// State of a single pipeline execution.
///
/// Owned by the caller of [`Pipeline::run`] for the duration of the run;
/// independent runs never share one.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    id: Uuid,
    variables: Variables,
    stage_outputs: HashMap<String, String>,
    statuses: Vec<(String, StageStatus)>,
}

impl PipelineRun {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Output of a completed stage.
    pub fn output(&self, stage_id: &str) -> Option<&str> {
        self.stage_outputs.get(stage_id).map(String::as_str)
    }

    pub fn status(&self, stage_id: &str) -> Option<StageStatus> {
        self.statuses
            .iter()
            .find(|(id, _)| id == stage_id)
            .map(|(_, status)| *status)
    }

    /// The run's result: defined only once the terminal stage has succeeded.
    pub fn result(&self) -> Option<&str> {
        match self.statuses.last() {
            Some((id, StageStatus::Succeeded)) => self.output(id),
            _ => None,
        }
    }

    fn set_status(&mut self, stage_id: &str, status: StageStatus) {
        if let Some(entry) = self.statuses.iter_mut().find(|(id, _)| id == stage_id) {
            entry.1 = status;
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase (grounding, saving, ...).
    fn phase(&self, name: &str);
    /// Called right before a stage's generation request.
    fn stage_started(&self, stage_id: &str, role: &str, current: usize, total: usize);
    /// Called after a stage's output is recorded.
    fn stage_finished(&self, stage_id: &str, current: usize, total: usize);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn stage_started(&self, _stage_id: &str, _role: &str, _current: usize, _total: usize) {}
    fn stage_finished(&self, _stage_id: &str, _current: usize, _total: usize) {}
}

// ---------------------------------------------------------------------------
// Stage execution
// ---------------------------------------------------------------------------

/// Build the single generation prompt for `stage`.
///
/// The effective variables are `variables` plus one binding per upstream
/// stage (`{upstream_id}` → its output). Parts are concatenated as goal →
/// backstory → task description → expected-output hint.
pub fn build_prompt(
    stage: &Stage,
    variables: &Variables,
    stage_outputs: &HashMap<String, String>,
) -> Result<String> {
    let lookup = |name: &str| {
        if stage.upstream_stage_ids().iter().any(|u| u == name) {
            stage_outputs.get(name).map(String::as_str)
        } else {
            variables.get(name).map(String::as_str)
        }
    };

    let role = stage.role();
    let goal = render_with(role.goal_template(), lookup)?;
    let backstory = render_with(role.backstory_template(), lookup)?;
    let description = render_with(stage.description_template(), lookup)?;

    Ok(format!(
        "Role: {}\nGoal: {goal}\n\n{backstory}\n\nTask:\n{description}\n\nExpected output: {}",
        role.name(),
        stage.expected_output()
    ))
}

/// Execute one stage of `run`: exactly one generation call, output stored
/// verbatim. No retries.
#[instrument(skip_all, fields(run_id = %run.id, stage = %stage.id()))]
pub async fn execute_stage(
    stage: &Stage,
    run: &mut PipelineRun,
    ctx: GenerationContext<'_>,
) -> Result<String> {
    for upstream in stage.upstream_stage_ids() {
        if run.status(upstream) != Some(StageStatus::Succeeded) {
            return Err(ContentCrewError::config(format!(
                "upstream stage '{upstream}' has not succeeded"
            )));
        }
    }

    run.set_status(stage.id(), StageStatus::Running);

    let prompt = match build_prompt(stage, &run.variables, &run.stage_outputs) {
        Ok(prompt) => prompt,
        Err(e) => {
            run.set_status(stage.id(), StageStatus::Failed);
            return Err(e);
        }
    };

    debug!(prompt_len = prompt.len(), role = stage.role().name(), "calling generation service");
    let started = Instant::now();

    match ctx.service.generate(&prompt, ctx.params).await {
        Ok(output) => {
            info!(
                output_len = output.len(),
                elapsed_ms = started.elapsed().as_millis(),
                "stage succeeded"
            );
            run.stage_outputs
                .insert(stage.id().to_string(), output.clone());
            run.set_status(stage.id(), StageStatus::Succeeded);
            Ok(output)
        }
        Err(e) => {
            warn!(error = %e, "stage generation failed");
            run.set_status(stage.id(), StageStatus::Failed);
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline orchestration
// ---------------------------------------------------------------------------

impl Pipeline {
    /// Create fresh run state with every stage `Pending`.
    ///
    /// Rejects variables whose names collide with stage ids, since those
    /// names are reserved for stage outputs.
    pub fn start(&self, variables: Variables) -> Result<PipelineRun> {
        if let Some(stage) = self.stages().iter().find(|s| variables.contains_key(s.id())) {
            return Err(ContentCrewError::invalid_input(format!(
                "variable '{}' collides with a stage id",
                stage.id()
            )));
        }

        Ok(PipelineRun {
            id: Uuid::now_v7(),
            variables,
            stage_outputs: HashMap::new(),
            statuses: self
                .stages()
                .iter()
                .map(|s| (s.id().to_string(), StageStatus::Pending))
                .collect(),
        })
    }

    /// Run every stage in order and return the terminal stage's output.
    pub async fn run(
        &self,
        ctx: GenerationContext<'_>,
        variables: Variables,
        progress: &dyn ProgressReporter,
    ) -> Result<String> {
        let mut run = self.start(variables)?;
        self.drive(&mut run, ctx, progress).await
    }

    /// Execute all stages of an already-started run.
    #[instrument(skip_all, fields(pipeline = %self.name(), run_id = %run.id))]
    pub async fn drive(
        &self,
        run: &mut PipelineRun,
        ctx: GenerationContext<'_>,
        progress: &dyn ProgressReporter,
    ) -> Result<String> {
        let total = self.stages().len();
        let started = Instant::now();
        info!(stages = total, "pipeline run started");

        for (i, stage) in self.stages().iter().enumerate() {
            progress.stage_started(stage.id(), stage.role().name(), i + 1, total);
            execute_stage(stage, run, ctx)
                .await
                .map_err(|e| e.in_stage(stage.id()))?;
            progress.stage_finished(stage.id(), i + 1, total);
        }

        let result = run
            .result()
            .map(str::to_string)
            .ok_or_else(|| ContentCrewError::config("terminal stage produced no result"))?;

        info!(
            elapsed_ms = started.elapsed().as_millis(),
            output_len = result.len(),
            "pipeline run complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::crew::Role;
    use crate::testing::{self, FnGenerator};

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Two-stage chain whose task descriptions are `PLAN({topic})` and
    /// `WRITE({plan})`.
    fn plan_write_pipeline() -> Pipeline {
        let planner = Arc::new(Role::new("planner", "Plan {topic}", "You plan."));
        let writer = Arc::new(Role::new(
            "writer",
            "Write about {topic}",
            "You write from this plan:\n{plan}",
        ));
        Pipeline::chain(
            "plan-write",
            vec![
                Stage::new("plan", planner, "PLAN({topic})", "an outline"),
                Stage::new("write", writer, "WRITE({plan})", "a post"),
            ],
        )
        .unwrap()
    }

    /// Responds with the line following `Task:` in the prompt.
    fn task_line(prompt: &str) -> Result<String> {
        let task = prompt
            .split("Task:\n")
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .unwrap_or_default();
        Ok(task.to_string())
    }

    #[tokio::test]
    async fn end_to_end_threads_outputs_through_stages() {
        let generator = FnGenerator::new(task_line);
        let params = testing::params();
        let ctx = GenerationContext::new(&generator, &params);

        let result = plan_write_pipeline()
            .run(ctx, vars(&[("topic", "electric bikes")]), &SilentProgress)
            .await
            .expect("run");

        assert_eq!(result, "WRITE(PLAN(electric bikes))");
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn echo_shows_upstream_output_in_rendered_backstory() {
        let generator = testing::echo();
        let params = testing::params();
        let ctx = GenerationContext::new(&generator, &params);
        let pipeline = plan_write_pipeline();

        let mut run = pipeline.start(vars(&[("topic", "electric bikes")])).unwrap();
        let result = pipeline.drive(&mut run, ctx, &SilentProgress).await.unwrap();

        let stage1 = run.output("plan").unwrap().to_string();
        let prompts = generator.prompts();
        assert_eq!(prompts[0], stage1);
        assert!(prompts[1].contains(&format!("You write from this plan:\n{stage1}")));
        assert_eq!(result, prompts[1]);
        assert_eq!(run.result(), Some(result.as_str()));
    }

    #[test]
    fn prompt_order_is_goal_backstory_task_expected() {
        let pipeline = plan_write_pipeline();
        let stage = pipeline.stage("plan").unwrap();
        let prompt =
            build_prompt(stage, &vars(&[("topic", "tea")]), &HashMap::new()).unwrap();

        let goal = prompt.find("Plan tea").unwrap();
        let backstory = prompt.find("You plan.").unwrap();
        let task = prompt.find("PLAN(tea)").unwrap();
        let hint = prompt.find("Expected output: an outline").unwrap();
        assert!(goal < backstory && backstory < task && task < hint);
    }

    #[tokio::test]
    async fn missing_variable_fails_before_generation_for_that_stage() {
        let planner = Arc::new(Role::new("planner", "Plan {topic}", "You plan."));
        let writer = Arc::new(Role::new(
            "writer",
            "Write about {topic}",
            "Insights:\n{web_insights}\nPlan:\n{plan}",
        ));
        let pipeline = Pipeline::chain(
            "ungrounded",
            vec![
                Stage::new("plan", planner, "Outline {topic}", "plan"),
                Stage::new("write", writer, "Write it", "post"),
            ],
        )
        .unwrap();

        let generator = testing::echo();
        let params = testing::params();
        let ctx = GenerationContext::new(&generator, &params);
        let mut run = pipeline.start(vars(&[("topic", "bikes")])).unwrap();

        let err = pipeline
            .drive(&mut run, ctx, &SilentProgress)
            .await
            .unwrap_err();

        assert_eq!(err.failed_stage(), Some("write"));
        assert!(
            matches!(err.root(), ContentCrewError::MissingVariable { name } if name == "web_insights")
        );
        // Only stage 1 reached the generation service.
        assert_eq!(generator.calls(), 1);
        assert_eq!(run.status("plan"), Some(StageStatus::Succeeded));
        assert_eq!(run.status("write"), Some(StageStatus::Failed));
        assert_eq!(run.output("write"), None);
        assert_eq!(run.result(), None);
    }

    #[tokio::test]
    async fn generation_failure_aborts_run_without_later_stages() {
        let generator = FnGenerator::new(|prompt: &str| {
            if prompt.contains("WRITE(") {
                Err(ContentCrewError::Generation("rate limited".into()))
            } else {
                Ok("plan text".to_string())
            }
        });
        let params = testing::params();
        let ctx = GenerationContext::new(&generator, &params);

        let planner = Arc::new(Role::new("planner", "Plan {topic}", "p"));
        let writer = Arc::new(Role::new("writer", "Write {topic}", "{plan}"));
        let editor = Arc::new(Role::new("editor", "Edit", "{write}"));
        let pipeline = Pipeline::chain(
            "three",
            vec![
                Stage::new("plan", planner, "PLAN({topic})", "x"),
                Stage::new("write", writer, "WRITE({plan})", "y"),
                Stage::new("edit", editor, "EDIT", "z"),
            ],
        )
        .unwrap();

        let mut run = pipeline.start(vars(&[("topic", "t")])).unwrap();
        let err = pipeline
            .drive(&mut run, ctx, &SilentProgress)
            .await
            .unwrap_err();

        assert_eq!(err.failed_stage(), Some("write"));
        assert!(matches!(err.root(), ContentCrewError::Generation(_)));
        assert_eq!(generator.calls(), 2, "no retry and no call for 'edit'");
        assert_eq!(run.status("edit"), Some(StageStatus::Pending));
        assert_eq!(run.result(), None);
    }

    #[tokio::test]
    async fn stage_refuses_to_start_before_upstream_succeeds() {
        let pipeline = plan_write_pipeline();
        let generator = testing::echo();
        let params = testing::params();
        let mut run = pipeline.start(vars(&[("topic", "t")])).unwrap();

        let err = execute_stage(
            pipeline.stage("write").unwrap(),
            &mut run,
            GenerationContext::new(&generator, &params),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("has not succeeded"));
        assert_eq!(run.status("write"), Some(StageStatus::Pending));
        assert_eq!(generator.calls(), 0);
    }

    #[test]
    fn new_run_starts_pending() {
        let pipeline = plan_write_pipeline();
        let run = pipeline.start(vars(&[("topic", "t")])).unwrap();
        assert_eq!(run.status("plan"), Some(StageStatus::Pending));
        assert_eq!(run.status("write"), Some(StageStatus::Pending));
        assert_eq!(run.status("missing"), None);
        assert_eq!(run.result(), None);
        assert_eq!(run.variables().get("topic").map(String::as_str), Some("t"));
    }

    #[test]
    fn variable_named_like_a_stage_is_rejected() {
        let err = plan_write_pipeline()
            .start(vars(&[("topic", "t"), ("plan", "sneaky")]))
            .unwrap_err();
        assert!(matches!(err, ContentCrewError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn output_is_stored_verbatim() {
        let raw = "  leading space\n\ntrailing newline\n";
        let generator = FnGenerator::new(move |_: &str| Ok(raw.to_string()));
        let params = testing::params();
        let ctx = GenerationContext::new(&generator, &params);

        let result = plan_write_pipeline()
            .run(ctx, vars(&[("topic", "t")]), &SilentProgress)
            .await
            .unwrap();
        assert_eq!(result, raw);
    }

    #[tokio::test]
    async fn independent_runs_do_not_share_state() {
        let generator = FnGenerator::new(task_line);
        let params = testing::params();
        let ctx = GenerationContext::new(&generator, &params);
        let pipeline = plan_write_pipeline();

        let (a, b) = tokio::join!(
            pipeline.run(ctx, vars(&[("topic", "tea")]), &SilentProgress),
            pipeline.run(ctx, vars(&[("topic", "coffee")]), &SilentProgress),
        );
        assert_eq!(a.unwrap(), "WRITE(PLAN(tea))");
        assert_eq!(b.unwrap(), "WRITE(PLAN(coffee))");
    }
}
