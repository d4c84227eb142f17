//! Stub services for orchestration tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use contentcrew_providers::{GenerationParams, GenerationService, Insight, InsightService};
use contentcrew_shared::{ContentCrewError, Result};

pub(crate) fn params() -> GenerationParams {
    GenerationParams {
        model: "stub-model".into(),
        temperature: 0.0,
    }
}

/// Generation stub driven by a closure over the prompt; records every prompt.
pub(crate) struct FnGenerator<F> {
    respond: F,
    prompts: Mutex<Vec<String>>,
}

impl<F> FnGenerator<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    pub(crate) fn new(respond: F) -> Self {
        Self {
            respond,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl<F> GenerationService for FnGenerator<F>
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }
}

/// Returns its prompt unchanged.
pub(crate) fn echo() -> FnGenerator<impl Fn(&str) -> Result<String> + Send + Sync> {
    FnGenerator::new(|prompt: &str| Ok(prompt.to_string()))
}

/// Fails every call with a generation error.
pub(crate) fn failing() -> FnGenerator<impl Fn(&str) -> Result<String> + Send + Sync> {
    FnGenerator::new(|_: &str| Err(ContentCrewError::Generation("stub outage".into())))
}

/// Search stub returning a fixed result (or error) and counting calls.
pub(crate) struct StubInsights {
    result: std::result::Result<Vec<Insight>, String>,
    calls: AtomicUsize,
    last_k: AtomicUsize,
}

impl StubInsights {
    pub(crate) fn returning(snippets: &[&str]) -> Self {
        Self::with_results(snippets.iter().map(|s| Insight::new(*s)).collect())
    }

    pub(crate) fn with_results(results: Vec<Insight>) -> Self {
        Self {
            result: Ok(results),
            calls: AtomicUsize::new(0),
            last_k: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_k: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_k(&self) -> usize {
        self.last_k.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InsightService for StubInsights {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<Insight>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_k.store(k, Ordering::SeqCst);
        match &self.result {
            Ok(results) => Ok(results.clone()),
            Err(message) => Err(ContentCrewError::Retrieval(message.clone())),
        }
    }
}
