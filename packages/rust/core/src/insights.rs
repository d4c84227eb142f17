//! Web grounding: turn search snippets into the `{web_insights}` variable.

use tracing::{debug, info, instrument, warn};

use contentcrew_providers::InsightService;

/// Variable name the grounding text is bound to.
pub const WEB_INSIGHTS_VAR: &str = "web_insights";

/// Default number of snippets requested.
pub const DEFAULT_INSIGHT_COUNT: usize = 5;

/// Query `service` once with `topic` and join the snippets with newlines.
///
/// Never fails: a retrieval error degrades to an empty string (logged at
/// `warn`). Results without a snippet contribute an empty line so the
/// service's ranking positions are preserved.
#[instrument(skip(service))]
pub async fn gather_insights(service: &dyn InsightService, topic: &str, k: usize) -> String {
    match service.search(topic, k).await {
        Ok(results) => {
            info!(count = results.len(), "web insights gathered");
            results
                .into_iter()
                .map(|r| r.snippet.unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n")
        }
        Err(e) => {
            warn!(error = %e, "insight retrieval failed, continuing without grounding");
            String::new()
        }
    }
}

/// Like [`gather_insights`], but treats an absent service (e.g. no API key
/// configured) as "unavailable".
pub async fn gather_insights_opt(
    service: Option<&dyn InsightService>,
    topic: &str,
    k: usize,
) -> String {
    match service {
        Some(service) => gather_insights(service, topic, k).await,
        None => {
            debug!("no insight service configured, grounding is empty");
            String::new()
        }
    }
}
