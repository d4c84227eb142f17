//! External service seams for contentcrew.
//!
//! The orchestrator only ever talks to the two traits defined here:
//! - [`GenerationService`] - `generate(prompt, params) -> text`
//! - [`InsightService`] - `search(query, k) -> snippets`
//!
//! HTTP-backed implementations ([`OpenAiClient`], [`SerpApiClient`]) are
//! constructed once by the front-end and passed down by reference; tests
//! substitute stubs.

pub mod generation;
pub mod search;

pub use generation::{GenerationParams, GenerationService, OpenAiClient};
pub use search::{Insight, InsightService, SerpApiClient};

/// User-Agent string for outgoing requests.
pub(crate) const USER_AGENT: &str = concat!("contentcrew/", env!("CARGO_PKG_VERSION"));
