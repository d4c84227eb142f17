//! Core orchestration for contentcrew.
//!
//! Turns a topic into finished content by running a chain of role-bound
//! generation stages (planner → writer → editor), optionally grounded in web
//! search snippets, then persists the result and can produce variations.

pub mod artifact;
pub mod crew;
pub mod insights;
pub mod pipeline;
pub mod presets;
pub mod template;
pub mod variation;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;
