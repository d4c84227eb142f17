//! Shared types, error model, and configuration for contentcrew.
//!
//! This crate is the foundation depended on by all other contentcrew crates.
//! It provides:
//! - [`ContentCrewError`] - the unified error type
//! - Domain types ([`ContentRecord`], [`ContentSummary`], [`RecordId`], [`Framework`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GenerationConfig, SearchConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, read_api_key, validate_api_key,
};
pub use error::{ContentCrewError, Result};
pub use types::{ContentRecord, ContentSummary, Framework, ListOrder, PresetName, RecordId};
