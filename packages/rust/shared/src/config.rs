//! Application configuration for contentcrew.
//!
//! User config lives at `~/.contentcrew/contentcrew.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContentCrewError, Result};
use crate::types::{Framework, PresetName};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contentcrew.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contentcrew";

// ---------------------------------------------------------------------------
// Config structs (matching contentcrew.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generation service settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Insight retrieval (web search) settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory that receives one markdown file per persisted run.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Path of the content database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Pipeline preset used when the CLI does not name one.
    #[serde(default = "default_preset")]
    pub preset: PresetName,

    /// Whether to gather web insights before running the pipeline.
    #[serde(default = "default_true")]
    pub grounding: bool,

    /// Copy framework bound as `{framework}`.
    #[serde(default = "default_framework")]
    pub framework: Framework,

    /// Maximum number of search snippets used for grounding.
    #[serde(default = "default_insight_count")]
    pub insight_count: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            database_path: default_database_path(),
            preset: default_preset(),
            grounding: true,
            framework: default_framework(),
            insight_count: default_insight_count(),
        }
    }
}

fn default_output_dir() -> String {
    "posts".into()
}
fn default_database_path() -> String {
    "content.db".into()
}
fn default_preset() -> PresetName {
    PresetName::Social
}
fn default_framework() -> Framework {
    Framework::Aida
}
fn default_insight_count() -> usize {
    5
}
fn default_true() -> bool {
    true
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_generation_key_env")]
    pub api_key_env: String,

    /// Model passed with every generation request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_base_url(),
            api_key_env: default_generation_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_generation_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_generation_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_generation_timeout() -> u64 {
    60
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the SerpAPI-compatible search endpoint.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Name of the env var holding the search API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Search engine passed as the `engine` query parameter.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// Per-request timeout.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            api_key_env: default_search_key_env(),
            engine: default_engine(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_base_url() -> String {
    "https://serpapi.com".into()
}
fn default_search_key_env() -> String {
    "SERPAPI_KEY".into()
}
fn default_engine() -> String {
    "google".into()
}
fn default_search_timeout() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contentcrew/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContentCrewError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contentcrew/contentcrew.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentCrewError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContentCrewError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContentCrewError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContentCrewError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContentCrewError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read an API key from the named env var. Empty values count as unset.
pub fn read_api_key(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

/// Check that the generation API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.generation.api_key_env;
    match read_api_key(var_name) {
        Some(_) => Ok(()),
        None => Err(ContentCrewError::config(format!(
            "generation API key not found. Set the {var_name} environment variable \
             (a .env file in the working directory is also read)."
        ))),
    }
}
