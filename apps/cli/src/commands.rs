//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use contentcrew_core::crew::Pipeline;
use contentcrew_core::insights::WEB_INSIGHTS_VAR;
use contentcrew_core::pipeline::{GenerationContext, ProgressReporter};
use contentcrew_core::workflow::{self, GenerateRequest, Persistence, Services};
use contentcrew_core::{artifact, presets, variation};
use contentcrew_providers::{
    GenerationParams, InsightService, OpenAiClient, SerpApiClient,
};
use contentcrew_shared::{
    AppConfig, Framework, ListOrder, PresetName, RecordId, init_config, load_config,
    read_api_key, validate_api_key,
};
use contentcrew_storage::ContentStore;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// contentcrew: multi-stage content generation from a single topic.
#[derive(Parser)]
#[command(
    name = "contentcrew",
    version,
    about = "Generate, store, and vary content with a planner → writer → editor pipeline.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the pipeline for a topic and save the result.
    Generate {
        /// Subject of the content.
        topic: String,

        /// Copy framework: AIDA or PAS (defaults to config).
        #[arg(short, long)]
        framework: Option<Framework>,

        /// Pipeline preset: blog or social (defaults to config).
        #[arg(short, long)]
        preset: Option<PresetName>,

        /// Skip web search grounding.
        #[arg(long)]
        no_grounding: bool,

        /// Do not store the record or write the markdown file.
        #[arg(long)]
        no_save: bool,

        /// Also print one variation of the result.
        #[arg(long)]
        variation: bool,
    },

    /// List stored content records.
    List {
        /// Most recent date first.
        #[arg(long)]
        newest: bool,
    },

    /// Print a stored record.
    Show {
        /// Record id.
        id: RecordId,
    },

    /// Delete a stored record.
    Delete {
        /// Record id.
        id: RecordId,
    },

    /// Produce a variation of a stored record.
    Vary {
        /// Record id.
        id: RecordId,

        /// Store the variation as a new record (and markdown file).
        #[arg(long)]
        save: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contentcrew=info",
        1 => "contentcrew=debug",
        _ => "contentcrew=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate {
            topic,
            framework,
            preset,
            no_grounding,
            no_save,
            variation,
        } => {
            let opts = GenerateOpts {
                framework,
                preset,
                grounding: !no_grounding,
                save: !no_save,
                variation,
            };
            cmd_generate(&topic, opts).await
        }
        Command::List { newest } => cmd_list(newest).await,
        Command::Show { id } => cmd_show(id).await,
        Command::Delete { id } => cmd_delete(id).await,
        Command::Vary { id, save } => cmd_vary(id, save).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

async fn open_store(config: &AppConfig) -> Result<ContentStore> {
    let path = PathBuf::from(&config.defaults.database_path);
    ContentStore::open(&path)
        .await
        .wrap_err_with(|| format!("failed to open content store at {}", path.display()))
}

fn generation_client(config: &AppConfig) -> Result<OpenAiClient> {
    validate_api_key(config)?;
    let key = read_api_key(&config.generation.api_key_env)
        .ok_or_else(|| eyre!("{} is not set", config.generation.api_key_env))?;
    Ok(OpenAiClient::from_config(&config.generation, key)?)
}

/// `None` when no search key is configured; grounding then stays empty.
fn search_client(config: &AppConfig) -> Result<Option<SerpApiClient>> {
    match read_api_key(&config.search.api_key_env) {
        Some(key) => Ok(Some(SerpApiClient::from_config(&config.search, key)?)),
        None => {
            warn!(
                var = %config.search.api_key_env,
                "search API key not set, web insights will be empty"
            );
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Fail early when the pipeline needs `{web_insights}` but grounding is off;
/// the run would otherwise stop at its first stage with a missing variable.
fn check_grounding(pipeline: &Pipeline, grounding: bool) -> Result<()> {
    if !grounding && pipeline.requires_variable(WEB_INSIGHTS_VAR) {
        return Err(eyre!(
            "the '{}' preset needs web insights; drop --no-grounding (and set \
             `grounding = true` in the config) or use `--preset blog`",
            pipeline.name()
        ));
    }
    Ok(())
}

struct GenerateOpts {
    framework: Option<Framework>,
    preset: Option<PresetName>,
    grounding: bool,
    save: bool,
    variation: bool,
}

async fn cmd_generate(topic: &str, opts: GenerateOpts) -> Result<()> {
    let config = load_config()?;
    let preset = opts.preset.unwrap_or(config.defaults.preset);
    let pipeline = presets::pipeline_for(preset)?;
    let grounding = opts.grounding && config.defaults.grounding;
    check_grounding(&pipeline, grounding)?;

    // Validate API key before doing anything
    let generator = generation_client(&config)?;
    let search = if grounding {
        search_client(&config)?
    } else {
        None
    };
    let store = open_store(&config).await?;
    let params = GenerationParams::from(&config.generation);

    let services = Services {
        generation: &generator,
        insights: search.as_ref().map(|c| c as &dyn InsightService),
        params: &params,
    };
    let persistence = Persistence {
        store: &store,
        output_dir: PathBuf::from(&config.defaults.output_dir),
    };
    let request = GenerateRequest {
        topic: topic.to_string(),
        framework: Some(opts.framework.unwrap_or(config.defaults.framework)),
        grounding,
        insight_count: config.defaults.insight_count,
        persist: opts.save,
    };

    info!(topic, preset = %preset, grounding = request.grounding, "generating content");

    let reporter = CliProgress::new();
    let result = workflow::generate(&pipeline, services, &persistence, &request, &reporter).await;
    reporter.finish();
    let outcome = result?;

    println!();
    println!("{}", outcome.content);
    println!();

    if let Some(id) = outcome.record_id {
        println!("  Saved:  record {id}");
    }
    if let Some(path) = &outcome.artifact_path {
        println!("  File:   {}", path.display());
    }
    for err in &outcome.persistence_errors {
        eprintln!("  Warning: content was generated but not saved: {err}");
    }
    println!("  Time:   {:.1}s", outcome.elapsed.as_secs_f64());

    if opts.variation {
        let ctx = GenerationContext::new(&generator, &params);
        let varied = variation::vary(ctx, &outcome.content).await?;
        println!();
        println!("--- Variation ---");
        println!();
        println!("{varied}");
    }
    println!();

    Ok(())
}

async fn cmd_list(newest: bool) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;
    let order = if newest {
        ListOrder::Newest
    } else {
        ListOrder::Inserted
    };

    let records = store.list(order).await?;
    if records.is_empty() {
        println!("No content stored yet.");
        return Ok(());
    }
    for summary in records {
        println!("{summary}");
    }
    Ok(())
}

async fn cmd_show(id: RecordId) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;
    let record = store.get(id).await?;

    println!("{}", record.summary());
    println!();
    println!("{}", record.content);
    Ok(())
}

async fn cmd_delete(id: RecordId) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;
    store.delete(id).await?;
    println!("Deleted record {id}.");
    Ok(())
}

async fn cmd_vary(id: RecordId, save: bool) -> Result<()> {
    let config = load_config()?;
    let generator = generation_client(&config)?;
    let store = open_store(&config).await?;
    let params = GenerationParams::from(&config.generation);

    let record = store.get(id).await?;
    info!(%id, topic = %record.topic, "varying stored content");

    let reporter = CliProgress::new();
    reporter.phase("Generating variation");
    let result = variation::vary(GenerationContext::new(&generator, &params), &record.content).await;
    reporter.finish();
    let varied = result?;

    println!();
    println!("{varied}");
    println!();

    if save {
        let today = Local::now().date_naive();
        let new_id = store.create_on(&record.topic, &varied, today).await?;
        println!("  Saved:  record {new_id}");
        let output_dir = PathBuf::from(&config.defaults.output_dir);
        match artifact::write_artifact(&output_dir, today, &record.topic, &varied) {
            Ok(path) => println!("  File:   {}", path.display()),
            Err(e) => eprintln!("  Warning: markdown file not written: {e}"),
        }
        println!();
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn stage_started(&self, stage_id: &str, role: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {role} ({stage_id})"));
    }

    fn stage_finished(&self, stage_id: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("[{current}/{total}] {stage_id} done"));
    }
}
