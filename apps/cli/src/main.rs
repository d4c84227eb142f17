//! contentcrew CLI: turn a topic into finished, stored content.
//!
//! Runs a planner → writer → editor pipeline against an LLM, optionally
//! grounded in web search snippets, and keeps the results in a local store.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // A missing .env is fine; keys may come from the real environment.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
