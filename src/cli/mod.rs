//! CLI module for sqlsage
//!
//! Commands:
//! - `ask`: run one question through the text-to-SQL workflow
//! - `schema`: print the annotated database schema
//! - `seed`: create and populate the sample e-commerce database

use crate::config::{AppConfig, LlmConfig};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sqlsage_llm::{
    LlmProvider, OllamaConfig, OllamaProvider, OpenAiConfig, OpenAiProvider, ProviderRegistry,
};
use sqlsage_schema::SchemaStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub mod ask;
pub mod output;
pub mod schema;
pub mod seed;

/// Sqlsage CLI
#[derive(Parser, Debug)]
#[command(name = "sqlsage")]
#[command(about = "Ask your database questions in plain English")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question and print the resulting rows
    Ask {
        /// The natural-language question
        question: String,
        /// Print the full session outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the annotated schema the generator sees
    Schema,
    /// Create and populate the sample e-commerce database
    Seed {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Ask { question, json }) => ask::run(&question, json).await,
        Some(Commands::Schema) => schema::run().await,
        Some(Commands::Seed { force }) => seed::run(force).await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Open the configured database, refusing to silently create an empty one.
pub(crate) async fn open_store(config: &AppConfig) -> Result<SchemaStore> {
    let path = &config.database.path;
    if !path.exists() {
        bail!(
            "database not found at {}. Run 'sqlsage seed' to create the sample database.",
            path.display()
        );
    }
    SchemaStore::from_path(path)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))
}

/// Register every provider the environment supports and resolve the
/// configured default.
pub(crate) fn build_provider(llm: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let timeout = Duration::from_secs(llm.timeout_secs);
    let mut registry = ProviderRegistry::new(&llm.provider);

    match OpenAiConfig::from_env() {
        Ok(config) => {
            registry.register(
                "openai",
                Arc::new(OpenAiProvider::new(config.with_timeout(timeout))),
            );
        }
        Err(e) => debug!("OpenAI provider not available: {e}"),
    }

    match OllamaProvider::new(OllamaConfig::from_env().with_timeout(timeout)) {
        Ok(provider) => registry.register("ollama", Arc::new(provider)),
        Err(e) => debug!("Ollama provider not available: {e}"),
    }

    registry.default_provider().with_context(|| {
        format!(
            "LLM provider '{}' is not configured (available: {})",
            registry.default_provider_name(),
            registry.list_providers().join(", ")
        )
    })
}
