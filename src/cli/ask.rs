//! `sqlsage ask` — run one question through the workflow

use crate::cli::output::format_results;
use crate::cli::{build_provider, open_store};
use crate::config::load_config;
use anyhow::{bail, Result};
use sqlsage_core::Orchestrator;
use sqlsage_schema::SchemaProfile;
use tracing::info;

/// Run one question and print the outcome
pub async fn run(question: &str, json: bool) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;

    let profile = SchemaProfile::load(&store, config.workflow.sample_value_limit).await?;
    if profile.is_empty() {
        bail!(
            "database at {} has no tables. Run 'sqlsage seed' first.",
            config.database.path.display()
        );
    }

    let provider = build_provider(&config.llm)?;
    info!(
        provider = provider.name(),
        model = provider.default_model(),
        "Using LLM provider"
    );

    let orchestrator = Orchestrator::new(provider, store, profile, config.orchestrator_config());
    let outcome = orchestrator.run(question).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("SQL: {}", outcome.final_sql);
    if outcome.correction_attempts > 0 {
        println!(
            "(repaired {} time{})",
            outcome.correction_attempts,
            if outcome.correction_attempts == 1 { "" } else { "s" }
        );
    }
    println!();

    if outcome.succeeded {
        match &outcome.rows {
            Some(rows) => println!("{}", format_results(rows)),
            None => println!("No results found."),
        }
    } else {
        println!(
            "Query failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
        if !outcome.correction_history.is_empty() {
            println!("\nRejected candidates:");
            for (idx, sql) in outcome.correction_history.iter().enumerate() {
                println!("  {}. {}", idx + 1, sql);
            }
        }
    }

    Ok(())
}
