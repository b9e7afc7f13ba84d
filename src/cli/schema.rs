//! `sqlsage schema` — print the annotated schema

use crate::cli::open_store;
use crate::config::load_config;
use anyhow::Result;
use sqlsage_schema::SchemaProfile;

/// Print every table's annotated DDL
pub async fn run() -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config).await?;
    let profile = SchemaProfile::load(&store, config.workflow.sample_value_limit).await?;

    println!("{}", "=".repeat(60));
    println!("DATABASE SCHEMA ({} tables)", profile.len());
    println!("{}", "=".repeat(60));
    println!("{}", profile.render());

    Ok(())
}
