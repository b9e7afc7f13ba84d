//! Application configuration
//!
//! Layered loading: embedded defaults, then optional file overrides, then
//! `SQLSAGE_`-prefixed environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use sqlsage_core::OrchestratorConfig;
use std::path::PathBuf;

/// Embedded default configuration (compiled into the binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation collaborator settings
    pub llm: LlmConfig,
    /// Database settings
    pub database: DatabaseConfig,
    /// Workflow settings
    pub workflow: WorkflowConfig,
}

/// Which provider answers completions, and how
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "openai" or "ollama"
    pub provider: String,
    /// Model override; empty defers to the provider default
    #[serde(default)]
    pub model: String,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,
    /// Max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Per-call deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_timeout_secs() -> u64 {
    60
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
}

/// Workflow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Correction budget per question
    #[serde(default = "default_max_correction_attempts")]
    pub max_correction_attempts: u32,
    /// How many tables the ranker surfaces to the generator
    #[serde(default = "default_top_k_tables")]
    pub top_k_tables: usize,
    /// Distinct values sampled per column for schema annotations
    #[serde(default = "default_sample_value_limit")]
    pub sample_value_limit: usize,
}

fn default_max_correction_attempts() -> u32 {
    3
}

fn default_top_k_tables() -> usize {
    3
}

fn default_sample_value_limit() -> usize {
    5
}

impl AppConfig {
    /// Project the app configuration onto the workflow engine's config
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            max_correction_attempts: self.workflow.max_correction_attempts,
            top_k_tables: self.workflow.top_k_tables,
            call_timeout_secs: self.llm.timeout_secs,
        }
    }
}

/// Load configuration from embedded defaults, files, and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/local").required(false))
        // prefix_separator("_") so SQLSAGE_LLM__PROVIDER works with a single
        // underscore after the prefix
        .add_source(
            Environment::with_prefix("SQLSAGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.workflow.max_correction_attempts, 3);
        assert_eq!(config.workflow.top_k_tables, 3);
        assert_eq!(config.database.path, PathBuf::from("data/ecommerce.db"));
    }

    #[test]
    fn test_orchestrator_projection() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let orchestrator = config.orchestrator_config();
        assert_eq!(orchestrator.max_correction_attempts, 3);
        assert_eq!(orchestrator.call_timeout_secs, 60);
    }
}
