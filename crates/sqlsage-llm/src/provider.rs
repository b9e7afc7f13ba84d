//! Provider trait and registry
//!
//! `LlmProvider` is the seam the rest of the workspace tests against; the
//! registry holds the configured providers and hands out the default one.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Trait for LLM providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get available models
    fn available_models(&self) -> Vec<String>;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Complete a conversation
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

/// Registry of configured providers with a designated default
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    default_provider: String,
}

impl ProviderRegistry {
    /// Create a new registry
    #[must_use]
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        let name = name.into();
        debug!(provider = %name, "Registering LLM provider");
        self.providers.insert(name, provider);
    }

    /// Get a provider by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(name).cloned()
    }

    /// Get the default provider
    ///
    /// # Errors
    /// Returns `Error::NotConfigured` if the default provider was never
    /// registered.
    pub fn default_provider(&self) -> Result<Arc<dyn LlmProvider>> {
        self.get(&self.default_provider)
            .ok_or_else(|| Error::NotConfigured(self.default_provider.clone()))
    }

    /// Get the default provider name
    #[must_use]
    pub fn default_provider_name(&self) -> &str {
        &self.default_provider
    }

    /// List registered provider names
    #[must_use]
    pub fn list_providers(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}
