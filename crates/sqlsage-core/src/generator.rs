//! SQL generation from natural language

use crate::error::Result;
use crate::prompts::{generation_prompt, SYSTEM_PROMPT};
use sqlsage_llm::{CompletionRequest, LlmProvider, Message};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Reduce a raw model completion to bare SQL.
///
/// Strips a surrounding code fence (with or without a language tag), trims
/// whitespace, and removes a single trailing statement terminator. Providers
/// are asked for plain SQL but routinely fence it anyway.
#[must_use]
pub fn clean_sql_output(raw: &str) -> String {
    let mut text = raw.trim();

    if text.starts_with("```") {
        text = text.trim_start_matches("```");
        if let Some(rest) = text.strip_prefix("sql") {
            text = rest;
        }
        if let Some(closing) = text.rfind("```") {
            text = &text[..closing];
        }
    }

    let text = text.trim();
    let text = text.strip_suffix(';').unwrap_or(text);
    text.trim_end().to_string()
}

/// Generates the first SQL candidate for a question.
pub struct SqlGenerator {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl SqlGenerator {
    /// Create a generator bound to a provider and model settings.
    ///
    /// An empty `model` defers to the provider's default.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    /// Ask the provider for a SQL candidate and sanitize its output.
    ///
    /// # Errors
    /// Propagates provider infrastructure errors untouched; output quality is
    /// the validator's concern, not an error here.
    #[instrument(skip(self, question, schema_context))]
    pub async fn generate(&self, question: &str, schema_context: &str) -> Result<String> {
        let request = CompletionRequest::new(&self.model)
            .with_message(Message::system(SYSTEM_PROMPT))
            .with_message(Message::user(generation_prompt(question, schema_context)))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        let sql = clean_sql_output(&response.content);
        debug!(provider = self.provider.name(), "Generated SQL candidate");
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_plain_sql() {
        assert_eq!(clean_sql_output("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_clean_strips_fence_with_tag() {
        let raw = "```sql\nSELECT * FROM customers\n```";
        assert_eq!(clean_sql_output(raw), "SELECT * FROM customers");
    }

    #[test]
    fn test_clean_strips_bare_fence() {
        let raw = "```\nSELECT 1\n```";
        assert_eq!(clean_sql_output(raw), "SELECT 1");
    }

    #[test]
    fn test_clean_strips_single_trailing_semicolon() {
        assert_eq!(clean_sql_output("SELECT 1;"), "SELECT 1");
        // only one terminator is removed; a doubled one is a real artifact
        assert_eq!(clean_sql_output("SELECT 1;;"), "SELECT 1;");
    }

    #[test]
    fn test_clean_trims_whitespace() {
        assert_eq!(clean_sql_output("  SELECT 1 ;  "), "SELECT 1");
    }
}
