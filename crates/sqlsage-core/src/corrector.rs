//! Bounded self-correction of rejected candidates

use crate::error::Result;
use crate::generator::clean_sql_output;
use crate::prompts::{correction_prompt, SYSTEM_PROMPT};
use crate::session::Session;
use crate::validator::Verdict;
use sqlsage_llm::{CompletionRequest, LlmProvider, Message};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Why the current candidate was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A denylisted keyword was found in the text
    SecurityViolation,
    /// Unparsable, or not a single read statement
    SyntaxInvalid,
    /// The store rejected the query plan
    SemanticInvalid,
    /// The store rejected actual execution despite validation
    ExecutionFailed,
}

impl FailureKind {
    /// Label shown to the generation collaborator in repair prompts
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::SecurityViolation => "security violation",
            Self::SyntaxInvalid => "syntax error",
            Self::SemanticInvalid => "semantic error",
            Self::ExecutionFailed => "execution error",
        }
    }
}

/// A classified rejection: what went wrong and the message describing it
#[derive(Debug, Clone)]
pub struct Failure {
    /// Coarse classification
    pub kind: FailureKind,
    /// Human-readable detail, fed back to the collaborator
    pub message: String,
}

impl Failure {
    /// Classify a failed validation verdict.
    ///
    /// Returns `None` for a valid verdict.
    #[must_use]
    pub fn from_verdict(verdict: &Verdict) -> Option<Self> {
        use crate::session::ValidationState;

        let kind = match verdict.outcome.state {
            ValidationState::Valid | ValidationState::Unvalidated => return None,
            ValidationState::SyntaxInvalid if verdict.blocked_keyword.is_some() => {
                FailureKind::SecurityViolation
            }
            ValidationState::SyntaxInvalid => FailureKind::SyntaxInvalid,
            ValidationState::SemanticInvalid => FailureKind::SemanticInvalid,
        };

        Some(Self {
            kind,
            message: verdict.outcome.errors.join("; "),
        })
    }

    /// Classify an execution failure
    #[must_use]
    pub fn execution(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::ExecutionFailed,
            message: message.into(),
        }
    }
}

/// Asks the generation collaborator for a repaired query.
pub struct SelfCorrector {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl SelfCorrector {
    /// Create a corrector bound to a provider and model settings
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

    /// Replace the session's rejected candidate with a repaired one.
    ///
    /// The session mutations are exactly: rejected SQL appended to the
    /// history, attempt counter bumped, error state cleared. The only side
    /// effect beyond that is the outbound generation request.
    ///
    /// # Errors
    /// Propagates provider infrastructure errors; the attempt counter is not
    /// advanced in that case.
    #[instrument(skip(self, session, failure), fields(attempt = session.correction_attempt + 1))]
    pub async fn correct(&self, session: &mut Session, failure: &Failure) -> Result<()> {
        let prompt = correction_prompt(
            &session.question,
            &session.schema_context,
            &session.candidate_sql,
            failure,
        );

        let request = CompletionRequest::new(&self.model)
            .with_message(Message::system(SYSTEM_PROMPT))
            .with_message(Message::user(prompt))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        let corrected = clean_sql_output(&response.content);
        debug!(kind = failure.kind.label(), "Applied correction");

        session.apply_correction(corrected);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ValidationOutcome, ValidationState};
    use sqlsage_llm::{CompletionResponse, Error as LlmError};

    struct FixedProvider {
        reply: String,
    }

    #[async_trait::async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn available_models(&self) -> Vec<String> {
            vec!["fixed".to_string()]
        }

        fn default_model(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> sqlsage_llm::Result<CompletionResponse> {
            Ok(CompletionResponse {
                content: self.reply.clone(),
                usage: None,
                finish_reason: Some("stop".to_string()),
                model: request.model,
            })
        }
    }

    struct BrokenProvider;

    #[async_trait::async_trait]
    impl LlmProvider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        fn available_models(&self) -> Vec<String> {
            Vec::new()
        }

        fn default_model(&self) -> &str {
            "broken"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> sqlsage_llm::Result<CompletionResponse> {
            Err(LlmError::Network("connection refused".to_string()))
        }
    }

    fn rejected_session() -> Session {
        let mut session = Session::new("Show me all customers");
        session.link_schema(
            vec!["customers".to_string()],
            "CREATE TABLE customers (customer_id INTEGER PRIMARY KEY);".to_string(),
        );
        session.set_candidate("SELECT * FROM custmers");
        session.record_validation(ValidationOutcome {
            state: ValidationState::SemanticInvalid,
            errors: vec!["table does not exist in the database".to_string()],
        });
        session
    }

    #[tokio::test]
    async fn test_correct_updates_session() {
        let corrector = SelfCorrector::new(
            Arc::new(FixedProvider {
                reply: "```sql\nSELECT * FROM customers;\n```".to_string(),
            }),
            "fixed",
            0.0,
            256,
        );
        let mut session = rejected_session();
        let failure = Failure {
            kind: FailureKind::SemanticInvalid,
            message: "table does not exist in the database".to_string(),
        };

        corrector.correct(&mut session, &failure).await.unwrap();

        assert_eq!(session.candidate_sql, "SELECT * FROM customers");
        assert_eq!(session.correction_attempt, 1);
        assert_eq!(
            session.correction_history,
            vec!["SELECT * FROM custmers".to_string()]
        );
        assert_eq!(session.validation.state, ValidationState::Unvalidated);
        assert!(session.validation.errors.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_session_untouched() {
        let corrector = SelfCorrector::new(Arc::new(BrokenProvider), "broken", 0.0, 256);
        let mut session = rejected_session();
        let failure = Failure::execution("no such table: custmers");

        let result = corrector.correct(&mut session, &failure).await;

        assert!(result.is_err());
        assert_eq!(session.correction_attempt, 0);
        assert_eq!(session.candidate_sql, "SELECT * FROM custmers");
    }

    #[test]
    fn test_failure_from_verdict_classification() {
        let security = Verdict {
            outcome: ValidationOutcome {
                state: ValidationState::SyntaxInvalid,
                errors: vec!["dangerous keyword 'DROP' found".to_string()],
            },
            blocked_keyword: Some("DROP"),
        };
        assert_eq!(
            Failure::from_verdict(&security).unwrap().kind,
            FailureKind::SecurityViolation
        );

        let syntax = Verdict {
            outcome: ValidationOutcome {
                state: ValidationState::SyntaxInvalid,
                errors: vec!["syntax error: unexpected token".to_string()],
            },
            blocked_keyword: None,
        };
        assert_eq!(
            Failure::from_verdict(&syntax).unwrap().kind,
            FailureKind::SyntaxInvalid
        );

        let valid = Verdict {
            outcome: ValidationOutcome {
                state: ValidationState::Valid,
                errors: Vec::new(),
            },
            blocked_keyword: None,
        };
        assert!(Failure::from_verdict(&valid).is_none());
    }
}
