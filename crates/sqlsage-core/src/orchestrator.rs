//! Workflow orchestrator — the bounded-retry state machine
//!
//! Sequences ranking, generation, validation, correction and execution for
//! one question at a time:
//!
//! | From       | Condition                    | To                |
//! |------------|------------------------------|-------------------|
//! | LinkSchema | always                       | Generate          |
//! | Generate   | always                       | Validate          |
//! | Validate   | invalid and attempts < max   | Correct           |
//! | Validate   | valid or attempts >= max     | Execute           |
//! | Correct    | always                       | Validate          |
//! | Execute    | succeeded                    | Terminal(success) |
//! | Execute    | failed and attempts < max    | Correct           |
//! | Execute    | failed and attempts >= max   | Terminal(failure) |
//!
//! One attempt budget covers both the validate-correct and the
//! execute-correct loop, so a pathological question can never consume more
//! than `max_correction_attempts` correction calls in total. When the budget
//! runs out during validation the workflow still proceeds to execution: a
//! candidate the plan check dislikes may still run (the plan check has false
//! positives), and attempting is preferred over refusing outright.
//!
//! Termination is guaranteed: the attempt counter is monotonically increasing
//! and bounded, and no other cycle exists.

use crate::corrector::{Failure, SelfCorrector};
use crate::error::{Error, Result};
use crate::executor::QueryExecutor;
use crate::generator::SqlGenerator;
use crate::ranker::TableRanker;
use crate::session::{ExecutionState, Session, SessionOutcome};
use crate::validator::QueryValidator;
use serde::{Deserialize, Serialize};
use sqlsage_llm::LlmProvider;
use sqlsage_schema::{SchemaProfile, SchemaStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Model override; empty defers to the provider's default
    #[serde(default)]
    pub model: String,
    /// Sampling temperature for generation and correction
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Max tokens per generation call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Correction budget shared by the validate and execute loops
    #[serde(default = "default_max_correction_attempts")]
    pub max_correction_attempts: u32,
    /// How many tables the ranker may surface
    #[serde(default = "default_top_k_tables")]
    pub top_k_tables: usize,
    /// Deadline for each external call, in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.0
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_max_correction_attempts() -> u32 {
    3
}

fn default_top_k_tables() -> usize {
    3
}

fn default_call_timeout_secs() -> u64 {
    60
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_correction_attempts: default_max_correction_attempts(),
            top_k_tables: default_top_k_tables(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl OrchestratorConfig {
    /// Per-call deadline as a `Duration`
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Where the state machine goes next
enum Stage {
    Validate,
    Correct(Failure),
    Execute,
}

/// Drives one question through the whole workflow.
///
/// All collaborators are explicit dependencies constructed once per process
/// and passed in; there are no hidden process-wide caches, so tests can
/// substitute fakes freely.
pub struct Orchestrator {
    generator: SqlGenerator,
    corrector: SelfCorrector,
    validator: QueryValidator,
    executor: QueryExecutor,
    ranker: TableRanker,
    profile: SchemaProfile,
    config: OrchestratorConfig,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Wire up the workflow over a provider, a store and a schema profile.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: SchemaStore,
        profile: SchemaProfile,
        config: OrchestratorConfig,
    ) -> Self {
        let corpus: Vec<(String, String)> = profile
            .tables()
            .iter()
            .map(|t| (t.name().to_string(), t.document.clone()))
            .collect();

        Self {
            generator: SqlGenerator::new(
                provider.clone(),
                config.model.clone(),
                config.temperature,
                config.max_tokens,
            ),
            corrector: SelfCorrector::new(
                provider,
                config.model.clone(),
                config.temperature,
                config.max_tokens,
            ),
            validator: QueryValidator::new(store.clone()),
            executor: QueryExecutor::new(store),
            ranker: TableRanker::fit(&corpus),
            profile,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Get a child cancellation token for this orchestrator
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Cancel the in-flight session at its next call boundary
    pub fn cancel(&self) {
        info!("Cancelling workflow");
        self.cancel.cancel();
    }

    /// Race an external call against cancellation and the per-call deadline.
    async fn guarded<T>(
        &self,
        stage: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let deadline = self.config.call_timeout();
        tokio::select! {
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            outcome = tokio::time::timeout(deadline, fut) => match outcome {
                Ok(inner) => inner,
                Err(_) => Err(Error::StageTimeout {
                    stage,
                    secs: deadline.as_secs(),
                }),
            },
        }
    }

    /// Rank tables and assemble the schema context for the generator.
    ///
    /// When no table has any textual overlap with the question, the full
    /// schema is shown instead: a blind generator is strictly worse than a
    /// generator reading too much.
    fn link_schema(&self, session: &mut Session) {
        let ranked = self.ranker.rank(&session.question, self.config.top_k_tables);

        let tables: Vec<String> = ranked.iter().map(|ts| ts.table.clone()).collect();
        let context = if ranked.is_empty() {
            warn!("No table matched the question; using the full schema");
            self.profile.render()
        } else {
            ranked
                .iter()
                .filter_map(|ts| {
                    self.profile
                        .ddl_for(&ts.table)
                        .map(|ddl| format!("-- Relevance: {:.2}\n{}", ts.score, ddl))
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        debug!(tables = ?tables, "Linked schema");
        session.link_schema(tables, context);
    }

    /// Run one question to a terminal outcome.
    ///
    /// # Errors
    /// Only infrastructure failures (provider or store connection down, call
    /// timeout, cancellation) are errors. SQL-quality failures are handled
    /// inside the workflow and end up in the returned outcome instead.
    pub async fn run(&self, question: &str) -> Result<SessionOutcome> {
        let mut session = Session::new(question);
        info!(session = %session.id, "Starting text-to-SQL session");

        self.link_schema(&mut session);

        let generated = self
            .guarded(
                "generation",
                self.generator
                    .generate(&session.question, &session.schema_context),
            )
            .await?;
        session.set_candidate(generated);

        let max_attempts = self.config.max_correction_attempts;
        let mut stage = Stage::Validate;

        loop {
            stage = match stage {
                Stage::Validate => {
                    let verdict = self
                        .guarded("validation", self.validator.validate(&session.candidate_sql))
                        .await?;
                    let failure = Failure::from_verdict(&verdict);
                    session.record_validation(verdict.outcome);

                    match failure {
                        Some(failure) if session.correction_attempt < max_attempts => {
                            Stage::Correct(failure)
                        }
                        Some(_) => {
                            // Budget exhausted: attempt execution anyway
                            // rather than failing closed.
                            warn!(
                                session = %session.id,
                                "Correction budget exhausted during validation; executing as-is"
                            );
                            Stage::Execute
                        }
                        None => Stage::Execute,
                    }
                }
                Stage::Correct(failure) => {
                    debug!(
                        session = %session.id,
                        attempt = session.correction_attempt + 1,
                        kind = failure.kind.label(),
                        "Requesting correction"
                    );
                    self.guarded("correction", self.corrector.correct(&mut session, &failure))
                        .await?;
                    Stage::Validate
                }
                Stage::Execute => {
                    let outcome = self
                        .guarded("execution", self.executor.execute(&session.candidate_sql))
                        .await?;
                    session.record_execution(outcome);

                    match session.execution.state {
                        ExecutionState::Succeeded => break,
                        ExecutionState::Failed
                            if session.correction_attempt < max_attempts =>
                        {
                            let message = session
                                .execution
                                .error
                                .clone()
                                .unwrap_or_else(|| "execution failed".to_string());
                            Stage::Correct(Failure::execution(message))
                        }
                        _ => break,
                    }
                }
            };
        }

        session.finish();
        info!(
            session = %session.id,
            succeeded = session.succeeded(),
            attempts = session.correction_attempt,
            "Session finished"
        );
        Ok(session.into_outcome())
    }
}
