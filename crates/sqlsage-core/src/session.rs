//! Session record — the single mutable record threaded through one workflow
//!
//! A `Session` is created fresh per question, owned exclusively by the
//! orchestrator for the duration of the run, and discarded (or logged by the
//! caller) once a terminal state is reached. No cross-question state lives
//! here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlsage_schema::ResultSet;
use uuid::Uuid;

/// Validation state of the current candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    /// Not validated yet (fresh candidate)
    Unvalidated,
    /// Rejected by the syntax phase (parse, statement type, or denylist)
    SyntaxInvalid,
    /// Rejected by the store's plan check
    SemanticInvalid,
    /// Accepted by both phases
    Valid,
}

/// Execution state of the current candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// Not executed yet
    NotRun,
    /// Executed and returned rows
    Succeeded,
    /// The store (or the executor's safety net) rejected the run
    Failed,
}

/// Result of a validation pass
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    /// Coarse validation state
    pub state: ValidationState,
    /// Human-readable errors, syntax errors first
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    /// Fresh, unvalidated outcome
    #[must_use]
    pub fn unvalidated() -> Self {
        Self {
            state: ValidationState::Unvalidated,
            errors: Vec::new(),
        }
    }
}

/// Result of an execution pass
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    /// Coarse execution state
    pub state: ExecutionState,
    /// Store error, verbatim, when `state` is `Failed`
    pub error: Option<String>,
    /// Ordered rows when `state` is `Succeeded`
    pub rows: Option<ResultSet>,
}

impl ExecutionOutcome {
    /// Fresh, not-run outcome
    #[must_use]
    pub fn not_run() -> Self {
        Self {
            state: ExecutionState::NotRun,
            error: None,
            rows: None,
        }
    }

    /// Successful run with rows
    #[must_use]
    pub fn succeeded(rows: ResultSet) -> Self {
        Self {
            state: ExecutionState::Succeeded,
            error: None,
            rows: Some(rows),
        }
    }

    /// Failed run with the store's message
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            state: ExecutionState::Failed,
            error: Some(error.into()),
            rows: None,
        }
    }
}

/// The per-question workflow record.
///
/// Invariants, maintained by the mutation methods below:
/// - `correction_history.len() == correction_attempt` at all times
/// - `correction_attempt` only ever grows, by one, via `apply_correction`
/// - `final_sql` is set exactly once, by `finish`
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Unique id for logs and diagnostics
    pub id: Uuid,
    /// When the session started
    pub started_at: DateTime<Utc>,
    /// The immutable input question
    pub question: String,
    /// Tables selected by the ranker, best first
    pub relevant_tables: Vec<String>,
    /// Annotated DDL of the relevant tables
    pub schema_context: String,
    /// SQL text currently under consideration
    pub candidate_sql: String,
    /// Number of corrections performed so far
    pub correction_attempt: u32,
    /// Every previously rejected candidate, oldest first
    pub correction_history: Vec<String>,
    /// Validation state of the current candidate
    pub validation: ValidationOutcome,
    /// Execution state of the current candidate
    pub execution: ExecutionOutcome,
    /// Set exactly once when the workflow terminates
    pub final_sql: Option<String>,
}

impl Session {
    /// Create a fresh session for one question
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            question: question.into(),
            relevant_tables: Vec::new(),
            schema_context: String::new(),
            candidate_sql: String::new(),
            correction_attempt: 0,
            correction_history: Vec::new(),
            validation: ValidationOutcome::unvalidated(),
            execution: ExecutionOutcome::not_run(),
            final_sql: None,
        }
    }

    /// Record the ranker's output (set once, at the start)
    pub fn link_schema(&mut self, tables: Vec<String>, context: String) {
        self.relevant_tables = tables;
        self.schema_context = context;
    }

    /// Record the generator's first candidate
    pub fn set_candidate(&mut self, sql: impl Into<String>) {
        self.candidate_sql = sql.into();
        self.validation = ValidationOutcome::unvalidated();
        self.execution = ExecutionOutcome::not_run();
    }

    /// Record a validation pass over the current candidate
    pub fn record_validation(&mut self, outcome: ValidationOutcome) {
        self.validation = outcome;
    }

    /// Record an execution pass over the current candidate
    pub fn record_execution(&mut self, outcome: ExecutionOutcome) {
        self.execution = outcome;
    }

    /// Replace the rejected candidate with a corrected one.
    ///
    /// Appends the rejected SQL to the history, bumps the attempt counter and
    /// clears validation/execution state so the next cycle starts clean.
    pub fn apply_correction(&mut self, corrected_sql: impl Into<String>) {
        let rejected = std::mem::replace(&mut self.candidate_sql, corrected_sql.into());
        self.correction_history.push(rejected);
        self.correction_attempt += 1;
        self.validation = ValidationOutcome::unvalidated();
        self.execution = ExecutionOutcome::not_run();
    }

    /// Mark the session terminal, freezing the final SQL
    pub fn finish(&mut self) {
        if self.final_sql.is_none() {
            self.final_sql = Some(self.candidate_sql.clone());
        }
    }

    /// Whether the run ended with rows
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.execution.state == ExecutionState::Succeeded
    }

    /// Consume the session into the caller-facing outcome
    #[must_use]
    pub fn into_outcome(mut self) -> SessionOutcome {
        self.finish();
        let succeeded = self.succeeded();
        SessionOutcome {
            final_sql: self.final_sql.unwrap_or_default(),
            succeeded,
            rows: self.execution.rows,
            error: self.execution.error,
            correction_attempts: self.correction_attempt,
            correction_history: self.correction_history,
        }
    }
}

/// Terminal outcome of one session, for any caller
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    /// The SQL the workflow settled on
    pub final_sql: String,
    /// Whether execution returned rows
    pub succeeded: bool,
    /// Rows when successful
    pub rows: Option<ResultSet>,
    /// The last failure message when unsuccessful
    pub error: Option<String>,
    /// Corrections spent
    pub correction_attempts: u32,
    /// Every rejected candidate, oldest first
    pub correction_history: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_clean() {
        let session = Session::new("How many customers?");
        assert_eq!(session.correction_attempt, 0);
        assert!(session.correction_history.is_empty());
        assert_eq!(session.validation.state, ValidationState::Unvalidated);
        assert_eq!(session.execution.state, ExecutionState::NotRun);
        assert!(session.final_sql.is_none());
    }

    #[test]
    fn test_apply_correction_bookkeeping() {
        let mut session = Session::new("q");
        session.set_candidate("SELECT * FROM custmers");
        session.record_validation(ValidationOutcome {
            state: ValidationState::SemanticInvalid,
            errors: vec!["table does not exist in the database".to_string()],
        });

        session.apply_correction("SELECT * FROM customers");

        assert_eq!(session.candidate_sql, "SELECT * FROM customers");
        assert_eq!(session.correction_attempt, 1);
        assert_eq!(
            session.correction_history,
            vec!["SELECT * FROM custmers".to_string()]
        );
        assert_eq!(session.validation.state, ValidationState::Unvalidated);
        assert!(session.validation.errors.is_empty());
        assert_eq!(session.execution.state, ExecutionState::NotRun);
    }

    #[test]
    fn test_history_length_tracks_attempts() {
        let mut session = Session::new("q");
        session.set_candidate("a");
        for i in 1..=3 {
            session.apply_correction(format!("candidate {i}"));
            assert_eq!(session.correction_history.len() as u32, session.correction_attempt);
        }
    }

    #[test]
    fn test_finish_sets_final_sql_once() {
        let mut session = Session::new("q");
        session.set_candidate("SELECT 1");
        session.finish();
        session.set_candidate("SELECT 2");
        session.finish();
        assert_eq!(session.final_sql.as_deref(), Some("SELECT 1"));
    }

    #[test]
    fn test_outcome_carries_history() {
        let mut session = Session::new("q");
        session.set_candidate("bad");
        session.apply_correction("good");
        session.record_execution(ExecutionOutcome::failed("no such table: good"));

        let outcome = session.into_outcome();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.final_sql, "good");
        assert_eq!(outcome.correction_attempts, 1);
        assert_eq!(outcome.correction_history, vec!["bad".to_string()]);
        assert_eq!(outcome.error.as_deref(), Some("no such table: good"));
    }
}
