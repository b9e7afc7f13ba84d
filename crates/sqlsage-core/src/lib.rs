//! Sqlsage Core — Question-to-SQL Workflow Engine
//!
//! This crate turns one natural-language question into an executed, validated
//! read-only SQL query:
//! - Ranker: TF-IDF shortlist of the tables worth describing to the generator
//! - Generator: first SQL candidate from the LLM provider
//! - Validator: syntax + denylist check, then a plan check against the store
//! - Corrector: bounded LLM-driven repair of rejected candidates
//! - Orchestrator: the state machine wiring the above together
//!
//! # Workflow
//!
//! ```text
//! question ──► link schema ──► generate ──► validate ──► execute ──► outcome
//!                                 ▲             │            │
//!                                 └── correct ◄─┴────────────┘
//!                                     (shared attempt budget)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod corrector;
pub mod error;
pub mod executor;
pub mod generator;
pub mod orchestrator;
pub mod prompts;
pub mod ranker;
pub mod session;
pub mod validator;

pub use corrector::{Failure, FailureKind, SelfCorrector};
pub use error::{Error, Result};
pub use executor::QueryExecutor;
pub use generator::{clean_sql_output, SqlGenerator};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use ranker::{TableRanker, TableScore};
pub use session::{
    ExecutionOutcome, ExecutionState, Session, SessionOutcome, ValidationOutcome, ValidationState,
};
pub use validator::{QueryValidator, Verdict};
