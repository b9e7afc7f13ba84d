//! Two-phase query validation
//!
//! Syntax first: parse the candidate, require exactly one read statement, and
//! scan the raw text for mutating keywords. The keyword scan runs even when
//! the parsed statement type looks safe; it is a fast-reject layer on top of
//! the parser, not the sole safety mechanism.
//!
//! Semantics second, only when syntax passed: ask the store for a query plan
//! without running anything, and fold the store's answer into coarse
//! categories the corrector can act on.

use crate::error::Result;
use crate::session::{ValidationOutcome, ValidationState};
use regex::Regex;
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use sqlsage_schema::SchemaStore;
use std::sync::LazyLock;
use tracing::{debug, instrument};

/// Keywords that mutate state; any whole-word occurrence anywhere in the
/// text rejects the candidate, including inside strings and comments.
const DENYLIST: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE",
];

static DENYLIST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(insert|update|delete|drop|alter|create|truncate)\b")
        .expect("DENYLIST_REGEX is a compile-time constant")
});

/// Find the first denylisted keyword in the text, canonical uppercase.
fn denylisted_keyword(sql: &str) -> Option<&'static str> {
    let hit = DENYLIST_REGEX.find(sql)?;
    let upper = hit.as_str().to_uppercase();
    DENYLIST.iter().find(|kw| **kw == upper).copied()
}

/// The validator's answer for one candidate
#[derive(Debug, Clone)]
pub struct Verdict {
    /// Validation state plus cumulative errors (syntax first, then semantic)
    pub outcome: ValidationOutcome,
    /// The keyword that tripped the denylist, when one did
    pub blocked_keyword: Option<&'static str>,
}

impl Verdict {
    /// Whether the candidate passed both phases
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.outcome.state == ValidationState::Valid
    }
}

/// Validates candidates against grammar, safety policy, and the live schema.
pub struct QueryValidator {
    store: SchemaStore,
}

impl QueryValidator {
    /// Create a validator over the given store
    #[must_use]
    pub fn new(store: SchemaStore) -> Self {
        Self { store }
    }

    /// Syntax phase: pure, no store round-trip.
    ///
    /// Returns the error list (empty = pass) and the denylist hit, if any.
    fn check_syntax(sql: &str) -> (Vec<String>, Option<&'static str>) {
        let mut errors = Vec::new();

        if sql.trim().is_empty() {
            errors.push("empty SQL query".to_string());
            return (errors, None);
        }

        match Parser::parse_sql(&SQLiteDialect {}, sql) {
            Err(e) => errors.push(format!("syntax error: {e}")),
            Ok(statements) => match statements.as_slice() {
                [] => errors.push("empty SQL query".to_string()),
                [Statement::Query(_)] => {}
                [_] => errors.push("only SELECT queries are allowed".to_string()),
                _ => errors.push("only a single statement is allowed".to_string()),
            },
        }

        let blocked = denylisted_keyword(sql);
        if let Some(keyword) = blocked {
            errors.push(format!(
                "dangerous keyword '{keyword}' found; only SELECT queries are allowed"
            ));
        }

        (errors, blocked)
    }

    /// Fold a store-reported plan error into a coarse category.
    fn classify_plan_error(message: &str) -> String {
        let lower = message.to_lowercase();

        if lower.contains("no such table") {
            "table does not exist in the database".to_string()
        } else if lower.contains("no such column") {
            "column does not exist in the referenced table".to_string()
        } else if lower.contains("ambiguous column") {
            "ambiguous column reference; qualify it with a table alias".to_string()
        } else {
            format!("semantic error: {message}")
        }
    }

    /// Validate one candidate.
    ///
    /// The semantic phase is skipped entirely when the syntax phase fails.
    ///
    /// # Errors
    /// Only infrastructure failures of the store connection are returned as
    /// `Err`; a store-rejected plan is a `SemanticInvalid` verdict, not an
    /// error.
    #[instrument(skip(self, sql))]
    pub async fn validate(&self, sql: &str) -> Result<Verdict> {
        let (syntax_errors, blocked_keyword) = Self::check_syntax(sql);

        if !syntax_errors.is_empty() {
            debug!(errors = syntax_errors.len(), "Syntax validation failed");
            return Ok(Verdict {
                outcome: ValidationOutcome {
                    state: ValidationState::SyntaxInvalid,
                    errors: syntax_errors,
                },
                blocked_keyword,
            });
        }

        match self.store.plan(sql).await {
            Ok(()) => Ok(Verdict {
                outcome: ValidationOutcome {
                    state: ValidationState::Valid,
                    errors: Vec::new(),
                },
                blocked_keyword: None,
            }),
            Err(e) if e.is_sql() => {
                let classified = Self::classify_plan_error(&e.to_string());
                debug!(error = %classified, "Plan check rejected candidate");
                Ok(Verdict {
                    outcome: ValidationOutcome {
                        state: ValidationState::SemanticInvalid,
                        errors: vec![classified],
                    },
                    blocked_keyword: None,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_validator() -> QueryValidator {
        let store = SchemaStore::in_memory().await.unwrap();
        sqlx::query(
            "CREATE TABLE customers (customer_id INTEGER PRIMARY KEY, first_name TEXT, city TEXT)",
        )
        .execute(store.pool())
        .await
        .unwrap();
        sqlx::query("CREATE TABLE orders (order_id INTEGER PRIMARY KEY, customer_id INTEGER)")
            .execute(store.pool())
            .await
            .unwrap();
        QueryValidator::new(store)
    }

    #[tokio::test]
    async fn test_valid_select_passes_clean() {
        let validator = seeded_validator().await;
        let verdict = validator.validate("SELECT * FROM customers").await.unwrap();
        assert!(verdict.is_valid());
        assert!(verdict.outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_denylist_blocks_every_keyword() {
        let validator = seeded_validator().await;
        let candidates = [
            ("INSERT INTO customers VALUES (1)", "INSERT"),
            ("UPDATE customers SET city = 'x'", "UPDATE"),
            ("DELETE FROM customers", "DELETE"),
            ("DROP TABLE customers", "DROP"),
            ("ALTER TABLE customers ADD COLUMN x TEXT", "ALTER"),
            ("CREATE TABLE x (id INTEGER)", "CREATE"),
            ("TRUNCATE TABLE customers", "TRUNCATE"),
        ];

        for (sql, keyword) in candidates {
            let verdict = validator.validate(sql).await.unwrap();
            assert_eq!(verdict.outcome.state, ValidationState::SyntaxInvalid, "{sql}");
            assert_eq!(verdict.blocked_keyword, Some(keyword), "{sql}");
            assert!(verdict
                .outcome
                .errors
                .iter()
                .any(|e| e.contains(keyword)));
        }
    }

    #[tokio::test]
    async fn test_denylist_is_case_insensitive_and_positional() {
        let validator = seeded_validator().await;
        let verdict = validator
            .validate("SELECT * FROM customers -- drop table customers")
            .await
            .unwrap();
        assert_eq!(verdict.outcome.state, ValidationState::SyntaxInvalid);
        assert_eq!(verdict.blocked_keyword, Some("DROP"));
    }

    #[tokio::test]
    async fn test_denylist_matches_whole_words_only() {
        let validator = seeded_validator().await;
        // "created_at"-style identifiers must not trip the CREATE keyword
        sqlx::query("CREATE TABLE events (id INTEGER, created_at TEXT)")
            .execute(validator.store.pool())
            .await
            .unwrap();
        let verdict = validator
            .validate("SELECT created_at FROM events")
            .await
            .unwrap();
        assert!(verdict.is_valid());
    }

    #[tokio::test]
    async fn test_multiple_statements_rejected() {
        let validator = seeded_validator().await;
        let verdict = validator
            .validate("SELECT 1; SELECT 2")
            .await
            .unwrap();
        assert_eq!(verdict.outcome.state, ValidationState::SyntaxInvalid);
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let validator = seeded_validator().await;
        let verdict = validator.validate("   ").await.unwrap();
        assert_eq!(verdict.outcome.state, ValidationState::SyntaxInvalid);
    }

    #[tokio::test]
    async fn test_semantic_missing_table() {
        let validator = seeded_validator().await;
        let verdict = validator.validate("SELECT * FROM custmers").await.unwrap();
        assert_eq!(verdict.outcome.state, ValidationState::SemanticInvalid);
        assert_eq!(
            verdict.outcome.errors,
            vec!["table does not exist in the database".to_string()]
        );
    }

    #[tokio::test]
    async fn test_semantic_missing_column() {
        let validator = seeded_validator().await;
        let verdict = validator
            .validate("SELECT nickname FROM customers")
            .await
            .unwrap();
        assert_eq!(verdict.outcome.state, ValidationState::SemanticInvalid);
        assert_eq!(
            verdict.outcome.errors,
            vec!["column does not exist in the referenced table".to_string()]
        );
    }

    #[tokio::test]
    async fn test_semantic_ambiguous_column() {
        let validator = seeded_validator().await;
        let verdict = validator
            .validate(
                "SELECT customer_id FROM customers JOIN orders ON \
                 customers.customer_id = orders.customer_id",
            )
            .await
            .unwrap();
        assert_eq!(verdict.outcome.state, ValidationState::SemanticInvalid);
        assert!(verdict.outcome.errors[0].contains("ambiguous column reference"));
    }

    #[tokio::test]
    async fn test_trailing_semicolon_is_idempotent() {
        let validator = seeded_validator().await;
        let bare = validator.validate("SELECT * FROM customers").await.unwrap();
        let terminated = validator
            .validate("SELECT * FROM customers;")
            .await
            .unwrap();
        assert_eq!(bare.outcome.state, terminated.outcome.state);
    }

    #[test]
    fn test_classify_plan_error_fallback() {
        let msg = QueryValidator::classify_plan_error("misuse of aggregate: count()");
        assert!(msg.starts_with("semantic error:"));
        assert!(msg.contains("misuse of aggregate"));
    }
}
