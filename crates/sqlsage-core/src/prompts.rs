//! Prompt construction for SQL generation and correction

use crate::corrector::Failure;

/// System instructions shared by generation and correction requests.
///
/// The disambiguation rules matter: annotated schemas carry descriptions and
/// sample values precisely so the model can tell near-identical column names
/// apart.
pub const SYSTEM_PROMPT: &str = "\
You are an expert SQL query generator. You convert natural-language questions \
into SQL queries for the database schema you are given.

RULES:
1. Generate ONLY SELECT queries. Never INSERT, UPDATE, DELETE, DROP, ALTER, CREATE or TRUNCATE.
2. Use only the tables and columns present in the schema.
3. Return only the SQL query, with no explanation and no markdown formatting.
4. Use JOIN, WHERE, GROUP BY and ORDER BY as the question requires.
5. Use table aliases when joining for readability.

COLUMN DISAMBIGUATION:
- When several columns have similar names, read their descriptions carefully.
- The sample values in the schema show each column's data format; use them to \
pick the right column.
- For a column named like a SQL function, use the column itself unless the \
question explicitly asks for a calculation.";

/// User prompt for the first generation attempt
#[must_use]
pub fn generation_prompt(question: &str, schema: &str) -> String {
    format!(
        "DATABASE SCHEMA:\n{schema}\n\nQUESTION TO CONVERT:\nQuestion: {question}\nSQL:"
    )
}

/// User prompt for a repair attempt
#[must_use]
pub fn correction_prompt(question: &str, schema: &str, failing_sql: &str, failure: &Failure) -> String {
    format!(
        "DATABASE SCHEMA:\n{schema}\n\n\
         TASK: Fix the following SQL query that has an error.\n\n\
         ORIGINAL QUESTION: {question}\n\n\
         INCORRECT SQL:\n{failing_sql}\n\n\
         ERROR TYPE: {kind}\n\
         ERROR MESSAGE: {message}\n\n\
         INSTRUCTIONS:\n\
         1. Identify the specific issue in the SQL query.\n\
         2. Generate a corrected version.\n\
         3. Ensure the corrected query still answers the original question.\n\
         4. Return ONLY the corrected SQL query.\n\n\
         CORRECTED SQL:",
        kind = failure.kind.label(),
        message = failure.message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corrector::{Failure, FailureKind};

    #[test]
    fn test_generation_prompt_contains_parts() {
        let prompt = generation_prompt("How many orders?", "CREATE TABLE orders (...)");
        assert!(prompt.contains("How many orders?"));
        assert!(prompt.contains("CREATE TABLE orders"));
        assert!(prompt.ends_with("SQL:"));
    }

    #[test]
    fn test_correction_prompt_names_failure() {
        let failure = Failure {
            kind: FailureKind::SemanticInvalid,
            message: "table does not exist in the database".to_string(),
        };
        let prompt = correction_prompt("q", "schema", "SELECT * FROM custmers", &failure);
        assert!(prompt.contains("SELECT * FROM custmers"));
        assert!(prompt.contains("semantic error"));
        assert!(prompt.contains("table does not exist"));
    }
}
