//! SchemaProfile — annotated DDL and ranking corpus
//!
//! Built once per schema from the store, then handed to the workflow as an
//! explicit dependency. Rebuilding after a schema change is the caller's
//! responsibility.

use crate::error::Result;
use crate::store::SchemaStore;
use crate::types::TableInfo;
use tracing::debug;

/// One table's profile: structure, annotated DDL, and its corpus document.
#[derive(Debug, Clone)]
pub struct TableProfile {
    /// Structured table description
    pub info: TableInfo,
    /// Annotated `CREATE TABLE` text shown to the generator
    pub ddl: String,
    /// Bag-of-words document scored by the relevance ranker
    pub document: String,
}

impl TableProfile {
    /// Table name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }
}

/// Profile of a whole schema, tables in store enumeration order.
#[derive(Debug, Clone)]
pub struct SchemaProfile {
    tables: Vec<TableProfile>,
}

impl SchemaProfile {
    /// Build the profile by introspecting every table.
    ///
    /// `sample_limit` bounds how many distinct values are sampled per column
    /// for the DDL annotations.
    pub async fn load(store: &SchemaStore, sample_limit: usize) -> Result<Self> {
        let mut tables = Vec::new();

        for name in store.list_tables().await? {
            let info = store.table_info(&name).await?;

            let mut samples = Vec::with_capacity(info.columns.len());
            for column in &info.columns {
                let values = store
                    .sample_values(&name, &column.name, sample_limit)
                    .await
                    .unwrap_or_default();
                samples.push(values);
            }

            let ddl = render_table_ddl(&info, &samples);
            let document = build_document(&info);
            debug!(table = %name, "Profiled table");

            tables.push(TableProfile {
                info,
                ddl,
                document,
            });
        }

        Ok(Self { tables })
    }

    /// Tables in enumeration order
    #[must_use]
    pub fn tables(&self) -> &[TableProfile] {
        &self.tables
    }

    /// Corpus documents, aligned with `tables()`
    #[must_use]
    pub fn documents(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.document.as_str()).collect()
    }

    /// Annotated DDL for a table, if present
    #[must_use]
    pub fn ddl_for(&self, table: &str) -> Option<&str> {
        self.tables
            .iter()
            .find(|t| t.name() == table)
            .map(|t| t.ddl.as_str())
    }

    /// Full annotated schema, every table's DDL joined
    #[must_use]
    pub fn render(&self) -> String {
        self.tables
            .iter()
            .map(|t| t.ddl.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Number of tables
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the schema has no tables
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Render one table as annotated DDL.
///
/// Each column line carries a description comment and up to a handful of
/// sampled values so the generator can disambiguate similarly-named columns.
fn render_table_ddl(info: &TableInfo, samples: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(info.columns.len() + info.foreign_keys.len());

    for (idx, column) in info.columns.iter().enumerate() {
        let mut def = format!("    {} {}", column.name, column.data_type);
        if column.primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if column.not_null && !column.primary_key {
            def.push_str(" NOT NULL");
        }

        let description = describe_column(info, &column.name);
        let values = samples.get(idx).map(Vec::as_slice).unwrap_or(&[]);
        if values.is_empty() {
            def.push_str(&format!("  -- {description}"));
        } else {
            let rendered = values
                .iter()
                .take(5)
                .map(|v| format!("\"{v}\""))
                .collect::<Vec<_>>()
                .join(", ");
            def.push_str(&format!("  -- {description} (e.g., {rendered})"));
        }

        lines.push(def);
    }

    for fk in &info.foreign_keys {
        lines.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column, fk.referenced_table, fk.referenced_column
        ));
    }

    format!("CREATE TABLE {} (\n{}\n);", info.name, lines.join(",\n"))
}

/// Bag-of-words document for one table: name, column names, descriptions.
fn build_document(info: &TableInfo) -> String {
    let mut parts = vec![info.name.replace('_', " ")];

    for column in &info.columns {
        parts.push(column.name.replace('_', " "));
        parts.push(describe_column(info, &column.name));
    }

    parts.join(" ")
}

/// Heuristic, deterministic column description.
///
/// Declared foreign keys take priority; the rest is name-pattern guessing
/// good enough to steer the generator and the ranker.
fn describe_column(info: &TableInfo, column: &str) -> String {
    let lower = column.to_lowercase();

    if let Some(fk) = info.foreign_keys.iter().find(|fk| fk.column == column) {
        return format!(
            "References {}.{}",
            fk.referenced_table, fk.referenced_column
        );
    }

    if lower == "id" || lower.ends_with("_id") {
        if lower == "id" || lower.trim_end_matches("_id") == info.name.trim_end_matches('s') {
            return format!("Unique identifier for {}", info.name);
        }
        let referenced = lower.trim_end_matches("_id").replace('_', " ");
        return format!("Foreign key referencing {referenced}");
    }

    if lower.contains("name") {
        return title_case(column);
    }

    if lower.contains("date") {
        let subject = lower.replace('_', " ").replace("date", "");
        return format!("Date of {}", subject.trim());
    }

    if lower.contains("amount") || lower.contains("price") {
        return format!("Monetary value for {}", lower.replace('_', " "));
    }

    if lower.contains("quantity") || lower.contains("count") {
        let subject = lower
            .replace('_', " ")
            .replace("quantity", "")
            .replace("count", "");
        return format!("Number of {}", subject.trim());
    }

    title_case(column)
}

fn title_case(s: &str) -> String {
    s.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnInfo, ForeignKey};

    fn column(name: &str, data_type: &str, pk: bool) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            not_null: pk,
            primary_key: pk,
        }
    }

    fn orders_info() -> TableInfo {
        TableInfo {
            name: "orders".to_string(),
            columns: vec![
                column("order_id", "INTEGER", true),
                column("customer_id", "INTEGER", false),
                column("order_date", "DATE", false),
                column("total_amount", "REAL", false),
            ],
            foreign_keys: vec![ForeignKey {
                column: "customer_id".to_string(),
                referenced_table: "customers".to_string(),
                referenced_column: "customer_id".to_string(),
            }],
        }
    }

    #[test]
    fn test_describe_column_foreign_key_priority() {
        let info = orders_info();
        assert_eq!(
            describe_column(&info, "customer_id"),
            "References customers.customer_id"
        );
    }

    #[test]
    fn test_describe_column_primary_id() {
        let info = orders_info();
        assert_eq!(
            describe_column(&info, "order_id"),
            "Unique identifier for orders"
        );
    }

    #[test]
    fn test_describe_column_date_and_amount() {
        let info = orders_info();
        assert_eq!(describe_column(&info, "order_date"), "Date of order");
        assert_eq!(
            describe_column(&info, "total_amount"),
            "Monetary value for total amount"
        );
    }

    #[test]
    fn test_render_ddl_contains_annotations() {
        let info = orders_info();
        let samples = vec![
            vec!["1".to_string()],
            vec![],
            vec!["2024-01-05".to_string()],
            vec![],
        ];
        let ddl = render_table_ddl(&info, &samples);

        assert!(ddl.starts_with("CREATE TABLE orders ("));
        assert!(ddl.contains("order_id INTEGER PRIMARY KEY"));
        assert!(ddl.contains("(e.g., \"2024-01-05\")"));
        assert!(ddl.contains("FOREIGN KEY (customer_id) REFERENCES customers(customer_id)"));
    }

    #[test]
    fn test_document_splits_underscores() {
        let info = orders_info();
        let doc = build_document(&info);
        assert!(doc.contains("order date"));
        assert!(doc.contains("total amount"));
    }

    #[tokio::test]
    async fn test_profile_load_from_store() {
        let store = SchemaStore::in_memory().await.unwrap();
        sqlx::query("CREATE TABLE products (product_id INTEGER PRIMARY KEY, product_name TEXT)")
            .execute(store.pool())
            .await
            .unwrap();

        let profile = SchemaProfile::load(&store, 3).await.unwrap();
        assert_eq!(profile.len(), 1);
        assert_eq!(profile.tables()[0].name(), "products");
        assert!(profile.ddl_for("products").unwrap().contains("product_name"));
        assert!(profile.ddl_for("missing").is_none());
    }
}
