//! Spanner DDL generation from the target schema.

use crate::schema::{ForeignKey, IndexKey, SecondaryIndex, TargetTable};
use crate::types::TargetType;
use std::collections::BTreeMap;

/// Trait for generating DDL strings.
pub trait ToDdl {
    /// Convert a target type to a DDL type string.
    fn to_ddl(&self, ty: &TargetType) -> String;

    /// Generate a complete CREATE TABLE statement.
    fn to_create_table(&self, table: &TargetTable) -> String;
}

/// GoogleSQL reserved keywords; identifiers spelled like one are always
/// quoted.
const RESERVED: &[&str] = &[
    "ALL", "AND", "ANY", "ARRAY", "AS", "ASC", "ASSERT_ROWS_MODIFIED", "AT", "BETWEEN", "BY",
    "CASE", "CAST", "COLLATE", "CONTAINS", "CREATE", "CROSS", "CUBE", "CURRENT", "DEFAULT",
    "DEFINE", "DESC", "DISTINCT", "ELSE", "END", "ENUM", "ESCAPE", "EXCEPT", "EXCLUDE", "EXISTS",
    "EXTRACT", "FALSE", "FETCH", "FOLLOWING", "FOR", "FROM", "FULL", "GROUP", "GROUPING", "GROUPS",
    "HASH", "HAVING", "IF", "IGNORE", "IN", "INNER", "INTERSECT", "INTERVAL", "INTO", "IS", "JOIN",
    "LATERAL", "LEFT", "LIKE", "LIMIT", "LOOKUP", "MERGE", "NATURAL", "NEW", "NO", "NOT", "NULL",
    "NULLS", "OF", "ON", "OR", "ORDER", "OUTER", "OVER", "PARTITION", "PRECEDING", "PROTO",
    "RANGE", "RECURSIVE", "RESPECT", "RIGHT", "ROLLUP", "ROWS", "SELECT", "SET", "SOME", "STRUCT",
    "TABLESAMPLE", "THEN", "TO", "TREAT", "TRUE", "UNBOUNDED", "UNION", "UNNEST", "USING", "WHEN",
    "WHERE", "WINDOW", "WITH", "WITHIN",
];

/// Whether `name` collides with a GoogleSQL reserved keyword.
fn is_reserved(name: &str) -> bool {
    RESERVED.iter().any(|k| k.eq_ignore_ascii_case(name))
}

/// Spanner DDL generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpannerDdl {
    /// Wrap every identifier in backticks; reserved keywords are quoted
    /// regardless
    pub quote_ids: bool,
}

impl SpannerDdl {
    pub fn new(quote_ids: bool) -> Self {
        Self { quote_ids }
    }

    fn id(&self, name: &str) -> String {
        if self.quote_ids || is_reserved(name) {
            format!("`{name}`")
        } else {
            name.to_string()
        }
    }

    fn keys(&self, keys: &[IndexKey]) -> String {
        keys.iter()
            .map(|k| {
                if k.desc {
                    format!("{} DESC", self.id(&k.column))
                } else {
                    self.id(&k.column)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn ids(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|n| self.id(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `CREATE [UNIQUE] INDEX` for a secondary index of `table`.
    pub fn to_create_index(&self, table: &str, index: &SecondaryIndex) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            self.id(&index.name),
            self.id(table),
            self.keys(&index.keys)
        )
    }

    /// `ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY` for `table`.
    pub fn to_foreign_key(&self, table: &str, fk: &ForeignKey) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.id(table),
            self.id(&fk.name),
            self.ids(&fk.columns),
            self.id(&fk.refer_table),
            self.ids(&fk.refer_columns)
        )
    }

    /// All statements for a schema: tables first, then indexes, then foreign keys.
    pub fn schema_statements(&self, schema: &BTreeMap<String, TargetTable>) -> Vec<String> {
        let mut statements: Vec<String> =
            schema.values().map(|t| self.to_create_table(t)).collect();
        for table in schema.values() {
            for index in &table.indexes {
                statements.push(self.to_create_index(&table.name, index));
            }
        }
        for table in schema.values() {
            for fk in &table.foreign_keys {
                statements.push(self.to_foreign_key(&table.name, fk));
            }
        }
        statements
    }
}

impl ToDdl for SpannerDdl {
    fn to_ddl(&self, ty: &TargetType) -> String {
        ty.to_string()
    }

    fn to_create_table(&self, table: &TargetTable) -> String {
        let columns: Vec<String> = table
            .col_names
            .iter()
            .filter_map(|name| table.col_defs.get(name))
            .map(|col| {
                let not_null = if col.not_null { " NOT NULL" } else { "" };
                format!("  {} {}{not_null}", self.id(&col.name), self.to_ddl(&col.ty))
            })
            .collect();
        format!(
            "CREATE TABLE {} (\n{}\n) PRIMARY KEY ({})",
            self.id(&table.name),
            columns.join(",\n"),
            self.keys(&table.primary_keys)
        )
    }
}
