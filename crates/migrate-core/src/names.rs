//! Identifier Mapper: bidirectional source/target name translation.
//!
//! Source identifiers are legalised into Spanner identifiers
//! (`[A-Za-z][A-Za-z0-9_]*`, at most [`MAX_IDENTIFIER_LEN`] characters) and
//! memoised in both directions. Spanner names are case-insensitive, so every
//! collision check and every reverse-map key uses the lower-cased target name.
//!
//! Tables, indexes and constraints share one namespace; columns have a
//! namespace per table.

use crate::error::{ConversionError, Result};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Longest identifier Spanner accepts.
pub const MAX_IDENTIFIER_LEN: usize = 128;

#[derive(Debug, Clone, Default)]
struct NameEntry {
    /// The mapped name on the other side
    name: String,
    /// Column map for this table, keyed the same way as the outer map
    cols: HashMap<String, String>,
}

/// Memoised, collision-free source/target identifier mapping.
///
/// Forward keys are exact source names. Reverse keys are lower-cased target
/// names. Entries are always inserted in pairs.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    to_target: HashMap<String, NameEntry>,
    to_source: HashMap<String, NameEntry>,
    /// Lower-cased index and constraint names sharing the table namespace
    reserved: HashSet<String>,
}

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve (creating if needed) the target name for a source table.
    pub fn table(&mut self, src: &str) -> Result<String> {
        if src.is_empty() {
            return Err(ConversionError::EmptyIdentifier);
        }
        if let Some(entry) = self.to_target.get(src) {
            return Ok(entry.name.clone());
        }

        let base = fix_name(src);
        let taken = |n: &str| {
            let key = n.to_lowercase();
            self.to_source.contains_key(&key) || self.reserved.contains(&key)
        };
        let target = first_free(&base, self.to_source.len() + self.reserved.len(), taken)?;
        if target != src {
            debug!("Mapped table name '{src}' to '{target}'");
        }

        self.to_target.insert(
            src.to_string(),
            NameEntry {
                name: target.clone(),
                cols: HashMap::new(),
            },
        );
        self.to_source.insert(
            target.to_lowercase(),
            NameEntry {
                name: src.to_string(),
                cols: HashMap::new(),
            },
        );
        Ok(target)
    }

    /// Look up the target name of a table without creating a mapping.
    pub fn get_table(&self, src: &str) -> Option<&str> {
        self.to_target.get(src).map(|e| e.name.as_str())
    }

    /// Resolve the target name for a column of a source table.
    ///
    /// With `must_exist`, an unmapped column is a `ColumnNotFound` error
    /// instead of a new mapping. Every lookup verifies the reverse map.
    pub fn column(&mut self, src_table: &str, src_col: &str, must_exist: bool) -> Result<String> {
        if src_col.is_empty() {
            return Err(ConversionError::EmptyIdentifier);
        }
        let sp_table = if must_exist {
            self.get_table(src_table)
                .map(str::to_string)
                .ok_or_else(|| ConversionError::TableNotFound(src_table.to_string()))?
        } else {
            self.table(src_table)?
        };
        let reverse_key = sp_table.to_lowercase();

        let existing = self
            .to_target
            .get(src_table)
            .and_then(|e| e.cols.get(src_col))
            .cloned();
        if let Some(sp_col) = existing {
            self.check_column(&reverse_key, &sp_col, src_col)?;
            return Ok(sp_col);
        }
        if must_exist {
            return Err(ConversionError::ColumnNotFound {
                table: src_table.to_string(),
                column: src_col.to_string(),
            });
        }

        let reverse = self
            .to_source
            .get_mut(&reverse_key)
            .ok_or_else(|| ConversionError::TableNotFound(sp_table.clone()))?;
        let base = fix_name(src_col);
        let count = reverse.cols.len();
        let sp_col = first_free(&base, count, |n| reverse.cols.contains_key(&n.to_lowercase()))?;
        reverse
            .cols
            .insert(sp_col.to_lowercase(), src_col.to_string());

        if let Some(forward) = self.to_target.get_mut(src_table) {
            forward.cols.insert(src_col.to_string(), sp_col.clone());
        }
        if sp_col != src_col {
            debug!("Mapped column name '{src_table}.{src_col}' to '{sp_col}'");
        }
        self.check_column(&reverse_key, &sp_col, src_col)?;
        Ok(sp_col)
    }

    /// Reserve a legal, unused name in the table namespace (indexes, foreign keys).
    pub fn reserve(&mut self, src: &str) -> Result<String> {
        if src.is_empty() {
            return Err(ConversionError::EmptyIdentifier);
        }
        let base = fix_name(src);
        let taken = |n: &str| {
            let key = n.to_lowercase();
            self.to_source.contains_key(&key) || self.reserved.contains(&key)
        };
        let name = first_free(&base, self.to_source.len() + self.reserved.len(), taken)?;
        self.reserved.insert(name.to_lowercase());
        Ok(name)
    }

    /// Source table name for a target table.
    pub fn source_table(&self, target: &str) -> Option<&str> {
        self.to_source
            .get(&target.to_lowercase())
            .map(|e| e.name.as_str())
    }

    /// Source column name for a target column.
    pub fn source_column(&self, target_table: &str, target_col: &str) -> Option<&str> {
        self.to_source
            .get(&target_table.to_lowercase())
            .and_then(|e| e.cols.get(&target_col.to_lowercase()))
            .map(String::as_str)
    }

    /// Number of mapped tables.
    pub fn table_count(&self) -> usize {
        self.to_target.len()
    }

    fn check_column(&self, reverse_key: &str, sp_col: &str, expected: &str) -> Result<()> {
        let found = self
            .to_source
            .get(reverse_key)
            .and_then(|e| e.cols.get(&sp_col.to_lowercase()));
        match found {
            Some(src) if src == expected => Ok(()),
            other => Err(ConversionError::InconsistentNameMap {
                target: sp_col.to_string(),
                expected: expected.to_string(),
                found: other.cloned().unwrap_or_default(),
            }),
        }
    }
}

/// Find an unused name: `base` itself, then `base_<n>` for `n` from `start`.
///
/// At most `start + 2` candidates are tried. With `start` entries in use, one
/// of them is always free, so exhaustion means the caller's count is wrong.
fn first_free(base: &str, start: usize, taken: impl Fn(&str) -> bool) -> Result<String> {
    if !taken(base) {
        return Ok(base.to_string());
    }
    for n in start..start + start + 2 {
        let suffix = format!("_{n}");
        let stem: String = base
            .chars()
            .take(MAX_IDENTIFIER_LEN.saturating_sub(suffix.len()))
            .collect();
        let candidate = format!("{stem}{suffix}");
        if !taken(&candidate) {
            return Ok(candidate);
        }
    }
    Err(ConversionError::NameSpaceExhausted(base.to_string()))
}

/// Legalise an identifier: illegal characters become `_`, a name not starting
/// with a letter gets an `A` prefix, and the result is truncated.
pub fn fix_name(name: &str) -> String {
    let mut fixed: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !fixed.starts_with(|c: char| c.is_ascii_alphabetic()) {
        fixed.insert(0, 'A');
    }
    fixed.chars().take(MAX_IDENTIFIER_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_name() {
        assert_eq!(fix_name("orders"), "orders");
        assert_eq!(fix_name("my-table"), "my_table");
        assert_eq!(fix_name("sales.orders"), "sales_orders");
        assert_eq!(fix_name("1st"), "A1st");
        assert_eq!(fix_name("_hidden"), "A_hidden");
        assert_eq!(fix_name("çafé"), "A_af_");
        assert_eq!(fix_name(&"x".repeat(200)).len(), MAX_IDENTIFIER_LEN);
    }

    #[test]
    fn test_table_idempotent() {
        let mut names = NameMap::new();
        let first = names.table("my-table").unwrap();
        let second = names.table("my-table").unwrap();
        assert_eq!(first, "my_table");
        assert_eq!(first, second);
        assert_eq!(names.source_table("my_table"), Some("my-table"));
        assert_eq!(names.table_count(), 1);
    }

    #[test]
    fn test_table_collisions_get_distinct_names() {
        let mut names = NameMap::new();
        let a = names.table("a-b").unwrap();
        let b = names.table("a.b").unwrap();
        let c = names.table("a b").unwrap();
        let d = names.table("a_b").unwrap();
        assert_eq!(a, "a_b");
        assert_eq!(b, "a_b_1");
        assert_eq!(c, "a_b_2");
        assert_eq!(d, "a_b_3");
        for (src, tgt) in [("a-b", &a), ("a.b", &b), ("a b", &c), ("a_b", &d)] {
            assert_eq!(names.source_table(tgt), Some(src));
            assert_eq!(names.table(src).unwrap(), *tgt);
        }
    }

    #[test]
    fn test_collision_is_case_insensitive() {
        let mut names = NameMap::new();
        assert_eq!(names.table("Users").unwrap(), "Users");
        assert_eq!(names.table("users").unwrap(), "users_1");
        assert_eq!(names.source_table("USERS"), Some("Users"));
    }

    #[test]
    fn test_suffix_skips_taken_names() {
        let mut names = NameMap::new();
        names.table("t_1").unwrap();
        names.table("t").unwrap();
        // "t" is taken ignoring case; "T_2" is the first suffix tried (two entries exist)
        assert_eq!(names.table("T").unwrap(), "T_2");
    }

    #[test]
    fn test_column_mapping() {
        let mut names = NameMap::new();
        assert_eq!(names.column("t", "id", false).unwrap(), "id");
        assert_eq!(names.column("t", "first name", false).unwrap(), "first_name");
        assert_eq!(names.column("t", "first-name", false).unwrap(), "first_name_2");
        assert_eq!(names.column("t", "first name", true).unwrap(), "first_name");
        assert_eq!(names.source_column("t", "FIRST_NAME_2"), Some("first-name"));
        // other tables have their own column namespace
        assert_eq!(names.column("u", "first-name", false).unwrap(), "first_name");
    }

    #[test]
    fn test_column_must_exist() {
        let mut names = NameMap::new();
        names.column("t", "id", false).unwrap();
        assert!(matches!(
            names.column("t", "missing", true),
            Err(ConversionError::ColumnNotFound { .. })
        ));
        assert!(matches!(
            names.column("nope", "id", true),
            Err(ConversionError::TableNotFound(_))
        ));
        assert!(matches!(
            names.column("t", "", false),
            Err(ConversionError::EmptyIdentifier)
        ));
    }

    #[test]
    fn test_reserve_shares_table_namespace() {
        let mut names = NameMap::new();
        names.table("orders").unwrap();
        assert_eq!(names.reserve("orders").unwrap(), "orders_1");
        assert_eq!(names.reserve("orders_idx").unwrap(), "orders_idx");
        assert_eq!(names.table("orders-idx").unwrap(), "orders_idx_3");
    }

    #[test]
    fn test_many_collisions_terminate() {
        let mut names = NameMap::new();
        let mut seen = HashSet::new();
        // '!' through '/' all legalise to "t_"
        for i in 0..15u8 {
            let src = format!("t{}", char::from(b'!' + i));
            let target = names.table(&src).unwrap().to_lowercase();
            assert!(seen.insert(target));
        }
    }
}
