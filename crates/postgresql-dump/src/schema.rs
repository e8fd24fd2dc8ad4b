//! Statement Classifier & Schema Builder.
//!
//! This module applies one [`DumpStatement`] at a time to a [`Conv`]. Schema
//! statements mutate the source and target schemas in schema mode only;
//! `COPY` and `INSERT` come back as [`Directive`]s for the caller to feed to
//! the data converter. Failures are counted per statement kind and never
//! abort the run.

use crate::data::RowTarget;
use crate::error::StatementError;
use crate::insert::extract_rows;
use crate::statement::{ident_name, source_type, table_name, DumpStatement};
use migrate_core::{
    parse_timezone, Conv, ConversionError, ForeignKey, IndexKey, SchemaIssue, SecondaryIndex,
    SourceColumn, SourceTable, TargetColumn, TargetTable,
};
use postgresql_types::map_column_type;
use sqlparser::ast::{
    AlterColumnOperation, AlterTableOperation, ColumnOption, CreateIndex, CreateTable, Expr,
    Ident, Insert, ObjectName, TableConstraint, Value,
};
use sqlparser::tokenizer::Token;
use std::iter::Peekable;
use tracing::debug;

/// What the caller must do after a statement has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// The stream continues with `COPY` payload lines. With `None` the
    /// target is unknown and the payload is read and discarded.
    Copy(Option<RowTarget>),
    /// Rows of an `INSERT`
    Rows {
        target: RowTarget,
        rows: Vec<Vec<Option<String>>>,
    },
}

/// Apply a statement to the conversion state.
pub fn process_statement(conv: &mut Conv, stmt: DumpStatement) -> Option<Directive> {
    let kind = stmt.kind().to_string();
    let result = match stmt {
        DumpStatement::CreateTable(create) => create_table(conv, create).map(|_| None),
        DumpStatement::AlterTable { name, operations } => {
            alter_table(conv, &name, operations).map(|_| None)
        }
        DumpStatement::CreateIndex(index) => create_index(conv, index).map(|_| None),
        DumpStatement::Copy {
            table_name,
            columns,
            values,
        } => Ok(Some(copy_from(conv, &table_name, &columns, &values))),
        DumpStatement::Insert(insert) => insert_into(conv, &insert).map(Some),
        DumpStatement::SetTimezone(value) => set_timezone(conv, &value).map(|_| None),
        DumpStatement::Unhandled { kind } => {
            debug!("Skipping {kind} statement");
            conv.skip_statement(&kind);
            Ok(None)
        }
    };

    match result {
        Ok(directive) => directive,
        Err(e) => {
            debug!("Error processing {kind} statement: {e}");
            conv.error_in_statement(&kind);
            if conv.schema_mode() && is_anomaly(&e) {
                conv.unexpected(format!("{kind}: {e}"));
            }
            None
        }
    }
}

/// Errors that point at unsupported input or a broken internal invariant,
/// rather than at a reference to something the dump never defined.
fn is_anomaly(e: &StatementError) -> bool {
    match e {
        StatementError::UnsupportedInsertSource(_) | StatementError::UnsupportedExpression(_) => {
            true
        }
        StatementError::Conversion(
            ConversionError::InconsistentNameMap { .. } | ConversionError::NameSpaceExhausted(_),
        ) => true,
        _ => false,
    }
}

// ============================================================================
// CREATE TABLE
// ============================================================================

fn create_table(conv: &mut Conv, create: CreateTable) -> Result<(), StatementError> {
    if conv.data_mode() {
        return Ok(());
    }
    let src_name = table_name(&create.name);
    if conv.src_schema.contains_key(&src_name) {
        return Err(StatementError::DuplicateTable(src_name));
    }
    let sp_name = conv.names.table(&src_name)?;

    let mut src = SourceTable::new(&src_name);
    let mut sp = TargetTable::new(&sp_name);
    let mut constraints = Vec::new();
    for column in &create.columns {
        let col_name = ident_name(&column.name);
        let ty = source_type(&column.data_type);
        let (sp_ty, issues) = map_column_type(&ty.type_id, &ty.mods, &ty.array_bounds);
        let sp_col_name = conv.names.column(&src_name, &col_name, false)?;

        let mut src_col = SourceColumn::new(&col_name, &ty.type_id);
        src_col.mods = ty.mods;
        src_col.array_bounds = ty.array_bounds;
        for issue in issues {
            src_col.add_issue(issue);
        }
        let mut sp_col = TargetColumn::new(sp_col_name, sp_ty);

        for option in &column.options {
            let name = option.name.as_ref().map(ident_name);
            match &option.option {
                ColumnOption::NotNull => {
                    src_col.not_null = true;
                    sp_col.not_null = true;
                }
                ColumnOption::Default(_) => src_col.add_issue(SchemaIssue::DefaultValue),
                ColumnOption::Unique { is_primary, .. } => {
                    let columns = vec![col_name.clone()];
                    constraints.push(if *is_primary {
                        Constraint::PrimaryKey { columns }
                    } else {
                        Constraint::Unique { name, columns }
                    });
                }
                ColumnOption::ForeignKey {
                    foreign_table,
                    referred_columns,
                    ..
                } => constraints.push(Constraint::ForeignKey {
                    name,
                    columns: vec![col_name.clone()],
                    refer_table: table_name(foreign_table),
                    refer_columns: referred_columns.iter().map(ident_name).collect(),
                }),
                _ => {}
            }
        }
        src.push_column(src_col);
        sp.push_column(sp_col);
    }
    debug!(
        "Created table '{sp_name}' from '{src_name}' with {} columns",
        sp.col_names.len()
    );
    conv.src_schema.insert(src_name.clone(), src);
    conv.sp_schema.insert(sp_name, sp);

    constraints.extend(create.constraints.iter().filter_map(Constraint::from_table));
    let mut first_error = None;
    for constraint in constraints {
        if let Err(e) = apply_constraint(conv, &src_name, constraint) {
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => {
            conv.schema_statement("CreateTable");
            Ok(())
        }
    }
}

// ============================================================================
// Constraints
// ============================================================================

/// Table constraints the schema builder carries over.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Constraint {
    PrimaryKey {
        columns: Vec<String>,
    },
    Unique {
        name: Option<String>,
        columns: Vec<String>,
    },
    ForeignKey {
        name: Option<String>,
        columns: Vec<String>,
        refer_table: String,
        refer_columns: Vec<String>,
    },
}

impl Constraint {
    fn from_table(constraint: &TableConstraint) -> Option<Self> {
        let names = |idents: &[Ident]| idents.iter().map(ident_name).collect::<Vec<_>>();
        match constraint {
            TableConstraint::PrimaryKey { columns, .. } => Some(Constraint::PrimaryKey {
                columns: names(columns),
            }),
            TableConstraint::Unique { name, columns, .. } => Some(Constraint::Unique {
                name: name.as_ref().map(ident_name),
                columns: names(columns),
            }),
            TableConstraint::ForeignKey {
                name,
                columns,
                foreign_table,
                referred_columns,
                ..
            } => Some(Constraint::ForeignKey {
                name: name.as_ref().map(ident_name),
                columns: names(columns),
                refer_table: table_name(foreign_table),
                refer_columns: names(referred_columns),
            }),
            other => {
                debug!("Skipping constraint: {other}");
                None
            }
        }
    }
}

fn apply_constraint(
    conv: &mut Conv,
    src_table: &str,
    constraint: Constraint,
) -> Result<(), StatementError> {
    let sp_table = conv
        .names
        .get_table(src_table)
        .map(str::to_string)
        .ok_or_else(|| ConversionError::TableNotFound(src_table.to_string()))?;

    match constraint {
        Constraint::PrimaryKey { columns } => {
            let keys = index_keys(conv, src_table, &columns)?;
            let table = target_table(conv, &sp_table)?;
            let replaced = !table.primary_keys.is_empty();
            table.primary_keys = keys;
            if replaced {
                conv.unexpected(format!("Multiple primary keys found for table '{src_table}'"));
            }
            if let Some(src) = conv.src_schema.get_mut(src_table) {
                src.primary_keys = columns;
            }
        }

        Constraint::Unique { name, columns } => {
            let keys = index_keys(conv, src_table, &columns)?;
            let name = name.unwrap_or_else(|| format!("{src_table}_{}_key", columns.join("_")));
            let name = conv.names.reserve(&name)?;
            target_table(conv, &sp_table)?.indexes.push(SecondaryIndex {
                name,
                unique: true,
                keys,
            });
        }

        Constraint::ForeignKey {
            name,
            columns,
            refer_table,
            refer_columns,
        } => {
            let refer_columns = if refer_columns.is_empty() {
                conv.src_schema
                    .get(&refer_table)
                    .map(|t| t.primary_keys.clone())
                    .unwrap_or_default()
            } else {
                refer_columns
            };
            if !conv.src_schema.contains_key(&refer_table) || refer_columns.is_empty() {
                debug!(
                    "Dropping foreign key of table '{src_table}': referenced table '{refer_table}' is unknown or has no key"
                );
                add_issue(conv, src_table, &columns, SchemaIssue::ForeignKey);
                return Ok(());
            }

            let sp_columns = columns
                .iter()
                .map(|c| conv.names.column(src_table, c, true))
                .collect::<Result<Vec<_>, _>>()?;
            let sp_refer_columns = refer_columns
                .iter()
                .map(|c| conv.names.column(&refer_table, c, true))
                .collect::<Result<Vec<_>, _>>()?;
            let sp_refer_table = conv
                .names
                .get_table(&refer_table)
                .map(str::to_string)
                .ok_or_else(|| ConversionError::TableNotFound(refer_table.clone()))?;
            let name = name.unwrap_or_else(|| format!("{src_table}_{}_fkey", columns.join("_")));
            let name = conv.names.reserve(&name)?;
            target_table(conv, &sp_table)?.foreign_keys.push(ForeignKey {
                name,
                columns: sp_columns,
                refer_table: sp_refer_table,
                refer_columns: sp_refer_columns,
            });
        }
    }
    Ok(())
}

fn index_keys(
    conv: &mut Conv,
    src_table: &str,
    columns: &[String],
) -> Result<Vec<IndexKey>, StatementError> {
    columns
        .iter()
        .map(|c| -> Result<IndexKey, StatementError> {
            Ok(IndexKey::asc(conv.names.column(src_table, c, true)?))
        })
        .collect()
}

fn target_table<'a>(
    conv: &'a mut Conv,
    sp_table: &str,
) -> Result<&'a mut TargetTable, StatementError> {
    conv.sp_schema
        .get_mut(sp_table)
        .ok_or_else(|| ConversionError::TableNotFound(sp_table.to_string()).into())
}

fn add_issue(conv: &mut Conv, src_table: &str, columns: &[String], issue: SchemaIssue) {
    let Some(table) = conv.src_schema.get_mut(src_table) else {
        return;
    };
    for column in columns {
        if let Some(col) = table.column_mut(column) {
            col.add_issue(issue);
        }
    }
}

// ============================================================================
// ALTER TABLE / CREATE INDEX
// ============================================================================

/// Flag the column of an `ALTER TABLE .. ALTER COLUMN .. ADD GENERATED`
/// the parser rejected (pg_dump emits identity sequence options it does not
/// accept). Returns whether the statement named a known table.
pub(crate) fn unparsed_identity(conv: &mut Conv, tokens: &[Token]) -> bool {
    let mut words = tokens
        .iter()
        .filter(|t| !matches!(t, Token::Whitespace(_)))
        .peekable();
    if !(keyword(&mut words, "ALTER") && keyword(&mut words, "TABLE")) {
        return false;
    }
    if keyword(&mut words, "IF") && !keyword(&mut words, "EXISTS") {
        return false;
    }
    keyword(&mut words, "ONLY");
    let mut parts = Vec::new();
    loop {
        match words.next() {
            Some(Token::Word(w)) => parts.push(Ident {
                value: w.value.clone(),
                quote_style: w.quote_style,
            }),
            _ => return false,
        }
        if !matches!(words.peek(), Some(Token::Period)) {
            break;
        }
        words.next();
    }
    if !keyword(&mut words, "ALTER") {
        return false;
    }
    keyword(&mut words, "COLUMN");
    let column = match words.next() {
        Some(Token::Word(w)) => ident_name(&Ident {
            value: w.value.clone(),
            quote_style: w.quote_style,
        }),
        _ => return false,
    };
    if !(keyword(&mut words, "ADD") && keyword(&mut words, "GENERATED")) {
        return false;
    }

    let src_table = table_name(&ObjectName(parts));
    if !conv.src_schema.contains_key(&src_table) {
        return false;
    }
    if conv.schema_mode() {
        add_issue(conv, &src_table, &[column], SchemaIssue::Serial);
    }
    true
}

fn keyword<'a>(words: &mut Peekable<impl Iterator<Item = &'a Token>>, value: &str) -> bool {
    match words.peek() {
        Some(Token::Word(w)) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case(value) => {
            words.next();
            true
        }
        _ => false,
    }
}

fn alter_table(
    conv: &mut Conv,
    name: &ObjectName,
    operations: Vec<AlterTableOperation>,
) -> Result<(), StatementError> {
    if conv.data_mode() {
        return Ok(());
    }
    let src_table = table_name(name);
    let Some(sp_table) = conv.names.get_table(&src_table).map(str::to_string) else {
        debug!("ALTER TABLE for unknown table '{src_table}' (view, sequence or index?)");
        conv.skip_statement("AlterTable");
        return Ok(());
    };

    let mut applied = false;
    for operation in operations {
        match operation {
            AlterTableOperation::AddConstraint(constraint) => {
                if let Some(constraint) = Constraint::from_table(&constraint) {
                    apply_constraint(conv, &src_table, constraint)?;
                    applied = true;
                }
            }
            AlterTableOperation::AlterColumn { column_name, op } => {
                let src_col = ident_name(&column_name);
                let sp_col = conv.names.column(&src_table, &src_col, true)?;
                applied |= alter_column(conv, &src_table, &sp_table, &src_col, &sp_col, op);
            }
            other => debug!("Skipping ALTER TABLE operation on '{src_table}': {other}"),
        }
    }
    if applied {
        conv.schema_statement("AlterTable");
    } else {
        conv.skip_statement("AlterTable");
    }
    Ok(())
}

fn alter_column(
    conv: &mut Conv,
    src_table: &str,
    sp_table: &str,
    src_col: &str,
    sp_col: &str,
    op: AlterColumnOperation,
) -> bool {
    let not_null = match op {
        AlterColumnOperation::SetNotNull => true,
        AlterColumnOperation::DropNotNull => false,
        AlterColumnOperation::SetDefault { .. } => {
            add_issue(conv, src_table, &[src_col.to_string()], SchemaIssue::DefaultValue);
            return true;
        }
        AlterColumnOperation::AddGenerated { .. } => {
            add_issue(conv, src_table, &[src_col.to_string()], SchemaIssue::Serial);
            return true;
        }
        other => {
            debug!("Skipping ALTER COLUMN {src_table}.{src_col}: {other}");
            return false;
        }
    };
    if let Some(col) = conv
        .src_schema
        .get_mut(src_table)
        .and_then(|t| t.column_mut(src_col))
    {
        col.not_null = not_null;
    }
    if let Some(col) = conv
        .sp_schema
        .get_mut(sp_table)
        .and_then(|t| t.column_mut(sp_col))
    {
        col.not_null = not_null;
    }
    true
}

fn create_index(conv: &mut Conv, index: CreateIndex) -> Result<(), StatementError> {
    if conv.data_mode() {
        return Ok(());
    }
    let src_table = table_name(&index.table_name);
    let Some(sp_table) = conv.names.get_table(&src_table).map(str::to_string) else {
        debug!("CREATE INDEX on unknown table '{src_table}'");
        conv.skip_statement("CreateIndex");
        return Ok(());
    };
    if let Some(predicate) = &index.predicate {
        debug!("Skipping partial index on '{src_table}' (WHERE {predicate})");
        conv.skip_statement("CreateIndex");
        return Ok(());
    }

    let mut src_cols = Vec::with_capacity(index.columns.len());
    let mut keys = Vec::with_capacity(index.columns.len());
    for column in &index.columns {
        let src_col = match &column.expr {
            Expr::Identifier(ident) => ident_name(ident),
            Expr::CompoundIdentifier(idents) => idents.last().map(ident_name).unwrap_or_default(),
            other => return Err(StatementError::UnsupportedExpression(other.to_string())),
        };
        keys.push(IndexKey {
            column: conv.names.column(&src_table, &src_col, true)?,
            desc: column.asc == Some(false),
        });
        src_cols.push(src_col);
    }

    let name = index
        .name
        .as_ref()
        .and_then(|n| n.0.last())
        .map(ident_name)
        .unwrap_or_else(|| format!("{src_table}_{}_idx", src_cols.join("_")));
    let name = conv.names.reserve(&name)?;
    target_table(conv, &sp_table)?.indexes.push(SecondaryIndex {
        name,
        unique: index.unique,
        keys,
    });
    conv.schema_statement("CreateIndex");
    Ok(())
}

// ============================================================================
// COPY / INSERT
// ============================================================================

fn copy_from(
    conv: &mut Conv,
    table: &ObjectName,
    columns: &[Ident],
    values: &[Option<String>],
) -> Directive {
    if values.iter().flatten().any(|v| !v.trim().is_empty()) && conv.schema_mode() {
        conv.unexpected("COPY payload on the statement line");
    }
    match row_target(conv, table, columns) {
        Ok(target) => {
            conv.data_statement("Copy");
            Directive::Copy(Some(target))
        }
        Err(e) => {
            debug!("Discarding COPY payload: {e}");
            conv.error_in_statement("Copy");
            Directive::Copy(None)
        }
    }
}

fn insert_into(conv: &mut Conv, insert: &Insert) -> Result<Directive, StatementError> {
    let target = row_target(conv, &insert.table_name, &insert.columns)?;
    let rows = extract_rows(insert)?;
    conv.data_statement("Insert");
    Ok(Directive::Rows { target, rows })
}

/// Resolve a table and optional column list; no list means every column in
/// declaration order.
fn row_target(
    conv: &mut Conv,
    table: &ObjectName,
    columns: &[Ident],
) -> Result<RowTarget, ConversionError> {
    let src_table = table_name(table);
    let src_cols: Vec<String> = match conv.src_schema.get(&src_table) {
        Some(_) if !columns.is_empty() => columns.iter().map(ident_name).collect(),
        Some(t) => t.col_names.clone(),
        None => return Err(ConversionError::TableNotFound(src_table)),
    };
    let sp_table = conv
        .names
        .get_table(&src_table)
        .map(str::to_string)
        .ok_or_else(|| ConversionError::TableNotFound(src_table.clone()))?;
    let sp_cols = src_cols
        .iter()
        .map(|c| conv.names.column(&src_table, c, true))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RowTarget {
        src_table,
        sp_table,
        src_cols,
        sp_cols,
    })
}

// ============================================================================
// SET timezone
// ============================================================================

fn set_timezone(conv: &mut Conv, value: &Expr) -> Result<(), StatementError> {
    let name = match value {
        Expr::Value(Value::SingleQuotedString(s)) | Expr::Value(Value::DoubleQuotedString(s)) => {
            s.clone()
        }
        Expr::Identifier(ident) => ident.value.clone(),
        other => return Err(StatementError::UnsupportedExpression(other.to_string())),
    };
    if name.eq_ignore_ascii_case("default") || name.eq_ignore_ascii_case("local") {
        conv.reset_timezone();
    } else {
        let tz = parse_timezone(&name).ok_or(StatementError::UnknownTimezone(name))?;
        conv.set_timezone(tz);
    }
    conv.schema_statement("SetTimezone");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrate_core::{TargetType, TypeKind};
    use sqlparser::dialect::PostgreSqlDialect;
    use sqlparser::parser::Parser;

    fn run(conv: &mut Conv, sql: &str) -> Vec<Directive> {
        Parser::parse_sql(&PostgreSqlDialect {}, sql)
            .unwrap()
            .into_iter()
            .filter_map(|stmt| process_statement(conv, DumpStatement::from(stmt)))
            .collect()
    }

    fn keys(table: &TargetTable) -> Vec<&str> {
        table
            .primary_keys
            .iter()
            .map(|k| k.column.as_str())
            .collect()
    }

    #[test]
    fn test_create_table_columns() {
        let mut conv = Conv::default();
        run(
            &mut conv,
            "CREATE TABLE public.t (
                id integer NOT NULL,
                price numeric(20,2) DEFAULT 0,
                tags text[],
                grid integer[][],
                \"Weird Name\" varchar(10)
            );",
        );
        let sp = &conv.sp_schema["t"];
        assert_eq!(sp.col_names, vec!["id", "price", "tags", "grid", "Weird_Name"]);
        assert!(sp.col_defs["id"].not_null);
        assert_eq!(sp.col_defs["id"].ty, TargetType::new(TypeKind::Int64));
        assert_eq!(sp.col_defs["tags"].ty, TargetType::string_max().into_array());
        assert_eq!(sp.col_defs["grid"].ty, TargetType::string_max());
        assert_eq!(
            sp.col_defs["Weird_Name"].ty,
            TargetType::with_len(TypeKind::String, 10)
        );

        let src = &conv.src_schema["t"];
        assert_eq!(
            src.col_defs["price"].issues,
            vec![SchemaIssue::PrecisionLoss, SchemaIssue::DefaultValue]
        );
        assert_eq!(src.col_defs["id"].issues, vec![SchemaIssue::Widened]);
        assert_eq!(
            src.col_defs["grid"].issues,
            vec![SchemaIssue::MultiDimensionalArray]
        );
        assert_eq!(conv.stats().statement("CreateTable").schema, 1);
    }

    #[test]
    fn test_inline_and_table_constraints() {
        let mut conv = Conv::default();
        run(
            &mut conv,
            "CREATE TABLE a (id int8 PRIMARY KEY, code text UNIQUE);
             CREATE TABLE b (x int8, y int8 REFERENCES a, PRIMARY KEY (x, y));",
        );
        assert_eq!(keys(&conv.sp_schema["a"]), vec!["id"]);
        assert_eq!(conv.sp_schema["a"].indexes[0].name, "a_code_key");
        assert!(conv.sp_schema["a"].indexes[0].unique);

        let b = &conv.sp_schema["b"];
        assert_eq!(keys(b), vec!["x", "y"]);
        assert_eq!(b.foreign_keys.len(), 1);
        assert_eq!(b.foreign_keys[0].name, "b_y_fkey");
        assert_eq!(b.foreign_keys[0].refer_table, "a");
        assert_eq!(b.foreign_keys[0].refer_columns, vec!["id"]);
    }

    #[test]
    fn test_alter_table_primary_key_and_not_null() {
        let mut conv = Conv::default();
        run(
            &mut conv,
            "CREATE TABLE t (id int8, name text);
             ALTER TABLE ONLY public.t ADD CONSTRAINT t_pkey PRIMARY KEY (id);
             ALTER TABLE t ALTER COLUMN name SET NOT NULL;",
        );
        assert_eq!(keys(&conv.sp_schema["t"]), vec!["id"]);
        assert!(conv.sp_schema["t"].col_defs["name"].not_null);
        assert!(conv.src_schema["t"].col_defs["name"].not_null);
        assert_eq!(conv.src_schema["t"].primary_keys, vec!["id"]);
        assert_eq!(conv.stats().statement("AlterTable").schema, 2);
    }

    #[test]
    fn test_multiple_primary_keys_overwrite() {
        let mut conv = Conv::default();
        run(
            &mut conv,
            "CREATE TABLE t (a int8, b int8);
             ALTER TABLE t ADD CONSTRAINT k1 PRIMARY KEY (a);
             ALTER TABLE t ADD CONSTRAINT k2 PRIMARY KEY (b);",
        );
        assert_eq!(keys(&conv.sp_schema["t"]), vec!["b"]);
        assert_eq!(conv.stats().unexpected.len(), 1);
    }

    #[test]
    fn test_alter_unknown_table_is_skipped() {
        let mut conv = Conv::default();
        run(
            &mut conv,
            "ALTER TABLE ONLY public.some_view ADD CONSTRAINT v_pkey PRIMARY KEY (id);",
        );
        let stats = conv.stats().statement("AlterTable");
        assert_eq!(stats.skip, 1);
        assert_eq!(stats.error, 0);
    }

    #[test]
    fn test_constraint_on_unknown_column_is_error() {
        let mut conv = Conv::default();
        run(
            &mut conv,
            "CREATE TABLE t (a int8);
             ALTER TABLE t ADD CONSTRAINT t_pkey PRIMARY KEY (nope);",
        );
        assert!(conv.sp_schema["t"].primary_keys.is_empty());
        assert_eq!(conv.stats().statement("AlterTable").error, 1);
    }

    #[test]
    fn test_foreign_key_to_unknown_table_dropped() {
        let mut conv = Conv::default();
        run(
            &mut conv,
            "CREATE TABLE t (a int8);
             ALTER TABLE t ADD CONSTRAINT t_a_fkey FOREIGN KEY (a) REFERENCES later(id);",
        );
        assert!(conv.sp_schema["t"].foreign_keys.is_empty());
        assert_eq!(
            conv.src_schema["t"].col_defs["a"].issues,
            vec![SchemaIssue::ForeignKey]
        );
    }

    #[test]
    fn test_create_index() {
        let mut conv = Conv::default();
        run(
            &mut conv,
            "CREATE TABLE t (a int8, b text);
             CREATE UNIQUE INDEX t_b_idx ON public.t USING btree (b DESC, a);
             CREATE INDEX ON t (a);
             CREATE INDEX gone ON missing (a);",
        );
        let indexes = &conv.sp_schema["t"].indexes;
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].name, "t_b_idx");
        assert!(indexes[0].unique);
        assert!(indexes[0].keys[0].desc);
        assert!(!indexes[0].keys[1].desc);
        assert_eq!(indexes[1].name, "t_a_idx");
        assert_eq!(conv.stats().statement("CreateIndex").skip, 1);
    }

    #[test]
    fn test_duplicate_table_is_error() {
        let mut conv = Conv::default();
        run(&mut conv, "CREATE TABLE t (a int8); CREATE TABLE t (b int8);");
        assert_eq!(conv.sp_schema["t"].col_names, vec!["a"]);
        assert_eq!(conv.stats().statement("CreateTable").error, 1);
    }

    #[test]
    fn test_schema_statements_ignored_in_data_mode() {
        let mut conv = Conv::default();
        conv.set_data_mode();
        run(&mut conv, "CREATE TABLE t (a int8);");
        assert!(conv.sp_schema.is_empty());
    }

    #[test]
    fn test_copy_directive() {
        let mut conv = Conv::default();
        let directives = run(
            &mut conv,
            "CREATE TABLE t (id int8, name text);\nCOPY public.t (name, id) FROM stdin;\n",
        );
        let expected = RowTarget {
            src_table: "t".into(),
            sp_table: "t".into(),
            src_cols: vec!["name".into(), "id".into()],
            sp_cols: vec!["name".into(), "id".into()],
        };
        assert_eq!(directives, vec![Directive::Copy(Some(expected))]);
        assert_eq!(conv.stats().statement("Copy").data, 1);
    }

    #[test]
    fn test_copy_unknown_table_discards() {
        let mut conv = Conv::default();
        let directives = run(&mut conv, "COPY nowhere (a) FROM stdin;\n");
        assert_eq!(directives, vec![Directive::Copy(None)]);
        assert_eq!(conv.stats().statement("Copy").error, 1);
    }

    #[test]
    fn test_insert_without_column_list() {
        let mut conv = Conv::default();
        let directives = run(
            &mut conv,
            "CREATE TABLE t (id int8, name text);
             INSERT INTO t VALUES (1, 'a'), (2, NULL);",
        );
        let Directive::Rows { target, rows } = &directives[0] else {
            panic!("expected rows, got {directives:?}");
        };
        assert_eq!(target.src_cols, vec!["id", "name"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], None);
    }

    #[test]
    fn test_insert_with_function_call_is_unexpected() {
        let mut conv = Conv::default();
        let directives = run(
            &mut conv,
            "CREATE TABLE t (ts timestamptz); INSERT INTO t VALUES (now());",
        );
        assert!(directives.is_empty());
        assert_eq!(conv.stats().statement("Insert").error, 1);
        assert_eq!(conv.stats().unexpected.len(), 1);
    }

    #[test]
    fn test_set_timezone() {
        let mut conv = Conv::default();
        run(&mut conv, "SET timezone = 'America/New_York';");
        assert_eq!(conv.timezone(), chrono_tz::America::New_York);
        run(&mut conv, "SET TIME ZONE 'Asia/Tokyo';");
        assert_eq!(conv.timezone(), chrono_tz::Asia::Tokyo);
        run(&mut conv, "SET timezone = 'Mars/Olympus';");
        assert_eq!(conv.timezone(), chrono_tz::Asia::Tokyo);
        assert_eq!(conv.stats().statement("SetTimezone").error, 1);
        assert_eq!(conv.stats().statement("SetTimezone").schema, 2);
    }

    #[test]
    fn test_unparsed_identity_flags_serial() {
        use sqlparser::tokenizer::Tokenizer;

        let mut conv = Conv::default();
        run(&mut conv, "CREATE TABLE public.ident (id integer NOT NULL, v text);");
        let tokenize = |sql: &str| Tokenizer::new(&PostgreSqlDialect {}, sql).tokenize().unwrap();

        let sql = "ALTER TABLE public.ident ALTER COLUMN id ADD GENERATED ALWAYS AS IDENTITY (
            SEQUENCE NAME public.ident_id_seq
            START WITH 1
            CACHE 1
        );";
        assert!(unparsed_identity(&mut conv, &tokenize(sql)));
        let col = conv.src_schema["ident"].column("id").unwrap();
        assert!(col.issues.contains(&SchemaIssue::Serial));

        let other = "ALTER TABLE ONLY public.missing ALTER COLUMN id ADD GENERATED ALWAYS AS IDENTITY;";
        assert!(!unparsed_identity(&mut conv, &tokenize(other)));
        let not_identity = "ALTER TABLE public.ident ALTER COLUMN v SET STORAGE WIBBLE;";
        assert!(!unparsed_identity(&mut conv, &tokenize(not_identity)));
    }

    #[test]
    fn test_unhandled_is_skipped() {
        let mut conv = Conv::default();
        run(&mut conv, "CREATE SEQUENCE s; SELECT 1;");
        assert_eq!(conv.stats().statement("CREATE SEQUENCE").skip, 1);
        assert_eq!(conv.stats().statement("SELECT").skip, 1);
    }
}
