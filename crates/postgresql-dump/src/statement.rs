//! Closed set of statement kinds the classifier acts on.
//!
//! Parsed statements are narrowed once into [`DumpStatement`], so the schema
//! builder is a single exhaustive match. Everything it does not act on lands
//! in [`DumpStatement::Unhandled`] with a keyword-based kind for statistics.

use crate::chunk::{leading_keywords, words};
use sqlparser::ast::{
    AlterTableOperation, ArrayElemTypeDef, CharacterLength, CopySource, CopyTarget, CreateIndex,
    CreateTable, DataType, ExactNumberInfo, Expr, Ident, Insert, ObjectName, OneOrManyWithParens,
    Statement, TimezoneInfo,
};

/// A statement narrowed to what the dump converter understands.
#[derive(Debug, Clone)]
pub enum DumpStatement {
    CreateTable(CreateTable),
    AlterTable {
        name: ObjectName,
        operations: Vec<AlterTableOperation>,
    },
    CreateIndex(CreateIndex),
    /// `COPY <table> [(cols)] FROM stdin`
    Copy {
        table_name: ObjectName,
        columns: Vec<Ident>,
        /// Inline values the parser consumed after the terminator
        values: Vec<Option<String>>,
    },
    Insert(Insert),
    /// `SET timezone = ...`, `SET timezone TO ...`, `SET TIME ZONE ...`
    SetTimezone(Expr),
    Unhandled {
        kind: String,
    },
}

pub const CREATE_TABLE: &str = "CreateTable";
pub const ALTER_TABLE: &str = "AlterTable";
pub const CREATE_INDEX: &str = "CreateIndex";
pub const COPY: &str = "Copy";
pub const INSERT: &str = "Insert";
pub const SET_TIMEZONE: &str = "SetTimezone";

impl DumpStatement {
    /// Statistics key for this statement.
    pub fn kind(&self) -> &str {
        match self {
            DumpStatement::CreateTable(_) => CREATE_TABLE,
            DumpStatement::AlterTable { .. } => ALTER_TABLE,
            DumpStatement::CreateIndex(_) => CREATE_INDEX,
            DumpStatement::Copy { .. } => COPY,
            DumpStatement::Insert(_) => INSERT,
            DumpStatement::SetTimezone(_) => SET_TIMEZONE,
            DumpStatement::Unhandled { kind } => kind,
        }
    }
}

/// Statistics key of a statement the parser rejected, judged from its
/// leading words; `None` unless it is a kind [`DumpStatement`] acts on.
pub fn handled_kind(text: &str) -> Option<&'static str> {
    let words: Vec<String> = words(text).take(6).collect();
    let word = |i: usize| words.get(i).map(String::as_str).unwrap_or("");
    match word(0) {
        "CREATE" => {
            let mut i = 1;
            if matches!(word(i), "GLOBAL" | "LOCAL") {
                i += 1;
            }
            if matches!(word(i), "TEMP" | "TEMPORARY" | "UNLOGGED") {
                i += 1;
            }
            if word(i) == "UNIQUE" {
                i += 1;
            }
            match word(i) {
                "TABLE" => Some(CREATE_TABLE),
                "INDEX" => Some(CREATE_INDEX),
                _ => None,
            }
        }
        "ALTER" if word(1) == "TABLE" => Some(ALTER_TABLE),
        "COPY" => Some(COPY),
        "INSERT" => Some(INSERT),
        "SET" => {
            let mut i = 1;
            if matches!(word(i), "SESSION" | "LOCAL") {
                i += 1;
            }
            let name = word(i).split(['=', '\'']).next().unwrap_or("");
            let time_zone = name == "TIMEZONE" || (name == "TIME" && word(i + 1) == "ZONE");
            time_zone.then_some(SET_TIMEZONE)
        }
        _ => None,
    }
}

impl From<Statement> for DumpStatement {
    fn from(stmt: Statement) -> Self {
        match stmt {
            Statement::CreateTable(create) => DumpStatement::CreateTable(create),
            Statement::AlterTable {
                name, operations, ..
            } => DumpStatement::AlterTable { name, operations },
            Statement::CreateIndex(index) => DumpStatement::CreateIndex(index),
            Statement::Copy {
                source: CopySource::Table {
                    table_name,
                    columns,
                },
                to: false,
                target: CopyTarget::Stdin,
                values,
                ..
            } => DumpStatement::Copy {
                table_name,
                columns,
                values,
            },
            Statement::Insert(insert) => DumpStatement::Insert(insert),
            Statement::SetTimeZone { value, .. } => DumpStatement::SetTimezone(value),
            Statement::SetVariable {
                variables: OneOrManyWithParens::One(variable),
                mut value,
                ..
            } if is_timezone_variable(&variable) && value.len() == 1 => {
                DumpStatement::SetTimezone(value.remove(0))
            }
            other => DumpStatement::Unhandled {
                kind: leading_keywords(&other.to_string()),
            },
        }
    }
}

fn is_timezone_variable(name: &ObjectName) -> bool {
    let name = name.to_string();
    name.eq_ignore_ascii_case("timezone") || name.eq_ignore_ascii_case("time zone")
}

// ============================================================================
// Identifiers
// ============================================================================

/// Source name of an identifier: unquoted identifiers fold to lower case.
pub fn ident_name(ident: &Ident) -> String {
    match ident.quote_style {
        Some(_) => ident.value.clone(),
        None => ident.value.to_lowercase(),
    }
}

/// Source name of a table: the `public` schema is dropped, other schemas are
/// kept as `schema.table`.
pub fn table_name(name: &ObjectName) -> String {
    let parts: Vec<String> = name.0.iter().map(ident_name).collect();
    match parts.as_slice() {
        [schema, table] if schema == "public" => table.clone(),
        _ => parts.join("."),
    }
}

// ============================================================================
// Column types
// ============================================================================

/// PostgreSQL type id, modifiers and array bounds of a column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceType {
    pub type_id: String,
    pub mods: Vec<i64>,
    pub array_bounds: Vec<i64>,
}

impl SourceType {
    fn scalar(type_id: &str, mods: Vec<i64>) -> Self {
        Self {
            type_id: type_id.to_string(),
            mods,
            array_bounds: Vec::new(),
        }
    }
}

/// Describe a parsed column type the way PostgreSQL catalogs it.
pub fn source_type(data_type: &DataType) -> SourceType {
    match data_type {
        DataType::Array(elem) => {
            let (inner, bound) = match elem {
                ArrayElemTypeDef::SquareBracket(inner, bound) => {
                    (inner.as_ref(), bound.map(|b| b as i64).unwrap_or(-1))
                }
                ArrayElemTypeDef::AngleBracket(inner) | ArrayElemTypeDef::Parenthesis(inner) => {
                    (inner.as_ref(), -1)
                }
                ArrayElemTypeDef::None => {
                    let mut ty = SourceType::scalar("unknown", vec![]);
                    ty.array_bounds.push(-1);
                    return ty;
                }
            };
            let mut ty = source_type(inner);
            ty.array_bounds.insert(0, bound);
            ty
        }

        DataType::Bool | DataType::Boolean => SourceType::scalar("bool", vec![]),

        DataType::SmallInt(_) | DataType::Int2(_) => SourceType::scalar("int2", vec![]),
        DataType::Int(_) | DataType::Integer(_) | DataType::Int4(_) => {
            SourceType::scalar("int4", vec![])
        }
        DataType::BigInt(_) | DataType::Int8(_) => SourceType::scalar("int8", vec![]),

        DataType::Real | DataType::Float4 => SourceType::scalar("float4", vec![]),
        DataType::Double | DataType::DoublePrecision | DataType::Float8 => {
            SourceType::scalar("float8", vec![])
        }
        DataType::Float(Some(p)) if *p <= 24 => SourceType::scalar("float4", vec![]),
        DataType::Float(_) => SourceType::scalar("float8", vec![]),

        DataType::Numeric(info) | DataType::Decimal(info) | DataType::Dec(info) => {
            let mods = match info {
                ExactNumberInfo::None => vec![],
                ExactNumberInfo::Precision(p) => vec![*p as i64],
                ExactNumberInfo::PrecisionAndScale(p, s) => vec![*p as i64, *s as i64],
            };
            SourceType::scalar("numeric", mods)
        }

        DataType::Character(len) | DataType::Char(len) => {
            SourceType::scalar("bpchar", length_mods(len))
        }
        DataType::CharacterVarying(len) | DataType::CharVarying(len) | DataType::Varchar(len) => {
            SourceType::scalar("varchar", length_mods(len))
        }
        DataType::Text => SourceType::scalar("text", vec![]),
        DataType::Bytea => SourceType::scalar("bytea", vec![]),
        DataType::Uuid => SourceType::scalar("uuid", vec![]),
        DataType::JSON => SourceType::scalar("json", vec![]),
        DataType::JSONB => SourceType::scalar("jsonb", vec![]),
        DataType::Interval => SourceType::scalar("interval", vec![]),

        DataType::Date => SourceType::scalar("date", vec![]),
        DataType::Timestamp(_, tz) => match tz {
            TimezoneInfo::WithTimeZone | TimezoneInfo::Tz => {
                SourceType::scalar("timestamptz", vec![])
            }
            TimezoneInfo::None | TimezoneInfo::WithoutTimeZone => {
                SourceType::scalar("timestamp", vec![])
            }
        },
        DataType::Time(_, tz) => match tz {
            TimezoneInfo::WithTimeZone | TimezoneInfo::Tz => SourceType::scalar("timetz", vec![]),
            TimezoneInfo::None | TimezoneInfo::WithoutTimeZone => {
                SourceType::scalar("time", vec![])
            }
        },

        DataType::Custom(name, mods) => {
            let base = name.0.last().map(ident_name).unwrap_or_default();
            let mods = mods.iter().filter_map(|m| m.trim().parse().ok()).collect();
            SourceType::scalar(&postgresql_types::canonical_type_id(&base), mods)
        }

        other => SourceType::scalar(&other.to_string().to_lowercase(), vec![]),
    }
}

fn length_mods(len: &Option<CharacterLength>) -> Vec<i64> {
    match len {
        Some(CharacterLength::IntegerLength { length, .. }) => vec![*length as i64],
        Some(CharacterLength::Max) | None => vec![],
    }
}
