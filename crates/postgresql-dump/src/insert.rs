//! Literal extraction from `INSERT ... VALUES` statements.

use crate::error::StatementError;
use sqlparser::ast::{Expr, Insert, SetExpr, UnaryOperator, Value};

/// Rows of an `INSERT`, as text values; `None` is SQL `NULL`.
pub fn extract_rows(insert: &Insert) -> Result<Vec<Vec<Option<String>>>, StatementError> {
    let source = insert
        .source
        .as_ref()
        .ok_or_else(|| StatementError::UnsupportedInsertSource("DEFAULT VALUES".to_string()))?;
    let SetExpr::Values(values) = source.body.as_ref() else {
        return Err(StatementError::UnsupportedInsertSource(
            source.body.to_string(),
        ));
    };
    values
        .rows
        .iter()
        .map(|row| row.iter().map(literal).collect::<Result<Vec<_>, _>>())
        .collect()
}

/// Text of a literal expression.
fn literal(expr: &Expr) -> Result<Option<String>, StatementError> {
    match expr {
        Expr::Value(value) => value_text(value).ok_or_else(|| unsupported(expr)),
        Expr::UnaryOp { op, expr: inner } => match (op, inner.as_ref()) {
            (UnaryOperator::Minus, Expr::Value(Value::Number(n, _))) => {
                Ok(Some(format!("-{n}")))
            }
            (UnaryOperator::Plus, Expr::Value(Value::Number(n, _))) => Ok(Some(n.clone())),
            _ => Err(unsupported(expr)),
        },
        Expr::Cast { expr: inner, .. } => literal(inner),
        Expr::Nested(inner) => literal(inner),
        _ => Err(unsupported(expr)),
    }
}

fn value_text(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Number(n, _) => Some(Some(n.clone())),
        Value::SingleQuotedString(s)
        | Value::EscapedStringLiteral(s)
        | Value::NationalStringLiteral(s) => Some(Some(s.clone())),
        Value::DollarQuotedString(d) => Some(Some(d.value.clone())),
        Value::Boolean(b) => Some(Some(b.to_string())),
        Value::Null => Some(None),
        _ => None,
    }
}

fn unsupported(expr: &Expr) -> StatementError {
    StatementError::UnsupportedExpression(expr.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::ast::Statement;
    use sqlparser::dialect::PostgreSqlDialect;
    use sqlparser::parser::Parser;

    fn rows(sql: &str) -> Result<Vec<Vec<Option<String>>>, StatementError> {
        let statements = Parser::parse_sql(&PostgreSqlDialect {}, sql).unwrap();
        match &statements[0] {
            Statement::Insert(insert) => extract_rows(insert),
            other => panic!("expected INSERT, got {other}"),
        }
    }

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_literals() {
        let rows = rows(
            "INSERT INTO t VALUES (1, -2.5, 'it''s', E'a\\tb', $$dollar$$, true, NULL), (+3, 'x', '', '', '', false, 'y');",
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                s("1"),
                s("-2.5"),
                s("it's"),
                s("a\tb"),
                s("dollar"),
                s("true"),
                None
            ]
        );
        assert_eq!(rows[1][0], s("3"));
    }

    #[test]
    fn test_cast_of_literal() {
        let rows = rows("INSERT INTO t VALUES ('{1,2}'::integer[], CAST('7' AS int8));").unwrap();
        assert_eq!(rows[0], vec![s("{1,2}"), s("7")]);
    }

    #[test]
    fn test_unsupported_expression() {
        assert!(matches!(
            rows("INSERT INTO t VALUES (now());"),
            Err(StatementError::UnsupportedExpression(_))
        ));
        assert!(matches!(
            rows("INSERT INTO t VALUES (1 + 2);"),
            Err(StatementError::UnsupportedExpression(_))
        ));
    }

    #[test]
    fn test_insert_select_unsupported() {
        assert!(matches!(
            rows("INSERT INTO t SELECT * FROM u;"),
            Err(StatementError::UnsupportedInsertSource(_))
        ));
    }
}
