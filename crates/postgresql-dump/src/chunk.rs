//! Statement chunker: the only place that decides statement boundaries.
//!
//! Lines are accumulated until the newest line contains a `;` (or input
//! ends), then the buffer is parsed. A failed parse is retried with more
//! input while the buffer is lexically incomplete, which covers terminators
//! inside strings, dollar-quoted bodies and comments. Once the buffer is
//! lexically complete and ends at a terminator, more input cannot help, so
//! the buffer is split at top-level terminators and each statement is parsed
//! on its own.

use crate::error::Result;
use crate::reader::DumpReader;
use crate::schema::unparsed_identity;
use crate::statement::{handled_kind, ALTER_TABLE};
use migrate_core::Conv;
use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::io::BufRead;
use tracing::{debug, warn};

/// Text consumed from the stream and the statements parsed from it.
#[derive(Debug)]
pub struct Chunk {
    pub text: String,
    pub statements: Vec<Statement>,
}

/// Read the next chunk; `None` once the stream is exhausted.
pub fn next_chunk<R: BufRead>(
    conv: &mut Conv,
    reader: &mut DumpReader<R>,
) -> Result<Option<Chunk>> {
    let dialect = PostgreSqlDialect {};
    let mut buf = String::new();
    loop {
        let line = reader.read_line()?;
        if is_meta_command(&line) && only_comments(&buf) {
            debug!("Skipping psql meta-command at line {}", reader.line_number());
            if reader.eof() {
                return Ok(None);
            }
            continue;
        }
        buf.push_str(&line);

        if reader.eof() && buf.trim().is_empty() {
            return Ok(None);
        }
        if !line.contains(';') && !reader.eof() {
            continue;
        }

        match Parser::parse_sql(&dialect, &buf) {
            Ok(statements) => {
                return Ok(Some(Chunk {
                    text: buf,
                    statements,
                }))
            }
            Err(e) => {
                if let Some(segments) = complete_segments(&buf) {
                    let statements = parse_each(conv, segments);
                    return Ok(Some(Chunk {
                        text: buf,
                        statements,
                    }));
                }
                if reader.eof() {
                    warn!(
                        "Unparsable input at end of dump (line {}): {e}",
                        reader.line_number()
                    );
                    return Ok(Some(Chunk {
                        text: buf,
                        statements: Vec::new(),
                    }));
                }
                debug!(
                    "Incomplete statement at line {}, reading more input",
                    reader.line_number()
                );
                conv.stats_add_reparsed();
            }
        }
    }
}

/// psql meta-commands such as `\connect` or `\restrict`.
fn is_meta_command(line: &str) -> bool {
    line.trim_start().starts_with('\\')
}

/// Whether `buf` holds nothing but blank lines and `--` comments.
fn only_comments(buf: &str) -> bool {
    buf.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with("--")
    })
}

/// Top-level statements of `buf` if it tokenizes cleanly, its last
/// significant token is `;` and no `BEGIN ATOMIC` body is left open.
fn complete_segments(buf: &str) -> Option<Vec<Vec<Token>>> {
    let tokens = Tokenizer::new(&PostgreSqlDialect {}, buf).tokenize().ok()?;
    let last = tokens
        .iter()
        .rev()
        .find(|t| !matches!(t, Token::Whitespace(_)))?;
    if *last != Token::SemiColon {
        return None;
    }
    split_statements(tokens)
}

/// Parse each top-level statement separately.
///
/// A statement the parser rejects is an error only when it is of a kind the
/// classifier acts on; anything else is skipped, as it would be if parsed.
fn parse_each(conv: &mut Conv, segments: Vec<Vec<Token>>) -> Vec<Statement> {
    let dialect = PostgreSqlDialect {};
    let mut statements = Vec::new();
    for segment in segments {
        let text: String = segment.iter().map(Token::to_string).collect();
        let tokens = segment.clone();
        match Parser::new(&dialect).with_tokens(segment).parse_statements() {
            Ok(parsed) => statements.extend(parsed),
            Err(e) => match handled_kind(&text) {
                Some(kind) if kind == ALTER_TABLE && unparsed_identity(conv, &tokens) => {
                    conv.schema_statement(kind);
                }
                Some(kind) => {
                    debug!("Unparsable {kind} statement: {e}");
                    conv.error_in_statement(kind);
                    if conv.schema_mode() {
                        conv.unexpected(format!("Unparsable {kind} statement"));
                    }
                }
                None => {
                    let kind = leading_keywords(&text);
                    debug!("Skipping unparsable {kind} statement: {e}");
                    conv.skip_statement(&kind);
                }
            },
        }
    }
    statements
}

/// Split at top-level `;`, keeping the terminator with its statement and
/// dropping segments that hold only whitespace and comments.
///
/// `;` inside a `BEGIN ATOMIC ... END` function body does not end the
/// statement. `None` if the tokens end inside such a body.
fn split_statements(tokens: Vec<Token>) -> Option<Vec<Vec<Token>>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    let mut atomic_depth = 0usize;
    let mut case_depth = 0usize;
    let mut prev_word = String::new();
    for token in tokens {
        if let Token::Word(w) = &token {
            let word = w.value.to_uppercase();
            match word.as_str() {
                "ATOMIC" if prev_word == "BEGIN" => atomic_depth += 1,
                "CASE" if atomic_depth > 0 => case_depth += 1,
                "END" if case_depth > 0 => case_depth -= 1,
                "END" if atomic_depth > 0 => atomic_depth -= 1,
                _ => {}
            }
            prev_word = word;
        } else if !matches!(token, Token::Whitespace(_)) {
            prev_word.clear();
        }
        let end = token == Token::SemiColon && atomic_depth == 0;
        current.push(token);
        if end {
            segments.push(std::mem::take(&mut current));
        }
    }
    if atomic_depth > 0 {
        return None;
    }
    segments.push(current);
    Some(
        segments
            .into_iter()
            .filter(|s| {
                s.iter()
                    .any(|t| !matches!(t, Token::Whitespace(_) | Token::SemiColon))
            })
            .collect(),
    )
}

/// Words of a statement with `--` comment lines removed.
pub(crate) fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines()
        .filter(|l| !l.trim_start().starts_with("--"))
        .flat_map(str::split_whitespace)
        .map(|w| w.trim_end_matches(';').to_uppercase())
}

/// First keyword of a statement, plus the object keyword for DDL verbs.
pub(crate) fn leading_keywords(text: &str) -> String {
    let mut words = words(text);
    let Some(first) = words.next() else {
        return "EMPTY".to_string();
    };
    match first.as_str() {
        "CREATE" | "ALTER" | "DROP" | "COMMENT" => match words.next() {
            Some(second) => format!("{first} {second}"),
            None => first,
        },
        _ => first,
    }
}
