//! Grammar parsers producing [`StatementRecord`]s.
//!
//! Each statement is tokenized once and handed to the grammar for its
//! classified kind. A failing statement yields a [`ParseError`] and never
//! affects its neighbours.

mod cursor;
mod declare;
mod expr;
mod input;
pub mod lexer;
mod output;
mod process;
mod select;
mod source;

pub use declare::MAP_TYPE;
pub use expr::{parse_expression, Expr, Literal};
pub use lexer::{tokenize, Token, TokenKind};
pub use select::SelectQuery;
pub use source::SourceList;

use crate::error::ParseError;
use crate::types::{StatementKind, StatementRecord};
use cursor::Cursor;
use expr::is_reserved;

/// Parses one statement of an already classified kind.
pub fn parse_statement(text: &str, kind: StatementKind) -> Result<StatementRecord, ParseError> {
    let tokens = tokenize(text)?;
    parse_tokens(text, &tokens, kind)
}

/// Parses already tokenized statement text.
pub fn parse_tokens(
    text: &str,
    tokens: &[Token<'_>],
    kind: StatementKind,
) -> Result<StatementRecord, ParseError> {
    let mut c = Cursor::new(text, tokens);

    match kind {
        StatementKind::Declare => {
            let decl = declare::parse_declare(&mut c)?;
            let mut record = StatementRecord::new(kind).with_assign(decl.name);
            record.declared_type = decl.declared_type;
            record.rvalue = Some(decl.rvalue);
            Ok(record)
        }
        StatementKind::Set => {
            let decl = declare::parse_set(&mut c)?;
            let mut record = StatementRecord::new(kind).with_assign(decl.name);
            record.rvalue = Some(decl.rvalue);
            Ok(record)
        }
        StatementKind::Using => Err(ParseError::unsupported(
            "USING statements do not contribute to lineage",
        )),
        _ => {
            let assign = parse_assignment(&mut c);
            if kind == StatementKind::Import && assign.is_none() {
                return Err(ParseError::unsupported(
                    "IMPORT without an assignment does not contribute to lineage",
                ));
            }
            let kind = refine_kind(&c, kind);
            let mut record = parse_body(&mut c, kind)?;
            record.assign_var = assign;
            Ok(record)
        }
    }
}

/// `name =` at the start of a statement.
fn parse_assignment(c: &mut Cursor<'_, '_>) -> Option<String> {
    let is_assignment = c
        .peek()
        .is_some_and(|t| t.kind == TokenKind::Ident && !is_reserved(t.text))
        && c.peek_at(1).is_some_and(|t| t.is_punct("="));
    if !is_assignment {
        return None;
    }
    let name = c.advance().map(|t| t.text.to_string());
    c.advance();
    name
}

/// The keyword table classifies a statement by the first listed keyword it
/// contains anywhere, so `x = SELECT * FROM (REDUCE ...)` is classified as a
/// reduce. When the statement body itself opens with a different transform
/// keyword, that keyword's grammar is the one that can parse it.
fn refine_kind(c: &Cursor<'_, '_>, kind: StatementKind) -> StatementKind {
    if !kind.is_transform() {
        return kind;
    }
    match c.peek().map(|t| t.text) {
        Some("SELECT") => StatementKind::Select,
        Some("PROCESS") => StatementKind::Process,
        Some("REDUCE") => StatementKind::Reduce,
        Some("COMBINE") => StatementKind::Combine,
        _ => kind,
    }
}

fn parse_body(c: &mut Cursor<'_, '_>, kind: StatementKind) -> Result<StatementRecord, ParseError> {
    let mut record = StatementRecord::new(kind);

    match kind {
        StatementKind::Select => {
            let query = select::parse_select_statement(c)?;
            record.sources = query.sources.sources;
            record.params = query.sources.params;
            record.columns = query.columns;
        }
        StatementKind::Process | StatementKind::Reduce | StatementKind::Combine => {
            let keyword = match kind {
                StatementKind::Process => "PROCESS",
                StatementKind::Reduce => "REDUCE",
                _ => "COMBINE",
            };
            let clause = process::parse_process(c, keyword)?;
            record.sources = clause.sources.sources;
            record.params = clause.sources.params;
            record.using_clause = clause.using;
        }
        StatementKind::Output => {
            let clause = output::parse_output(c)?;
            record.sources = clause.sources.sources;
            record.params = clause.sources.params;
            record.path = Some(clause.path);
        }
        _ => {
            let clause = input::parse_input(c, kind)?;
            record.sources = vec![clause.source_name()];
            record.params = clause.params;
            if kind != StatementKind::ModuleInput {
                record.path = Some(clause.resource);
            }
        }
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;
    use rstest::rstest;

    #[test]
    fn test_select_record() {
        let record = parse_statement(
            "Joined = SELECT a.k, b.v AS value FROM a INNER JOIN b ON a.k == b.k",
            StatementKind::Select,
        )
        .unwrap();
        assert_eq!(record.assign_var.as_deref(), Some("Joined"));
        assert_eq!(record.sources, vec!["a", "b"]);
        assert_eq!(record.columns, vec!["a.k", "value"]);
    }

    #[test]
    fn test_process_record_without_assignment() {
        let record = parse_statement("PROCESS Foo USING Bar()", StatementKind::Process).unwrap();
        assert!(record.assign_var.is_none());
        assert_eq!(record.sources, vec!["Foo"]);
        assert_eq!(record.using_clause.as_deref(), Some("Bar"));
    }

    #[test]
    fn test_kind_refined_by_leading_keyword() {
        let record = parse_statement(
            "x = SELECT * FROM (REDUCE a ON k USING R)",
            StatementKind::Reduce,
        )
        .unwrap();
        assert_eq!(record.kind, StatementKind::Select);
        assert_eq!(record.sources, vec!["a"]);
    }

    #[rstest]
    #[case("x = PROCESS a USING P", StatementKind::Process)]
    #[case("x = REDUCE a ON k USING R", StatementKind::Reduce)]
    #[case("x = COMBINE a AS l WITH b AS r ON l.k == r.k USING C", StatementKind::Combine)]
    #[case("x = SELECT k FROM a", StatementKind::Select)]
    fn test_assigned_transform_takes_keyword_kind(
        #[case] text: &str,
        #[case] expected: StatementKind,
    ) {
        let record = parse_statement(text, StatementKind::Select).unwrap();
        assert_eq!(record.kind, expected);
        assert_eq!(record.assign_var.as_deref(), Some("x"));
        assert_eq!(record.sources.first().map(String::as_str), Some("a"));
    }

    #[test]
    fn test_input_record() {
        let record = parse_statement(r#"Raw = SSTREAM @"/data/raw.ss""#, StatementKind::StreamInput).unwrap();
        assert_eq!(record.assign_var.as_deref(), Some("Raw"));
        assert_eq!(record.sources, vec!["SSTREAM_/data/raw.ss"]);
        assert_eq!(record.path.as_deref(), Some("/data/raw.ss"));
    }

    #[test]
    fn test_module_reference_record() {
        let record = parse_statement("m = Lib.Func(Raw, 3)", StatementKind::ModuleInput).unwrap();
        assert_eq!(record.sources, vec!["MODULE_Lib.Func"]);
        assert_eq!(record.params, vec!["Raw"]);
        assert!(record.path.is_none());
    }

    #[test]
    fn test_output_record() {
        let record = parse_statement(r#"OUTPUT Joined TO "/out/x.ss""#, StatementKind::Output).unwrap();
        assert_eq!(record.sources, vec!["Joined"]);
        assert_eq!(record.path.as_deref(), Some("/out/x.ss"));
    }

    #[test]
    fn test_declare_record() {
        let record = parse_statement("#DECLARE @n int = 5", StatementKind::Declare).unwrap();
        assert_eq!(record.assign_var.as_deref(), Some("@n"));
        assert_eq!(record.rvalue.as_deref(), Some("5"));
        assert_eq!(record.declared_type.as_deref(), Some("int"));
    }

    #[test]
    fn test_unsupported_statements() {
        let err = parse_statement("USING Some.Namespace", StatementKind::Using).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnsupportedFeature);
        let err = parse_statement(r#"IMPORT "/lib/a.module""#, StatementKind::Import).unwrap_err();
        assert!(err.is_unsupported());
        let record = parse_statement(r#"m = IMPORT "/lib/a.module""#, StatementKind::Import).unwrap();
        assert_eq!(record.sources, vec!["IMPORT_/lib/a.module"]);
    }

    #[test]
    fn test_syntax_error_has_position() {
        let err = parse_statement("x = SELECT FROM", StatementKind::Select).unwrap_err();
        assert!(err.position.is_some());
    }
}
