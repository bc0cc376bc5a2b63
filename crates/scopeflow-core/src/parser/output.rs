//! `OUTPUT` grammar.

use super::cursor::Cursor;
use super::source::{parse_source_item, SourceList};
use crate::error::{ParseError, ParseErrorKind};
use crate::preprocess::literals::unquote;

/// Keywords that end the output path.
const PATH_TERMINATORS: &[&str] = &["CLUSTERED", "SORTED", "USING", "WITH", "PARTITIONED"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputClause {
    pub sources: SourceList,
    pub path: String,
}

/// `OUTPUT [src {, src}] TO [SSTREAM] path [CLUSTERED BY ...] [SORTED BY ...] [USING ...]`
pub(crate) fn parse_output(c: &mut Cursor<'_, '_>) -> Result<OutputClause, ParseError> {
    c.expect_ident("OUTPUT")?;
    let mut clause = OutputClause::default();

    while !c.at_end() && !c.check_ident("TO") {
        parse_source_item(c, &mut clause.sources)?;
        if !c.eat_punct(",") {
            break;
        }
    }

    if !c.eat_ident("TO") {
        return Err(c.error("OUTPUT requires TO").with_kind(ParseErrorKind::MissingClause));
    }
    c.eat_ident("SSTREAM");

    let start = c.mark();
    c.skip_balanced_until(|t| PATH_TERMINATORS.iter().any(|word| t.is_ident(word)));
    let path = unquote(c.text_since(start));
    if path.is_empty() {
        return Err(c.error("OUTPUT requires a path").with_kind(ParseErrorKind::MissingClause));
    }
    clause.path = path;

    Ok(clause)
}
