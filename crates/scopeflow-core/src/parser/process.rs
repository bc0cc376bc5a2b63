//! `PROCESS`, `REDUCE` and `COMBINE` grammar.

use super::cursor::Cursor;
use super::source::{parse_source_item, SourceList};
use crate::error::ParseError;

/// The parts of a processing statement that matter for lineage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessClause {
    pub sources: SourceList,
    /// Implementation named by `USING`, without its arguments.
    pub using: Option<String>,
}

/// `PROCESS|REDUCE|COMBINE [src {, src}] [WITH src] [ON ...] [PRESORT ...]
/// [USING impl(args)] [PRODUCE ...] ...`
///
/// An empty source list means the statement continues from the previous result.
pub(crate) fn parse_process(c: &mut Cursor<'_, '_>, keyword: &str) -> Result<ProcessClause, ParseError> {
    c.expect_ident(keyword)?;
    let mut clause = ProcessClause::default();

    while !c.at_clause_boundary() {
        parse_source_item(c, &mut clause.sources)?;
        if !c.eat_punct(",") {
            break;
        }
    }

    if c.eat_ident("WITH") {
        parse_source_item(c, &mut clause.sources)?;
    }

    c.skip_balanced_until(|t| t.is_ident("USING"));
    if c.eat_ident("USING") {
        clause.using = Some(c.dotted_name()?);
    }

    Ok(clause)
}
