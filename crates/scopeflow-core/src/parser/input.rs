//! Input statements: `EXTRACT`, `SSTREAM` (streams and streamsets), `VIEW`,
//! `IMPORT` and implicit module references.

use super::cursor::Cursor;
use super::source::{parse_extract, parse_module_params, parse_stream, parse_view_like};
use crate::error::ParseError;
use crate::types::{SourcePrefix, StatementKind};

/// The synthetic source of an input statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputClause {
    pub prefix: SourcePrefix,
    /// Resource path, or the dotted module name for module references.
    pub resource: String,
    pub params: Vec<String>,
}

impl InputClause {
    fn new(prefix: SourcePrefix, resource: String) -> Self {
        Self {
            prefix,
            resource,
            params: Vec::new(),
        }
    }

    /// `PREFIX_resource`
    pub fn source_name(&self) -> String {
        self.prefix.tag(&self.resource)
    }
}

/// Parses the right-hand side of an input statement. Trailing clauses
/// (`USING`, `PARAMS`, stream options) do not affect lineage and are ignored.
pub(crate) fn parse_input(c: &mut Cursor<'_, '_>, kind: StatementKind) -> Result<InputClause, ParseError> {
    match kind {
        StatementKind::ExtractInput => Ok(InputClause::new(SourcePrefix::Extract, parse_extract(c)?)),
        StatementKind::StreamInput => {
            let (prefix, path) = parse_stream(c)?;
            Ok(InputClause::new(prefix, path))
        }
        StatementKind::ViewInput => Ok(InputClause::new(SourcePrefix::View, parse_view_like(c, "VIEW")?)),
        StatementKind::Import => Ok(InputClause::new(SourcePrefix::Import, parse_view_like(c, "IMPORT")?)),
        StatementKind::ModuleInput => {
            let name = c.dotted_name()?;
            let params = parse_module_params(c)?;
            Ok(InputClause {
                prefix: SourcePrefix::Module,
                resource: name,
                params,
            })
        }
        other => Err(ParseError::new(format!("{other:?} is not an input statement"))),
    }
}
