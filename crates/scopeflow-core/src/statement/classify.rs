use crate::parser::{Token, TokenKind};
use crate::types::StatementKind;

/// Keyword table in precedence order. Directive keywords only match in their
/// `#` form; the others match whole, upper-case identifier tokens.
const KEYWORD_TABLE: &[(&str, StatementKind)] = &[
    ("#DECLARE", StatementKind::Declare),
    ("#SET", StatementKind::Set),
    ("OUTPUT", StatementKind::Output),
    ("REDUCE", StatementKind::Reduce),
    ("SELECT", StatementKind::Select),
    ("PROCESS", StatementKind::Process),
    ("COMBINE", StatementKind::Combine),
    ("SSTREAM", StatementKind::StreamInput),
    ("EXTRACT", StatementKind::ExtractInput),
    ("VIEW", StatementKind::ViewInput),
    ("IMPORT", StatementKind::Import),
    ("USING", StatementKind::Using),
];

fn contains_keyword(tokens: &[Token<'_>], keyword: &str) -> bool {
    let wanted = if keyword.starts_with('#') {
        TokenKind::Directive
    } else {
        TokenKind::Ident
    };
    tokens.iter().any(|t| t.kind == wanted && t.text == keyword)
}

/// `name = Dotted.Name(...)` with no statement keyword.
fn is_module_reference(tokens: &[Token<'_>]) -> bool {
    let [name, eq, rest @ ..] = tokens else {
        return false;
    };
    if name.kind != TokenKind::Ident || !eq.is_punct("=") {
        return false;
    }

    let mut dots = 0;
    let mut i = 0;
    while i < rest.len() {
        let token = &rest[i];
        if i % 2 == 0 {
            if token.kind != TokenKind::Ident {
                return false;
            }
        } else if token.is_punct("(") {
            return dots > 0;
        } else if token.is_punct(".") {
            dots += 1;
        } else {
            return false;
        }
        i += 1;
    }
    false
}

/// Determines a statement's kind: the first keyword of the table that occurs
/// anywhere in the statement wins, then the implicit module reference.
/// `None` means the statement is not recognized.
pub fn classify(tokens: &[Token<'_>]) -> Option<StatementKind> {
    KEYWORD_TABLE
        .iter()
        .find(|(keyword, _)| contains_keyword(tokens, keyword))
        .map(|(_, kind)| *kind)
        .or_else(|| is_module_reference(tokens).then_some(StatementKind::ModuleInput))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::tokenize;
    use rstest::rstest;

    fn kind_of(text: &str) -> Option<StatementKind> {
        classify(&tokenize(text).unwrap())
    }

    #[rstest]
    #[case("#DECLARE @x string = \"SELECT\"", Some(StatementKind::Declare))]
    #[case("#SET @x = @y + \"OUTPUT\"", Some(StatementKind::Set))]
    #[case("OUTPUT a TO SSTREAM @Out", Some(StatementKind::Output))]
    #[case("x = SELECT * FROM (REDUCE a ON k USING R)", Some(StatementKind::Reduce))]
    #[case("x = SELECT * FROM SSTREAM @In", Some(StatementKind::Select))]
    #[case("x = PROCESS a USING P", Some(StatementKind::Process))]
    #[case("x = COMBINE a WITH b ON a.k == b.k USING C", Some(StatementKind::Combine))]
    #[case("x = SSTREAM @In", Some(StatementKind::StreamInput))]
    #[case("x = EXTRACT a:int FROM @In USING DefaultTextExtractor", Some(StatementKind::ExtractInput))]
    #[case("x = VIEW @V", Some(StatementKind::ViewInput))]
    #[case("x = IMPORT @M", Some(StatementKind::Import))]
    #[case("USING Some.Namespace", Some(StatementKind::Using))]
    #[case("x = Lib.Func(a, b)", Some(StatementKind::ModuleInput))]
    #[case("x = Func(a)", None)]
    #[case("x = select * from t", None)]
    #[case("RESOURCE @\"a.dll\"", None)]
    fn test_classify(#[case] text: &str, #[case] expected: Option<StatementKind>) {
        assert_eq!(kind_of(text), expected);
    }
}
