use crate::preprocess::literals::literal_end;

/// Marker that opens an embedded host-language code block.
pub const HOST_CODE_MARKER: &str = "#CS";

/// One `;`-terminated statement of normalized script text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatement {
    /// Zero-based index among the non-empty statements
    pub index: usize,
    /// Trimmed statement text without the terminator
    pub text: String,
    /// Byte offset of the untrimmed statement in the script
    pub offset: usize,
}

/// Statements of a script plus where splitting stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitStatements {
    pub statements: Vec<RawStatement>,
    /// Byte offset of the piece holding a host code block marker, when one was found.
    pub halted_at: Option<usize>,
}

/// Splits normalized text on `;`.
///
/// Empty pieces are skipped. The first piece containing the host code block
/// marker ends the script: it and everything after it are dropped. Semicolons
/// inside literals never split, though preprocessing normally removes them.
pub fn split_statements(text: &str) -> SplitStatements {
    let mut out = SplitStatements::default();

    for (offset, piece) in pieces(text) {
        if piece.contains(HOST_CODE_MARKER) {
            out.halted_at = Some(offset);
            break;
        }
        let trimmed = piece.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.statements.push(RawStatement {
            index: out.statements.len(),
            text: trimmed.to_string(),
            offset,
        });
    }

    out
}

fn pieces(text: &str) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(text, i);
                continue;
            }
            b';' => {
                out.push((start, &text[start..i]));
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    out.push((start, &text[start..]));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_skips_empty_pieces() {
        let split = split_statements("a = SSTREAM @x;\n;  ;\nb = SELECT * FROM a;\n");
        let texts: Vec<_> = split.statements.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a = SSTREAM @x", "b = SELECT * FROM a"]);
        assert_eq!(split.statements[1].index, 1);
        assert!(split.halted_at.is_none());
    }

    #[test]
    fn test_host_code_block_halts_permanently() {
        let split = split_statements("a = SSTREAM @x;\nb = SELECT 1 FROM a\n#CS\nclass X {};\n#ENDCS\nc = SELECT * FROM b;");
        assert_eq!(split.statements.len(), 1);
        assert_eq!(split.halted_at, Some(15));
    }

    #[test]
    fn test_literal_semicolon_does_not_split() {
        let split = split_statements(r#"x = EXTRACT a FROM "p;q" USING E;"#);
        assert_eq!(split.statements.len(), 1);
    }
}
