//! Character-level cleanup before statement splitting.

use super::literals::map_literals;

/// Removes `;` characters inside quoted literals so they cannot split a statement.
pub fn strip_reserved_split_chars(text: &str) -> String {
    map_literals(text, |literal| literal.replace(';', ""))
}

/// Drops characters outside the target encoding (ASCII), including a UTF-8 BOM.
pub fn strip_non_target_encoding(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicolons_in_literals_are_removed() {
        let text = r#"x = EXTRACT a FROM "a;b.tsv" USING E(delimiter: ';');"#;
        assert_eq!(
            strip_reserved_split_chars(text),
            r#"x = EXTRACT a FROM "ab.tsv" USING E(delimiter: '');"#
        );
    }

    #[test]
    fn test_non_ascii_is_dropped() {
        assert_eq!(strip_non_target_encoding("\u{feff}x = “y”;"), "x = y;");
    }
}
