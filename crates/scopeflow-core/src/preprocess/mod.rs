//! Textual normalization of raw script source.
//!
//! Each pass is a pure `&str -> String` function; [`preprocess`] runs them in
//! a fixed order so later passes see the output of earlier ones (parameters
//! are substituted before loops are unrolled, hints are stripped before
//! semicolons inside literals are removed, and so on).

mod comments;
mod conditionals;
mod encoding;
mod hints;
pub(crate) mod literals;
mod loops;
mod params;

pub use comments::{collapse_blank_lines, strip_comments};
pub use conditionals::resolve_conditionals;
pub use encoding::{strip_non_target_encoding, strip_reserved_split_chars};
pub use hints::strip_data_hints;
pub use loops::expand_loops;
pub use params::{normalize_date_params, substitute_external_params};

use crate::types::ConditionalMode;
use std::collections::HashMap;
#[cfg(feature = "tracing")]
use tracing::debug;

/// Inputs to the preprocessing pipeline.
#[derive(Debug, Clone, Default)]
pub struct PreprocessOptions {
    pub conditional_mode: ConditionalMode,
    /// Already date-normalized external parameters.
    pub external_params: HashMap<String, String>,
}

impl PreprocessOptions {
    pub fn new(conditional_mode: ConditionalMode) -> Self {
        Self {
            conditional_mode,
            external_params: HashMap::new(),
        }
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.external_params = params;
        self
    }
}

/// Runs every normalization pass over `text`.
pub fn preprocess(text: &str, options: &PreprocessOptions) -> String {
    let text = strip_comments(text);
    let text = resolve_conditionals(&text, options.conditional_mode.keeps_content());
    let text = substitute_external_params(&text, &options.external_params);
    let text = expand_loops(&text);
    let text = strip_data_hints(&text);
    let text = strip_reserved_split_chars(&text);
    let text = strip_non_target_encoding(&text);
    let text = collapse_blank_lines(&text);

    #[cfg(feature = "tracing")]
    debug!(bytes = text.len(), "preprocessed script");

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order() {
        let script = "// header\n\
            #DECLARE @n int = 2;\n\
            LOOP(i, @n) { s@@i@@ = SSTREAM \"@@Root@@/p@@i@@;x.ss\"; }\n\
            [PIN] o = SELECT * FROM s0;\n\n\n";
        let options = PreprocessOptions::default().with_params(
            [("Root".to_string(), "/data".to_string())]
                .into_iter()
                .collect(),
        );
        let out = preprocess(script, &options);

        assert!(!out.contains("header"));
        assert!(!out.contains("LOOP"));
        assert!(!out.contains("[PIN]"));
        assert!(out.contains("s0 = SSTREAM \"/data/p0x.ss\";"));
        assert!(out.contains("s1 = SSTREAM \"/data/p1x.ss\";"));
        assert!(!out.ends_with('\n'));
    }

    #[test]
    fn test_drop_mode_is_honored() {
        let script = "a = SSTREAM \"x\";\n#IF (true)\nb = SELECT * FROM a;\n#ENDIF\n";
        let out = preprocess(script, &PreprocessOptions::new(ConditionalMode::Drop));
        assert_eq!(out, "a = SSTREAM \"x\";");
    }
}
