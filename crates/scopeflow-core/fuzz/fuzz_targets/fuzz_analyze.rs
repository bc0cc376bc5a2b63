//! Fuzz target for the script analyzer.
//!
//! This tests that `analyze()` doesn't panic on arbitrary script inputs.

#![no_main]

use arbitrary::Arbitrary;
use scopeflow_core::{analyze, AnalysisOptions, AnalyzeRequest, ConditionalMode, ScriptKind};
use libfuzzer_sys::fuzz_target;

/// Structured input for fuzzing - exercises every file kind and option.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    script: String,
    kind_idx: u8,
    drop_conditional: bool,
    annotate: bool,
    params: Vec<(String, String)>,
}

impl FuzzInput {
    fn kind(&self) -> ScriptKind {
        match self.kind_idx % 3 {
            0 => ScriptKind::Script,
            1 => ScriptKind::View,
            _ => ScriptKind::Module,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let options = AnalysisOptions {
        conditional_mode: if input.drop_conditional {
            ConditionalMode::Drop
        } else {
            ConditionalMode::Keep
        },
        annotate: Some(input.annotate),
        reference_date: None,
    };
    let mut request = AnalyzeRequest::new(input.script.clone())
        .with_kind(input.kind())
        .with_options(options);
    for (key, value) in input.params {
        request = request.with_param(key, value);
    }

    // Bad statements are reported as issues, never as panics.
    let result = analyze(&request);
    for edge in &result.edges {
        assert!(edge.from < result.nodes.len() && edge.to < result.nodes.len());
    }
});
