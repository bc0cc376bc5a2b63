//! Fuzz target for the preprocessor and statement splitter.
//!
//! This tests that `preprocess()` and `split_statements()` don't panic on arbitrary inputs.

#![no_main]

use arbitrary::Arbitrary;
use scopeflow_core::{preprocess, split_statements, ConditionalMode, PreprocessOptions};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    text: String,
    keep_conditionals: bool,
    params: HashMap<String, String>,
}

fuzz_target!(|input: FuzzInput| {
    let mode = if input.keep_conditionals {
        ConditionalMode::Keep
    } else {
        ConditionalMode::Drop
    };
    let options = PreprocessOptions::new(mode).with_params(input.params);

    let text = preprocess(&input.text, &options);
    let _split = split_statements(&text);
});
