//! Statement splitting and classification.

mod classify;
mod split;

pub use classify::classify;
pub use split::{split_statements, RawStatement, SplitStatements, HOST_CODE_MARKER};
