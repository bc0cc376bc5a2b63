//! Input handling for file reading and stdin support.

use anyhow::{Context, Result};
use scopeflow_core::ScriptKind;
use std::io::{self, Read};
use std::path::PathBuf;

/// One script read from disk or stdin.
#[derive(Debug, Clone)]
pub struct ScriptSource {
    pub name: String,
    pub content: String,
    pub kind: ScriptKind,
}

/// Read script input from files or stdin.
///
/// If no files are provided, reads from stdin. `kind` overrides the file kind
/// otherwise picked from each file's extension.
pub fn read_input(files: &[PathBuf], kind: Option<ScriptKind>) -> Result<Vec<ScriptSource>> {
    if files.is_empty() {
        read_from_stdin(kind)
    } else {
        read_from_files(files, kind)
    }
}

/// Read a script from stdin
fn read_from_stdin(kind: Option<ScriptKind>) -> Result<Vec<ScriptSource>> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read from stdin")?;

    Ok(vec![ScriptSource {
        name: "<stdin>".to_string(),
        content,
        kind: kind.unwrap_or_default(),
    }])
}

/// Read scripts from multiple files
fn read_from_files(files: &[PathBuf], kind: Option<ScriptKind>) -> Result<Vec<ScriptSource>> {
    files
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;

            Ok(ScriptSource {
                name: path.display().to_string(),
                content,
                kind: kind.unwrap_or_else(|| ScriptKind::from_path(path)),
            })
        })
        .collect()
}
