//! CLI argument parsing using clap.

use chrono::NaiveDate;
use clap::{ArgAction, Parser, ValueEnum};
use scopeflow_core::{AnalysisOptions, ConditionalMode, ScriptKind};
use std::path::PathBuf;

/// ScopeFlow - script lineage analyzer
#[derive(Parser, Debug)]
#[command(name = "scopeflow")]
#[command(about = "Extract data lineage from batch query scripts", long_about = None)]
#[command(version)]
pub struct Args {
    /// Script files to analyze (reads from stdin if none provided)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// File kind; inferred from the extension when omitted (.view, .module, else script)
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// External parameter in KEY=VALUE format, substituted for @@KEY@@ (can be repeated)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Drop the body of #IF blocks instead of keeping every branch
    #[arg(long)]
    pub drop_conditional: bool,

    /// Annotate nodes with resolved links and implementation names
    #[arg(long)]
    pub annotate: bool,

    /// Reference date (YYYY-MM-DD) for date patterns; defaults to today minus five days
    #[arg(long, value_name = "DATE")]
    pub reference_date: Option<NaiveDate>,

    /// JSON file mapping stream paths to size labels, used with --annotate
    #[arg(long, value_name = "FILE", requires = "annotate")]
    pub sizes: Option<PathBuf>,

    /// Suppress issues on stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Analysis options derived from the flags.
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            conditional_mode: if self.drop_conditional {
                ConditionalMode::Drop
            } else {
                ConditionalMode::Keep
            },
            annotate: Some(self.annotate),
            reference_date: self.reference_date,
        }
    }

    /// Default log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// File kind options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Script,
    View,
    Module,
}

impl From<KindArg> for ScriptKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Script => ScriptKind::Script,
            KindArg::View => ScriptKind::View,
            KindArg::Module => ScriptKind::Module,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
}
