//! ScopeFlow CLI - script lineage analyzer

use scopeflow_cli::cli;
use scopeflow_cli::input::{self, ScriptSource};
use scopeflow_cli::output;
use scopeflow_cli::sizes::SizeCatalog;

use anyhow::{Context, Result};
use clap::Parser;
use scopeflow_core::{
    analyze_with_provider, AnalysisOptions, AnalyzeRequest, Severity, StreamInfoProvider,
};
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cli::{Args, OutputFormat};
use output::{format_json, format_table, ScriptReport};

/// Analysis errors in at least one script.
const EXIT_FAILURE: u8 = 1;
/// Configuration or I/O error (unreadable input, bad catalog, unwritable output).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("scopeflow: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

/// Logs go to stderr so they never mix with JSON on stdout.
fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: Args) -> Result<bool> {
    let sources = input::read_input(&args.files, args.kind.map(Into::into))?;
    let catalog = args
        .sizes
        .as_deref()
        .map(SizeCatalog::load)
        .transpose()?;
    if let Some(catalog) = &catalog {
        info!(entries = catalog.len(), "loaded size catalog");
    }
    let provider = catalog.as_ref().map(|c| c as &dyn StreamInfoProvider);

    let options = args.analysis_options();
    let reports: Vec<_> = sources
        .into_iter()
        .map(|source| {
            let request = build_request(source, &args, options.clone());
            debug!(source = ?request.source_name, kind = ?request.script_kind, "analyzing");
            ScriptReport {
                source: request.source_name.clone().unwrap_or_default(),
                result: analyze_with_provider(&request, provider),
            }
        })
        .collect();

    let output_str = match args.format {
        OutputFormat::Json => {
            format_json(&reports, args.compact).context("Failed to serialize JSON")?
        }
        OutputFormat::Table => format_table(&reports, args.quiet, !args.quiet),
    };

    write_output(&args.output, &output_str)?;

    if !args.quiet && args.format != OutputFormat::Table {
        print_issues_to_stderr(&reports);
    }

    Ok(reports.iter().any(|r| r.result.summary.has_errors))
}

fn build_request(source: ScriptSource, args: &Args, options: AnalysisOptions) -> AnalyzeRequest {
    let mut request = AnalyzeRequest::new(source.content)
        .with_kind(source.kind)
        .with_options(options);
    request.source_name = Some(source.name);
    for (key, value) in &args.params {
        request = request.with_param(key.clone(), value.clone());
    }
    request
}

fn write_output(path: &Option<std::path::PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure newline at end for terminal output
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn print_issues_to_stderr(reports: &[ScriptReport]) {
    for report in reports {
        for issue in &report.result.issues {
            let level = match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info => "info",
            };

            let location = issue
                .statement_index
                .map(|i| format!(" (statement {i})"))
                .unwrap_or_default();

            eprintln!("scopeflow: {level}: {}{location}: {}", report.source, issue.message);
        }
    }
}
