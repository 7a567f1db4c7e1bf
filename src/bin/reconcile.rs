use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser};
use nfn_reconcile::{
    InputFormat, OutputTargets, ReconcileError, ReconcileOptions, ReconcileReport,
    reconcile_to_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "reconcile",
    version,
    about = "Reconcile crowd-sourced transcriptions into one consensus row per subject"
)]
struct Cli {
    #[command(flatten)]
    args: ReconcileArgs,
}

#[derive(Debug, Args)]
struct ReconcileArgs {
    /// Classification export, or a plain CSV/JSON file.
    input: PathBuf,

    /// Input format: nfn, csv or json.
    #[arg(long, default_value = "nfn")]
    format: String,

    /// Workflow export used to decode coded select values.
    #[arg(long)]
    workflow_csv: Option<PathBuf>,

    /// Workflow to reconcile when the export holds several.
    #[arg(long)]
    workflow_id: Option<String>,

    /// Column types for CSV/JSON input, as name:type[,name:type...]. Repeatable.
    #[arg(short = 'c', long = "column-types")]
    column_types: Vec<String>,

    /// Column holding the subject key.
    #[arg(long, default_value = "subject_id")]
    group_by: String,

    /// Column identifying each transcription.
    #[arg(long, default_value = "classification_id")]
    key_column: String,

    /// Column holding the transcriber's name; empty to skip it.
    #[arg(long, default_value = "user_name")]
    user_column: String,

    /// Merged output CSV path.
    #[arg(short = 'o', long = "merged", alias = "output")]
    merged: Option<PathBuf>,

    /// Reconciled output CSV path.
    #[arg(long)]
    reconciled: Option<PathBuf>,

    /// Explanations output CSV path.
    #[arg(long)]
    explanations: Option<PathBuf>,

    /// Unreconciled (flattened) output CSV path.
    #[arg(long)]
    unreconciled: Option<PathBuf>,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Log progress and list every warning.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_options(args: &ReconcileArgs) -> Result<ReconcileOptions> {
    let format = InputFormat::from_str(&args.format)
        .map_err(|error| anyhow!(error))
        .context("failed to parse --format")?;

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let user_column = Some(args.user_column.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    Ok(ReconcileOptions {
        format,
        group_by: args.group_by.clone(),
        row_key: args.key_column.clone(),
        user_column,
        workflow_id: args.workflow_id.clone(),
        workflow_csv: args.workflow_csv.clone(),
        column_types: args.column_types.clone(),
        delimiter: args.delimiter as u8,
    })
}

fn outputs(args: &ReconcileArgs) -> OutputTargets {
    OutputTargets {
        merged: args.merged.clone(),
        reconciled: args.reconciled.clone(),
        explanations: args.explanations.clone(),
        unreconciled: args.unreconciled.clone(),
    }
}

fn log_report(report: &ReconcileReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} row={:?} task={:?}: {}",
                warning.code, warning.row_key, warning.task_id, warning.message
            );
        }
    }
}

fn log_error(error: &anyhow::Error) {
    match error.downcast_ref::<ReconcileError>() {
        Some(ReconcileError::Validation(messages)) => {
            eprintln!("error: {error}");
            for message in messages {
                eprintln!("  - {message}");
            }
        }
        _ => eprintln!("error: {error:#}"),
    }
}

fn run_reconcile(args: &ReconcileArgs) -> Result<ReconcileReport> {
    let options = parse_options(args)?;
    reconcile_to_csv(&args.input, &outputs(args), &options)
        .with_context(|| format!("failed to reconcile '{}'", args.input.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let args = cli.args;

    let default_filter = if args.verbose {
        "nfn_reconcile=info"
    } else {
        "nfn_reconcile=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run_reconcile(&args) {
        Ok(report) => {
            log_report(&report, args.verbose);
            if report.subject_count > 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(error) => {
            log_error(&error);
            ExitCode::from(1)
        }
    }
}
