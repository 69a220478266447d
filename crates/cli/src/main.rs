mod config;
mod output;
mod walk;

use anyhow::Result;
use clap::{Parser, Subcommand};
use iamscan_core::{Report, Scanner};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use output::Format;

#[derive(Parser, Debug)]
#[command(author, version, about = "iamscan — static IAM policy checks for Terraform")]
struct Cli {
    /// Config file (YAML); defaults to <folder>/.iamscan.yaml when present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, global = true)]
    format: Option<Format>,

    /// Exit with status 1 when anything is reported
    #[arg(long, default_value_t = false, global = true)]
    fail_on_findings: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Scan Terraform files
    Terraform {
        /// Folder containing the relevant files
        #[arg(short, long, default_value = ".")]
        folder: PathBuf,
    },
}

struct ScanOutcome {
    report: Report,
    scanned: usize,
    skipped: usize,
}

/// Parses and scans files in parallel; results are merged in input order.
fn scan_files(scanner: &Scanner, files: &[PathBuf]) -> ScanOutcome {
    let results: Vec<_> = files
        .par_iter()
        .map(|p| {
            let file = p.to_string_lossy().into_owned();
            iamscan_tfcompat::parse_file(p).map(|body| scanner.scan_body(&file, &body))
        })
        .collect();

    let mut out = ScanOutcome { report: Report::new(), scanned: 0, skipped: 0 };
    for (path, res) in files.iter().zip(results) {
        match res {
            Ok(findings) => {
                out.scanned += 1;
                out.report.extend(findings);
            }
            Err(e) => {
                out.skipped += 1;
                tracing::warn!(file = %path.display(), error = %e, "skipping file");
            }
        }
    }
    out
}

fn run_terraform(cli: &Cli, folder: &Path) -> Result<ExitCode> {
    let cfg = config::load(cli.config.as_deref(), folder)?;
    let format = cli.format.or(cfg.format).unwrap_or_default();
    let fail_on_findings = cli.fail_on_findings || cfg.fail_on_findings;
    let exclude = cfg.exclude_patterns()?;

    if format == Format::Table {
        eprintln!("Scanning Terraform files in: {}", folder.display());
    }
    let files = walk::terraform_files(folder, &exclude)?;
    let scanner = cfg.aws.scanner();
    tracing::debug!(files = files.len(), analyzers = ?scanner.analyzers().collect::<Vec<_>>(), "scan start");

    let outcome = scan_files(&scanner, &files);
    let rendered = output::render(outcome.report.findings(), format)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;

    eprintln!(
        "{} file(s) scanned, {} skipped, {} finding(s)",
        outcome.scanned,
        outcome.skipped,
        outcome.report.len()
    );
    if fail_on_findings && !outcome.report.is_empty() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_span_events(FmtSpan::CLOSE)
        .init();
    let cli = Cli::parse();

    let res = match &cli.cmd {
        Cmd::Terraform { folder } => {
            let _span = tracing::info_span!("terraform", folder = %folder.display()).entered();
            run_terraform(&cli, folder)
        }
    };
    match res {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
