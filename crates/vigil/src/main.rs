//! Vigil command-line interface.
//!
//! Thin I/O wrapper around the core crates: `vigil analyze` checks a Python
//! file against the constraint rules, `vigil highlight` scores completion
//! positions from a JSON dump of token alternatives. All real logic lives
//! in `vigil_analyzer` and `vigil_highlight`; this binary only reads files,
//! picks an output format, and maps the summary onto an exit code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use vigil_analyzer::ConstraintAnalyzer;
use vigil_highlight::{Highlighter, DEFAULT_HIGHLIGHT_THRESHOLD};
use vigil_protocol::{
    AnalyzerConfig, ComplianceStatus, ConstraintViolation, PositionAlternatives,
    ViolationsSummary,
};

#[derive(Parser)]
#[command(name = "vigil", version, about = "Review assistant for LLM code completions")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a Python file against the constraint rules
    Analyze {
        /// File to analyze
        file: PathBuf,
        /// Rule configuration file (JSON); built-in defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score completion positions from a JSON array of token alternatives
    Highlight {
        /// JSON file: array of positions, each an array of
        /// {token, probability, importance?, category?}
        file: PathBuf,
        /// Entropy threshold above which a position is highlighted
        #[arg(long, default_value_t = DEFAULT_HIGHLIGHT_THRESHOLD)]
        threshold: f64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the built-in rule configuration (a starter config file)
    DefaultConfig,
}

#[derive(Serialize)]
struct AnalysisReport {
    violations: Vec<ConstraintViolation>,
    summary: ViolationsSummary,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = vigil_logging::init_logging(vigil_logging::LogConfig {
        app_name: "vigil",
        verbose: cli.verbose,
    }) {
        eprintln!("failed to initialize logging: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Analyze { file, config, json } => cmd_analyze(file, config, json),
        Command::Highlight {
            file,
            threshold,
            json,
        } => cmd_highlight(file, threshold, json),
        Command::DefaultConfig => {
            println!("{}", AnalyzerConfig::default_json());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_analyze(file: PathBuf, config: Option<PathBuf>, json: bool) -> Result<ExitCode> {
    let code = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let analyzer = match config {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            // Malformed configuration is recoverable: the analyzer falls
            // back to built-in defaults and logs a warning.
            ConstraintAnalyzer::from_json_config(&raw)
        }
        None => ConstraintAnalyzer::new(),
    };

    let violations = analyzer.analyze(&code);
    let summary = analyzer.summarize(&violations);
    let non_compliant = summary.status == ComplianceStatus::NonCompliant;

    if json {
        let report = AnalysisReport {
            violations,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if violations.is_empty() {
            println!("{}: no violations", file.display());
        } else {
            for violation in &violations {
                println!(
                    "{}:{}:{}: [{}] {}: {}",
                    file.display(),
                    violation.line,
                    violation.column,
                    violation.severity,
                    violation.rule,
                    violation.explanation
                );
                if !violation.code_snippet.is_empty() {
                    println!("    {}", violation.code_snippet);
                }
            }
        }
        println!(
            "status: {} ({} violations)",
            summary.status, summary.total_violations
        );
    }

    if non_compliant {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_highlight(file: PathBuf, threshold: f64, json: bool) -> Result<ExitCode> {
    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let positions: Vec<PositionAlternatives> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid alternatives JSON in {}", file.display()))?;

    let highlighter = Highlighter::with_threshold(threshold);
    let report = highlighter.highlight(&positions);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (position, score) in report.entropy_scores.iter().enumerate() {
            let marker = if report.highlighted_positions.contains(&position) {
                " <- review"
            } else {
                ""
            };
            println!("position {:>3}: entropy {:.3}{}", position, score, marker);
        }
        println!(
            "{} of {} positions highlighted (threshold {})",
            report.highlighted_positions.len(),
            report.entropy_scores.len(),
            threshold
        );
    }
    Ok(ExitCode::SUCCESS)
}
