//! hint CLI binary entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use hinttool::cli::{run_annotate, AnnotateRequest};
use hinttool::output::{render_diff, render_json, render_summary, AnnotateReport, ErrorReport};
use hinttool::python::{AnnotateOptions, OracleKind, PythonLevel};

/// Best-effort type annotation insertion engine for Python sources.
#[derive(Parser)]
#[command(name = "hint")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert best-effort type annotations into Python sources.
    Annotate {
        /// Files or directories to annotate (default: current directory)
        paths: Vec<PathBuf>,

        /// Apply changes to disk (default: check mode, report only)
        #[arg(long)]
        write: bool,

        /// Print a unified diff of the edits
        #[arg(long, conflicts_with = "json")]
        diff: bool,

        /// Print the JSON report
        #[arg(long)]
        json: bool,

        /// Target Python version (e.g. 3.8 or 2.7); decides inline vs
        /// comment annotation syntax
        #[arg(long, value_name = "VERSION")]
        python_version: Option<String>,

        /// Infer types from literals instead of stubbing every slot as Any
        #[arg(long)]
        infer: bool,

        /// Only annotate variable targets
        #[arg(long, conflicts_with = "functions_only")]
        variables_only: bool,

        /// Only annotate function signatures
        #[arg(long)]
        functions_only: bool,

        /// Exclude files matching this glob (repeatable)
        #[arg(long = "exclude", value_name = "GLOB")]
        exclude: Vec<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Annotate {
            paths,
            write,
            diff,
            json,
            python_version,
            infer,
            variables_only,
            functions_only,
            exclude,
        } => {
            let level = match python_version.as_deref() {
                None => PythonLevel::default(),
                Some(text) => match PythonLevel::parse(text) {
                    Some(level) => level,
                    None => {
                        let err = hinttool::error::HintError::invalid_args(format!(
                            "invalid python version '{}'",
                            text
                        ));
                        return fail(&err, json);
                    }
                },
            };

            let mut request = AnnotateRequest::new(if paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                paths
            });
            request.write = write;
            request.exclude = exclude;
            request.options = AnnotateOptions {
                level,
                oracle: if infer {
                    OracleKind::Infer
                } else {
                    OracleKind::Stub
                },
                annotate_variables: !functions_only,
                annotate_functions: !variables_only,
            };

            match run_annotate(&request) {
                Ok(outcome) => {
                    if json {
                        let report =
                            AnnotateReport::from_batch(outcome.batch, write, outcome.files_written);
                        println!("{}", render_json(&report));
                    } else if diff {
                        print!("{}", render_diff(&outcome.batch));
                    } else {
                        print!("{}", render_summary(&outcome.batch, write));
                    }
                    ExitCode::SUCCESS
                }
                Err(err) => fail(&err, json),
            }
        }
    }
}

fn fail(err: &hinttool::error::HintError, json: bool) -> ExitCode {
    if json {
        println!("{}", render_json(&ErrorReport::from_error(err)));
    } else {
        eprintln!("error: {}", err);
    }
    ExitCode::from(err.error_code().code())
}
