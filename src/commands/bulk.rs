//! Merge, import, validation, and export subcommand handlers.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result};

use crate::cli::ExportFormat;
use crate::settings::Settings;
use crate::transform::{self, MergeStrategy};

/// Merge `source` into `target` under the named strategy.
///
/// # Errors
///
/// `InvalidStrategy` for an unknown strategy name, plus engine failures.
pub fn merge(
    settings: &Settings,
    source: &Path,
    target: &Path,
    strategy: &str,
    sections: &[String],
) -> Result<()> {
    let strategy: MergeStrategy = strategy.parse()?;
    let filter = (!sections.is_empty()).then_some(sections);
    transform::merge(settings, source, target, strategy, filter)
        .with_context(|| format!("merging {} into {}", source.display(), target.display()))
}

/// Import `source` into `target`, always overwriting.
///
/// # Errors
///
/// Engine failures.
pub fn import(
    settings: &Settings,
    source: &Path,
    target: &Path,
    sections: &[String],
) -> Result<()> {
    let filter = (!sections.is_empty()).then_some(sections);
    transform::import(settings, source, target, filter)
        .with_context(|| format!("importing {} into {}", source.display(), target.display()))
}

/// Validate a file and print the report; the exit code reports the verdict.
///
/// # Errors
///
/// Guard failures; syntax problems are part of the report, not errors.
pub fn validate(settings: &Settings, file: &Path, json: bool) -> Result<ExitCode> {
    let report = transform::validate(settings, file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for issue in &report.issues {
            println!("line {}: {} ({})", issue.line, issue.message, issue.text);
        }
        println!(
            "{}: {} lines, {} issue(s)",
            if report.is_ok() { "ok" } else { "invalid" },
            report.lines,
            report.issues.len()
        );
    }
    Ok(match report.into_result() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("{err}");
            ExitCode::FAILURE
        }
    })
}

/// Export the file to JSON, YAML, or the process environment.
///
/// # Errors
///
/// Engine failures.
pub fn export(
    settings: &Settings,
    file: &Path,
    format: ExportFormat,
    pretty: bool,
    indent: usize,
    prefix: &str,
    section: Option<&str>,
) -> Result<()> {
    match format {
        ExportFormat::Json => {
            println!("{}", transform::to_json(settings, file, pretty)?);
        }
        ExportFormat::Yaml => {
            print!("{}", transform::to_yaml(settings, file, indent)?);
        }
        ExportFormat::Env => {
            for (name, value) in transform::to_env(settings, file, prefix, section)? {
                println!("{name}={value}");
            }
        }
    }
    Ok(())
}
