//! Read-side subcommand handlers.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;

use crate::query;
use crate::settings::Settings;

/// Print a key's value; with `array`, one decoded element per line.
///
/// # Errors
///
/// Engine failures, including `NotFound` for an absent section or key.
pub fn get(
    settings: &Settings,
    file: &Path,
    section: &str,
    key: &str,
    array: bool,
) -> Result<()> {
    if array {
        for element in query::read_array(settings, file, section, key)? {
            println!("{element}");
        }
    } else {
        println!("{}", query::read(settings, file, section, key)?);
    }
    Ok(())
}

/// Print section names in file order, one per line.
///
/// # Errors
///
/// Engine failures.
pub fn sections(settings: &Settings, file: &Path) -> Result<()> {
    for name in query::list_sections(settings, file)? {
        println!("{name}");
    }
    Ok(())
}

/// Print key names of a section in file order, one per line.
///
/// # Errors
///
/// Engine failures.
pub fn keys(settings: &Settings, file: &Path, section: &str) -> Result<()> {
    for name in query::list_keys(settings, file, section)? {
        println!("{name}");
    }
    Ok(())
}

/// Print `true`/`false` and report the answer through the exit code.
///
/// # Errors
///
/// Engine failures other than plain absence.
pub fn has(
    settings: &Settings,
    file: &Path,
    section: &str,
    key: Option<&str>,
) -> Result<ExitCode> {
    let found = match key {
        Some(key) => query::key_exists(settings, file, section, key)?,
        None => query::section_exists(settings, file, section)?,
    };
    println!("{found}");
    Ok(if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
