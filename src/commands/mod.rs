//! Top-level subcommand orchestration.
//!
//! Each handler validates nothing itself: it hands the parsed arguments to
//! the engine, prints the result to stdout, and lets typed engine errors
//! convert to [`anyhow::Error`] at this boundary.

pub mod bulk;
pub mod edit;
pub mod query;

use std::process::ExitCode;

use anyhow::Result;

use crate::cli::{Cli, Command};

/// Route a parsed invocation to its handler.
///
/// # Errors
///
/// Propagates engine failures from the individual handlers.
pub fn dispatch(args: &Cli) -> Result<ExitCode> {
    let settings = args.global.settings();

    match &args.command {
        Command::Get {
            file,
            section,
            key,
            array,
        } => query::get(&settings, file, section, key, *array)?,
        Command::Sections { file } => query::sections(&settings, file)?,
        Command::Keys { file, section } => query::keys(&settings, file, section)?,
        Command::Has { file, section, key } => {
            return query::has(&settings, file, section, key.as_deref());
        }
        Command::Set {
            file,
            section,
            key,
            value,
        } => edit::set(&settings, file, section, key, value)?,
        Command::SetArray {
            file,
            section,
            key,
            elements,
        } => edit::set_array(&settings, file, section, key, elements)?,
        Command::AddSection { file, section } => edit::add_section(&settings, file, section)?,
        Command::RemoveSection { file, section } => {
            edit::remove_section(&settings, file, section)?;
        }
        Command::RemoveKey { file, section, key } => {
            edit::remove_key(&settings, file, section, key)?;
        }
        Command::RenameSection { file, old, new } => {
            edit::rename_section(&settings, file, old, new)?;
        }
        Command::RenameKey {
            file,
            section,
            old,
            new,
        } => edit::rename_key(&settings, file, section, old, new)?,
        Command::Format { file, indent, sort } => {
            edit::format(&settings, file, *indent, *sort)?;
        }
        Command::Batch {
            file,
            section,
            pairs,
        } => edit::batch(&settings, file, section, pairs)?,
        Command::Merge {
            source,
            target,
            strategy,
            sections,
        } => bulk::merge(&settings, source, target, strategy, sections)?,
        Command::Import {
            source,
            target,
            sections,
        } => bulk::import(&settings, source, target, sections)?,
        Command::Validate { file, json } => return bulk::validate(&settings, file, *json),
        Command::Export {
            file,
            format,
            pretty,
            indent,
            prefix,
            section,
        } => bulk::export(
            &settings,
            file,
            *format,
            *pretty,
            *indent,
            prefix,
            section.as_deref(),
        )?,
        Command::Version => {
            let version = option_env!("INI_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("ini {version}");
        }
    }
    Ok(ExitCode::SUCCESS)
}
