//! Command-line surface for the INI engine.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::settings::Settings;

/// Top-level CLI entry point for the INI manipulation engine.
#[derive(Parser, Debug)]
#[command(
    name = "ini",
    about = "Atomic INI configuration file manipulation engine",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose diagnostic output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands, mapped onto [`Settings`].
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Reject section/key names containing '[', ']', or '='
    #[arg(long, global = true)]
    pub strict: bool,

    /// Refuse to write empty values
    #[arg(long = "no-empty-values", global = true)]
    pub no_empty_values: bool,

    /// Permit whitespace inside section/key names
    #[arg(long = "allow-whitespace-names", global = true)]
    pub allow_whitespace_names: bool,

    /// Maximum permitted file size in bytes
    #[arg(long, global = true, value_name = "BYTES")]
    pub max_file_size: Option<u64>,
}

impl GlobalOpts {
    /// Build engine settings from the global flags.
    #[must_use]
    pub fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            strict_names: self.strict,
            allow_empty_values: !self.no_empty_values,
            allow_whitespace_in_names: self.allow_whitespace_names,
            max_file_size: self.max_file_size.unwrap_or(defaults.max_file_size),
            ..defaults
        }
    }
}

/// Output format for the `export` subcommand.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON object of sections.
    Json,
    /// YAML mapping of sections.
    Yaml,
    /// Environment variables in the current process, echoed as `name=value`.
    Env,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read the value of a key
    Get {
        /// Target INI file
        file: PathBuf,
        /// Section name
        section: String,
        /// Key name
        key: String,
        /// Decode the value as a comma-separated array, one element per line
        #[arg(long)]
        array: bool,
    },
    /// Write a key=value pair, creating the section if needed
    Set {
        /// Target INI file
        file: PathBuf,
        /// Section name
        section: String,
        /// Key name
        key: String,
        /// Value to store
        value: String,
    },
    /// Write an array value from one or more elements
    SetArray {
        /// Target INI file
        file: PathBuf,
        /// Section name
        section: String,
        /// Key name
        key: String,
        /// Array elements
        #[arg(required = true)]
        elements: Vec<String>,
    },
    /// Add an empty section (idempotent)
    AddSection {
        /// Target INI file
        file: PathBuf,
        /// Section name
        section: String,
    },
    /// Remove a section and all its keys (no-op when absent)
    RemoveSection {
        /// Target INI file
        file: PathBuf,
        /// Section name
        section: String,
    },
    /// Remove a single key (no-op when absent)
    RemoveKey {
        /// Target INI file
        file: PathBuf,
        /// Section name
        section: String,
        /// Key name
        key: String,
    },
    /// Rename a section, leaving its keys untouched
    RenameSection {
        /// Target INI file
        file: PathBuf,
        /// Current section name
        old: String,
        /// New section name
        new: String,
    },
    /// Rename a key within a section, keeping its value
    RenameKey {
        /// Target INI file
        file: PathBuf,
        /// Section name
        section: String,
        /// Current key name
        old: String,
        /// New key name
        new: String,
    },
    /// List section names in file order
    Sections {
        /// Target INI file
        file: PathBuf,
    },
    /// List key names of a section in file order
    Keys {
        /// Target INI file
        file: PathBuf,
        /// Section name
        section: String,
    },
    /// Check whether a section (or key) exists; exit code reports the answer
    Has {
        /// Target INI file
        file: PathBuf,
        /// Section name
        section: String,
        /// Key name (check the section only when omitted)
        key: Option<String>,
    },
    /// Re-serialize the file: normalised separation, optional sort/indent
    Format {
        /// Target INI file
        file: PathBuf,
        /// Indent section headers by this many spaces
        #[arg(long, default_value_t = 0)]
        indent: usize,
        /// Sort keys lexicographically within each section
        #[arg(long)]
        sort: bool,
    },
    /// Apply several key=value pairs in one transaction
    Batch {
        /// Target INI file
        file: PathBuf,
        /// Section name
        section: String,
        /// key=value pairs
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Merge sections/keys from one file into another
    Merge {
        /// Source INI file
        source: PathBuf,
        /// Target INI file
        target: PathBuf,
        /// Conflict strategy: overwrite, skip, or merge
        #[arg(long, default_value = "overwrite")]
        strategy: String,
        /// Only merge these sections (comma separated)
        #[arg(long, value_delimiter = ',')]
        sections: Vec<String>,
    },
    /// Import sections/keys from one file into another, always overwriting
    Import {
        /// Source INI file
        source: PathBuf,
        /// Target INI file
        target: PathBuf,
        /// Only import these sections (comma separated)
        #[arg(long, value_delimiter = ',')]
        sections: Vec<String>,
    },
    /// Check a file for syntax problems without modifying it
    Validate {
        /// Target INI file
        file: PathBuf,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the whole file to another representation
    Export {
        /// Target INI file
        file: PathBuf,
        /// Output format
        #[arg(value_enum)]
        format: ExportFormat,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
        /// YAML indent width
        #[arg(long, default_value_t = 2)]
        indent: usize,
        /// Identifier prefix for env output
        #[arg(long, default_value = "")]
        prefix: String,
        /// Restrict env output to one section
        #[arg(long)]
        section: Option<String>,
    },
    /// Print version information
    Version,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_get() {
        let cli = Cli::parse_from(["ini", "get", "app.ini", "app", "name"]);
        assert!(matches!(cli.command, Command::Get { .. }));
    }

    #[test]
    fn parse_get_array_flag() {
        let cli = Cli::parse_from(["ini", "get", "app.ini", "app", "list", "--array"]);
        if let Command::Get { array, .. } = cli.command {
            assert!(array);
        } else {
            unreachable!("expected Get");
        }
    }

    #[test]
    fn parse_strict_global_flag() {
        let cli = Cli::parse_from(["ini", "--strict", "set", "a.ini", "s", "k", "v"]);
        assert!(cli.global.strict);
        assert!(cli.global.settings().strict_names);
    }

    #[test]
    fn parse_max_file_size() {
        let cli = Cli::parse_from(["ini", "--max-file-size", "1024", "sections", "a.ini"]);
        assert_eq!(cli.global.settings().max_file_size, 1024);
    }

    #[test]
    fn default_settings_without_flags() {
        let cli = Cli::parse_from(["ini", "sections", "a.ini"]);
        let s = cli.global.settings();
        assert!(!s.strict_names);
        assert!(s.allow_empty_values);
    }

    #[test]
    fn parse_merge_sections_delimiter() {
        let cli = Cli::parse_from([
            "ini", "merge", "src.ini", "dst.ini", "--sections", "app,db",
        ]);
        if let Command::Merge { sections, strategy, .. } = cli.command {
            assert_eq!(sections, vec!["app", "db"]);
            assert_eq!(strategy, "overwrite");
        } else {
            unreachable!("expected Merge");
        }
    }

    #[test]
    fn parse_export_format() {
        let cli = Cli::parse_from(["ini", "export", "a.ini", "yaml", "--indent", "4"]);
        if let Command::Export { format, indent, .. } = cli.command {
            assert_eq!(format, ExportFormat::Yaml);
            assert_eq!(indent, 4);
        } else {
            unreachable!("expected Export");
        }
    }

    #[test]
    fn set_array_requires_elements() {
        assert!(Cli::try_parse_from(["ini", "set-array", "a.ini", "s", "k"]).is_err());
    }
}
