// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed workspace so each integration test
// manipulates isolated INI files without repeating filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use ini_cli::Settings;

/// An isolated test workspace backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct IntegrationTestContext {
    /// Temporary directory holding the test INI files.
    pub root: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Path of a file inside the workspace (not necessarily existing yet).
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Seed a file with the given content and return its path.
    pub fn seed(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    /// Read a workspace file back as text.
    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path).expect("read fixture file")
    }

    /// File names currently present in the workspace root.
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.root.path())
            .expect("read workspace dir")
            .map(|e| {
                e.expect("read dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

/// Default engine settings shared by the integration tests.
pub fn settings() -> Settings {
    Settings::default()
}
