//! The locked atomic read-modify-write transaction behind every mutation.
//!
//! Life cycle: Idle → Locked → Staged → Committed (or RolledBack on any
//! failure). An exclusive advisory lock is taken on a sidecar `.lock`
//! file, the transformed document is staged into a temporary file in the
//! target's directory, the original is copied to a sibling `.bak`, and the
//! temp file is renamed onto the target. The same-filesystem rename is
//! atomic, so lock-free readers only ever see the old or the new content.
//!
//! Every failure path unwinds: the temp file is deleted, the lock released.
//! Only an aborted rename leaves the `.bak` behind, deliberately, as a
//! recovery aid for the operator.

use std::fs::{self, File, TryLockError};
use std::path::{Path, PathBuf};

use crate::codec;
use crate::document::Document;
use crate::error::{IniError, Result};
use crate::guard;
use crate::scanner::validate_name;
use crate::settings::Settings;

/// Outcome of a [`batch_write`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Number of pairs applied.
    pub applied: usize,
    /// Pairs that did not match `key=value` syntax, verbatim.
    pub rejected: Vec<String>,
}

/// RAII guard over the sidecar lock file.
///
/// Dropping the guard releases the advisory lock and removes the sidecar
/// best effort, on success and failure paths alike.
#[derive(Debug)]
struct LockGuard {
    file: File,
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = fs::remove_file(&self.path);
    }
}

/// Acquire the exclusive advisory lock for `target`, bounded retries.
fn acquire_lock(settings: &Settings, target: &Path) -> Result<LockGuard> {
    let lock_path = sidecar_path(target, "lock");
    let file = File::create(&lock_path).map_err(|e| IniError::io(&lock_path, e))?;

    for attempt in 1..=settings.lock_attempts {
        match file.try_lock() {
            Ok(()) => {
                return Ok(LockGuard {
                    file,
                    path: lock_path,
                });
            }
            Err(TryLockError::WouldBlock) => {
                tracing::debug!(
                    "lock busy for {} (attempt {attempt}/{})",
                    target.display(),
                    settings.lock_attempts
                );
                std::thread::sleep(settings.lock_retry_delay);
            }
            Err(TryLockError::Error(e)) => return Err(IniError::io(&lock_path, e)),
        }
    }
    Err(IniError::LockTimeout {
        path: target.to_path_buf(),
        attempts: settings.lock_attempts,
    })
}

/// Sibling path with an extra extension segment (`app.ini` → `app.ini.lock`).
fn sidecar_path(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Run a staged transaction against `path`.
///
/// Validates and resolves the path, locks it, reads the current document
/// (empty when the file does not exist yet), applies `edit`, and commits
/// the result atomically. If `edit` fails, nothing on disk changes.
///
/// # Errors
///
/// Path guard errors, [`IniError::LockTimeout`],
/// [`IniError::AtomicReplaceFailed`], [`IniError::Io`], or whatever `edit`
/// returns.
pub fn with_document<F>(settings: &Settings, path: &Path, edit: F) -> Result<()>
where
    F: FnOnce(&mut Document) -> Result<()>,
{
    let target = guard::checked_write_path(settings, path)?;
    let _lock = acquire_lock(settings, &target)?;

    let original = if target.is_file() {
        Some(guard::read_text(&target)?)
    } else {
        None
    };
    let mut doc = Document::parse(original.as_deref().unwrap_or(""));
    edit(&mut doc)?;
    commit(&target, original.as_deref(), &doc.render())
}

/// Stage `content` next to `target` and atomically swap it in.
fn commit(target: &Path, original: Option<&str>, content: &str) -> Result<()> {
    let dir = target.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    // Temp file in the same directory: the final rename must never cross a
    // filesystem boundary or it stops being atomic.
    let mut staged = tempfile::Builder::new()
        .prefix(".ini-staged-")
        .tempfile_in(&dir)
        .map_err(|e| IniError::io(&dir, e))?;
    std::io::Write::write_all(&mut staged, content.as_bytes())
        .map_err(|e| IniError::io(staged.path(), e))?;

    let backup = sidecar_path(target, "bak");
    if original.is_some() {
        fs::copy(target, &backup).map_err(|e| IniError::io(&backup, e))?;
    }

    match staged.persist(target) {
        Ok(_) => {
            if original.is_some() {
                let _ = fs::remove_file(&backup);
            }
            tracing::debug!("committed {}", target.display());
            Ok(())
        }
        Err(e) => {
            // The temp file is deleted when `e.file` drops; the backup and
            // the original are left untouched for recovery.
            Err(IniError::AtomicReplaceFailed {
                path: target.to_path_buf(),
                source: e.error,
            })
        }
    }
}

/// Validate a scalar value against the empty-value policy.
fn validate_value(settings: &Settings, value: &str) -> Result<()> {
    if value.is_empty() && !settings.allow_empty_values {
        return Err(IniError::MissingParameter("value"));
    }
    Ok(())
}

/// Write `key=value` into `section`, creating the section when absent.
///
/// The value is encoded through the codec, so values containing
/// whitespace, commas, or quotes survive a read back unchanged.
///
/// # Errors
///
/// Name/value validation, guard, lock, or commit failures.
pub fn write(
    settings: &Settings,
    path: &Path,
    section: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    validate_name(settings, "section", section)?;
    validate_name(settings, "key", key)?;
    validate_value(settings, value)?;
    with_document(settings, path, |doc| {
        doc.set_raw(section, key, &codec::encode_scalar(value));
        Ok(())
    })
}

/// Write an array value: elements individually encoded, comma-joined, and
/// stored verbatim (the joined form is already its own encoding).
///
/// # Errors
///
/// Name validation, guard, lock, or commit failures.
pub fn write_array(
    settings: &Settings,
    path: &Path,
    section: &str,
    key: &str,
    elements: &[String],
) -> Result<()> {
    validate_name(settings, "section", section)?;
    validate_name(settings, "key", key)?;
    with_document(settings, path, |doc| {
        doc.set_raw(section, key, &codec::encode_array(elements));
        Ok(())
    })
}

/// Append a `[section]` header unless one already exists (idempotent).
///
/// # Errors
///
/// Name validation, guard, lock, or commit failures.
pub fn add_section(settings: &Settings, path: &Path, section: &str) -> Result<()> {
    validate_name(settings, "section", section)?;
    with_document(settings, path, |doc| {
        doc.add_section(section);
        Ok(())
    })
}

/// Remove the first run of `section`; absence is a no-op success.
///
/// # Errors
///
/// Name validation, guard, lock, or commit failures.
pub fn remove_section(settings: &Settings, path: &Path, section: &str) -> Result<()> {
    validate_name(settings, "section", section)?;
    with_document(settings, path, |doc| {
        if !doc.remove_section(section) {
            tracing::debug!("section [{section}] absent; nothing to remove");
        }
        Ok(())
    })
}

/// Remove `key` from `section`; absence is a no-op success.
///
/// # Errors
///
/// Name validation, guard, lock, or commit failures.
pub fn remove_key(settings: &Settings, path: &Path, section: &str, key: &str) -> Result<()> {
    validate_name(settings, "section", section)?;
    validate_name(settings, "key", key)?;
    with_document(settings, path, |doc| {
        if !doc.remove_key(section, key) {
            tracing::debug!("key '{key}' absent from [{section}]; nothing to remove");
        }
        Ok(())
    })
}

/// Rename a section header, leaving its member lines untouched.
///
/// # Errors
///
/// [`IniError::NotFound`] when `old` is absent, [`IniError::AlreadyExists`]
/// when `new` is already a header; the file is unchanged on failure.
pub fn rename_section(settings: &Settings, path: &Path, old: &str, new: &str) -> Result<()> {
    validate_name(settings, "section", old)?;
    validate_name(settings, "section", new)?;
    with_document(settings, path, |doc| {
        if doc.header_index(old).is_none() {
            return Err(IniError::section_not_found(old));
        }
        if doc.header_index(new).is_some() {
            return Err(IniError::AlreadyExists(new.to_string()));
        }
        doc.rename_section(old, new);
        Ok(())
    })
}

/// Rename `old` to `new` within `section`, keeping the stored value.
///
/// Equivalent to remove-old + write-new inside one transaction, so the
/// renamed key lands at the end of the section run.
///
/// # Errors
///
/// [`IniError::NotFound`] when `old` is absent, [`IniError::AlreadyExists`]
/// when `new` is already present in the section.
pub fn rename_key(
    settings: &Settings,
    path: &Path,
    section: &str,
    old: &str,
    new: &str,
) -> Result<()> {
    validate_name(settings, "section", section)?;
    validate_name(settings, "key", old)?;
    validate_name(settings, "key", new)?;
    with_document(settings, path, |doc| {
        let Some(raw) = doc.raw_value(section, old) else {
            return Err(IniError::key_not_found(section, old));
        };
        if doc.raw_value(section, new).is_some() {
            return Err(IniError::AlreadyExists(new.to_string()));
        }
        doc.remove_key(section, old);
        doc.set_raw(section, new, &raw);
        Ok(())
    })
}

/// Re-serialize the whole document: sorted keys and indented headers on
/// request, sections separated by exactly one blank line.
///
/// # Errors
///
/// Guard, lock, or commit failures.
pub fn format(settings: &Settings, path: &Path, indent: usize, sort_keys: bool) -> Result<()> {
    with_document(settings, path, |doc| {
        doc.format(indent, sort_keys);
        Ok(())
    })
}

/// Apply several `key=value` pairs to `section` in one transaction.
///
/// Pairs without `=` (or with an empty key) are collected and reported;
/// the remaining pairs are still applied. Last write wins for a key given
/// twice.
///
/// # Errors
///
/// Name validation, guard, lock, or commit failures. Syntax rejects are
/// reported through [`BatchOutcome::rejected`], not as an `Err`.
pub fn batch_write(
    settings: &Settings,
    path: &Path,
    section: &str,
    pairs: &[String],
) -> Result<BatchOutcome> {
    validate_name(settings, "section", section)?;

    let mut parsed: Vec<(String, String)> = Vec::new();
    let mut rejected: Vec<String> = Vec::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                parsed.push((key.trim().to_string(), value.trim().to_string()));
            }
            _ => rejected.push(pair.clone()),
        }
    }

    for (key, _) in &parsed {
        validate_name(settings, "key", key)?;
    }

    with_document(settings, path, |doc| {
        for (key, value) in &parsed {
            validate_value(settings, value)?;
            doc.set_raw(section, key, &codec::encode_scalar(value));
        }
        Ok(())
    })?;

    if !rejected.is_empty() {
        tracing::warn!("{} batch pair(s) rejected", rejected.len());
    }
    Ok(BatchOutcome {
        applied: parsed.len(),
        rejected,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::default()
    }

    fn read_file(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn write_creates_file_section_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        write(&settings(), &file, "app", "name", "X").unwrap();
        assert_eq!(read_file(&file), "[app]\nname=X\n");
    }

    #[test]
    fn write_replaces_existing_key_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        fs::write(&file, "[app]\nname=X\nport=1\n").unwrap();
        write(&settings(), &file, "app", "name", "Y").unwrap();
        assert_eq!(read_file(&file), "[app]\nname=Y\nport=1\n");
    }

    #[test]
    fn write_quotes_values_that_need_it() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        write(&settings(), &file, "app", "greeting", "hello there").unwrap();
        assert_eq!(read_file(&file), "[app]\ngreeting=\"hello there\"\n");
    }

    #[test]
    fn empty_value_rejected_when_disallowed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        let mut s = settings();
        s.allow_empty_values = false;
        let err = write(&s, &file, "app", "name", "").unwrap_err();
        assert!(matches!(err, IniError::MissingParameter("value")));
        assert!(!file.exists(), "no side effect on validation failure");
    }

    #[test]
    fn rename_section_collision_leaves_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        let before = "[app]\nname=X\n\n[db]\nhost=h\n";
        fs::write(&file, before).unwrap();

        let err = rename_section(&settings(), &file, "app", "db").unwrap_err();
        assert!(matches!(err, IniError::AlreadyExists(_)));
        assert_eq!(read_file(&file), before);
    }

    #[test]
    fn rename_missing_section_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        fs::write(&file, "[app]\n").unwrap();
        let err = rename_section(&settings(), &file, "ghost", "new").unwrap_err();
        assert!(matches!(err, IniError::NotFound { .. }));
    }

    #[test]
    fn rename_key_moves_value_to_run_end() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        fs::write(&file, "[app]\nold=v\nother=o\n").unwrap();
        rename_key(&settings(), &file, "app", "old", "new").unwrap();
        assert_eq!(read_file(&file), "[app]\nother=o\nnew=v\n");
    }

    #[test]
    fn failed_edit_leaves_original_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        let before = "[app]\nname=X\n";
        fs::write(&file, before).unwrap();

        let err = with_document(&settings(), &file, |doc| {
            // Mutate, then abort: the staged state must never reach disk.
            doc.set_raw("app", "name", "CHANGED");
            Err(IniError::MissingParameter("simulated"))
        })
        .unwrap_err();
        assert!(matches!(err, IniError::MissingParameter("simulated")));
        assert_eq!(read_file(&file), before);
    }

    #[test]
    fn no_stray_artifacts_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        write(&settings(), &file, "app", "name", "X").unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|n| n != "app.ini")
            .collect();
        assert!(leftovers.is_empty(), "stray files: {leftovers:?}");
    }

    #[test]
    fn concurrent_lock_holder_times_out_fast() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        fs::write(&file, "[app]\n").unwrap();

        // Hold the sidecar lock from this thread, then attempt a write with
        // a tight retry budget.
        let lock_path = sidecar_path(&file, "lock");
        let holder = File::create(&lock_path).unwrap();
        holder.lock().unwrap();

        let mut s = settings();
        s.lock_attempts = 2;
        s.lock_retry_delay = std::time::Duration::from_millis(10);
        let err = write(&s, &file, "app", "k", "v").unwrap_err();
        assert!(matches!(err, IniError::LockTimeout { attempts: 2, .. }));

        holder.unlock().unwrap();
    }

    #[test]
    fn batch_write_applies_valid_and_reports_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        let outcome = batch_write(
            &settings(),
            &file,
            "app",
            &[
                "a=1".to_string(),
                "nonsense".to_string(),
                "b=2".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.rejected, vec!["nonsense"]);
        assert_eq!(read_file(&file), "[app]\na=1\nb=2\n");
    }

    #[test]
    fn batch_write_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        batch_write(
            &settings(),
            &file,
            "app",
            &["k=1".to_string(), "k=2".to_string()],
        )
        .unwrap();
        assert_eq!(read_file(&file), "[app]\nk=2\n");
    }

    #[test]
    fn format_via_mutator_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.ini");
        fs::write(&file, "[b]\nz=1\na=2\n[a]\nk=3\n").unwrap();
        format(&settings(), &file, 0, true).unwrap();
        assert_eq!(read_file(&file), "[b]\na=2\nz=1\n\n[a]\nk=3\n");
    }
}
