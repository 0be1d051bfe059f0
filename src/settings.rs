//! Engine configuration, passed explicitly into every entry point.
//!
//! There is deliberately no global state: each operation receives a
//! [`Settings`] reference, so embedding tools can run with different
//! policies side by side.

use std::time::Duration;

/// Default file size ceiling: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of lock acquisition attempts.
pub const DEFAULT_LOCK_ATTEMPTS: u32 = 10;

/// Default sleep between lock acquisition attempts.
pub const DEFAULT_LOCK_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Behaviour toggles and limits consulted by every engine operation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Reject section/key names containing `[`, `]`, or `=`.
    pub strict_names: bool,
    /// Permit writing empty string values.
    pub allow_empty_values: bool,
    /// Permit whitespace inside section/key names.
    pub allow_whitespace_in_names: bool,
    /// Maximum permitted file size in bytes.
    pub max_file_size: u64,
    /// Number of lock acquisition attempts before [`LockTimeout`](crate::IniError::LockTimeout).
    pub lock_attempts: u32,
    /// Fixed sleep between lock acquisition attempts.
    pub lock_retry_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            strict_names: false,
            allow_empty_values: true,
            allow_whitespace_in_names: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            lock_attempts: DEFAULT_LOCK_ATTEMPTS,
            lock_retry_delay: DEFAULT_LOCK_RETRY_DELAY,
        }
    }
}

impl Settings {
    /// Settings with strict name validation enabled.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict_names: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive_with_size_ceiling() {
        let s = Settings::default();
        assert!(!s.strict_names);
        assert!(s.allow_empty_values);
        assert!(!s.allow_whitespace_in_names);
        assert_eq!(s.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn strict_constructor_only_changes_name_validation() {
        let s = Settings::strict();
        assert!(s.strict_names);
        assert!(s.allow_empty_values);
    }
}
