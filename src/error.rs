//! Error types for the named-lock registry.
//!
//! Contention and timeouts are *not* errors: a failed acquire is a normal
//! outcome reported as `false` (or `None` for the guard forms). The only
//! error the registry raises is an unmatched release, which indicates a
//! logic bug in a caller and must propagate rather than be swallowed —
//! silently accepting it would corrupt refcounts and mask use-after-release
//! bugs.

use thiserror::Error;

/// Raised by [`release`](crate::NamedLockRegistry::release) when the key has
/// no lock held by the calling thread.
///
/// This covers three caller bugs:
/// - releasing a key that was never acquired (entry absent),
/// - releasing a key whose lock is currently free (double release),
/// - releasing from a thread other than the one that acquired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("release without matching acquire for key {key:?}")]
pub struct UnmatchedReleaseError {
    key: String,
}

impl UnmatchedReleaseError {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// The key the failed release named.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_key() {
        let err = UnmatchedReleaseError::new("cam-7");
        let msg = err.to_string();
        assert!(msg.contains("cam-7"), "message should name the key: {msg}");
        assert_eq!(err.key(), "cam-7");
    }
}
