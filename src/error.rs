//! Error types for sprig scaffolding operations.
//!
//! Defines [`SprigError`], the unified error type for the staging and merge
//! core. Error messages are designed to be self-contained: each variant
//! includes a clear description of what went wrong and actionable guidance
//! on how to fix it.
//!
//! Conflicts are deliberately *not* errors — manifest field conflicts and
//! template file conflicts are routed through the interactive resolution
//! loops in [`crate::manifest`] and [`crate::templates`] and always have a
//! safe default (keep existing).

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// SprigError
// ---------------------------------------------------------------------------

/// Unified error type for staging, merge, and materialization operations.
#[derive(Debug)]
pub enum SprigError {
    /// An on-disk document exists but cannot be parsed.
    ///
    /// The project's own manifest being corrupt is unrecoverable without
    /// user intervention, so this terminates the run.
    ManifestCorrupt {
        /// Path to the unparseable file.
        path: PathBuf,
        /// Parser detail.
        detail: String,
    },

    /// Flushing the staged filesystem to disk failed.
    ///
    /// Commit is per-file; a failure may leave earlier files written. The
    /// partial completion is reported, never silently swallowed.
    CommitFailed {
        /// The file whose flush failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// User input failed validation and cannot be corrected interactively
    /// (e.g. a scripted answer queue produced an invalid value).
    InvalidInput {
        /// What was being asked for.
        prompt: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The interactive prompt stream ended before an answer was produced.
    PromptClosed,

    /// An I/O error other than "not found" during a staged read.
    ///
    /// A half-merged manifest is worse than stopping early, so these
    /// propagate instead of degrading to an absent result.
    Io(std::io::Error),
}

impl fmt::Display for SprigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManifestCorrupt { path, detail } => {
                write!(
                    f,
                    "'{}' exists but could not be parsed: {detail}\n  To fix: repair or remove the file, then re-run sprig.",
                    path.display()
                )
            }
            Self::CommitFailed { path, source } => {
                write!(
                    f,
                    "failed to write '{}' to disk: {source}\n  Files staged before this one may already be written.\n  To fix: check permissions and disk space, then re-run sprig (re-runs are idempotent).",
                    path.display()
                )
            }
            Self::InvalidInput { prompt, reason } => {
                write!(f, "invalid answer for '{prompt}': {reason}")
            }
            Self::PromptClosed => {
                write!(f, "input stream closed before the prompt was answered")
            }
            Self::Io(err) => {
                write!(
                    f,
                    "I/O error: {err}\n  To fix: check file permissions and disk space."
                )
            }
        }
    }
}

impl std::error::Error for SprigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) | Self::CommitFailed { source: e, .. } => Some(e),
            Self::ManifestCorrupt { .. } | Self::InvalidInput { .. } | Self::PromptClosed => None,
        }
    }
}

impl From<std::io::Error> for SprigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Convenience alias used throughout the staging/merge core.
pub type Result<T> = std::result::Result<T, SprigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_corrupt_names_path_and_fix() {
        let err = SprigError::ManifestCorrupt {
            path: PathBuf::from("package.json"),
            detail: "expected value at line 1".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("package.json"));
        assert!(msg.contains("To fix"));
    }

    #[test]
    fn io_variant_exposes_source() {
        use std::error::Error as _;
        let err = SprigError::from(std::io::Error::other("boom"));
        assert!(err.source().is_some());
    }
}
