//! In-memory staged filesystem.
//!
//! [`StagedFs`] is an overlay over the real filesystem: reads lazily pull
//! from disk into memory on first access, writes go only to memory, and a
//! single explicit [`StagedFs::commit`] flushes all staged writes to disk,
//! atomically per file (write-to-temp + rename — a crash mid-commit never
//! leaves a half-written file).
//!
//! This is the core recovery guarantee of the whole tool: **nothing touches
//! disk until commit**, so an aborted run — conflict loop bailed out, fatal
//! parse error, Ctrl-C — leaves the project directory exactly as it was.
//!
//! # Lifecycle of a staged path
//!
//! ```text
//! unloaded → loaded (disk content, or absent) → modified → committed
//!                                                        ↘ discarded (drop)
//! ```
//!
//! A path maps to exactly one staged entry for the lifetime of the value —
//! repeated reads and writes reuse it, never duplicate it.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SprigError};

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// One staged path. `content: None` records "absent on disk" so a second
/// read does not hit the disk again.
#[derive(Clone, Debug)]
struct Entry {
    content: Option<String>,
    /// Set by [`StagedFs::write`]; only dirty entries are flushed on commit.
    dirty: bool,
}

// ---------------------------------------------------------------------------
// StagedFs
// ---------------------------------------------------------------------------

/// In-memory overlay over the real filesystem, rooted at a working
/// directory.
///
/// All relative paths resolve against the root. The root is explicit state
/// rather than the process working directory so that concurrent tests (and
/// library callers) never fight over ambient `cd`.
#[derive(Debug)]
pub struct StagedFs {
    root: PathBuf,
    entries: BTreeMap<PathBuf, Entry>,
}

impl StagedFs {
    /// Create a staged filesystem rooted at `root`. The directory is not
    /// created until [`Self::set_root`] or a commit needs it.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: BTreeMap::new(),
        }
    }

    /// The current root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Re-root at `path`, creating the directory (recursively) if absent.
    /// An empty path is a no-op, so `sprig init` without a path argument
    /// stays in the current directory.
    pub fn set_root(&mut self, path: &str) -> Result<()> {
        if path.is_empty() {
            return Ok(());
        }
        let new_root = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.root.join(path)
        };
        fs::create_dir_all(&new_root)?;
        debug!(root = %new_root.display(), "staged fs re-rooted");
        self.root = new_root;
        Ok(())
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    /// Staged content if present; otherwise a lazy disk read, cached into
    /// the overlay (including the "absent" result). A missing file is
    /// normal and yields `None`; any other I/O error propagates.
    pub fn read(&mut self, path: &str) -> Result<Option<String>> {
        let abs = self.resolve(path);
        if let Some(entry) = self.entries.get(&abs) {
            return Ok(entry.content.clone());
        }

        let content = match fs::read_to_string(&abs) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(SprigError::Io(e)),
        };
        debug!(path, loaded = content.is_some(), "lazy load into overlay");
        self.entries.insert(
            abs,
            Entry {
                content: content.clone(),
                dirty: false,
            },
        );
        Ok(content)
    }

    /// As [`Self::read`], parsed as JSON. Content that exists but fails to
    /// parse is fatal — a corrupt manifest cannot be merged into.
    pub fn read_json(&mut self, path: &str) -> Result<Option<Value>> {
        let Some(text) = self.read(path)? else {
            return Ok(None);
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(SprigError::ManifestCorrupt {
                path: self.resolve(path),
                detail: e.to_string(),
            }),
        }
    }

    /// Read a file directly from disk, bypassing the overlay. Used when a
    /// review needs the on-disk document regardless of staged changes.
    pub fn read_disk_json(&self, path: &str) -> Result<Option<Value>> {
        let abs = self.resolve(path);
        let text = match fs::read_to_string(&abs) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SprigError::Io(e)),
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(SprigError::ManifestCorrupt {
                path: abs,
                detail: e.to_string(),
            }),
        }
    }

    /// Stage `content` for `path` in memory; disk is untouched.
    ///
    /// Returns `false` when the content is empty or whitespace-only — the
    /// caller decides whether such a write is worth keeping (template
    /// materialization skips and warns instead).
    pub fn write(&mut self, path: &str, content: impl Into<String>) -> bool {
        let content = content.into();
        let worthwhile = !content.trim().is_empty();
        let abs = self.resolve(path);
        debug!(path, bytes = content.len(), "staged write");
        self.entries.insert(
            abs,
            Entry {
                content: Some(content),
                dirty: true,
            },
        );
        worthwhile
    }

    /// Serialize `value` as pretty JSON (trailing newline, npm-style) and
    /// stage it.
    pub fn write_json(&mut self, path: &str, value: &Value) -> Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(|e| SprigError::ManifestCorrupt {
            path: self.resolve(path),
            detail: e.to_string(),
        })?;
        self.write(path, text + "\n");
        Ok(())
    }

    /// True if the path is staged with content or exists on disk.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        let abs = self.resolve(path);
        match self.entries.get(&abs) {
            Some(entry) => entry.content.is_some(),
            None => abs.exists(),
        }
    }

    /// Number of staged (dirty) writes awaiting commit.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries.values().filter(|e| e.dirty).count()
    }

    /// Names of entries in the root directory, used for the
    /// empty-directory check before scaffolding. Missing root reads as
    /// empty.
    pub fn list_root(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let iter = match fs::read_dir(&self.root) {
            Ok(iter) => iter,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(SprigError::Io(e)),
        };
        for dirent in iter {
            names.push(dirent?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Flush every staged write to disk, atomically per file.
    ///
    /// Parent directories are created as needed. On failure the error names
    /// the file that could not be written; files flushed before it stay on
    /// disk (no multi-file transaction is modeled).
    pub fn commit(&mut self) -> Result<()> {
        for (abs, entry) in &mut self.entries {
            if !entry.dirty {
                continue;
            }
            let Some(content) = &entry.content else {
                continue;
            };
            write_atomic(abs, content).map_err(|source| SprigError::CommitFailed {
                path: abs.clone(),
                source,
            })?;
            debug!(path = %abs.display(), "committed");
            entry.dirty = false;
        }
        Ok(())
    }
}

/// Write `content` to `path` via a temp file in the same directory plus a
/// rename, so a crash never leaves a torn file.
fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("sprig-tmp");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(content.as_bytes())?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)
}
