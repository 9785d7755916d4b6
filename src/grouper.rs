//! Grouping of local files by target remote directory
//!
//! Walks a local directory tree and partitions every discovered file into a
//! plan keyed by the remote directory that will host it, preserving the
//! relative structure of the source tree. The plan only records directories
//! that directly contain at least one file; empty subdirectories produce no
//! key.

use crate::error::{FtpError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Mapping from remote directory path to the local files destined for it
///
/// Keys are normalized: trailing `/` and `.` are trimmed. Iteration order is
/// deterministic (sorted by key).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GroupedUploadPlan {
    groups: BTreeMap<String, Vec<PathBuf>>,
}

impl GroupedUploadPlan {
    /// Number of remote directory groups in the plan
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the plan contains no groups at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of files across all groups
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Files destined for one remote directory, if that key exists
    #[must_use]
    pub fn group(&self, remote_dir: &str) -> Option<&[PathBuf]> {
        self.groups.get(remote_dir).map(Vec::as_slice)
    }

    /// Iterate groups in sorted key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn push(&mut self, remote_dir: String, local_file: PathBuf) {
        self.groups.entry(remote_dir).or_default().push(local_file);
    }
}

/// Walk `local_root` and group every file beneath it by its target remote
/// directory under `remote_root`
///
/// The remote root is normalized to end with exactly one separator before
/// each relative directory path is appended; trailing `/` and `.` are then
/// trimmed from the resulting key.
///
/// # Errors
///
/// Returns `FtpError::LocalPathNotFound` when `local_root` is not a
/// directory, and `FtpError::FileSystem` when traversal fails.
pub fn group_files_by_remote_dir(local_root: &Path, remote_root: &str) -> Result<GroupedUploadPlan> {
    if !local_root.is_dir() {
        return Err(FtpError::LocalPathNotFound(local_root.to_path_buf()));
    }

    let normalized_root = format!("{}/", remote_root.trim_end_matches('/'));
    let mut plan = GroupedUploadPlan::default();

    for entry in WalkDir::new(local_root) {
        let entry = entry
            .map_err(|e| FtpError::FileSystem(format!("failed to walk {}: {e}", local_root.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative_dir = entry
            .path()
            .parent()
            .unwrap_or(local_root)
            .strip_prefix(local_root)
            .map_err(|e| {
                FtpError::FileSystem(format!(
                    "entry {} is not below {}: {e}",
                    entry.path().display(),
                    local_root.display()
                ))
            })?;

        let key = remote_key(&normalized_root, relative_dir);
        plan.push(key, entry.into_path());
    }

    debug!(
        "grouped {} files into {} remote directories under {}",
        plan.file_count(),
        plan.len(),
        remote_root
    );

    Ok(plan)
}

/// Concatenate the normalized remote root and a relative directory path,
/// trimming any trailing `/` or `.` from the key
fn remote_key(normalized_root: &str, relative_dir: &Path) -> String {
    let relative = relative_dir.to_string_lossy().replace('\\', "/");
    let key = format!("{normalized_root}{relative}");
    key.trim_end_matches(|c| c == '/' || c == '.').to_string()
}
