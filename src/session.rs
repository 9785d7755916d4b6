//! Transfer session: one connection, one logical operation
//!
//! A session owns a single transport connection for the duration of one
//! operation and guarantees the connection is closed afterwards, even on
//! failure. Transfers carry retry-then-verify semantics: after the bytes
//! move, the remote size is compared against the local length and the
//! transfer is repeated up to [`RETRY_ATTEMPTS`] times before failing loudly.

use crate::endpoint::RemoteEndpoint;
use crate::error::{FtpError, Result};
use crate::settings::{ConflictPolicy, Credentials, TransferSettings};
use crate::transport::{log_transfer, FtpTransport, TransportFactory, UploadOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Attempt budget for verified transfers
pub const RETRY_ATTEMPTS: u32 = 3;

/// One open connection performing exactly one logical operation
pub struct TransferSession {
    transport: Box<dyn FtpTransport>,
    open: bool,
}

impl TransferSession {
    /// Connect a fresh session through the factory
    ///
    /// # Errors
    ///
    /// Propagates connection and authentication failures from the transport.
    pub fn open(
        factory: &dyn TransportFactory,
        endpoint: &RemoteEndpoint,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<Self> {
        debug!(
            "opening session to {} as {}",
            endpoint.addr(),
            credentials.username
        );
        let transport = factory.connect(endpoint, credentials, settings)?;
        Ok(Self {
            transport,
            open: true,
        })
    }

    /// Upload one file, creating the remote directory first when requested
    ///
    /// # Errors
    ///
    /// Transport errors propagate immediately; a verification mismatch is
    /// retried and becomes `FtpError::Verification` once the budget is spent.
    pub fn upload_file(
        &mut self,
        local: &Path,
        remote: &str,
        conflict: ConflictPolicy,
        create_remote_directory: bool,
    ) -> Result<UploadOutcome> {
        if create_remote_directory {
            if let Some(dir) = parent_directory(remote) {
                self.ensure_directory(&dir)?;
            }
        }

        let local_len = fs::metadata(local)
            .map_err(|_| FtpError::LocalPathNotFound(local.to_path_buf()))?
            .len();

        for attempt in 1..=RETRY_ATTEMPTS {
            let outcome = self.transport.upload(local, remote, conflict)?;
            if matches!(outcome, UploadOutcome::Skipped) || !conflict.verifiable() {
                log_transfer(local, remote, outcome);
                return Ok(outcome);
            }

            match self.transport.remote_size(remote)? {
                None => {
                    debug!("server cannot verify {remote}, accepting transfer as-is");
                    log_transfer(local, remote, outcome);
                    return Ok(outcome);
                }
                Some(size) if size == local_len => {
                    log_transfer(local, remote, outcome);
                    return Ok(outcome);
                }
                Some(size) => {
                    warn!(
                        "verification mismatch for {remote} (remote {size}, local {local_len}), \
                         attempt {attempt}/{RETRY_ATTEMPTS}"
                    );
                }
            }
        }

        Err(FtpError::Verification {
            remote: remote.to_string(),
            attempts: RETRY_ATTEMPTS,
        })
    }

    /// Upload many files into one remote directory over this connection,
    /// failing fast on the first file-level error
    ///
    /// # Errors
    ///
    /// Propagates the first transport error inside the batch.
    pub fn upload_many(
        &mut self,
        files: &[PathBuf],
        remote_dir: &str,
        conflict: ConflictPolicy,
        create_remote_directory: bool,
    ) -> Result<u64> {
        let transferred =
            self.transport
                .upload_many(files, remote_dir, conflict, create_remote_directory)?;
        info!("uploaded {transferred} files into {remote_dir}");
        Ok(transferred)
    }

    /// Delete one remote file
    ///
    /// # Errors
    ///
    /// Propagates whatever the transport reports, including "already absent".
    pub fn delete_file(&mut self, remote: &str) -> Result<()> {
        self.transport.delete(remote)?;
        info!("deleted {remote}");
        Ok(())
    }

    /// Download one remote file with retry-then-verify
    ///
    /// # Errors
    ///
    /// Transport errors propagate immediately; a verification mismatch is
    /// retried and becomes `FtpError::Verification` once the budget is spent.
    pub fn download_file(&mut self, remote: &str, local: &Path) -> Result<u64> {
        let expected = self.transport.remote_size(remote)?;

        for attempt in 1..=RETRY_ATTEMPTS {
            let bytes = self.transport.download(remote)?;
            match expected {
                Some(size) if size != bytes.len() as u64 => {
                    warn!(
                        "verification mismatch for {remote} (got {}, expected {size}), \
                         attempt {attempt}/{RETRY_ATTEMPTS}",
                        bytes.len()
                    );
                }
                _ => {
                    if let Some(parent) = local.parent() {
                        fs::create_dir_all(parent).map_err(|e| {
                            FtpError::FileSystem(format!(
                                "failed to create {}: {e}",
                                parent.display()
                            ))
                        })?;
                    }
                    let len = bytes.len() as u64;
                    fs::write(local, bytes).map_err(|e| {
                        FtpError::FileSystem(format!("failed to write {}: {e}", local.display()))
                    })?;
                    info!("{remote} -> {} ({len} bytes)", local.display());
                    return Ok(len);
                }
            }
        }

        Err(FtpError::Verification {
            remote: remote.to_string(),
            attempts: RETRY_ATTEMPTS,
        })
    }

    /// Whether a remote directory exists
    ///
    /// # Errors
    ///
    /// Propagates transport failures other than a plain "no such directory".
    pub fn directory_exists(&mut self, remote_dir: &str) -> Result<bool> {
        self.transport.directory_exists(remote_dir)
    }

    /// Create a remote directory if it is absent
    ///
    /// Returns `Ok(true)` when this session created at least one level.
    /// Losing a creation race to a sibling worker is absorbed silently.
    ///
    /// # Errors
    ///
    /// Propagates transport failures that are not "already exists".
    pub fn ensure_directory(&mut self, remote_dir: &str) -> Result<bool> {
        if self.transport.directory_exists(remote_dir)? {
            return Ok(false);
        }
        let created = self.transport.create_directory(remote_dir, true)?;
        if created {
            info!("created remote directory {remote_dir}");
        }
        Ok(created)
    }

    /// Delete remote files in `remote_dir` that are not in `local_files`
    ///
    /// Used by mirror-mode sync after a group upload. Entries that fail to
    /// delete (for example subdirectories) are logged and skipped.
    ///
    /// # Errors
    ///
    /// Propagates a failure to list the remote directory.
    pub fn prune_remote(&mut self, remote_dir: &str, local_files: &[PathBuf]) -> Result<u64> {
        let keep: Vec<String> = local_files
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();

        let base = remote_dir.trim_end_matches('/');
        let mut pruned = 0u64;
        for name in self.transport.list_names(remote_dir)? {
            if keep.iter().any(|k| k == &name) {
                continue;
            }
            let remote = format!("{base}/{name}");
            match self.transport.delete(&remote) {
                Ok(()) => {
                    info!("mirror: removed {remote}");
                    pruned += 1;
                }
                Err(e) => warn!("mirror: could not remove {remote}: {e}"),
            }
        }
        Ok(pruned)
    }

    /// Disconnect explicitly, reporting any failure
    ///
    /// # Errors
    ///
    /// Propagates a transport failure while closing the connection.
    pub fn close(mut self) -> Result<()> {
        self.open = false;
        self.transport.disconnect()
    }
}

impl Drop for TransferSession {
    fn drop(&mut self) {
        // Disconnect is guaranteed even when an operation failed mid-way.
        if self.open {
            if let Err(e) = self.transport.disconnect() {
                debug!("disconnect during cleanup failed: {e}");
            }
        }
    }
}

/// Remote parent directory of a remote file path, if it has one
fn parent_directory(remote: &str) -> Option<String> {
    let trimmed = remote.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    if idx == 0 {
        return None;
    }
    Some(trimmed[..idx].to_string())
}
