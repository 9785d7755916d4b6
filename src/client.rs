//! Validating FTP client facade
//!
//! A pure precondition layer in front of sessions and the directory
//! orchestrator: blank hosts, paths, or credentials, non-`ftp` URI schemes,
//! and missing local paths are rejected before any network call is
//! attempted. Every operation constructs its collaborators fresh and
//! discards them on completion.

use crate::endpoint::RemoteEndpoint;
use crate::error::{FtpError, Result};
use crate::orchestrator::{DirectorySyncOrchestrator, ExcludeFn, ProgressFn, SyncReport};
use crate::session::TransferSession;
use crate::settings::{Credentials, SyncMode, TransferSettings};
use crate::transport::{SuppaftpFactory, TransportFactory, UploadOutcome};
use std::path::Path;
use std::sync::Arc;

/// The FTP client
pub struct FtpClient {
    factory: Arc<dyn TransportFactory>,
    progress: Option<Arc<ProgressFn>>,
}

impl Default for FtpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FtpClient {
    /// Client backed by the production `suppaftp` transport
    #[must_use]
    pub fn new() -> Self {
        Self::with_factory(Arc::new(SuppaftpFactory))
    }

    /// Client backed by a caller-supplied transport factory
    #[must_use]
    pub fn with_factory(factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            factory,
            progress: None,
        }
    }

    /// Attach a per-file completion callback for tree operations
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<ProgressFn>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Upload a single local file
    ///
    /// # Errors
    ///
    /// Precondition errors for blank parameters or a missing local file;
    /// transport and verification errors from the transfer.
    pub fn upload_file(
        &self,
        host: &str,
        remote_path: &str,
        local_file: &Path,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<UploadOutcome> {
        check_params(host, remote_path, credentials)?;
        check_local_file(local_file)?;
        let endpoint = RemoteEndpoint::new(host, remote_path);
        self.do_upload(&endpoint, local_file, credentials, settings)
    }

    /// Upload a single local file to an `ftp://` URI
    ///
    /// # Errors
    ///
    /// As [`FtpClient::upload_file`], plus `FtpError::InvalidScheme` for a
    /// non-FTP URI.
    pub fn upload_file_uri(
        &self,
        uri: &str,
        local_file: &Path,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<UploadOutcome> {
        let endpoint = RemoteEndpoint::from_uri(uri)?;
        check_params(&endpoint.host, &endpoint.path, credentials)?;
        check_local_file(local_file)?;
        self.do_upload(&endpoint, local_file, credentials, settings)
    }

    fn do_upload(
        &self,
        endpoint: &RemoteEndpoint,
        local_file: &Path,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<UploadOutcome> {
        let mut session =
            TransferSession::open(self.factory.as_ref(), endpoint, credentials, settings)?;
        let outcome = session.upload_file(
            local_file,
            &endpoint.path,
            settings.conflict,
            settings.create_remote_directory,
        )?;
        session.close()?;
        Ok(outcome)
    }

    /// Delete a remote file
    ///
    /// # Errors
    ///
    /// Precondition errors for blank parameters; transport errors otherwise.
    pub fn delete_file(
        &self,
        host: &str,
        remote_path: &str,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<()> {
        check_params(host, remote_path, credentials)?;
        let endpoint = RemoteEndpoint::new(host, remote_path);
        self.do_delete(&endpoint, credentials, settings)
    }

    /// Delete the remote file named by an `ftp://` URI
    ///
    /// # Errors
    ///
    /// As [`FtpClient::delete_file`], plus `FtpError::InvalidScheme` for a
    /// non-FTP URI.
    pub fn delete_file_uri(
        &self,
        uri: &str,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<()> {
        let endpoint = RemoteEndpoint::from_uri(uri)?;
        check_params(&endpoint.host, &endpoint.path, credentials)?;
        self.do_delete(&endpoint, credentials, settings)
    }

    fn do_delete(
        &self,
        endpoint: &RemoteEndpoint,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<()> {
        let mut session =
            TransferSession::open(self.factory.as_ref(), endpoint, credentials, settings)?;
        session.delete_file(&endpoint.path)?;
        session.close()
    }

    /// Download a remote file with retry and verification
    ///
    /// # Errors
    ///
    /// Precondition errors for blank parameters; transport and verification
    /// errors from the transfer.
    pub fn download_file(
        &self,
        host: &str,
        remote_path: &str,
        local_path: &Path,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<u64> {
        check_params(host, remote_path, credentials)?;
        let endpoint = RemoteEndpoint::new(host, remote_path);
        self.do_download(&endpoint, local_path, credentials, settings)
    }

    /// Download the remote file named by an `ftp://` URI
    ///
    /// # Errors
    ///
    /// As [`FtpClient::download_file`], plus `FtpError::InvalidScheme` for a
    /// non-FTP URI.
    pub fn download_file_uri(
        &self,
        uri: &str,
        local_path: &Path,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<u64> {
        let endpoint = RemoteEndpoint::from_uri(uri)?;
        check_params(&endpoint.host, &endpoint.path, credentials)?;
        self.do_download(&endpoint, local_path, credentials, settings)
    }

    fn do_download(
        &self,
        endpoint: &RemoteEndpoint,
        local_path: &Path,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<u64> {
        let mut session =
            TransferSession::open(self.factory.as_ref(), endpoint, credentials, settings)?;
        let bytes = session.download_file(&endpoint.path, local_path)?;
        session.close()?;
        Ok(bytes)
    }

    /// Batch-mode tree upload: grouped by remote directory, one connection
    /// and one multi-file call per group, blocking error on group failure
    ///
    /// # Errors
    ///
    /// Precondition errors for blank parameters or a missing local
    /// directory; the first group-level transport error otherwise.
    pub fn upload_directory(
        &self,
        host: &str,
        remote_dir: &str,
        local_dir: &Path,
        mode: SyncMode,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<SyncReport> {
        check_params(host, remote_dir, credentials)?;
        check_local_directory(local_dir)?;
        self.orchestrator(host, credentials, settings)
            .upload_directory(local_dir, remote_dir, mode)
    }

    /// Bounded-parallel tree upload: one worker-owned connection per entry,
    /// per-entry failures logged and reported, never raised
    ///
    /// # Errors
    ///
    /// Precondition errors for blank parameters or a missing local
    /// directory; traversal errors from the local file system.
    pub fn upload_directory_parallel(
        &self,
        host: &str,
        remote_dir: &str,
        local_dir: &Path,
        parallel: usize,
        exclude: Option<&ExcludeFn>,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<SyncReport> {
        check_params(host, remote_dir, credentials)?;
        check_local_directory(local_dir)?;
        self.orchestrator(host, credentials, settings)
            .upload_directory_parallel(local_dir, remote_dir, parallel, exclude)
    }

    fn orchestrator(
        &self,
        host: &str,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> DirectorySyncOrchestrator {
        let orchestrator = DirectorySyncOrchestrator::new(
            Arc::clone(&self.factory),
            RemoteEndpoint::new(host, "/"),
            credentials.clone(),
            settings.clone(),
        );
        match &self.progress {
            Some(progress) => orchestrator.with_progress(Arc::clone(progress)),
            None => orchestrator,
        }
    }
}

fn check_params(host: &str, remote_path: &str, credentials: &Credentials) -> Result<()> {
    non_blank(host, "host")?;
    non_blank(remote_path, "remote path")?;
    non_blank(&credentials.username, "username")?;
    non_blank(&credentials.password, "password")?;
    Ok(())
}

fn non_blank(value: &str, name: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FtpError::MissingParameter(name));
    }
    Ok(())
}

fn check_local_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(FtpError::LocalPathNotFound(path.to_path_buf()));
    }
    Ok(())
}

fn check_local_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(FtpError::LocalPathNotFound(path.to_path_buf()));
    }
    Ok(())
}
