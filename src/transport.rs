//! FTP transport collaborator
//!
//! [`FtpTransport`] is the seam between the transfer engine and the wire
//! protocol: one implementor wraps one live FTP connection. The production
//! implementation is backed by `suppaftp`; tests substitute a recording
//! mock. A [`TransportFactory`] mints one transport per session so that
//! parallel workers each own their connection exclusively.

use crate::endpoint::RemoteEndpoint;
use crate::error::{FtpError, Result};
use crate::settings::{ConflictPolicy, Credentials, DataConnectionType, EncryptionMode, TransferSettings};
use std::fs::File;
use std::path::{Path, PathBuf};
use suppaftp::types::FileType;
use suppaftp::{Mode, NativeTlsConnector, NativeTlsFtpStream, Status};
use tracing::{debug, info, warn};

/// Result of a single upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Bytes were transferred
    Uploaded(u64),
    /// The remote file already existed and the conflict policy said to skip
    Skipped,
}

/// One live FTP connection
///
/// Every method maps to one or a few protocol commands; retry and
/// verification semantics live a layer up in the session.
pub trait FtpTransport: Send {
    /// Upload one local file to `remote`, honoring the conflict policy
    fn upload(&mut self, local: &Path, remote: &str, conflict: ConflictPolicy)
        -> Result<UploadOutcome>;

    /// Download the remote file's bytes
    fn download(&mut self, remote: &str) -> Result<Vec<u8>>;

    /// Delete the remote file
    fn delete(&mut self, remote: &str) -> Result<()>;

    /// Size of the remote file, or `None` when it does not exist or the
    /// server cannot report sizes
    fn remote_size(&mut self, remote: &str) -> Result<Option<u64>>;

    /// Names of the entries directly inside a remote directory
    fn list_names(&mut self, remote_dir: &str) -> Result<Vec<String>>;

    /// Whether a remote directory exists
    fn directory_exists(&mut self, remote_dir: &str) -> Result<bool>;

    /// Create a remote directory, optionally with all missing ancestors
    ///
    /// Returns `Ok(true)` when at least one level was created and
    /// `Ok(false)` when everything already existed. A creation race lost to
    /// another worker reports `Ok(false)`, never an error.
    fn create_directory(&mut self, remote_dir: &str, recursive: bool) -> Result<bool>;

    /// Close the control connection
    fn disconnect(&mut self) -> Result<()>;

    /// Upload many files into one remote directory over this connection,
    /// failing fast on the first file-level error
    ///
    /// Returns the number of files transferred (skips included).
    fn upload_many(
        &mut self,
        files: &[PathBuf],
        remote_dir: &str,
        conflict: ConflictPolicy,
        create_remote_directory: bool,
    ) -> Result<u64> {
        if create_remote_directory && !self.directory_exists(remote_dir)? {
            self.create_directory(remote_dir, true)?;
        }

        let base = remote_dir.trim_end_matches('/');
        let mut transferred = 0u64;
        for local in files {
            let name = local
                .file_name()
                .ok_or_else(|| {
                    FtpError::FileSystem(format!("path has no file name: {}", local.display()))
                })?
                .to_string_lossy()
                .into_owned();
            self.upload(local, &format!("{base}/{name}"), conflict)?;
            transferred += 1;
        }
        Ok(transferred)
    }
}

/// Opens one transport per session
pub trait TransportFactory: Send + Sync {
    /// Connect and authenticate a fresh transport for one operation
    fn connect(
        &self,
        endpoint: &RemoteEndpoint,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<Box<dyn FtpTransport>>;
}

/// Production transport backed by `suppaftp`
pub struct SuppaftpTransport {
    stream: NativeTlsFtpStream,
}

/// Factory for [`SuppaftpTransport`] connections
#[derive(Debug, Default, Clone, Copy)]
pub struct SuppaftpFactory;

impl TransportFactory for SuppaftpFactory {
    fn connect(
        &self,
        endpoint: &RemoteEndpoint,
        credentials: &Credentials,
        settings: &TransferSettings,
    ) -> Result<Box<dyn FtpTransport>> {
        let addr = endpoint.addr();
        debug!("connecting to {addr} as {}", credentials.username);

        let mut stream = if settings.auto_detect {
            // Try an explicit TLS upgrade first, fall back to plain text
            // when the server refuses the handshake.
            match connect_explicit(endpoint, settings) {
                Ok(stream) => stream,
                Err(e) => {
                    debug!("TLS negotiation with {addr} failed ({e}), falling back to plain text");
                    connect_plain(endpoint)?
                }
            }
        } else {
            match settings.encryption {
                EncryptionMode::None => connect_plain(endpoint)?,
                EncryptionMode::Explicit => connect_explicit(endpoint, settings)?,
                EncryptionMode::Implicit => connect_implicit(endpoint, settings)?,
            }
        };

        stream.set_mode(data_mode(settings.data_connection));
        stream
            .login(&credentials.username, &credentials.password)
            .map_err(map_ftp)?;
        stream.transfer_type(FileType::Binary).map_err(map_ftp)?;

        Ok(Box::new(SuppaftpTransport { stream }))
    }
}

fn connect_plain(endpoint: &RemoteEndpoint) -> Result<NativeTlsFtpStream> {
    NativeTlsFtpStream::connect(endpoint.addr()).map_err(map_ftp)
}

fn connect_explicit(
    endpoint: &RemoteEndpoint,
    settings: &TransferSettings,
) -> Result<NativeTlsFtpStream> {
    let stream = connect_plain(endpoint)?;
    stream
        .into_secure(tls_connector(settings)?, &endpoint.host)
        .map_err(map_ftp)
}

fn connect_implicit(
    endpoint: &RemoteEndpoint,
    settings: &TransferSettings,
) -> Result<NativeTlsFtpStream> {
    NativeTlsFtpStream::connect_secure_implicit(
        endpoint.addr(),
        tls_connector(settings)?,
        &endpoint.host,
    )
    .map_err(map_ftp)
}

fn tls_connector(settings: &TransferSettings) -> Result<NativeTlsConnector> {
    let mut builder = suppaftp::native_tls::TlsConnector::builder();
    if settings.accept_invalid_certs {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }
    let connector = builder
        .build()
        .map_err(|e| FtpError::Transport(format!("TLS connector setup failed: {e}")))?;
    Ok(NativeTlsConnector::from(connector))
}

const fn data_mode(data_connection: DataConnectionType) -> Mode {
    match data_connection {
        DataConnectionType::AutoPassive | DataConnectionType::Passive => Mode::Passive,
        DataConnectionType::ExtendedPassive => Mode::ExtendedPassive,
        DataConnectionType::Active => Mode::Active,
    }
}

fn map_ftp(e: suppaftp::FtpError) -> FtpError {
    FtpError::Transport(e.to_string())
}

impl SuppaftpTransport {
    fn exists(&mut self, remote: &str) -> Result<bool> {
        Ok(self.remote_size(remote)?.is_some())
    }
}

impl FtpTransport for SuppaftpTransport {
    fn upload(
        &mut self,
        local: &Path,
        remote: &str,
        conflict: ConflictPolicy,
    ) -> Result<UploadOutcome> {
        let append = match conflict {
            ConflictPolicy::Skip => {
                if self.exists(remote)? {
                    debug!("remote file {remote} exists, skipping");
                    return Ok(UploadOutcome::Skipped);
                }
                false
            }
            // Append only when there is something to append to.
            ConflictPolicy::Append => self.exists(remote)?,
            ConflictPolicy::AppendNoCheck => true,
            ConflictPolicy::Overwrite | ConflictPolicy::NoCheck => false,
        };

        let mut file = File::open(local)
            .map_err(|e| FtpError::FileSystem(format!("failed to open {}: {e}", local.display())))?;

        let bytes = if append {
            self.stream.append_file(remote, &mut file).map_err(map_ftp)?
        } else {
            self.stream.put_file(remote, &mut file).map_err(map_ftp)?
        };
        Ok(UploadOutcome::Uploaded(bytes))
    }

    fn download(&mut self, remote: &str) -> Result<Vec<u8>> {
        let cursor = self.stream.retr_as_buffer(remote).map_err(map_ftp)?;
        Ok(cursor.into_inner())
    }

    fn delete(&mut self, remote: &str) -> Result<()> {
        self.stream.rm(remote).map_err(map_ftp)
    }

    fn remote_size(&mut self, remote: &str) -> Result<Option<u64>> {
        match self.stream.size(remote) {
            Ok(size) => Ok(Some(size as u64)),
            Err(suppaftp::FtpError::UnexpectedResponse(response))
                if response.status == Status::FileUnavailable =>
            {
                Ok(None)
            }
            Err(suppaftp::FtpError::UnexpectedResponse(response))
                if response.status == Status::CommandNotImplemented =>
            {
                // Server cannot report sizes at all.
                Ok(None)
            }
            Err(e) => Err(map_ftp(e)),
        }
    }

    fn list_names(&mut self, remote_dir: &str) -> Result<Vec<String>> {
        let entries = self.stream.nlst(Some(remote_dir)).map_err(map_ftp)?;
        // Some servers return full paths from NLST; keep only the last
        // component either way.
        Ok(entries
            .into_iter()
            .filter_map(|entry| entry.rsplit('/').next().map(str::to_string))
            .filter(|name| name != "." && name != "..")
            .collect())
    }

    fn directory_exists(&mut self, remote_dir: &str) -> Result<bool> {
        let current = self.stream.pwd().map_err(map_ftp)?;
        match self.stream.cwd(remote_dir) {
            Ok(()) => {
                self.stream.cwd(&current).map_err(map_ftp)?;
                Ok(true)
            }
            Err(suppaftp::FtpError::UnexpectedResponse(response))
                if response.status == Status::FileUnavailable =>
            {
                Ok(false)
            }
            Err(e) => Err(map_ftp(e)),
        }
    }

    fn create_directory(&mut self, remote_dir: &str, recursive: bool) -> Result<bool> {
        if !recursive {
            return match self.stream.mkdir(remote_dir) {
                Ok(()) => Ok(true),
                // A failed MKD against an existing directory (possibly one a
                // racing worker just created) is not an error.
                Err(e) => {
                    if self.directory_exists(remote_dir)? {
                        Ok(false)
                    } else {
                        Err(map_ftp(e))
                    }
                }
            };
        }

        let mut prefix = if remote_dir.starts_with('/') {
            String::from("/")
        } else {
            String::new()
        };
        let mut created_any = false;
        for segment in remote_dir.split('/').filter(|s| !s.is_empty()) {
            if !prefix.is_empty() && !prefix.ends_with('/') {
                prefix.push('/');
            }
            prefix.push_str(segment);
            if self.create_directory(&prefix, false)? {
                created_any = true;
            }
        }
        Ok(created_any)
    }

    fn disconnect(&mut self) -> Result<()> {
        self.stream.quit().map_err(map_ftp)
    }
}

/// Log a completed transfer in one place so batch and parallel paths agree
pub(crate) fn log_transfer(local: &Path, remote: &str, outcome: UploadOutcome) {
    match outcome {
        UploadOutcome::Uploaded(bytes) => {
            info!("{} -> {remote} ({bytes} bytes)", local.display());
        }
        UploadOutcome::Skipped => {
            warn!("{} -> {remote} skipped (remote file exists)", local.display());
        }
    }
}
