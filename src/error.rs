//! Error handling and types

use std::path::PathBuf;
use thiserror::Error;

/// FTP transfer and synchronization errors
#[derive(Error, Debug)]
pub enum FtpError {
    /// A required parameter was empty or blank
    #[error("missing or blank parameter: {0}")]
    MissingParameter(&'static str),

    /// A server URI carried a scheme other than `ftp`
    #[error("URI scheme must be 'ftp', got '{scheme}' in {uri}")]
    InvalidScheme {
        /// The offending URI as supplied by the caller
        uri: String,
        /// The scheme that was actually present
        scheme: String,
    },

    /// A local source path does not exist
    #[error("local path does not exist: {0}")]
    LocalPathNotFound(PathBuf),

    /// Error surfaced by the FTP transport (connection, auth, transfer)
    #[error("transport error: {0}")]
    Transport(String),

    /// Post-transfer verification did not pass within the attempt budget
    #[error("verification failed for {remote} after {attempts} attempts")]
    Verification {
        /// Remote path of the file that failed verification
        remote: String,
        /// Number of attempts made
        attempts: u32,
    },

    /// General local filesystem error
    #[error("file system error: {0}")]
    FileSystem(String),

    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FtpError {
    /// Whether this error was raised before any network call was attempted
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_) | Self::InvalidScheme { .. } | Self::LocalPathNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FtpError>;
