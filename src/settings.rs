//! Connection and transfer settings
//!
//! Settings are immutable once passed into an operation; credentials are
//! constructed per call and never persisted beyond it.

/// FTP account credentials, supplied fresh for every operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account username
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create credentials from username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// What to do when the remote file already exists at the destination path
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConflictPolicy {
    /// Replace the remote file
    Overwrite,
    /// Leave the remote file untouched and skip the transfer
    Skip,
    /// Append to the remote file, checking whether it exists first
    Append,
    /// Append without an existence check
    AppendNoCheck,
    /// Transfer without any existence check
    NoCheck,
}

impl ConflictPolicy {
    /// Whether a post-transfer size verification is meaningful for this policy
    ///
    /// Appended files never match the local length, and no-check transfers
    /// skip remote probes entirely.
    #[must_use]
    pub const fn verifiable(self) -> bool {
        matches!(self, Self::Overwrite | Self::Skip)
    }
}

/// Type of control-connection encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EncryptionMode {
    /// Plain text
    None,
    /// FTPS from the start of the connection (commonly port 990)
    Implicit,
    /// Connection starts in plain text and upgrades via AUTH TLS
    Explicit,
}

/// Data-connection establishment strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DataConnectionType {
    /// Prefer passive mode (default)
    AutoPassive,
    /// Passive mode (PASV)
    Passive,
    /// Extended passive mode (EPSV)
    ExtendedPassive,
    /// Active mode (PORT)
    Active,
}

/// Directory synchronization strategy for tree uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SyncMode {
    /// Transfer files without touching remote entries absent locally
    Update,
    /// Make the remote tree match the local tree, deleting remote files
    /// that have no local counterpart
    Mirror,
}

/// Connection policy and conflict behavior for a transfer operation
#[derive(Debug, Clone)]
pub struct TransferSettings {
    /// Conflict policy for existing remote files
    pub conflict: ConflictPolicy,
    /// Encryption mode, ignored when `auto_detect` is set
    pub encryption: EncryptionMode,
    /// Data-connection type
    pub data_connection: DataConnectionType,
    /// Negotiate connection settings automatically: try a TLS upgrade and
    /// fall back to plain text if the server refuses
    pub auto_detect: bool,
    /// Accept any server certificate during TLS negotiation
    pub accept_invalid_certs: bool,
    /// Create the remote directory before uploading if it is absent
    pub create_remote_directory: bool,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            conflict: ConflictPolicy::Overwrite,
            encryption: EncryptionMode::None,
            data_connection: DataConnectionType::AutoPassive,
            auto_detect: true,
            accept_invalid_certs: false,
            create_remote_directory: false,
        }
    }
}
