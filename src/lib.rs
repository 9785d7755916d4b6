//! ftpsync: concurrent FTP(S) file and directory transfer engine
//!
//! This library provides upload, download, and delete primitives against a
//! remote FTP(S) endpoint plus a recursive, concurrency-bounded directory
//! synchronizer, built on a bounded worker pool where every worker owns its
//! own connection.

pub mod cli;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod grouper;
pub mod orchestrator;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod transport;

// Re-export commonly used types
pub use client::FtpClient;
pub use endpoint::RemoteEndpoint;
pub use error::{FtpError, Result};
pub use grouper::{group_files_by_remote_dir, GroupedUploadPlan};
pub use orchestrator::{DirectorySyncOrchestrator, SyncReport};
pub use progress::ProgressTracker;
pub use scheduler::BoundedScheduler;
pub use session::TransferSession;
pub use settings::{
    ConflictPolicy, Credentials, DataConnectionType, EncryptionMode, SyncMode, TransferSettings,
};
pub use transport::{FtpTransport, TransportFactory, UploadOutcome};
