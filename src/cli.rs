//! Command-line interface definitions

use crate::endpoint::RemoteEndpoint;
use crate::settings::{
    ConflictPolicy, Credentials, DataConnectionType, EncryptionMode, SyncMode, TransferSettings,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Concurrent FTP(S) file and directory transfer utility
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a single file
    Upload {
        #[command(flatten)]
        connection: ConnectionOpts,

        /// Path of the file on the server
        #[arg(long, required_unless_present = "uri", conflicts_with = "uri")]
        remote_path: Option<String>,

        /// Local file to upload
        local_file: PathBuf,

        /// Conflict policy for an existing remote file
        #[arg(long, value_enum, default_value = "overwrite")]
        conflict: ConflictPolicy,

        /// Create the remote directory if it is absent
        #[arg(long)]
        create_remote_directory: bool,
    },

    /// Download a single file
    Download {
        #[command(flatten)]
        connection: ConnectionOpts,

        /// Path of the file on the server
        #[arg(long, required_unless_present = "uri", conflicts_with = "uri")]
        remote_path: Option<String>,

        /// Local path to write the downloaded file to
        local_path: PathBuf,
    },

    /// Delete a remote file
    Delete {
        #[command(flatten)]
        connection: ConnectionOpts,

        /// Path of the file on the server
        #[arg(long, required_unless_present = "uri", conflicts_with = "uri")]
        remote_path: Option<String>,
    },

    /// Upload a whole directory tree
    Sync {
        #[command(flatten)]
        connection: ConnectionOpts,

        /// Remote directory to upload into
        #[arg(long)]
        remote_dir: String,

        /// Local directory to upload
        local_dir: PathBuf,

        /// Use grouped batch transfers (one connection per remote directory)
        /// instead of the bounded-parallel per-entry engine
        #[arg(long)]
        batch: bool,

        /// Directory synchronization strategy (batch mode only)
        #[arg(long, value_enum, default_value = "update")]
        mode: SyncMode,

        /// Maximum concurrent connections (0 = one per CPU core)
        #[arg(long, default_value = "5")]
        parallel: usize,

        /// Skip entries whose relative path starts with any of these prefixes
        #[arg(long)]
        exclude: Vec<String>,

        /// Conflict policy for existing remote files
        #[arg(long, value_enum, default_value = "overwrite")]
        conflict: ConflictPolicy,
    },
}

/// Connection flags shared by every subcommand
#[derive(clap::Args, Debug)]
pub struct ConnectionOpts {
    /// Server host name or address
    #[arg(long, required_unless_present = "uri", conflicts_with = "uri")]
    pub host: Option<String>,

    /// Full ftp:// URI naming host and remote path at once
    #[arg(long)]
    pub uri: Option<String>,

    /// Control-connection port
    #[arg(long, default_value = "21")]
    pub port: u16,

    /// Account username
    #[arg(short, long)]
    pub username: String,

    /// Account password
    #[arg(short, long)]
    pub password: String,

    /// Encryption mode (ignored while auto-detection is on)
    #[arg(long, value_enum, default_value = "none")]
    pub encryption: EncryptionMode,

    /// Data-connection type
    #[arg(long, value_enum, default_value = "auto-passive")]
    pub data_connection: DataConnectionType,

    /// Disable connection auto-detection and use the explicit settings
    #[arg(long)]
    pub no_auto_detect: bool,

    /// Accept any server certificate during TLS negotiation
    #[arg(long)]
    pub accept_invalid_certs: bool,
}

impl ConnectionOpts {
    /// Credentials from the command line
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }

    /// Settings bundle for one operation
    #[must_use]
    pub fn settings(&self, conflict: ConflictPolicy, create_remote_directory: bool) -> TransferSettings {
        TransferSettings {
            conflict,
            encryption: self.encryption,
            data_connection: self.data_connection,
            auto_detect: !self.no_auto_detect,
            accept_invalid_certs: self.accept_invalid_certs,
            create_remote_directory,
        }
    }

    /// Resolve the endpoint from either the URI or the host + path form
    ///
    /// # Errors
    ///
    /// Returns an error when the URI cannot be parsed or carries a non-FTP
    /// scheme.
    pub fn endpoint(&self, remote_path: Option<&str>) -> Result<RemoteEndpoint> {
        if let Some(uri) = &self.uri {
            return Ok(RemoteEndpoint::from_uri(uri)?);
        }
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Either --host or --uri must be specified"))?;
        let path = remote_path
            .ok_or_else(|| anyhow::anyhow!("--remote-path is required with --host"))?;
        Ok(RemoteEndpoint::new(host, path).with_port(self.port))
    }
}

impl Args {
    /// Validate command-line arguments
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - Both --quiet and --verbose options are used
    /// - The parallel worker count is outside valid bounds (0-64)
    /// - A local source path does not exist
    pub fn validate(&self) -> Result<()> {
        if self.quiet && self.verbose > 0 {
            anyhow::bail!("Cannot use both --quiet and --verbose options");
        }

        match &self.command {
            Command::Upload { local_file, .. } => {
                if !local_file.is_file() {
                    anyhow::bail!("Local file does not exist: {}", local_file.display());
                }
            }
            Command::Sync {
                local_dir,
                parallel,
                ..
            } => {
                if !local_dir.is_dir() {
                    anyhow::bail!("Local directory does not exist: {}", local_dir.display());
                }
                if *parallel > 64 {
                    anyhow::bail!("Parallel worker count must be between 0 and 64, got: {parallel}");
                }
            }
            Command::Download { .. } | Command::Delete { .. } => {}
        }

        Ok(())
    }

    /// Worker count with `0` resolved to the CPU count
    #[must_use]
    pub fn effective_parallel(parallel: usize) -> usize {
        if parallel == 0 {
            num_cpus::get()
        } else {
            parallel
        }
    }
}
