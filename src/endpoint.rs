//! Remote endpoint addressing
//!
//! An endpoint can be given either as a host plus remote path, or as an
//! `ftp://` URI; both forms resolve to the same normalized pair before use.

use crate::error::{FtpError, Result};
use url::Url;

/// Default FTP control port
pub const DEFAULT_FTP_PORT: u16 = 21;

/// A resolved remote FTP endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    /// Server host name or address
    pub host: String,
    /// Control-connection port
    pub port: u16,
    /// Path on the server
    pub path: String,
}

impl RemoteEndpoint {
    /// Build an endpoint from host and remote path
    ///
    /// A `host:port` suffix is honored; otherwise the default FTP port is
    /// used. IPv6 literals are accepted bare (`::1`) or bracketed with a
    /// port (`[::1]:2121`).
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        let (host, port) = split_host_port(&host.into());
        Self {
            host,
            port,
            path: path.into(),
        }
    }

    /// Override the control-connection port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Parse an endpoint from an FTP URI such as `ftp://host/some/file.txt`
    ///
    /// # Errors
    ///
    /// Returns `FtpError::InvalidScheme` for any scheme other than `ftp`,
    /// and `FtpError::MissingParameter` when the URI carries no host.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let parsed = Url::parse(uri).map_err(|e| FtpError::InvalidScheme {
            uri: uri.to_string(),
            scheme: format!("unparseable ({e})"),
        })?;

        if parsed.scheme() != "ftp" {
            return Err(FtpError::InvalidScheme {
                uri: uri.to_string(),
                scheme: parsed.scheme().to_string(),
            });
        }

        // Url::host_str brackets IPv6 literals; store the bare address and
        // let addr() re-bracket.
        let host = parsed
            .host_str()
            .ok_or(FtpError::MissingParameter("host"))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        Ok(Self {
            host,
            port: parsed.port().unwrap_or(DEFAULT_FTP_PORT),
            path: parsed.path().to_string(),
        })
    }

    /// Socket address string for the control connection
    ///
    /// IPv6 hosts are bracketed so the port suffix stays unambiguous.
    #[must_use]
    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn split_host_port(host: &str) -> (String, u16) {
    if let Some(rest) = host.strip_prefix('[') {
        if let Some((addr, tail)) = rest.split_once(']') {
            let port = tail
                .strip_prefix(':')
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_FTP_PORT);
            return (addr.to_string(), port);
        }
    }
    // More than one colon without brackets is a bare IPv6 literal, not a
    // host:port pair.
    if host.matches(':').count() > 1 {
        return (host.to_string(), DEFAULT_FTP_PORT);
    }
    match host.rsplit_once(':') {
        Some((name, port_str)) => match port_str.parse::<u16>() {
            Ok(port) => (name.to_string(), port),
            Err(_) => (host.to_string(), DEFAULT_FTP_PORT),
        },
        None => (host.to_string(), DEFAULT_FTP_PORT),
    }
}
