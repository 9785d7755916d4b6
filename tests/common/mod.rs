//! Shared test fixtures: a recording in-memory FTP transport

use ftpsync::endpoint::RemoteEndpoint;
use ftpsync::error::{FtpError, Result};
use ftpsync::settings::{ConflictPolicy, Credentials, TransferSettings};
use ftpsync::transport::{FtpTransport, TransportFactory, UploadOutcome};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// One recorded transport call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Upload { remote: String, conflict: ConflictPolicy },
    Download(String),
    Delete(String),
    Size(String),
    List(String),
    DirExists(String),
    CreateDir { path: String, recursive: bool },
    Disconnect,
}

/// Shared server state across all connections minted by one factory
#[derive(Default)]
pub struct MockServer {
    pub calls: Mutex<Vec<Call>>,
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub dirs: Mutex<HashSet<String>>,
    /// Remote paths whose uploads fail with a transport error
    pub fail_uploads: Mutex<HashSet<String>>,
    /// Report every file as one byte larger than it is, so size
    /// verification never passes
    pub lie_about_sizes: Mutex<bool>,
}

impl MockServer {
    pub fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploaded_remotes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upload { remote, .. } => Some(remote),
                _ => None,
            })
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Connect))
            .count()
    }

    pub fn seed_file(&self, remote: &str, content: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(remote.to_string(), content.to_vec());
    }

    pub fn fail_upload_of(&self, remote: &str) {
        self.fail_uploads.lock().unwrap().insert(remote.to_string());
    }

    pub fn has_file(&self, remote: &str) -> bool {
        self.files.lock().unwrap().contains_key(remote)
    }
}

pub struct MockTransport {
    server: Arc<MockServer>,
}

impl FtpTransport for MockTransport {
    fn upload(
        &mut self,
        local: &Path,
        remote: &str,
        conflict: ConflictPolicy,
    ) -> Result<UploadOutcome> {
        self.server.record(Call::Upload {
            remote: remote.to_string(),
            conflict,
        });
        if self.server.fail_uploads.lock().unwrap().contains(remote) {
            return Err(FtpError::Transport(format!("551 transfer rejected: {remote}")));
        }
        if conflict == ConflictPolicy::Skip && self.server.has_file(remote) {
            return Ok(UploadOutcome::Skipped);
        }
        let content = std::fs::read(local)
            .map_err(|e| FtpError::FileSystem(format!("failed to read {}: {e}", local.display())))?;
        let len = content.len() as u64;
        self.server.seed_file(remote, &content);
        Ok(UploadOutcome::Uploaded(len))
    }

    fn download(&mut self, remote: &str) -> Result<Vec<u8>> {
        self.server.record(Call::Download(remote.to_string()));
        self.server
            .files
            .lock()
            .unwrap()
            .get(remote)
            .cloned()
            .ok_or_else(|| FtpError::Transport(format!("550 no such file: {remote}")))
    }

    fn delete(&mut self, remote: &str) -> Result<()> {
        self.server.record(Call::Delete(remote.to_string()));
        self.server
            .files
            .lock()
            .unwrap()
            .remove(remote)
            .map(|_| ())
            .ok_or_else(|| FtpError::Transport(format!("550 no such file: {remote}")))
    }

    fn remote_size(&mut self, remote: &str) -> Result<Option<u64>> {
        self.server.record(Call::Size(remote.to_string()));
        let lie = u64::from(*self.server.lie_about_sizes.lock().unwrap());
        Ok(self
            .server
            .files
            .lock()
            .unwrap()
            .get(remote)
            .map(|content| content.len() as u64 + lie))
    }

    fn list_names(&mut self, remote_dir: &str) -> Result<Vec<String>> {
        self.server.record(Call::List(remote_dir.to_string()));
        let base = remote_dir.trim_end_matches('/');
        Ok(self
            .server
            .files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|remote| {
                let (parent, name) = remote.rsplit_once('/')?;
                (parent == base).then(|| name.to_string())
            })
            .collect())
    }

    fn directory_exists(&mut self, remote_dir: &str) -> Result<bool> {
        self.server.record(Call::DirExists(remote_dir.to_string()));
        Ok(self.server.dirs.lock().unwrap().contains(remote_dir))
    }

    fn create_directory(&mut self, remote_dir: &str, recursive: bool) -> Result<bool> {
        self.server.record(Call::CreateDir {
            path: remote_dir.to_string(),
            recursive,
        });
        Ok(self.server.dirs.lock().unwrap().insert(remote_dir.to_string()))
    }

    fn disconnect(&mut self) -> Result<()> {
        self.server.record(Call::Disconnect);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockFactory {
    pub server: Arc<MockServer>,
}

impl MockFactory {
    pub fn new() -> (Arc<Self>, Arc<MockServer>) {
        let server = Arc::new(MockServer::default());
        let factory = Arc::new(Self {
            server: Arc::clone(&server),
        });
        (factory, server)
    }
}

impl TransportFactory for MockFactory {
    fn connect(
        &self,
        _endpoint: &RemoteEndpoint,
        _credentials: &Credentials,
        _settings: &TransferSettings,
    ) -> Result<Box<dyn FtpTransport>> {
        self.server.record(Call::Connect);
        Ok(Box::new(MockTransport {
            server: Arc::clone(&self.server),
        }))
    }
}

/// Credentials used by most scenarios
pub fn credentials() -> Credentials {
    Credentials::new("username", "password")
}
