//! Directory synchronization orchestration
//!
//! Two tree-upload strategies over the same grouping and traversal logic:
//!
//! - **Batch mode** opens one connection per remote-directory group and
//!   pushes that group's files through a single multi-file upload call. A
//!   file failure aborts its group; remaining groups are still attempted and
//!   the first group error is returned after the pass, so batch callers get
//!   a blocking error on partial failure.
//! - **Parallel mode** schedules one unit of work per file-system entry on a
//!   [`BoundedScheduler`]; directory entries check-then-create, file entries
//!   upload with retry and verification. Per-entry failures are logged and
//!   counted but never abort sibling entries; callers read the report.

use crate::endpoint::RemoteEndpoint;
use crate::error::{FtpError, Result};
use crate::grouper::group_files_by_remote_dir;
use crate::scheduler::BoundedScheduler;
use crate::session::TransferSession;
use crate::settings::{Credentials, SyncMode, TransferSettings};
use crate::transport::{TransportFactory, UploadOutcome};
use crossbeam::sync::WaitGroup;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use walkdir::WalkDir;

/// Predicate excluding entries from a parallel sync by relative path
pub type ExcludeFn = dyn Fn(&str) -> bool + Send + Sync;

/// Callback invoked with the number of files just completed
pub type ProgressFn = dyn Fn(u64) + Send + Sync;

/// Aggregate outcome of a tree operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Files successfully transferred
    pub files_uploaded: u64,
    /// Files skipped by the conflict policy
    pub files_skipped: u64,
    /// Entries that failed (parallel mode only; batch mode raises instead)
    pub files_failed: u64,
    /// Remote directories created
    pub directories_created: u64,
    /// Remote files removed by mirror mode
    pub files_pruned: u64,
    /// Total bytes transferred
    pub bytes_uploaded: u64,
    /// Wall-clock duration of the operation
    pub duration: Duration,
}

#[derive(Default)]
struct Counters {
    uploaded: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    dirs: AtomicU64,
    bytes: AtomicU64,
}

/// Drives tree transfers against one endpoint
pub struct DirectorySyncOrchestrator {
    factory: Arc<dyn TransportFactory>,
    endpoint: RemoteEndpoint,
    credentials: Credentials,
    settings: TransferSettings,
    progress: Option<Arc<ProgressFn>>,
}

impl DirectorySyncOrchestrator {
    /// Create an orchestrator for one endpoint and one settings bundle
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        endpoint: RemoteEndpoint,
        credentials: Credentials,
        settings: TransferSettings,
    ) -> Self {
        Self {
            factory,
            endpoint,
            credentials,
            settings,
            progress: None,
        }
    }

    /// Attach a per-file completion callback
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<ProgressFn>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report_progress(&self, bytes: u64) {
        if let Some(progress) = &self.progress {
            progress(bytes);
        }
    }

    /// Batch-mode tree upload: one connection and one multi-file call per
    /// remote-directory group
    ///
    /// # Errors
    ///
    /// Returns the first group-level error once every group has been
    /// attempted; precondition and traversal errors return immediately.
    pub fn upload_directory(
        &self,
        local_root: &Path,
        remote_root: &str,
        mode: SyncMode,
    ) -> Result<SyncReport> {
        let start = Instant::now();
        let plan = group_files_by_remote_dir(local_root, remote_root)?;
        info!(
            "uploading {} files in {} directory groups to {}",
            plan.file_count(),
            plan.len(),
            self.endpoint.addr()
        );

        let mut report = SyncReport::default();
        let mut first_error = None;
        for (remote_dir, files) in plan.iter() {
            match self.upload_group(remote_dir, files, mode) {
                Ok((transferred, pruned)) => {
                    report.files_uploaded += transferred;
                    report.files_pruned += pruned;
                    self.report_progress(transferred);
                }
                Err(e) => {
                    error!("directory group {remote_dir} failed: {e}");
                    report.files_failed += files.len() as u64;
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        report.duration = start.elapsed();

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(
                    "directory upload completed: {} files in {:?}",
                    report.files_uploaded, report.duration
                );
                Ok(report)
            }
        }
    }

    fn upload_group(
        &self,
        remote_dir: &str,
        files: &[PathBuf],
        mode: SyncMode,
    ) -> Result<(u64, u64)> {
        let mut session = TransferSession::open(
            self.factory.as_ref(),
            &self.endpoint,
            &self.credentials,
            &self.settings,
        )?;
        let transferred = session.upload_many(
            files,
            remote_dir,
            self.settings.conflict,
            self.settings.create_remote_directory,
        )?;
        let pruned = if mode == SyncMode::Mirror {
            session.prune_remote(remote_dir, files)?
        } else {
            0
        };
        session.close()?;
        Ok((transferred, pruned))
    }

    /// Bounded-parallel tree upload: one unit of work per file-system entry
    ///
    /// `parallel` is the worker cap (values below 1 fall back to the
    /// scheduler default); `exclude` filters entries by relative path before
    /// anything is scheduled. Per-entry failures are logged and reported in
    /// the returned [`SyncReport`], never raised.
    ///
    /// # Errors
    ///
    /// Returns an error only for precondition and traversal failures; the
    /// transfer phase itself is best-effort.
    pub fn upload_directory_parallel(
        &self,
        local_root: &Path,
        remote_root: &str,
        parallel: usize,
        exclude: Option<&ExcludeFn>,
    ) -> Result<SyncReport> {
        if !local_root.is_dir() {
            return Err(FtpError::LocalPathNotFound(local_root.to_path_buf()));
        }

        let start = Instant::now();
        let scheduler = BoundedScheduler::new(parallel);
        let wait_group = WaitGroup::new();
        let counters = Arc::new(Counters::default());
        let remote_base = remote_root.trim_end_matches('/').to_string();

        info!(
            "parallel sync of {} to {} with {} workers",
            local_root.display(),
            remote_root,
            scheduler.max_workers()
        );

        for entry in WalkDir::new(local_root).min_depth(1) {
            let entry = entry.map_err(|e| {
                FtpError::FileSystem(format!("failed to walk {}: {e}", local_root.display()))
            })?;
            let relative = entry
                .path()
                .strip_prefix(local_root)
                .map_err(|e| FtpError::FileSystem(format!("bad relative path: {e}")))?
                .to_string_lossy()
                .replace('\\', "/");

            if let Some(exclude) = exclude {
                if exclude(&relative) {
                    debug!("excluded {relative}");
                    continue;
                }
            }

            let remote_path = format!("{remote_base}/{relative}");
            let is_directory = entry.file_type().is_dir();
            let local_path = entry.into_path();

            let guard = wait_group.clone();
            let factory = Arc::clone(&self.factory);
            let endpoint = self.endpoint.clone();
            let credentials = self.credentials.clone();
            let settings = self.settings.clone();
            let counters = Arc::clone(&counters);
            let progress = self.progress.clone();

            scheduler.submit(move || {
                let _guard = guard;
                let outcome = sync_one_entry(
                    factory.as_ref(),
                    &endpoint,
                    &credentials,
                    &settings,
                    &local_path,
                    &remote_path,
                    is_directory,
                );
                match outcome {
                    Ok(EntryOutcome::Uploaded(bytes)) => {
                        counters.uploaded.fetch_add(1, Ordering::Relaxed);
                        counters.bytes.fetch_add(bytes, Ordering::Relaxed);
                        if let Some(progress) = progress {
                            progress(1);
                        }
                    }
                    Ok(EntryOutcome::Skipped) => {
                        counters.skipped.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(EntryOutcome::DirectoryCreated) => {
                        counters.dirs.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(EntryOutcome::DirectoryExisted) => {}
                    Err(e) => {
                        error!("failed to sync {} -> {remote_path}: {e}", local_path.display());
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }

        wait_group.wait();

        let report = SyncReport {
            files_uploaded: counters.uploaded.load(Ordering::Relaxed),
            files_skipped: counters.skipped.load(Ordering::Relaxed),
            files_failed: counters.failed.load(Ordering::Relaxed),
            directories_created: counters.dirs.load(Ordering::Relaxed),
            files_pruned: 0,
            bytes_uploaded: counters.bytes.load(Ordering::Relaxed),
            duration: start.elapsed(),
        };
        info!(
            "parallel sync done: {} uploaded, {} skipped, {} failed, {} dirs created in {:?}",
            report.files_uploaded,
            report.files_skipped,
            report.files_failed,
            report.directories_created,
            report.duration
        );
        Ok(report)
    }
}

enum EntryOutcome {
    Uploaded(u64),
    Skipped,
    DirectoryCreated,
    DirectoryExisted,
}

/// Process one entry on a worker: its own connection, one operation,
/// guaranteed disconnect
fn sync_one_entry(
    factory: &dyn TransportFactory,
    endpoint: &RemoteEndpoint,
    credentials: &Credentials,
    settings: &TransferSettings,
    local_path: &Path,
    remote_path: &str,
    is_directory: bool,
) -> Result<EntryOutcome> {
    let mut session = TransferSession::open(factory, endpoint, credentials, settings)?;
    let outcome = if is_directory {
        if session.ensure_directory(remote_path)? {
            EntryOutcome::DirectoryCreated
        } else {
            EntryOutcome::DirectoryExisted
        }
    } else {
        match session.upload_file(local_path, remote_path, settings.conflict, true)? {
            UploadOutcome::Uploaded(bytes) => EntryOutcome::Uploaded(bytes),
            UploadOutcome::Skipped => EntryOutcome::Skipped,
        }
    };
    session.close()?;
    Ok(outcome)
}
