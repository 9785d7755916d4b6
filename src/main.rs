//! ftpsync: concurrent FTP(S) file and directory transfer utility

use anyhow::{Context, Result};
use clap::Parser;
use ftpsync::cli::{Args, Command};
use ftpsync::{ConflictPolicy, FtpClient, ProgressTracker, SyncMode, SyncReport};
use std::sync::Arc;
use tracing::{info, Level};
use walkdir::WalkDir;

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging based on verbosity and quiet mode
    if args.quiet {
        // In quiet mode, only log errors
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::ERROR)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(match args.verbose {
                0 => Level::WARN,
                1 => Level::INFO,
                2 => Level::DEBUG,
                _ => Level::TRACE,
            })
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)?;
    }

    // Validate arguments
    args.validate().context("Invalid arguments")?;

    match run(&args) {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Upload {
            connection,
            remote_path,
            local_file,
            conflict,
            create_remote_directory,
        } => {
            let endpoint = connection.endpoint(remote_path.as_deref())?;
            let client = FtpClient::new();
            let settings = connection.settings(*conflict, *create_remote_directory);
            client.upload_file(
                &endpoint.addr(),
                &endpoint.path,
                local_file,
                &connection.credentials(),
                &settings,
            )?;
            info!("Upload completed");
            Ok(())
        }

        Command::Download {
            connection,
            remote_path,
            local_path,
        } => {
            let endpoint = connection.endpoint(remote_path.as_deref())?;
            let client = FtpClient::new();
            let settings = connection.settings(ConflictPolicy::Overwrite, false);
            let bytes = client.download_file(
                &endpoint.addr(),
                &endpoint.path,
                local_path,
                &connection.credentials(),
                &settings,
            )?;
            info!("Download completed: {bytes} bytes");
            Ok(())
        }

        Command::Delete {
            connection,
            remote_path,
        } => {
            let endpoint = connection.endpoint(remote_path.as_deref())?;
            let client = FtpClient::new();
            let settings = connection.settings(ConflictPolicy::Overwrite, false);
            client.delete_file(
                &endpoint.addr(),
                &endpoint.path,
                &connection.credentials(),
                &settings,
            )?;
            info!("Delete completed");
            Ok(())
        }

        Command::Sync {
            connection,
            remote_dir,
            local_dir,
            batch,
            mode,
            parallel,
            exclude,
            conflict,
        } => {
            let endpoint = connection.endpoint(Some(remote_dir))?;
            let settings = connection.settings(*conflict, true);
            let credentials = connection.credentials();

            let total_files = WalkDir::new(local_dir)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_file())
                .count() as u64;

            let mut client = FtpClient::new();
            let tracker = if args.quiet {
                None
            } else {
                Some(Arc::new(ProgressTracker::for_files(total_files)))
            };
            if let Some(tracker) = &tracker {
                let tracker = Arc::clone(tracker);
                client = client.with_progress(Arc::new(move |files| tracker.inc(files)));
            }

            let report = if *batch {
                client.upload_directory(
                    &endpoint.addr(),
                    &endpoint.path,
                    local_dir,
                    *mode,
                    &credentials,
                    &settings,
                )?
            } else {
                if *mode == SyncMode::Mirror {
                    anyhow::bail!("--mode mirror requires --batch");
                }
                let workers = Args::effective_parallel(*parallel);
                let exclude = exclude.clone();
                let predicate = move |relative: &str| {
                    exclude.iter().any(|prefix| relative.starts_with(prefix))
                };
                client.upload_directory_parallel(
                    &endpoint.addr(),
                    &endpoint.path,
                    local_dir,
                    workers,
                    Some(&predicate),
                    &credentials,
                    &settings,
                )?
            };

            if let Some(tracker) = &tracker {
                tracker.finish();
            }
            print_report(&report);
            Ok(())
        }
    }
}

fn print_report(report: &SyncReport) {
    info!("Files uploaded: {}", report.files_uploaded);
    info!("Files skipped: {}", report.files_skipped);
    if report.files_failed > 0 {
        info!("Files failed: {}", report.files_failed);
    }
    if report.files_pruned > 0 {
        info!("Remote files pruned: {}", report.files_pruned);
    }
    info!("Directories created: {}", report.directories_created);
    info!("Duration: {:?}", report.duration);
}
