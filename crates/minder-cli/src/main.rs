//! minder - supervises a set of child processes from a manifest.
//!
//! Thin driver over `minder-core`: starts every process in the manifest,
//! samples stats on a fixed tick, logs a per-process summary line, and
//! terminates everything on Ctrl+C.

mod manifest;

use anyhow::Result;
use clap::Parser;
use manifest::Manifest;
use minder_core::{
    CancellationToken, ProcessStatus, ProcessSupervisor, ResourceTracker, StatsSampler,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "minder")]
#[command(about = "Supervise child processes and sample their resource usage")]
struct Args {
    /// Path to the JSON process manifest
    #[arg(short, long)]
    manifest: PathBuf,

    /// Sampling interval in milliseconds
    #[arg(long, default_value = "500")]
    interval_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let manifest = Manifest::load(&args.manifest)?;
    info!("Supervising {} process(es)", manifest.processes.len());

    let tracker = Arc::new(ResourceTracker::default());
    let mut supervisors = Vec::with_capacity(manifest.processes.len());
    for spec in manifest.processes {
        let supervisor = Arc::new(ProcessSupervisor::new(spec, tracker.clone()));
        match supervisor.run().await {
            Ok(()) => {
                info!(
                    pid = supervisor.pid(),
                    command = supervisor.command_line(),
                    "started"
                );
            }
            Err(e) => {
                // The handle stays in Error; the caller decides on retries.
                error!(command = supervisor.command_line(), error = %e, "failed to start");
            }
        }
        supervisors.push(supervisor);
    }

    let interval = Duration::from_millis(args.interval_ms);
    let sampler = Arc::new(StatsSampler::new(supervisors).with_interval(interval));
    let token = CancellationToken::new();

    let sampler_task = {
        let sampler = sampler.clone();
        let token = token.clone();
        tokio::spawn(async move { sampler.run(token).await })
    };

    let mut report = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = report.tick() => {
                for snapshot in sampler.snapshots() {
                    info!(
                        pid = snapshot.pid,
                        status = %snapshot.status,
                        cpu_percent = snapshot.cpu_percent,
                        memory_mb = snapshot.memory_bytes / (1024 * 1024),
                        command = %snapshot.command_line,
                        "stats"
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Shutdown signal received, terminating supervised processes");
    token.cancel();
    for supervisor in sampler.supervisors() {
        if supervisor.status() != ProcessStatus::Running {
            continue;
        }
        if let Err(e) = supervisor.terminate().await {
            error!(command = supervisor.command_line(), error = %e, "terminate failed");
        }
    }
    let _ = sampler_task.await;

    Ok(())
}
