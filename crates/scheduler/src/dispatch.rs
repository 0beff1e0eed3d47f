use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use log::{error, info};

use crate::config::EncodeConfig;
use crate::hook;
use crate::job::{self, Job};
use crate::outpath;
use crate::pool::WorkerPool;
use crate::profile::Profile;

/// Final accounting for one scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    /// Jobs actually handed to a worker slot.
    pub launched: usize,
    /// Files whose output already existed.
    pub skipped: usize,
    /// Files dropped on a path-derivation error.
    pub errors: usize,
    pub completed: usize,
    pub peak_in_flight: usize,
}

/// Drive every input file through the worker pool until each one is
/// accounted for: encoded, skipped because its output already exists, or
/// dropped on a path error.
///
/// Single control loop: launch into a free slot while files remain,
/// otherwise suspend until a completion notification arrives, and after
/// every step drain finished slots (completion log, post-hook, slot
/// release). Returns exactly when the completed count reaches the file
/// count, including runs where every output already exists.
pub async fn run(cfg: EncodeConfig, profile: Profile, files: Vec<PathBuf>) -> Result<Summary> {
    let total = files.len();
    let pool = WorkerPool::new(cfg.workers.max(1));
    let cfg = Arc::new(cfg);
    let profile = Arc::new(profile);
    let mut pending: VecDeque<PathBuf> = files.into();

    while pool.completed() < total {
        let mut dispatched = false;
        if !pool.is_full() {
            if let Some(input) = pending.pop_front() {
                dispatch_one(&pool, &cfg, &profile, input)?;
                dispatched = true;
            }
        }
        if !dispatched {
            // No free slot, or no files left to assign.
            pool.wait().await;
        }
        drain(&pool, &cfg);
    }

    // A completion can land between the in-loop drain and the loop check;
    // its log line and post-hook still have to happen.
    drain(&pool, &cfg);

    let stats = pool.stats();
    Ok(Summary {
        total,
        launched: stats.launched,
        skipped: stats.skipped,
        errors: stats.errors,
        completed: stats.completed,
        peak_in_flight: stats.peak_in_flight,
    })
}

/// Resolve one file's output and either account for it without a job or
/// launch its stage chain into a free slot.
fn dispatch_one(
    pool: &Arc<WorkerPool>,
    cfg: &Arc<EncodeConfig>,
    profile: &Arc<Profile>,
    input: PathBuf,
) -> Result<()> {
    let output = match outpath::derive_output(&input, profile) {
        Ok(path) => path,
        Err(e) => {
            error!("{e}");
            info!("Skipping   : {}", input.display());
            pool.count_error();
            return Ok(());
        }
    };

    if output.exists() {
        info!("File {} exists, skipping", output.display());
        pool.count_skipped();
        return Ok(());
    }

    info!("Processing : {} -> {}", input.display(), output.display());
    let job = Job::new(input, output.clone());
    pool.acquire(job.id, output)?;

    let pool = Arc::clone(pool);
    let cfg = Arc::clone(cfg);
    let profile = Arc::clone(profile);
    tokio::spawn(async move {
        job::run(&cfg, &profile, &job).await;
        pool.complete(job.id);
    });
    Ok(())
}

/// Drain finished slots if the sticky completion flag is set: log each
/// finished output, fire the post-hook, release the slot.
fn drain(pool: &WorkerPool, cfg: &EncodeConfig) {
    if let Some(finished) = pool.drain_finished() {
        for done in finished {
            match done.started {
                Some(started) => info!(
                    "Finished   : {} ({})",
                    done.output.display(),
                    format_duration(Utc::now() - started)
                ),
                None => info!("Finished   : {}", done.output.display()),
            }
            if let Some(post_cmd) = &cfg.post_cmd {
                hook::spawn(post_cmd, &done.output);
            }
        }
    }
}

fn format_duration(d: chrono::Duration) -> String {
    let hours = d.num_hours();
    let minutes = d.num_minutes() % 60;
    let seconds = d.num_seconds() % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}
