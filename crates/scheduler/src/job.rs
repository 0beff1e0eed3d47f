use std::path::PathBuf;
use log::{info, warn};
use uuid::Uuid;

use crate::config::EncodeConfig;
use crate::encode;
use crate::outpath;
use crate::profile::Profile;

/// Identity a worker slot holds while a job occupies it.
pub type JobId = Uuid;

/// One file's transcoding work item. Immutable once created; lives only as
/// long as its slot occupancy.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Job {
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        Job {
            id: Uuid::new_v4(),
            input,
            output,
        }
    }
}

/// Run the job's external stage chain to completion inside one slot
/// occupancy.
///
/// Exit statuses are never inspected: a stage that ran and failed is
/// accounted exactly like one that succeeded, and the mux profile always
/// proceeds to its second stage. Spawn failures are logged and the job
/// still ends; the caller counts it finished either way.
pub async fn run(cfg: &EncodeConfig, profile: &Profile, job: &Job) {
    match profile {
        Profile::Webm => {
            run_stage(encode::webm_command(cfg, &job.input, &job.output), job).await;
        }
        Profile::Custom(template) => {
            run_stage(
                encode::custom_command(cfg, template, &job.input, &job.output),
                job,
            )
            .await;
        }
        Profile::Mkv => run_mux_chain(cfg, job).await,
    }
}

/// Two-stage chain for the container profile: encode to an intermediate
/// WebM next to the final output, wait for it, then mux it together with
/// the source's audio. The intermediate file stays on disk.
async fn run_mux_chain(cfg: &EncodeConfig, job: &Job) {
    let intermediate = match outpath::webm_intermediate(&job.output) {
        Ok(path) => path,
        Err(e) => {
            warn!("job {}: {e}", job.id);
            return;
        }
    };

    run_stage(encode::webm_command(cfg, &job.input, &intermediate), job).await;

    info!("Muxing     : {}", job.output.display());
    run_stage(
        encode::mux_command(cfg, &job.input, &intermediate, &job.output),
        job,
    )
    .await;
}

async fn run_stage(mut cmd: tokio::process::Command, job: &Job) {
    let program = cmd.as_std().get_program().to_os_string();
    match cmd.spawn() {
        Ok(mut child) => {
            if let Err(e) = child.wait().await {
                warn!("job {}: failed waiting on {program:?}: {e}", job.id);
            }
        }
        Err(e) => warn!("job {}: failed to launch {program:?}: {e}", job.id),
    }
}
