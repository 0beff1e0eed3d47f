use std::path::Path;
use log::debug;
use tokio::process::Command;

/// Fire-and-forget post-processing hook: runs the configured executable
/// with the finished output path as its only argument. The child is never
/// awaited and its exit status never observed; launch failures are not
/// surfaced to the scheduler.
pub fn spawn(post_cmd: &Path, output: &Path) {
    match Command::new(post_cmd).arg(output).spawn() {
        Ok(_child) => {}
        Err(e) => debug!("post-process hook {} failed to start: {e}", post_cmd.display()),
    }
}
