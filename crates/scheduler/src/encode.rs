use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::EncodeConfig;
use crate::profile::CustomTemplate;

/// Build the single-stage WebM encode invocation.
pub fn webm_command(cfg: &EncodeConfig, input: &Path, output: &Path) -> Command {
    let mut cmd = Command::new(&cfg.ffmpeg_bin);
    cmd.arg("-i")
        .arg(input)
        .arg("-speed")
        .arg("3")
        .arg("-filter:v")
        .arg("yadif")
        .arg("-crf")
        .arg("10")
        .arg("-c:v")
        .arg("libvpx")
        .arg("-b:v")
        .arg("1200k")
        .arg("-b:a")
        .arg("160k")
        .arg(output);
    stage_defaults(&mut cmd, cfg.nice);
    cmd
}

/// Build the container mux stage: video from the intermediate encode, the
/// selected audio track from the original source.
pub fn mux_command(
    cfg: &EncodeConfig,
    input: &Path,
    intermediate: &Path,
    output: &Path,
) -> Command {
    let mut cmd = Command::new(&cfg.mkvmerge_bin);
    cmd.arg("-q")
        .arg("-o")
        .arg(output)
        .arg("-A")
        .arg(intermediate)
        .arg("-D")
        .arg("-a")
        .arg(&cfg.audio_track)
        .arg(input);
    stage_defaults(&mut cmd, cfg.nice);
    cmd
}

/// Build an invocation from a custom template. Placeholder tokens expand to
/// the input/output paths; everything else passes through in order.
pub fn custom_command(
    cfg: &EncodeConfig,
    template: &CustomTemplate,
    input: &Path,
    output: &Path,
) -> Command {
    let mut args = template.build_args(input, output).into_iter();
    let program = args.next().unwrap_or_default();
    let mut cmd = Command::new(program);
    cmd.args(args);
    stage_defaults(&mut cmd, cfg.nice);
    cmd
}

/// Stream and priority policy shared by every external stage: stdin and
/// stderr are discarded, stdout is inherited, and the configured nice
/// value is applied in the child before exec. setpriority failures are
/// ignored, as is the whole adjustment on non-unix targets.
fn stage_defaults(cmd: &mut Command, nice: i32) {
    cmd.stdin(Stdio::null());
    cmd.stderr(Stdio::null());
    #[cfg(unix)]
    {
        let nice = nice.clamp(0, 19) as libc::c_int;
        unsafe {
            cmd.pre_exec(move || {
                libc::setpriority(libc::PRIO_PROCESS as _, 0, nice);
                Ok(())
            });
        }
    }
    #[cfg(not(unix))]
    let _ = nice;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn webm_invocation_matches_the_fixed_profile() {
        let cfg = EncodeConfig::default_config();
        let cmd = webm_command(&cfg, Path::new("in.vob"), Path::new("in.webm"));
        assert_eq!(cmd.as_std().get_program(), OsStr::new("ffmpeg"));
        assert_eq!(
            args_of(&cmd),
            strings(&[
                "-i", "in.vob", "-speed", "3", "-filter:v", "yadif", "-crf", "10", "-c:v",
                "libvpx", "-b:v", "1200k", "-b:a", "160k", "in.webm",
            ])
        );
    }

    #[test]
    fn mux_invocation_uses_the_configured_audio_track() {
        let mut cfg = EncodeConfig::default_config();
        cfg.audio_track = "3".to_string();
        let cmd = mux_command(
            &cfg,
            Path::new("in.vob"),
            Path::new("in.webm"),
            Path::new("in.mkv"),
        );
        assert_eq!(cmd.as_std().get_program(), OsStr::new("mkvmerge"));
        assert_eq!(
            args_of(&cmd),
            strings(&["-q", "-o", "in.mkv", "-A", "in.webm", "-D", "-a", "3", "in.vob"])
        );
    }

    #[test]
    fn custom_invocation_takes_its_program_from_the_template() {
        let cfg = EncodeConfig::default_config();
        let template = CustomTemplate::parse("enc --fast %i %o.avi").unwrap();
        let cmd = custom_command(&cfg, &template, Path::new("a.vob"), Path::new("a.avi"));
        assert_eq!(cmd.as_std().get_program(), OsStr::new("enc"));
        assert_eq!(args_of(&cmd), strings(&["--fast", "a.vob", "a.avi"]));
    }
}
