use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the batch encode scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// How many encodes run at once; 0 selects CPU count - 1 at start-up
    pub workers: usize,
    /// Nice value applied to every encoder process (0..=19)
    pub nice: i32,
    /// Audio track to take from the source when muxing a container
    pub audio_track: String,
    /// Optional executable invoked with each finished output path
    pub post_cmd: Option<PathBuf>,
    /// Path to the ffmpeg binary
    pub ffmpeg_bin: PathBuf,
    /// Path to the mkvmerge binary
    pub mkvmerge_bin: PathBuf,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl EncodeConfig {
    /// Create a default configuration with sensible values
    pub fn default_config() -> Self {
        Self {
            workers: 0,
            nice: 10,
            audio_track: "1".to_string(),
            post_cmd: None,
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            mkvmerge_bin: PathBuf::from("mkvmerge"),
        }
    }

    /// Load configuration from a file, or return defaults if path is None or file doesn't exist
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path).with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                })?;

                // Try TOML by extension, JSON otherwise
                if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    config = toml::from_str(&content).with_context(|| {
                        format!("Failed to parse TOML config: {}", config_path.display())
                    })?;
                } else {
                    config = serde_json::from_str(&content).with_context(|| {
                        format!("Failed to parse JSON config: {}", config_path.display())
                    })?;
                }
            }
        }

        Ok(config)
    }
}
