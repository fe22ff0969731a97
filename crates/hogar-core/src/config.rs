//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for server, auth, media directories, streaming, and external
//! tools. Every section defaults sensibly so a completely empty `{}` file is
//! valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub stream: StreamConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    ///
    /// This is intentionally string-based so the caller can read the file
    /// however it sees fit (async, embedded, etc.).
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.auth.enabled {
            if self.auth.api_key.is_none() {
                warnings.push(
                    "auth is enabled without an api_key; only database users can log in".into(),
                );
            }
            if self.auth.session_timeout_hours == 0 {
                warnings.push("auth.session_timeout_hours is 0; sessions expire immediately".into());
            }
        }

        if self.stream.direct_containers.is_empty() {
            warnings.push(
                "stream.direct_containers is empty; every request will transcode".into(),
            );
        }

        if !self.media.movie_dir.is_absolute() {
            warnings.push(format!(
                "media.movie_dir '{}' is relative; paths resolve against the working directory",
                self.media.movie_dir.display()
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            db_path: PathBuf::from("./data/hogar.db"),
        }
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    #[serde(default = "default_session_timeout")]
    pub session_timeout_hours: u64,
}

fn default_session_timeout() -> u64 {
    24
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            session_timeout_hours: default_session_timeout(),
        }
    }
}

/// Media storage directories.
///
/// These are loaded once at startup and shared immutably; there is no
/// runtime endpoint that can repoint them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Directory holding movie files.
    pub movie_dir: PathBuf,
    /// Directory holding uploaded photos.
    pub photo_dir: PathBuf,
    /// Directory holding banner images.
    pub banner_dir: PathBuf,
    /// Directory where muxed artifacts are cached.
    pub mux_cache_dir: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            movie_dir: PathBuf::from("./data/movies"),
            photo_dir: PathBuf::from("./data/photos"),
            banner_dir: PathBuf::from("./data/banners"),
            mux_cache_dir: PathBuf::from("./data/mux-cache"),
        }
    }
}

/// Streaming and transcoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Container extensions served directly with byte-range support.
    /// Anything else goes through the transcode path.
    pub direct_containers: Vec<String>,
    #[serde(default = "default_video_crf")]
    pub video_crf: u32,
    #[serde(default = "default_video_preset")]
    pub video_preset: String,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
    /// Audio bitrate used when muxing a separate audio track into a movie.
    #[serde(default = "default_mux_audio_bitrate")]
    pub mux_audio_bitrate: String,
}

fn default_video_crf() -> u32 {
    23
}
fn default_video_preset() -> String {
    "veryfast".into()
}
fn default_audio_bitrate() -> String {
    "192k".into()
}
fn default_mux_audio_bitrate() -> String {
    "192k".into()
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            direct_containers: vec!["mp4".into(), "m4v".into()],
            video_crf: default_video_crf(),
            video_preset: default_video_preset(),
            audio_bitrate: default_audio_bitrate(),
            mux_audio_bitrate: default_mux_audio_bitrate(),
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}
