//! # hogar-av
//!
//! External audio/video tooling for hogar.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Live transcoding** ([`transcode::TranscodeStream`]) -- ffmpeg piping a
//!   fragmented MP4 to stdout, bridged into an HTTP body.
//! - **Muxing** ([`mux::mux_to_file`]) -- combine a video file and an audio
//!   file into a single MP4 artifact with atomic finalization.

pub mod command;
pub mod mux;
pub mod tools;
pub mod transcode;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use transcode::{TranscodeSettings, TranscodeStream};
