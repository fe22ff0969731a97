//! Muxing a video file and a separate audio file into one MP4 artifact.
//!
//! The output is written next to its final location with a `.part` suffix
//! and renamed into place only after ffmpeg succeeds, so readers never see
//! a truncated artifact.

use std::path::Path;
use std::time::Duration;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Mux commands get a longer leash than the default tool timeout; a full
/// feature film re-encode of the audio track can take a while.
const MUX_TIMEOUT: Duration = Duration::from_secs(3600);

/// Build the ffmpeg argument list for muxing.
///
/// Video is stream-copied from the first input; audio is taken from the
/// second input and encoded to AAC so the pair always lands in a valid MP4.
pub fn build_args(video: &Path, audio: &Path, output: &Path, audio_bitrate: &str) -> Vec<String> {
    vec![
        "-y".into(),
        "-v".into(),
        "error".into(),
        "-i".into(),
        video.to_string_lossy().into_owned(),
        "-i".into(),
        audio.to_string_lossy().into_owned(),
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "1:a:0".into(),
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        audio_bitrate.into(),
        "-movflags".into(),
        "+frag_keyframe+empty_moov".into(),
        "-f".into(),
        "mp4".into(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Mux `video` and `audio` into `output`.
///
/// Writes to `<output>.part` and renames on success. On failure the temp
/// file is removed and the error propagated; `output` is never created.
pub async fn mux_to_file(
    tools: &ToolRegistry,
    video: &Path,
    audio: &Path,
    output: &Path,
    audio_bitrate: &str,
) -> hogar_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    let mut tmp = output.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = std::path::PathBuf::from(tmp);

    tracing::info!(
        "muxing {} + {} -> {}",
        video.display(),
        audio.display(),
        output.display()
    );

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(build_args(video, audio, &tmp, audio_bitrate));
    cmd.timeout(MUX_TIMEOUT);

    if let Err(e) = cmd.execute().await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }

    tokio::fs::rename(&tmp, output).await?;
    Ok(())
}
