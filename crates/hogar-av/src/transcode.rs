//! Live transcoding of a media file into a fragmented MP4 byte stream.
//!
//! ffmpeg writes the output container to stdout; a pump task moves stdout
//! chunks into a bounded channel that the HTTP layer drains. The channel
//! bound is the backpressure mechanism: when the client stalls, the pump
//! stalls, the OS pipe fills, and ffmpeg stops encoding.

use std::io;
use std::path::Path;
use std::process::Stdio;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Read size for each stdout chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// Number of chunks buffered between the pump task and the HTTP body.
const CHANNEL_CAPACITY: usize = 4;

/// Encoder settings for the transcode path.
#[derive(Debug, Clone)]
pub struct TranscodeSettings {
    pub video_crf: u32,
    pub video_preset: String,
    pub audio_bitrate: String,
}

impl From<&hogar_core::config::StreamConfig> for TranscodeSettings {
    fn from(cfg: &hogar_core::config::StreamConfig) -> Self {
        Self {
            video_crf: cfg.video_crf,
            video_preset: cfg.video_preset.clone(),
            audio_bitrate: cfg.audio_bitrate.clone(),
        }
    }
}

/// Build the ffmpeg argument list for transcoding `input` to a fragmented
/// MP4 on stdout.
///
/// `frag_keyframe+empty_moov` makes the output playable as it arrives, so
/// the container never needs a seekable destination.
pub fn build_args(input: &Path, settings: &TranscodeSettings) -> Vec<String> {
    vec![
        "-v".into(),
        "error".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        settings.video_preset.clone(),
        "-crf".into(),
        settings.video_crf.to_string(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        settings.audio_bitrate.clone(),
        "-movflags".into(),
        "frag_keyframe+empty_moov".into(),
        "-f".into(),
        "mp4".into(),
        "pipe:1".into(),
    ]
}

/// A running ffmpeg transcode whose output arrives as a chunk stream.
pub struct TranscodeStream {
    rx: mpsc::Receiver<io::Result<Bytes>>,
}

impl TranscodeStream {
    /// Spawn ffmpeg and start pumping its stdout.
    ///
    /// The child is spawned with `kill_on_drop`, and the pump task kills it
    /// explicitly as soon as the receiving side goes away, so an abandoned
    /// response cannot leave an encoder running.
    pub fn spawn(
        ffmpeg: &Path,
        input: &Path,
        settings: &TranscodeSettings,
    ) -> hogar_core::Result<Self> {
        let args = build_args(input, settings);

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| hogar_core::Error::tool("ffmpeg", format!("failed to spawn: {e}")))?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| hogar_core::Error::tool("ffmpeg", "stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| hogar_core::Error::tool("ffmpeg", "stderr not captured"))?;

        // Drain stderr separately so a chatty encoder cannot deadlock on a
        // full pipe.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(CHANNEL_CAPACITY);
        let input_desc = input.display().to_string();

        tokio::spawn(async move {
            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                match stdout.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).await.is_err() {
                            // Client went away; stop the encoder.
                            tracing::debug!("transcode client disconnected: {input_desc}");
                            let _ = child.start_kill();
                            let _ = child.wait().await;
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        let _ = child.start_kill();
                        let _ = child.wait().await;
                        return;
                    }
                }
            }

            let status = child.wait().await;
            let stderr_out = stderr_task.await.unwrap_or_default();

            match status {
                Ok(s) if s.success() => {}
                Ok(s) => {
                    tracing::warn!(
                        "ffmpeg transcode of {input_desc} exited with {s}: {}",
                        stderr_out.trim()
                    );
                    let _ = tx
                        .send(Err(io::Error::other(format!(
                            "ffmpeg exited with {s}: {}",
                            stderr_out.trim()
                        ))))
                        .await;
                }
                Err(e) => {
                    let _ = tx
                        .send(Err(io::Error::other(format!("ffmpeg wait failed: {e}"))))
                        .await;
                }
            }
        });

        Ok(Self { rx })
    }

    /// Turn the transcode into a `Stream` of chunks for an HTTP body.
    pub fn into_stream(self) -> ReceiverStream<io::Result<Bytes>> {
        ReceiverStream::new(self.rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    fn settings() -> TranscodeSettings {
        TranscodeSettings {
            video_crf: 23,
            video_preset: "veryfast".into(),
            audio_bitrate: "192k".into(),
        }
    }

    #[test]
    fn args_target_fragmented_mp4_on_stdout() {
        let args = build_args(Path::new("/media/in.mkv"), &settings());
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
        assert!(args.contains(&"frag_keyframe+empty_moov".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"/media/in.mkv".to_string()));

        let crf_pos = args.iter().position(|a| a == "-crf").unwrap();
        assert_eq!(args[crf_pos + 1], "23");
    }

    #[cfg(unix)]
    fn stub_script(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake_ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stream_delivers_stdout_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let script = stub_script(dir.path(), "printf 'hello world'");

        let ts = TranscodeStream::spawn(&script, Path::new("/in.mkv"), &settings()).unwrap();
        let mut stream = ts.into_stream();

        let mut collected = Vec::new();
        while let Some(item) = stream.next().await {
            collected.extend_from_slice(&item.unwrap());
        }
        assert_eq!(collected, b"hello world");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_yields_error_item() {
        let dir = tempfile::tempdir().unwrap();
        let script = stub_script(dir.path(), "printf 'partial'; echo broken >&2; exit 1");

        let ts = TranscodeStream::spawn(&script, Path::new("/in.mkv"), &settings()).unwrap();
        let mut stream = ts.into_stream();

        let mut saw_error = false;
        while let Some(item) = stream.next().await {
            if let Err(e) = item {
                assert!(e.to_string().contains("broken"), "unexpected error: {e}");
                saw_error = true;
            }
        }
        assert!(saw_error, "expected a trailing error item");
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let result = TranscodeStream::spawn(
            Path::new("/nonexistent/ffmpeg_xyz"),
            Path::new("/in.mkv"),
            &settings(),
        );
        assert!(result.is_err());
    }
}
