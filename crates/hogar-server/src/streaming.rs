//! Shared streaming helpers: range parsing, content-type guessing, and
//! chunked file serving via `ReaderStream`.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use hogar_core::Error;

/// A validated byte range against a file of known size.
///
/// Invariant: `start <= end < size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub size: u64,
}

impl ByteRange {
    /// Parse a `Range: bytes=START-END` header value against a file size.
    ///
    /// Only the first part of a multi-part range is honored; the rest is
    /// ignored. An end past the last byte is clamped. A malformed start, an
    /// inverted range, or a start at or past the file size all yield
    /// [`Error::InvalidRange`], which callers answer with 416.
    pub fn parse(value: &str, size: u64) -> hogar_core::Result<Self> {
        let spec = value
            .strip_prefix("bytes=")
            .ok_or_else(|| Error::InvalidRange(format!("Unsupported range unit: {value}")))?;

        // bytes=0-99,200-299 -> serve only 0-99.
        let first = spec.split(',').next().unwrap_or(spec);

        let mut parts = first.splitn(2, '-');
        let start_str = parts.next().unwrap_or("").trim();
        let end_str = parts.next().unwrap_or("").trim();

        let start: u64 = start_str
            .parse()
            .map_err(|_| Error::InvalidRange(format!("Invalid range start: {first}")))?;

        let end = if end_str.is_empty() {
            size.saturating_sub(1)
        } else {
            let end: u64 = end_str
                .parse()
                .map_err(|_| Error::InvalidRange(format!("Invalid range end: {first}")))?;
            end.min(size.saturating_sub(1))
        };

        if start > end || start >= size {
            return Err(Error::InvalidRange(format!(
                "Range {start}-{end} not satisfiable for size {size}"
            )));
        }

        Ok(Self { start, end, size })
    }

    /// Number of bytes covered by the range.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Guess the MIME type from a file extension.
pub fn guess_content_type(ext: &str) -> &'static str {
    match ext {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "ts" => "video/mp2t",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "srt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Lowercased extension of a path-like string.
pub fn file_extension(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Resolve a stored media path against a configured base directory.
///
/// Absolute paths are used as-is; relative paths are joined onto the base,
/// so rows can store names relative to `media.movie_dir` and friends.
pub fn resolve_media_path(base: &std::path::Path, stored: &str) -> std::path::PathBuf {
    let p = std::path::Path::new(stored);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Serve a file with Range support, reading in 64KB chunks via `ReaderStream`
/// so memory stays bounded regardless of file size.
///
/// Without a Range header this answers 200 with the full file; with one it
/// answers 206 and exactly the requested slice. An unsatisfiable or malformed
/// range yields 416 with `Content-Range: bytes */SIZE`.
pub async fn serve_file_range(
    file_path: &std::path::Path,
    content_type: &str,
    range_header: Option<&str>,
) -> Result<Response, Error> {
    let metadata = tokio::fs::metadata(file_path)
        .await
        .map_err(|_| Error::not_found("file", file_path.display()))?;
    let file_size = metadata.len();

    match range_header {
        Some(value) => {
            let range = match ByteRange::parse(value, file_size) {
                Ok(r) => r,
                Err(Error::InvalidRange(_)) => {
                    return Ok((
                        StatusCode::RANGE_NOT_SATISFIABLE,
                        [(
                            header::CONTENT_RANGE.as_str(),
                            format!("bytes */{file_size}"),
                        )],
                        Body::empty(),
                    )
                        .into_response());
                }
                Err(e) => return Err(e),
            };

            let mut file = tokio::fs::File::open(file_path)
                .await
                .map_err(|_| Error::not_found("file", file_path.display()))?;
            file.seek(std::io::SeekFrom::Start(range.start))
                .await
                .map_err(|e| Error::Internal(format!("Seek failed: {e}")))?;

            // Take limits reads to exactly the slice length.
            let limited = file.take(range.length());
            let stream = ReaderStream::with_capacity(limited, 64 * 1024);

            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE.as_str(), content_type.to_string()),
                    (
                        header::CONTENT_RANGE.as_str(),
                        format!("bytes {}-{}/{file_size}", range.start, range.end),
                    ),
                    (header::CONTENT_LENGTH.as_str(), range.length().to_string()),
                    (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
                ],
                Body::from_stream(stream),
            )
                .into_response())
        }
        None => {
            let file = tokio::fs::File::open(file_path)
                .await
                .map_err(|_| Error::not_found("file", file_path.display()))?;
            let stream = ReaderStream::with_capacity(file, 64 * 1024);

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE.as_str(), content_type.to_string()),
                    (header::CONTENT_LENGTH.as_str(), file_size.to_string()),
                    (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
                ],
                Body::from_stream(stream),
            )
                .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bounded_range() {
        let r = ByteRange::parse("bytes=100-199", 1000).unwrap();
        assert_eq!(r.start, 100);
        assert_eq!(r.end, 199);
        assert_eq!(r.length(), 100);
    }

    #[test]
    fn parse_open_range_runs_to_last_byte() {
        let r = ByteRange::parse("bytes=500-", 1000).unwrap();
        assert_eq!(r.start, 500);
        assert_eq!(r.end, 999);
        assert_eq!(r.length(), 500);
    }

    #[test]
    fn parse_clamps_oversized_end() {
        let r = ByteRange::parse("bytes=0-5000", 1000).unwrap();
        assert_eq!(r.end, 999);
    }

    #[test]
    fn parse_multi_range_uses_first_part() {
        let r = ByteRange::parse("bytes=0-99,200-299", 1000).unwrap();
        assert_eq!(r.start, 0);
        assert_eq!(r.end, 99);
    }

    #[test]
    fn parse_rejects_malformed_start() {
        assert!(matches!(
            ByteRange::parse("bytes=abc-100", 1000),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            ByteRange::parse("bytes=-100", 1000),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn parse_rejects_unknown_unit() {
        assert!(matches!(
            ByteRange::parse("items=0-10", 1000),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn parse_rejects_inverted_and_out_of_bounds() {
        assert!(ByteRange::parse("bytes=200-100", 1000).is_err());
        assert!(ByteRange::parse("bytes=1000-", 1000).is_err());
        assert!(ByteRange::parse("bytes=5000-6000", 1000).is_err());
    }

    #[test]
    fn parse_single_byte_file() {
        let r = ByteRange::parse("bytes=0-0", 1).unwrap();
        assert_eq!(r.length(), 1);
        assert!(ByteRange::parse("bytes=1-1", 1).is_err());
    }

    #[test]
    fn content_type_guessing() {
        assert_eq!(guess_content_type("mp4"), "video/mp4");
        assert_eq!(guess_content_type("m4v"), "video/mp4");
        assert_eq!(guess_content_type("mkv"), "video/x-matroska");
        assert_eq!(guess_content_type("mp3"), "audio/mpeg");
        assert_eq!(guess_content_type("png"), "image/png");
        assert_eq!(guess_content_type("xyz"), "application/octet-stream");
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(file_extension("/media/Movie.MKV"), "mkv");
        assert_eq!(file_extension("/media/clip.mp4"), "mp4");
        assert_eq!(file_extension("/media/noext"), "");
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = std::path::Path::new("/data/movies");
        assert_eq!(
            resolve_media_path(base, "film.mp4"),
            std::path::PathBuf::from("/data/movies/film.mp4")
        );
        assert_eq!(
            resolve_media_path(base, "series/ep1.mkv"),
            std::path::PathBuf::from("/data/movies/series/ep1.mkv")
        );
        // Absolute stored paths win over the base.
        assert_eq!(
            resolve_media_path(base, "/elsewhere/film.mp4"),
            std::path::PathBuf::from("/elsewhere/film.mp4")
        );
    }

    #[tokio::test]
    async fn serve_range_slice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, vec![7u8; 1000]).unwrap();

        let resp = serve_file_range(&path, "video/mp4", Some("bytes=100-199"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            resp.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes 100-199/1000"
        );
        assert_eq!(resp.headers().get(header::CONTENT_LENGTH).unwrap(), "100");
    }

    #[tokio::test]
    async fn serve_full_file_without_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, vec![7u8; 1000]).unwrap();

        let resp = serve_file_range(&path, "video/mp4", None).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CONTENT_LENGTH).unwrap(), "1000");
        assert_eq!(resp.headers().get(header::ACCEPT_RANGES).unwrap(), "bytes");
    }

    #[tokio::test]
    async fn serve_unsatisfiable_range_is_416() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, vec![7u8; 1000]).unwrap();

        let resp = serve_file_range(&path, "video/mp4", Some("bytes=2000-"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            resp.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */1000"
        );
    }

    #[tokio::test]
    async fn serve_missing_file_is_not_found() {
        let err = serve_file_range(std::path::Path::new("/no/such/file"), "video/mp4", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
