//! HTTP-level tests for the mux artifact endpoint: on-demand production,
//! caching, request coalescing, and failure handling.

#![cfg(unix)]

mod common;

use common::TestHarness;
use hogar_core::config::Config;

/// Stub ffmpeg that logs each invocation to a counter file and writes a
/// payload to its last argument (the `.part` output path).
fn counting_stub(dir: &std::path::Path, counter: &std::path::Path, payload: &str) -> std::path::PathBuf {
    let body = format!(
        "#!/bin/sh\necho run >> \"{}\"\nfor last; do :; done\nprintf '{}' > \"$last\"\n",
        counter.display(),
        payload
    );
    common::write_script(dir, "ffmpeg", &body)
}

fn invocations(counter: &std::path::Path) -> usize {
    std::fs::read_to_string(counter)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

struct MuxSetup {
    _harness: TestHarness,
    addr: std::net::SocketAddr,
    movie_id: hogar_core::MovieId,
    counter: std::path::PathBuf,
    cache_dir: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

async fn setup(payload: &str) -> MuxSetup {
    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("film.mp4");
    let audio = dir.path().join("track.aac");
    std::fs::write(&video, b"video bytes").unwrap();
    std::fs::write(&audio, b"audio bytes").unwrap();

    let counter = dir.path().join("invocations.log");
    let ffmpeg = counting_stub(dir.path(), &counter, payload);
    let cache_dir = dir.path().join("mux-cache");

    let mut config = Config::default();
    config.tools.ffmpeg_path = Some(ffmpeg);
    config.media.mux_cache_dir = cache_dir.clone();

    let (harness, addr) = TestHarness::with_server_config(config).await;
    let movie = harness.insert_movie("Film", video.to_str().unwrap());
    {
        let conn = harness.conn();
        hogar_db::queries::audios::create_audio(
            &conn,
            movie.id,
            Some("en"),
            audio.to_str().unwrap(),
        )
        .unwrap();
    }

    MuxSetup {
        _harness: harness,
        addr,
        movie_id: movie.id,
        counter,
        cache_dir,
        _dir: dir,
    }
}

#[tokio::test]
async fn mux_runs_once_and_is_cached() {
    let s = setup("MUXED-PAYLOAD").await;
    let url = format!("http://{}/api/movies/{}/muxed", s.addr, s.movie_id);

    let first = reqwest::get(&url).await.unwrap();
    assert_eq!(first.status(), 200);
    assert_eq!(first.headers().get("content-type").unwrap(), "video/mp4");
    let first_body = first.bytes().await.unwrap();
    assert_eq!(&first_body[..], b"MUXED-PAYLOAD");

    let second = reqwest::get(&url).await.unwrap();
    assert_eq!(second.status(), 200);
    assert_eq!(&second.bytes().await.unwrap()[..], &first_body[..]);

    // Only the first request invoked ffmpeg.
    assert_eq!(invocations(&s.counter), 1);

    // The artifact sits at the deterministic cache path, with no leftover temp.
    let artifact = s.cache_dir.join(format!("{}.mp4", s.movie_id));
    assert!(artifact.exists());
    let mut part = artifact.as_os_str().to_owned();
    part.push(".part");
    assert!(!std::path::PathBuf::from(part).exists());
}

#[tokio::test]
async fn concurrent_first_requests_coalesce() {
    let s = setup("SHARED").await;
    let url = format!("http://{}/api/movies/{}/muxed", s.addr, s.movie_id);

    let a = tokio::spawn(reqwest::get(url.clone()));
    let b = tokio::spawn(reqwest::get(url.clone()));
    let c = tokio::spawn(reqwest::get(url));

    for handle in [a, b, c] {
        let resp = handle.await.unwrap().unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(&resp.bytes().await.unwrap()[..], b"SHARED");
    }

    // At most one mux per movie ever runs at once; and since the artifact
    // exists after the leader finishes, the waiters never re-run it.
    assert_eq!(invocations(&s.counter), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn waiters_wake_even_when_mux_finishes_quickly() {
    // A short-lived mux narrows the gap between a waiter releasing the
    // pending-map entry and the leader notifying; every waiter must still
    // wake up and see the artifact. A lost wakeup shows up as a timeout.
    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("film.mp4");
    let audio = dir.path().join("track.aac");
    std::fs::write(&video, b"video bytes").unwrap();
    std::fs::write(&audio, b"audio bytes").unwrap();

    let counter = dir.path().join("invocations.log");
    let body = format!(
        "#!/bin/sh\necho run >> \"{}\"\nsleep 0.1\nfor last; do :; done\nprintf 'QUICK' > \"$last\"\n",
        counter.display()
    );
    let ffmpeg = common::write_script(dir.path(), "ffmpeg", &body);

    let mut config = Config::default();
    config.tools.ffmpeg_path = Some(ffmpeg);
    config.media.mux_cache_dir = dir.path().join("mux-cache");

    let (harness, addr) = TestHarness::with_server_config(config).await;
    let movie = harness.insert_movie("Quick", video.to_str().unwrap());
    {
        let conn = harness.conn();
        hogar_db::queries::audios::create_audio(&conn, movie.id, None, audio.to_str().unwrap())
            .unwrap();
    }

    let url = format!("http://{addr}/api/movies/{}/muxed", movie.id);
    let handles: Vec<_> = (0..8).map(|_| tokio::spawn(reqwest::get(url.clone()))).collect();

    for handle in handles {
        let resp = tokio::time::timeout(std::time::Duration::from_secs(30), handle)
            .await
            .expect("request stuck waiting for a mux that already finished")
            .unwrap()
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(&resp.bytes().await.unwrap()[..], b"QUICK");
    }

    assert_eq!(invocations(&counter), 1);
}

#[tokio::test]
async fn muxed_artifact_supports_ranges() {
    let s = setup("0123456789").await;
    let url = format!("http://{}/api/movies/{}/muxed", s.addr, s.movie_id);

    // Produce the artifact.
    assert_eq!(reqwest::get(&url).await.unwrap().status(), 200);

    let client = reqwest::Client::new();
    let resp = client
        .get(&url)
        .header("Range", "bytes=2-5")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers().get("content-range").unwrap(),
        "bytes 2-5/10"
    );
    assert_eq!(&resp.bytes().await.unwrap()[..], b"2345");
}

#[tokio::test]
async fn language_filter_selects_track() {
    let s = setup("ES-TRACK").await;

    // The default fixture track is "en"; asking for a missing language is 404
    // without ever spawning ffmpeg.
    let url = format!(
        "http://{}/api/movies/{}/muxed?language=fr",
        s.addr, s.movie_id
    );
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(invocations(&s.counter), 0);

    let url = format!(
        "http://{}/api/movies/{}/muxed?language=en",
        s.addr, s.movie_id
    );
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(invocations(&s.counter), 1);
}

#[tokio::test]
async fn missing_sources_are_404_before_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("invocations.log");
    let ffmpeg = counting_stub(dir.path(), &counter, "NEVER");

    let mut config = Config::default();
    config.tools.ffmpeg_path = Some(ffmpeg);
    config.media.mux_cache_dir = dir.path().join("mux-cache");

    let (harness, addr) = TestHarness::with_server_config(config).await;

    // Unknown movie id.
    let resp = reqwest::get(format!(
        "http://{addr}/api/movies/{}/muxed",
        uuid::Uuid::new_v4()
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 404);

    // Movie registered but no audio tracks at all.
    let no_audio = harness.insert_movie("Silent", "/media/silent.mp4");
    let resp = reqwest::get(format!("http://{addr}/api/movies/{}/muxed", no_audio.id))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Movie and audio registered but files are gone from disk.
    let ghost = harness.insert_movie("Ghost", "/media/ghost.mp4");
    {
        let conn = harness.conn();
        hogar_db::queries::audios::create_audio(&conn, ghost.id, None, "/media/ghost.aac").unwrap();
    }
    let resp = reqwest::get(format!("http://{addr}/api/movies/{}/muxed", ghost.id))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // ffmpeg never ran.
    assert_eq!(invocations(&counter), 0);
}

#[tokio::test]
async fn mux_failure_is_502_and_leaves_no_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let video = dir.path().join("film.mp4");
    let audio = dir.path().join("track.aac");
    std::fs::write(&video, b"video").unwrap();
    std::fs::write(&audio, b"audio").unwrap();

    // Stub that writes a partial output then exits non-zero.
    let ffmpeg = common::write_script(
        dir.path(),
        "ffmpeg",
        "#!/bin/sh\nfor last; do :; done\nprintf junk > \"$last\"\nexit 1\n",
    );
    let cache_dir = dir.path().join("mux-cache");

    let mut config = Config::default();
    config.tools.ffmpeg_path = Some(ffmpeg);
    config.media.mux_cache_dir = cache_dir.clone();

    let (harness, addr) = TestHarness::with_server_config(config).await;
    let movie = harness.insert_movie("Film", video.to_str().unwrap());
    {
        let conn = harness.conn();
        hogar_db::queries::audios::create_audio(&conn, movie.id, None, audio.to_str().unwrap())
            .unwrap();
    }

    let resp = reqwest::get(format!("http://{addr}/api/movies/{}/muxed", movie.id))
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);

    // Neither the final artifact nor the temp file survives a failed mux.
    let artifact = cache_dir.join(format!("{}.mp4", movie.id));
    assert!(!artifact.exists());
    let mut part = artifact.as_os_str().to_owned();
    part.push(".part");
    assert!(!std::path::PathBuf::from(part).exists());
}
