//! End-to-end runs of the batch and request flows with in-process media stages

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use reelscribe::media::{AudioExtractor, VideoDownloader};
use reelscribe::output::ReportAssembler;
use reelscribe::request::{handle_request, run_request, TranscriptionRequest};
use reelscribe::transcribe::Transcriber;
use reelscribe::{
    CountField, ProfileTranscriber, ReelscribeError, Result, RunOptions, SelectionOptions,
    TranscriptionPipeline,
};

/// Writes a fake video named after the last URL segment, failing for
/// configured URLs
struct FakeDownloader {
    failing: Vec<String>,
    scratch_dirs: Arc<Mutex<Vec<PathBuf>>>,
}

#[async_trait]
impl VideoDownloader for FakeDownloader {
    async fn download(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        self.scratch_dirs.lock().unwrap().push(dest_dir.to_path_buf());

        if self.failing.iter().any(|u| u == url) {
            anyhow::bail!(ReelscribeError::DownloadFailed(url.to_string()));
        }

        let id = url.trim_end_matches('/').rsplit('/').next().unwrap_or("post");
        let media = dest_dir.join(format!("{}.mp4", id));
        fs_err::write(&media, b"video")?;
        Ok(media)
    }
}

struct FakeExtractor;

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn extract_audio(&self, media: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let audio = dest_dir.join(format!(
            "{}.wav",
            media.file_stem().and_then(|s| s.to_str()).unwrap_or("audio")
        ));
        fs_err::write(&audio, b"audio")?;
        Ok(audio)
    }
}

/// Returns `spoken words of <id>` for an audio file named `<id>.wav`
struct FakeTranscriber;

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: &Path, _work_dir: &Path) -> Result<String> {
        let id = audio.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        Ok(format!("spoken words of {}", id))
    }

    fn engine_name(&self) -> &'static str {
        "fake"
    }
}

struct Harness {
    _workspace: TempDir,
    output_dir: PathBuf,
    scratch_root: PathBuf,
    scratch_dirs: Arc<Mutex<Vec<PathBuf>>>,
    transcriber: ProfileTranscriber,
}

fn harness(failing: &[&str]) -> Harness {
    let workspace = TempDir::new().unwrap();
    let output_dir = workspace.path().join("reports");
    let temp_root = workspace.path().join("tmp");
    fs_err::create_dir_all(&temp_root).unwrap();

    let scratch_dirs = Arc::new(Mutex::new(Vec::new()));
    let downloader = FakeDownloader {
        failing: failing.iter().map(|u| u.to_string()).collect(),
        scratch_dirs: scratch_dirs.clone(),
    };

    let pipeline = TranscriptionPipeline::with_stages(
        Box::new(downloader),
        Box::new(FakeExtractor),
        Box::new(FakeTranscriber),
        Some(&temp_root),
    )
    .unwrap();
    let scratch_root = pipeline.scratch_root().to_path_buf();

    let transcriber =
        ProfileTranscriber::with_parts(pipeline, ReportAssembler::new(&output_dir).unwrap());

    Harness {
        _workspace: workspace,
        output_dir,
        scratch_root,
        scratch_dirs,
        transcriber,
    }
}

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs_err::write(&path, content).unwrap();
    path
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().to_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn top_two_by_views_are_transcribed_in_rank_order() {
    let h = harness(&[]);
    let csv = write_csv(
        h.output_dir.parent().unwrap(),
        "alice.csv",
        "Reel,Views\n\
         https://www.instagram.com/reel/R1/,\"1,000\"\n\
         https://www.instagram.com/reel/R2/,50\n\
         https://www.instagram.com/reel/R3/,\"2,000\"\n\
         https://www.instagram.com/reel/R4/,0\n\
         https://www.instagram.com/reel/R5/,10\n",
    );

    let options = RunOptions {
        csv_file: csv,
        selection: SelectionOptions {
            top_count: 2,
            sort_by: CountField::ViewCount,
            filter_pinned: false,
        },
        profile_name: None,
        quick: false,
    };

    let report = h
        .transcriber
        .process_csv_file(&options)
        .await
        .unwrap()
        .expect("a report");

    assert_eq!(report, h.output_dir.join("alicetop2transcripts.txt"));
    let content = fs_err::read_to_string(&report).unwrap();

    let first = content.find("spoken words of R3").unwrap();
    let second = content.find("spoken words of R1").unwrap();
    assert!(first < second);
    assert!(content.contains("**Views:** 2,000"));
    assert!(content.contains("**Views:** 1,000"));
    assert!(!content.contains("R2"));

    // only the report is left behind
    assert_eq!(dir_entries(&h.output_dir), vec!["alicetop2transcripts.txt"]);
}

#[tokio::test]
async fn failed_download_is_skipped_without_aborting_the_run() {
    let failing = "https://www.instagram.com/reel/BAD/";
    let h = harness(&[failing]);
    let csv = write_csv(
        h.output_dir.parent().unwrap(),
        "bob.csv",
        "Link,View_Count\n\
         https://www.instagram.com/reel/BAD/,900\n\
         https://www.instagram.com/reel/GOOD/,100\n",
    );

    let options = RunOptions {
        csv_file: csv,
        selection: SelectionOptions {
            top_count: 5,
            filter_pinned: false,
            ..Default::default()
        },
        profile_name: Some("bob".to_string()),
        quick: false,
    };

    let report = h.transcriber.process_csv_file(&options).await.unwrap().unwrap();
    let content = fs_err::read_to_string(&report).unwrap();

    assert_eq!(report.file_name().unwrap(), "bobtop1transcripts.txt");
    assert!(content.contains("Total Posts Transcribed: 1"));
    assert!(content.contains("spoken words of GOOD"));
    assert!(!content.contains("/reel/BAD/"));
    // post numbers keep their position in the selection
    assert!(content.contains("## POST #2"));
}

#[tokio::test]
async fn only_post_failing_yields_no_report() {
    let failing = "https://www.instagram.com/reel/ONLY/";
    let h = harness(&[failing]);
    let csv = write_csv(
        h.output_dir.parent().unwrap(),
        "carol.csv",
        "url,views\nhttps://www.instagram.com/reel/ONLY/,5\n",
    );

    let options = RunOptions {
        csv_file: csv,
        selection: SelectionOptions {
            filter_pinned: false,
            ..Default::default()
        },
        profile_name: None,
        quick: false,
    };

    let report = h.transcriber.process_csv_file(&options).await.unwrap();
    assert!(report.is_none());
    assert!(dir_entries(&h.output_dir).is_empty());
}

#[tokio::test]
async fn scratch_directories_are_removed_on_every_path() {
    let h = harness(&["https://www.instagram.com/reel/BAD/"]);
    let csv = write_csv(
        h.output_dir.parent().unwrap(),
        "dave.csv",
        "Reel,Views\n\
         https://www.instagram.com/reel/OK1/,3\n\
         https://www.instagram.com/reel/BAD/,2\n\
         https://www.instagram.com/reel/OK2/,1\n",
    );

    let options = RunOptions {
        csv_file: csv,
        selection: SelectionOptions::default(),
        profile_name: None,
        quick: false,
    };
    h.transcriber.process_csv_file(&options).await.unwrap();

    let dirs = h.scratch_dirs.lock().unwrap().clone();
    assert_eq!(dirs.len(), 3);
    assert!(dirs.iter().all(|d| !d.exists()));
    assert!(dir_entries(&h.scratch_root).is_empty());
}

#[tokio::test]
async fn unsupported_and_missing_urls_are_skipped() {
    let h = harness(&[]);
    let csv = write_csv(
        h.output_dir.parent().unwrap(),
        "erin.csv",
        "Reel,Views\n\
         https://example.com/reel/X/,50\n\
         ,40\n\
         https://www.tiktok.com/reel/TT1/,30\n",
    );

    let options = RunOptions {
        csv_file: csv,
        selection: SelectionOptions {
            filter_pinned: false,
            ..Default::default()
        },
        profile_name: None,
        quick: false,
    };

    let report = h.transcriber.process_csv_file(&options).await.unwrap().unwrap();
    let content = fs_err::read_to_string(report).unwrap();
    assert!(content.contains("Total Posts Transcribed: 1"));
    assert!(content.contains("spoken words of TT1"));
    assert!(!content.contains("example.com"));
}

#[tokio::test]
async fn request_runs_without_pinned_filter_and_returns_report_text() {
    let h = harness(&[]);
    let request = TranscriptionRequest::from_json(
        r#"{"input": {
            "profile_name": "alice",
            "posts": [
                {"url": "https://www.instagram.com/reel/A1/", "views": 10},
                {"url": "https://www.instagram.com/reel/A2/", "views": 30},
                {"url": "https://www.instagram.com/reel/A3/", "views": 20},
                {"url": "https://www.instagram.com/reel/A4/", "views": 5}
            ],
            "top_count": 2
        }}"#,
    )
    .unwrap();

    let response = run_request(&request, &h.transcriber).await.unwrap();

    assert!(response.success);
    assert_eq!(response.filename.as_deref(), Some("alicetop2transcripts.txt"));
    assert_eq!(response.profile_name.as_deref(), Some("alice"));
    let text = response.output_text.unwrap();
    assert!(text.contains("spoken words of A2"));
    assert!(text.contains("spoken words of A3"));
    assert!(!text.contains("spoken words of A1"));
}

#[tokio::test]
async fn quick_request_uses_single_post_naming() {
    let h = harness(&[]);
    let request = TranscriptionRequest::from_json(
        r#"{"profile_name":"bob","posts":[{"url":"https://www.instagram.com/reel/QUICK1/"}],"top_count":1,"quick_transcribe":true}"#,
    )
    .unwrap();

    let response = run_request(&request, &h.transcriber).await.unwrap();

    let filename = response.filename.unwrap();
    assert!(filename.starts_with("quick_bob_QUICK1_"), "{}", filename);
    assert!(response.output_text.unwrap().contains("spoken words of QUICK1"));
}

#[tokio::test]
async fn quick_post_link_without_views_reaches_the_pipeline() {
    let h = harness(&[]);

    let report = h
        .transcriber
        .transcribe_single("https://www.instagram.com/p/ABC123/", "bob")
        .await
        .unwrap()
        .expect("a report");

    let name = report.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("quick_bob_unknown_"), "{}", name);
    let content = fs_err::read_to_string(&report).unwrap();
    assert!(content.contains("spoken words of ABC123"));
    assert_eq!(h.scratch_dirs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn quick_tiktok_link_reaches_the_pipeline() {
    let h = harness(&[]);

    let report = h
        .transcriber
        .transcribe_single("https://www.tiktok.com/@user/video/7301", "carol")
        .await
        .unwrap()
        .expect("a report");

    let content = fs_err::read_to_string(report).unwrap();
    assert!(content.contains("Profile: @carol"));
    assert!(content.contains("spoken words of 7301"));
}

#[tokio::test]
async fn quick_failure_yields_no_report() {
    let failing = "https://m.instagram.com/reel/GONE/";
    let h = harness(&[failing]);

    let report = h.transcriber.transcribe_single(failing, "dave").await.unwrap();

    assert!(report.is_none());
    assert!(dir_entries(&h.output_dir).is_empty());
}

#[tokio::test]
async fn request_with_nothing_transcribed_is_still_successful() {
    let failing = "https://www.instagram.com/reel/NOPE/";
    let request = TranscriptionRequest::from_json(&format!(
        r#"{{"profile_name":"zoe/../x","posts":[{{"url":"{}"}}],"quick_transcribe":true}}"#,
        failing
    ))
    .unwrap();

    let h = harness(&[failing]);
    let response = handle_request(&request, move || Ok(h.transcriber)).await;

    assert!(response.success);
    assert!(response.output_file.is_none());
    assert!(response.output_text.is_none());
    assert_eq!(response.filename.as_deref(), Some("zoe_.._x_transcription.txt"));
    assert_eq!(response.profile_name.as_deref(), Some("zoe/../x"));
    assert_eq!(
        response.message.as_deref(),
        Some("No transcriptions were created")
    );
}
