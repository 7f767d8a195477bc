use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::Router;

use emotion_core::analysis::domain::emotion::Emotion;
use emotion_core::analysis::domain::emotion_analyzer::ImageSource;
use emotion_core::capture::domain::image_upload::{ImageUpload, UploadRejection};
use emotion_core::persistence::infrastructure::temp_image_file::TempImageFile;
use emotion_core::pipeline::emotion_invoker::EmotionInvoker;
use emotion_core::shared::constants::IMAGE_FIELD;

use crate::response::ApiResponse;

#[derive(Clone)]
pub struct AppState {
    invoker: Arc<Mutex<EmotionInvoker>>,
    upload_dir: PathBuf,
    analysis_timeout: Duration,
}

impl AppState {
    pub fn new(
        invoker: Arc<Mutex<EmotionInvoker>>,
        upload_dir: PathBuf,
        analysis_timeout: Duration,
    ) -> Self {
        Self {
            invoker,
            upload_dir,
            analysis_timeout,
        }
    }
}

pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn health() -> ApiResponse {
    ApiResponse::Healthy
}

async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResponse {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(rejection) => {
            log::debug!("Rejected upload: {rejection}");
            return ApiResponse::Rejected(rejection);
        }
    };

    // Removed when this scope ends, whichever way analysis finishes.
    let staged =
        match TempImageFile::create_in(&state.upload_dir, &upload.extension(), upload.bytes()) {
            Ok(staged) => staged,
            Err(e) => {
                log::warn!(
                    "Failed to stage upload in {}: {e}",
                    state.upload_dir.display()
                );
                return ApiResponse::StorageFailed(e.to_string());
            }
        };
    log::debug!(
        "Staged {} ({} bytes) at {}",
        upload.filename(),
        upload.bytes().len(),
        staged.path().display()
    );

    match run_analysis(&state, staged.path().to_path_buf()).await {
        Ok(emotion) => ApiResponse::Analyzed(emotion),
        Err(detail) => {
            log::warn!("Analysis of {} failed: {detail}", upload.filename());
            ApiResponse::AnalysisFailed(detail)
        }
    }
}

/// Pulls the `image` file field out of the form. Fields with other names, or
/// an `image` field without a filename, are skipped.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ImageUpload, UploadRejection> {
    let mut multipart = multipart.map_err(|e| {
        log::debug!("Request is not a multipart form: {e}");
        UploadRejection::MissingImage
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadRejection::Unreadable(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if filename.is_empty() {
            return Err(UploadRejection::EmptyFilename);
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| UploadRejection::Unreadable(e.to_string()))?;
        return ImageUpload::new(filename, bytes.to_vec());
    }

    Err(UploadRejection::MissingImage)
}

/// Runs one analysis on the blocking pool. Analyses are serialized by the
/// invoker lock; a request that timed out while queued is never analysed.
async fn run_analysis(state: &AppState, path: PathBuf) -> Result<Option<Emotion>, String> {
    let invoker = Arc::clone(&state.invoker);
    let abandoned = Arc::new(AtomicBool::new(false));
    let task = tokio::task::spawn_blocking({
        let abandoned = Arc::clone(&abandoned);
        move || {
            let mut invoker = invoker.lock().unwrap_or_else(PoisonError::into_inner);
            if abandoned.load(Ordering::SeqCst) {
                log::debug!("Skipping abandoned analysis of {}", path.display());
                return None;
            }
            Some(invoker.invoke(ImageSource::File(&path)))
        }
    });

    match tokio::time::timeout(state.analysis_timeout, task).await {
        Ok(Ok(Some(Ok(emotion)))) => Ok(emotion),
        Ok(Ok(Some(Err(e)))) => Err(e.to_string()),
        Ok(Ok(None)) => Err("analysis was abandoned".to_string()),
        Ok(Err(e)) => Err(format!("analysis task failed: {e}")),
        Err(_) => {
            abandoned.store(true, Ordering::SeqCst);
            Err(format!(
                "analysis timed out after {}s",
                state.analysis_timeout.as_secs_f64()
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use emotion_core::analysis::domain::analysis_report::{
        AnalysisReport, FaceAnalysis, FaceSelection,
    };
    use emotion_core::analysis::domain::emotion_analyzer::{
        AnalysisError, AnalysisOptions, EmotionAnalyzer,
    };
    use serde_json::{json, Value};
    use std::path::Path;
    use tower::ServiceExt;

    const BOUNDARY: &str = "emotion-test-boundary";

    // --- Stubs ---

    enum Behavior {
        Label(&'static str),
        Faces(Vec<&'static str>),
        Fail,
        Panic,
        Sleep(Duration),
    }

    type Seen = Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>;

    struct StubAnalyzer {
        behavior: Behavior,
        seen: Seen,
    }

    impl EmotionAnalyzer for StubAnalyzer {
        fn analyze(
            &mut self,
            image: ImageSource<'_>,
            _options: &AnalysisOptions,
        ) -> Result<AnalysisReport, AnalysisError> {
            if let ImageSource::File(path) = image {
                let bytes = std::fs::read(path).unwrap_or_default();
                self.seen.lock().unwrap().push((path.to_path_buf(), bytes));
            }
            match &self.behavior {
                Behavior::Label(label) => Ok(AnalysisReport::Single(face(label))),
                Behavior::Faces(labels) => Ok(AnalysisReport::Multiple(
                    labels.iter().map(|l| face(l)).collect(),
                )),
                Behavior::Fail => Err(AnalysisError::Backend("model exploded".to_string())),
                Behavior::Panic => panic!("tensor shape mismatch"),
                Behavior::Sleep(duration) => {
                    std::thread::sleep(*duration);
                    Ok(AnalysisReport::Single(face("happy")))
                }
            }
        }
    }

    fn face(label: &str) -> FaceAnalysis {
        FaceAnalysis {
            dominant_emotion: Emotion::new(label),
            ..Default::default()
        }
    }

    // --- Helpers ---

    struct Harness {
        app: Router,
        seen: Seen,
        dir: tempfile::TempDir,
    }

    fn harness(behavior: Behavior) -> Harness {
        harness_with(behavior, Duration::from_secs(5), 1024 * 1024)
    }

    fn harness_with(behavior: Behavior, timeout: Duration, body_limit: usize) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let analyzer = StubAnalyzer {
            behavior,
            seen: seen.clone(),
        };
        let invoker = EmotionInvoker::new(
            Box::new(analyzer),
            AnalysisOptions::default(),
            FaceSelection::First,
        );
        let state = AppState::new(
            Arc::new(Mutex::new(invoker)),
            dir.path().to_path_buf(),
            timeout,
        );
        Harness {
            app: build_router(state, body_limit),
            seen,
            dir,
        }
    }

    fn file_part(name: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
        let mut part = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        part.extend_from_slice(bytes);
        part.extend_from_slice(b"\r\n");
        part
    }

    fn text_part(name: &str, value: &str) -> Vec<u8> {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .into_bytes()
    }

    fn multipart_request(parts: Vec<Vec<u8>>) -> Request<Body> {
        let mut body: Vec<u8> = parts.concat();
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn staged_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_health() {
        let h = harness(Behavior::Label("happy"));
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_analyze_returns_dominant_emotion() {
        let h = harness(Behavior::Label("happy"));
        let request = multipart_request(vec![file_part("image", "face.jpg", b"jpeg-bytes")]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "emotion": "happy" }));
        assert_eq!(staged_files(h.dir.path()), 0);
    }

    #[tokio::test]
    async fn test_analyzer_sees_staged_copy_with_original_extension() {
        let h = harness(Behavior::Label("sad"));
        let request = multipart_request(vec![
            text_part("note", "ignored"),
            file_part("image", "capture.png", b"png-bytes"),
        ]);

        let (status, _) = send(h.app, request).await;

        assert_eq!(status, StatusCode::OK);
        let seen = h.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (path, bytes) = &seen[0];
        assert_eq!(bytes, b"png-bytes");
        assert_eq!(path.parent(), Some(h.dir.path()));
        assert!(path.to_string_lossy().ends_with(".png"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_extensionless_upload_is_staged_as_jpg() {
        let h = harness(Behavior::Label("neutral"));
        let request = multipart_request(vec![file_part("image", "snapshot", b"bytes")]);

        send(h.app, request).await;

        let seen = h.seen.lock().unwrap();
        assert!(seen[0].0.to_string_lossy().ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_first_face_of_sequence_is_reported() {
        let h = harness(Behavior::Faces(vec!["surprise", "angry"]));
        let request = multipart_request(vec![file_part("image", "group.jpg", b"x")]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "emotion": "surprise" }));
    }

    #[tokio::test]
    async fn test_no_faces_is_null_emotion() {
        let h = harness(Behavior::Faces(vec![]));
        let request = multipart_request(vec![file_part("image", "empty.jpg", b"x")]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "emotion": null }));
    }

    #[tokio::test]
    async fn test_missing_image_field() {
        let h = harness(Behavior::Label("happy"));
        let request = multipart_request(vec![file_part("photo", "face.jpg", b"x")]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "no image file provided" }));
        assert!(h.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_text_field_is_not_a_file() {
        let h = harness(Behavior::Label("happy"));
        let request = multipart_request(vec![text_part("image", "not a file")]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "no image file provided" }));
    }

    #[tokio::test]
    async fn test_non_multipart_body() {
        let h = harness(Behavior::Label("happy"));
        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "no image file provided" }));
    }

    #[tokio::test]
    async fn test_empty_filename() {
        let h = harness(Behavior::Label("happy"));
        let request = multipart_request(vec![file_part("image", "", b"x")]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "empty filename" }));
        assert_eq!(staged_files(h.dir.path()), 0);
        assert!(h.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_upload_is_invalid() {
        let h = harness_with(Behavior::Label("happy"), Duration::from_secs(5), 1024);
        let request = multipart_request(vec![file_part("image", "big.jpg", &[7u8; 8192])]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid upload");
        assert!(body["detail"].is_string());
        assert!(h.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analysis_failure() {
        let h = harness(Behavior::Fail);
        let request = multipart_request(vec![file_part("image", "face.jpg", b"x")]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "error": "analysis_failed", "detail": "model exploded" })
        );
        assert_eq!(staged_files(h.dir.path()), 0);
    }

    #[tokio::test]
    async fn test_analyzer_panic_is_analysis_failure() {
        let h = harness(Behavior::Panic);
        let request = multipart_request(vec![file_part("image", "face.jpg", b"x")]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "analysis_failed");
        assert_eq!(body["detail"], "analyzer panicked: tensor shape mismatch");
        assert_eq!(staged_files(h.dir.path()), 0);
    }

    #[tokio::test]
    async fn test_service_recovers_after_panic() {
        let h = harness(Behavior::Panic);
        let first = multipart_request(vec![file_part("image", "a.jpg", b"x")]);
        let second = multipart_request(vec![file_part("image", "b.jpg", b"x")]);

        let (first_status, _) = send(h.app.clone(), first).await;
        let (second_status, _) = send(h.app, second).await;

        assert_eq!(first_status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(second_status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(h.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_analysis_failure_and_cleans_up() {
        let h = harness_with(
            Behavior::Sleep(Duration::from_millis(500)),
            Duration::from_millis(50),
            1024 * 1024,
        );
        let request = multipart_request(vec![file_part("image", "slow.jpg", b"x")]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "error": "analysis_failed", "detail": "analysis timed out after 0.05s" })
        );
        assert_eq!(staged_files(h.dir.path()), 0);
    }

    #[tokio::test]
    async fn test_request_timed_out_in_queue_is_never_analysed() {
        let h = harness_with(
            Behavior::Sleep(Duration::from_millis(400)),
            Duration::from_millis(100),
            1024 * 1024,
        );
        let first = multipart_request(vec![file_part("image", "a.jpg", b"a")]);
        let second = multipart_request(vec![file_part("image", "b.jpg", b"b")]);

        let ((first_status, _), (second_status, second_body)) =
            tokio::join!(send(h.app.clone(), first), send(h.app.clone(), second));
        // Let the running analysis finish and release the lock.
        tokio::time::sleep(Duration::from_millis(800)).await;

        assert_eq!(first_status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(second_status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(second_body["error"], "analysis_failed");
        assert_eq!(h.seen.lock().unwrap().len(), 1);
        assert_eq!(staged_files(h.dir.path()), 0);
    }

    #[tokio::test]
    async fn test_storage_failure() {
        let h = harness(Behavior::Label("happy"));
        std::fs::remove_dir(h.dir.path()).unwrap();
        let request = multipart_request(vec![file_part("image", "face.jpg", b"x")]);

        let (status, body) = send(h.app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "storage_failed");
        assert!(body["detail"].is_string());
        assert!(h.seen.lock().unwrap().is_empty());
    }
}
