use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use emotion_core::analysis::domain::emotion::Emotion;
use emotion_core::capture::domain::image_upload::UploadRejection;

/// Every reply the service sends.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Healthy,
    Rejected(UploadRejection),
    StorageFailed(String),
    AnalysisFailed(String),
    Analyzed(Option<Emotion>),
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiResponse::Healthy | ApiResponse::Analyzed(_) => StatusCode::OK,
            ApiResponse::Rejected(_) => StatusCode::BAD_REQUEST,
            ApiResponse::StorageFailed(_) | ApiResponse::AnalysisFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ApiResponse::Healthy => json!({ "status": "ok" }),
            ApiResponse::Rejected(UploadRejection::Unreadable(detail)) => {
                json!({ "error": "invalid upload", "detail": detail })
            }
            ApiResponse::Rejected(rejection) => json!({ "error": rejection.to_string() }),
            ApiResponse::StorageFailed(detail) => {
                json!({ "error": "storage_failed", "detail": detail })
            }
            ApiResponse::AnalysisFailed(detail) => {
                json!({ "error": "analysis_failed", "detail": detail })
            }
            ApiResponse::Analyzed(emotion) => json!({ "emotion": emotion }),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_body() {
        assert_eq!(ApiResponse::Healthy.status(), StatusCode::OK);
        assert_eq!(ApiResponse::Healthy.body(), json!({ "status": "ok" }));
    }

    #[test]
    fn test_rejections_are_bad_requests() {
        let missing = ApiResponse::Rejected(UploadRejection::MissingImage);
        let empty = ApiResponse::Rejected(UploadRejection::EmptyFilename);
        let unreadable = ApiResponse::Rejected(UploadRejection::Unreadable("eof".into()));

        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.body(), json!({ "error": "no image file provided" }));
        assert_eq!(empty.body(), json!({ "error": "empty filename" }));
        assert_eq!(
            unreadable.body(),
            json!({ "error": "invalid upload", "detail": "eof" })
        );
    }

    #[test]
    fn test_failures_are_server_errors() {
        let storage = ApiResponse::StorageFailed("read-only file system".into());
        let analysis = ApiResponse::AnalysisFailed("model exploded".into());

        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            storage.body(),
            json!({ "error": "storage_failed", "detail": "read-only file system" })
        );
        assert_eq!(analysis.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            analysis.body(),
            json!({ "error": "analysis_failed", "detail": "model exploded" })
        );
    }

    #[test]
    fn test_analyzed_label_or_null() {
        let happy = ApiResponse::Analyzed(Emotion::new("happy"));
        assert_eq!(happy.body(), json!({ "emotion": "happy" }));
        assert_eq!(ApiResponse::Analyzed(None).body(), json!({ "emotion": null }));
    }
}
