//! Forwards images to a DeepFace-style HTTP analysis service.
//!
//! The image goes out as multipart field `image` along with `actions` and
//! `enforce_detection` text fields; the JSON reply is interpreted by
//! [`AnalysisReport::from_json`].
use std::io::Cursor;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};

use crate::analysis::domain::analysis_report::AnalysisReport;
use crate::analysis::domain::emotion_analyzer::{
    AnalysisError, AnalysisOptions, EmotionAnalyzer, ImageSource,
};
use crate::shared::frame::Frame;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Error bodies are truncated to this many characters.
const MAX_ERROR_BODY: usize = 512;

pub struct RemoteEmotionAnalyzer {
    client: reqwest::blocking::Client,
    url: String,
}

impl RemoteEmotionAnalyzer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn remote_err(&self) -> impl FnOnce(reqwest::Error) -> AnalysisError + '_ {
        move |source| AnalysisError::Remote {
            url: self.url.clone(),
            source,
        }
    }
}

impl EmotionAnalyzer for RemoteEmotionAnalyzer {
    fn analyze(
        &mut self,
        image: ImageSource<'_>,
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport, AnalysisError> {
        let part = image_part(image)?;
        let actions = options
            .actions
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let form = Form::new()
            .part("image", part)
            .text("actions", actions)
            .text("enforce_detection", options.enforce_detection.to_string());

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .map_err(self.remote_err())?;

        let status = response.status();
        let body = response.text().map_err(self.remote_err())?;
        if !status.is_success() {
            return Err(AnalysisError::RemoteStatus {
                url: self.url.clone(),
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        parse_reply(&body)
    }
}

fn parse_reply(body: &str) -> Result<AnalysisReport, AnalysisError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(AnalysisError::MalformedResponse)?;
    Ok(AnalysisReport::from_json(&value))
}

fn image_part(image: ImageSource<'_>) -> Result<Part, AnalysisError> {
    match image {
        ImageSource::Frame(frame) => Ok(Part::bytes(encode_jpeg(frame)?).file_name("frame.jpg")),
        ImageSource::File(path) => {
            let bytes = std::fs::read(path).map_err(|e| AnalysisError::ImageLoad {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(e),
            })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.jpg".to_string());
            Ok(Part::bytes(bytes).file_name(name))
        }
    }
}

fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>, AnalysisError> {
    let img = frame.to_rgb_image().ok_or_else(|| {
        AnalysisError::Backend(format!(
            "cannot encode {}-channel frame as JPEG",
            frame.channels()
        ))
    })?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
        .map_err(AnalysisError::Encode)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::analysis_report::FaceSelection;

    #[test]
    fn test_parse_reply_mapping() {
        let report = parse_reply(r#"{"dominant_emotion": "happy", "age": 30}"#).unwrap();
        assert_eq!(
            report.dominant_emotion(FaceSelection::First).unwrap().as_str(),
            "happy"
        );
    }

    #[test]
    fn test_parse_reply_relayed_label() {
        let report = parse_reply(r#"{"emotion": "surprise"}"#).unwrap();
        assert_eq!(
            report.dominant_emotion(FaceSelection::First).unwrap().as_str(),
            "surprise"
        );
    }

    #[test]
    fn test_parse_reply_sequence() {
        let report =
            parse_reply(r#"[{"dominant_emotion": "sad"}, {"dominant_emotion": "angry"}]"#)
                .unwrap();
        assert_eq!(report.face_count(), 2);
    }

    #[test]
    fn test_parse_reply_invalid_json_is_error() {
        let result = parse_reply("<html>502 Bad Gateway</html>");
        assert!(matches!(result, Err(AnalysisError::MalformedResponse(_))));
    }

    #[test]
    fn test_encode_jpeg_produces_decodable_image() {
        let frame = Frame::new(vec![200u8; 16 * 8 * 3], 16, 8, 3);
        let bytes = encode_jpeg(&frame).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn test_missing_file_is_image_load_error() {
        let result = image_part(ImageSource::File(std::path::Path::new(
            "/nonexistent/upload.png",
        )));
        assert!(matches!(result, Err(AnalysisError::ImageLoad { .. })));
    }

    #[test]
    fn test_unreachable_service_is_remote_error() {
        // Port 9 (discard) on loopback is closed on test machines
        let mut analyzer =
            RemoteEmotionAnalyzer::new("http://127.0.0.1:9/analyze", Duration::from_secs(2))
                .unwrap();
        let frame = Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3);

        let result = analyzer.analyze(ImageSource::Frame(&frame), &AnalysisOptions::default());

        assert!(matches!(result, Err(AnalysisError::Remote { .. })));
    }
}
