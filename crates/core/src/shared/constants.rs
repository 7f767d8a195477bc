pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMOTION_MODEL_NAME: &str = "emotion-ferplus-8.onnx";
pub const EMOTION_MODEL_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/emotion_ferplus/model/emotion-ferplus-8.onnx";

/// Output file used by the capture utility when the caller gives none.
pub const DEFAULT_CAPTURE_FILENAME: &str = "emotion_capture.jpg";

/// Extension given to uploads whose filename has none.
pub const DEFAULT_UPLOAD_EXTENSION: &str = ".jpg";

pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";

pub const DEFAULT_SERVICE_PORT: u16 = 6000;

/// Multipart form field carrying the image in `POST /analyze`.
pub const IMAGE_FIELD: &str = "image";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Labels the bundled classifier and DeepFace-style services report.
pub const KNOWN_EMOTIONS: &[&str] = &[
    "angry", "disgust", "fear", "happy", "sad", "surprise", "neutral", "contempt",
];
