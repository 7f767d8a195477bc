pub mod analyzer_factory;
pub mod execution_provider;
pub mod local_emotion_analyzer;
pub mod onnx_emotion_classifier;
pub mod onnx_face_locator;
pub mod remote_emotion_analyzer;

#[cfg(feature = "clap")]
pub mod analyzer_args;
