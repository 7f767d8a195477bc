/// FER+ facial expression classifier using ONNX Runtime via `ort`.
///
/// The model takes a 64x64 grayscale crop with raw 0-255 intensities
/// (NCHW `[1, 1, 64, 64]`) and emits eight unnormalized scores.
use std::path::Path;

use crate::analysis::domain::emotion::{Emotion, EmotionScore};
use crate::analysis::domain::emotion_classifier::EmotionClassifier;
use crate::analysis::infrastructure::execution_provider::load_session;
use crate::shared::frame::Frame;

const INPUT_SIZE: u32 = 64;

/// Output order of the FER+ model, renamed to the DeepFace vocabulary.
const LABELS: [&str; 8] = [
    "neutral", "happy", "surprise", "sad", "angry", "disgust", "fear", "contempt",
];

pub struct OnnxEmotionClassifier {
    session: ort::session::Session,
}

impl OnnxEmotionClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        log::info!("Emotion classifier loaded from {}", model_path.display());
        Ok(Self { session })
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify(&mut self, face: &Frame) -> Result<Vec<EmotionScore>, Box<dyn std::error::Error>> {
        let input = preprocess(face)?;
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("emotion model produced no outputs".into());
        }
        let logits = outputs[0].try_extract_array::<f32>()?;
        let logits = logits.as_slice().ok_or("cannot get logits slice")?;
        if logits.len() != LABELS.len() {
            return Err(format!(
                "emotion model produced {} scores, expected {}",
                logits.len(),
                LABELS.len()
            )
            .into());
        }
        Ok(to_scores(&softmax(logits)))
    }
}

/// Grayscale + resize to the model's 64x64 input.
fn preprocess(face: &Frame) -> Result<ndarray::Array4<f32>, Box<dyn std::error::Error>> {
    let rgb = face.to_rgb_image().ok_or("emotion classifier expects an RGB frame")?;
    let gray = image::DynamicImage::ImageRgb8(rgb).to_luma8();
    let resized = image::imageops::resize(
        &gray,
        INPUT_SIZE,
        INPUT_SIZE,
        image::imageops::FilterType::Triangle,
    );

    let size = INPUT_SIZE as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 1, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        tensor[[0, 0, y as usize, x as usize]] = pixel.0[0] as f32;
    }
    Ok(tensor)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|v| v / sum).collect()
}

fn to_scores(probabilities: &[f32]) -> Vec<EmotionScore> {
    LABELS
        .iter()
        .zip(probabilities)
        .filter_map(|(label, &score)| {
            Some(EmotionScore {
                emotion: Emotion::new(label)?,
                score,
            })
        })
        .collect()
}
