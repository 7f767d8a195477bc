use crate::analysis::domain::emotion::EmotionScore;
use crate::shared::frame::Frame;

/// Domain interface for classifying the expression of a single face crop.
pub trait EmotionClassifier: Send {
    fn classify(&mut self, face: &Frame) -> Result<Vec<EmotionScore>, Box<dyn std::error::Error>>;
}
