use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::constants::KNOWN_EMOTIONS;

/// A dominant-emotion label as reported by an analysis capability.
///
/// Labels are opaque text. Capabilities may report labels outside
/// [`KNOWN_EMOTIONS`]; they are passed through untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Emotion(String);

impl Emotion {
    /// Wraps a label, trimming whitespace. Blank labels are treated as absent.
    pub fn new(label: impl AsRef<str>) -> Option<Self> {
        let label = label.as_ref().trim();
        if label.is_empty() {
            None
        } else {
            Some(Self(label.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        KNOWN_EMOTIONS.contains(&self.0.as_str())
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Probability (or raw score) assigned to one label.
#[derive(Clone, Debug, PartialEq)]
pub struct EmotionScore {
    pub emotion: Emotion,
    pub score: f32,
}

/// Label with the highest score, ties resolved in favour of the earlier entry.
pub fn dominant(scores: &[EmotionScore]) -> Option<&Emotion> {
    scores
        .iter()
        .fold(None::<&EmotionScore>, |best, s| match best {
            Some(b) if b.score >= s.score => Some(b),
            _ => Some(s),
        })
        .map(|s| &s.emotion)
}
