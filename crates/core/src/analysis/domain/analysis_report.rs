use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::analysis::domain::emotion::{Emotion, EmotionScore};
use crate::analysis::domain::face_locator::FaceBox;

/// Result for one analysed face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceAnalysis {
    pub dominant_emotion: Option<Emotion>,
    pub scores: Vec<EmotionScore>,
    pub region: Option<FaceBox>,
}

/// Shape of a capability's answer.
///
/// Capabilities answer with one mapping, a sequence of mappings (one per
/// face), or something else entirely.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisReport {
    Single(FaceAnalysis),
    Multiple(Vec<FaceAnalysis>),
    Unrecognized,
}

/// Which face of a multi-face report supplies the dominant emotion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaceSelection {
    /// First face in the order the capability reported.
    #[default]
    First,
    /// Only report when exactly one face was found.
    Single,
}

impl FromStr for FaceSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Self::First),
            "single" => Ok(Self::Single),
            other => Err(format!(
                "face selection must be 'first' or 'single', got '{other}'"
            )),
        }
    }
}

impl fmt::Display for FaceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceSelection::First => write!(f, "first"),
            FaceSelection::Single => write!(f, "single"),
        }
    }
}

impl AnalysisReport {
    /// Dominant emotion according to `selection`.
    ///
    /// A missing `dominant_emotion`, an empty sequence or an unrecognized
    /// shape all yield `None`.
    pub fn dominant_emotion(&self, selection: FaceSelection) -> Option<&Emotion> {
        match self {
            AnalysisReport::Single(face) => face.dominant_emotion.as_ref(),
            AnalysisReport::Multiple(faces) => match selection {
                FaceSelection::First => faces.first(),
                FaceSelection::Single if faces.len() == 1 => faces.first(),
                FaceSelection::Single => None,
            }
            .and_then(|face| face.dominant_emotion.as_ref()),
            AnalysisReport::Unrecognized => None,
        }
    }

    pub fn face_count(&self) -> usize {
        match self {
            AnalysisReport::Single(_) => 1,
            AnalysisReport::Multiple(faces) => faces.len(),
            AnalysisReport::Unrecognized => 0,
        }
    }

    /// Interprets a DeepFace-style JSON reply.
    ///
    /// Accepts a face mapping, a sequence of face mappings, or a
    /// `{"results": [...]}` envelope. Sequence entries that are not
    /// mappings become empty faces so positions are preserved.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => match map.get("results") {
                Some(Value::Array(items)) if !map.contains_key("dominant_emotion") => {
                    AnalysisReport::Multiple(items.iter().map(face_from_value).collect())
                }
                _ => AnalysisReport::Single(face_from_map(map)),
            },
            Value::Array(items) => {
                AnalysisReport::Multiple(items.iter().map(face_from_value).collect())
            }
            _ => AnalysisReport::Unrecognized,
        }
    }
}

fn face_from_value(value: &Value) -> FaceAnalysis {
    value.as_object().map(face_from_map).unwrap_or_default()
}

fn face_from_map(map: &Map<String, Value>) -> FaceAnalysis {
    // Relaying services answer `{"emotion": "<label>"}` instead of a score map.
    let dominant_emotion = map
        .get("dominant_emotion")
        .and_then(Value::as_str)
        .and_then(Emotion::new)
        .or_else(|| map.get("emotion").and_then(Value::as_str).and_then(Emotion::new));

    let scores = map
        .get("emotion")
        .and_then(Value::as_object)
        .map(|scores| {
            scores
                .iter()
                .filter_map(|(label, score)| {
                    Some(EmotionScore {
                        emotion: Emotion::new(label)?,
                        score: score.as_f64()? as f32,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let region = map.get("region").and_then(Value::as_object).and_then(|r| {
        let field = |key: &str| r.get(key).and_then(Value::as_u64).map(|v| v as u32);
        Some(FaceBox {
            x: field("x")?,
            y: field("y")?,
            width: field("w")?,
            height: field("h")?,
            confidence: map
                .get("face_confidence")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
        })
    });

    FaceAnalysis {
        dominant_emotion,
        scores,
        region,
    }
}
