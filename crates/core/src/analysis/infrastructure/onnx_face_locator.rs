/// YOLO face locator using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference and NMS post-processing.
/// Landmarks emitted by pose variants of the model are ignored.
use std::path::Path;

use crate::analysis::domain::face_locator::{FaceBox, FaceLocator};
use crate::analysis::infrastructure::execution_provider::load_session;
use crate::shared::frame::Frame;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for a located face.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

pub struct OnnxFaceLocator {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxFaceLocator {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. }
                    if shape.len() >= 4 && shape[2] > 0 =>
                {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!("Face locator loaded (input {input_size}px, confidence {confidence})");
        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceLocator for OnnxFaceLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();

        // Output is [1, features, detections] (transposed) or [1, detections, features].
        if shape.len() != 3 {
            return Err(format!("unexpected face model output shape: {shape:?}").into());
        }
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_feats < 5 {
            return Err(format!("face model output has {num_feats} features, need 5").into());
        }

        let data = tensor.as_slice().ok_or("cannot get tensor slice")?;
        let feature = |det: usize, f: usize| -> f64 {
            if transposed {
                data[f * num_dets + det] as f64
            } else {
                data[det * num_feats + f] as f64
            }
        };

        // Row format: [cx, cy, w, h, conf, ...keypoints]
        let mut raw = Vec::new();
        for i in 0..num_dets {
            let conf = feature(i, 4);
            if conf < self.confidence {
                continue;
            }
            let (cx, cy, w, h) = (feature(i, 0), feature(i, 1), feature(i, 2), feature(i, 3));
            raw.push(RawDetection {
                x1: ((cx - w / 2.0) - pad_x as f64) / scale,
                y1: ((cy - h / 2.0) - pad_y as f64) / scale,
                x2: ((cx + w / 2.0) - pad_x as f64) / scale,
                y2: ((cy + h / 2.0) - pad_y as f64) / scale,
                confidence: conf,
            });
        }

        Ok(nms(&mut raw, NMS_IOU_THRESH)
            .iter()
            .filter_map(|d| to_face_box(d, frame.width(), frame.height()))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a frame to `target_size` × `target_size`.
///
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, YOLO convention
    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let channels = (frame.channels() as usize).min(3);

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                let sc = c.min(channels - 1);
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, sc]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets.iter() {
        let overlaps = keep.iter().any(|k| {
            bbox_iou(
                &[k.x1, k.y1, k.x2, k.y2],
                &[det.x1, det.y1, det.x2, det.y2],
            ) > iou_thresh
        });
        if !overlaps {
            keep.push(det.clone());
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Clamps a detection to the frame; degenerate boxes are dropped.
fn to_face_box(det: &RawDetection, frame_w: u32, frame_h: u32) -> Option<FaceBox> {
    let x1 = det.x1.clamp(0.0, frame_w as f64);
    let y1 = det.y1.clamp(0.0, frame_h as f64);
    let x2 = det.x2.clamp(0.0, frame_w as f64);
    let y2 = det.y2.clamp(0.0, frame_h as f64);
    let width = (x2 - x1).round() as u32;
    let height = (y2 - y1).round() as u32;
    if width == 0 || height == 0 {
        return None;
    }
    Some(FaceBox {
        x: x1.round() as u32,
        y: y1.round() as u32,
        width,
        height,
        confidence: det.confidence,
    })
}
