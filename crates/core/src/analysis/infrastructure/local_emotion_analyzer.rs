use crate::analysis::domain::analysis_report::{AnalysisReport, FaceAnalysis};
use crate::analysis::domain::emotion::dominant;
use crate::analysis::domain::emotion_analyzer::{
    AnalysisError, AnalysisOptions, EmotionAnalyzer, ImageSource,
};
use crate::analysis::domain::emotion_classifier::EmotionClassifier;
use crate::analysis::domain::face_locator::{FaceBox, FaceLocator};
use crate::capture::infrastructure::image_decoder::open_image;
use crate::shared::frame::Frame;

/// In-process capability: locate faces, then classify each crop.
///
/// With `enforce_detection` off, a frame without a located face is
/// classified as a whole and reported as a single face.
pub struct LocalEmotionAnalyzer {
    locator: Box<dyn FaceLocator>,
    classifier: Box<dyn EmotionClassifier>,
}

impl LocalEmotionAnalyzer {
    pub fn new(locator: Box<dyn FaceLocator>, classifier: Box<dyn EmotionClassifier>) -> Self {
        Self {
            locator,
            classifier,
        }
    }

    fn analyze_frame(
        &mut self,
        frame: &Frame,
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport, AnalysisError> {
        let mut faces = self
            .locator
            .locate(frame)
            .map_err(|e| AnalysisError::Backend(format!("face location failed: {e}")))?;
        log::debug!("Located {} face(s) in {}x{} frame", faces.len(), frame.width(), frame.height());

        if faces.is_empty() {
            if options.enforce_detection {
                return Err(AnalysisError::NoFaceDetected);
            }
            return Ok(AnalysisReport::Single(self.classify_region(frame, None)?));
        }

        faces.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        let analyses = faces
            .into_iter()
            .map(|face| {
                let crop = frame.crop(face.x, face.y, face.width, face.height);
                match crop {
                    Some(crop) => self.classify_region(&crop, Some(face)),
                    None => Ok(FaceAnalysis {
                        region: Some(face),
                        ..Default::default()
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AnalysisReport::Multiple(analyses))
    }

    fn classify_region(
        &mut self,
        image: &Frame,
        region: Option<FaceBox>,
    ) -> Result<FaceAnalysis, AnalysisError> {
        let scores = self
            .classifier
            .classify(image)
            .map_err(|e| AnalysisError::Backend(format!("emotion classification failed: {e}")))?;
        Ok(FaceAnalysis {
            dominant_emotion: dominant(&scores).cloned(),
            scores,
            region,
        })
    }
}

impl EmotionAnalyzer for LocalEmotionAnalyzer {
    fn analyze(
        &mut self,
        image: ImageSource<'_>,
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport, AnalysisError> {
        match image {
            ImageSource::Frame(frame) => self.analyze_frame(frame, options),
            ImageSource::File(path) => {
                let frame = open_image(path).map_err(|source| AnalysisError::ImageLoad {
                    path: path.to_path_buf(),
                    source,
                })?;
                self.analyze_frame(&frame, options)
            }
        }
    }
}
