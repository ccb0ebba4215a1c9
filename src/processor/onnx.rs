//! ONNX expression backend
//!
//! Two models, both run with ort (ONNX Runtime):
//! - an UltraFace-style face detector: RGB input `[1, 3, 240, 320]`
//!   normalised as `(p - 127) / 128`, outputs `scores [1, N, 2]` and
//!   `boxes [1, N, 4]` (normalised corner coordinates)
//! - a FER+-style classifier: grayscale input `[1, 1, 64, 64]` with raw pixel
//!   values, output of 8 logits
//!
//! Only the highest scoring face is classified.

use super::backend::ExpressionBackend;
use crate::camera::VideoFrame;
use crate::config::ModelConfig;
use crate::error::{MoodError, Result};
use crate::mood::Expressions;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use tracing::{debug, info};

const DETECTOR_WIDTH: u32 = 320;
const DETECTOR_HEIGHT: u32 = 240;
const CLASSIFIER_SIZE: u32 = 64;

/// Classifier output order
const FERPLUS_LABELS: [&str; 8] = [
    "neutral",
    "happiness",
    "surprise",
    "sadness",
    "anger",
    "disgust",
    "fear",
    "contempt",
];

/// Reported labels, in reporting order, with their classifier index.
/// Contempt has no presentation and is dropped.
const REPORTED: [(&str, usize); 7] = [
    ("neutral", 0),
    ("happy", 1),
    ("sad", 3),
    ("angry", 4),
    ("fearful", 6),
    ("disgusted", 5),
    ("surprised", 2),
];

/// Face box in normalised coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
}

impl FaceBox {
    /// Pixel rectangle `(x, y, width, height)` clamped to the image
    fn to_pixels(self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x1 = (self.x1.clamp(0.0, 1.0) * width as f32) as u32;
        let y1 = (self.y1.clamp(0.0, 1.0) * height as f32) as u32;
        let x2 = (self.x2.clamp(0.0, 1.0) * width as f32) as u32;
        let y2 = (self.y2.clamp(0.0, 1.0) * height as f32) as u32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some((x1, y1, x2 - x1, y2 - y1))
    }
}

pub struct OnnxExpressionBackend {
    face_detector: Option<Session>,
    classifier: Option<Session>,
    config: ModelConfig,
}

// Safety: ort::Session is Send+Sync by design
unsafe impl Send for OnnxExpressionBackend {}

impl Default for OnnxExpressionBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OnnxExpressionBackend {
    pub fn new() -> Self {
        Self {
            face_detector: None,
            classifier: None,
            config: ModelConfig::default(),
        }
    }

    fn find_face(&mut self, image: &RgbImage) -> Result<Option<FaceBox>> {
        let input_name = self.config.face_detector_input.clone();
        let min_score = self.config.min_face_score;
        let session = self
            .face_detector
            .as_mut()
            .ok_or_else(|| MoodError::DetectionError("Face detector not loaded".into()))?;

        let resized = imageops::resize(image, DETECTOR_WIDTH, DETECTOR_HEIGHT, FilterType::Triangle);
        let mut input = Array4::<f32>::zeros((
            1,
            3,
            DETECTOR_HEIGHT as usize,
            DETECTOR_WIDTH as usize,
        ));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                input[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - 127.0) / 128.0;
            }
        }

        let tensor = Tensor::from_array(input)
            .map_err(|e| MoodError::DetectionError(format!("Face tensor error: {}", e)))?;
        let outputs = session
            .run(ort::inputs![input_name.as_str() => tensor])
            .map_err(|e| MoodError::DetectionError(format!("Face detector error: {}", e)))?;

        let mut output_iter = outputs.iter();
        let (_, scores_value) = output_iter
            .next()
            .ok_or_else(|| MoodError::DetectionError("Face detector produced no scores".into()))?;
        let (_, boxes_value) = output_iter
            .next()
            .ok_or_else(|| MoodError::DetectionError("Face detector produced no boxes".into()))?;

        let (_shape, scores) = scores_value
            .try_extract_tensor::<f32>()
            .map_err(|e| MoodError::DetectionError(format!("Score extraction error: {}", e)))?;
        let (_shape, boxes) = boxes_value
            .try_extract_tensor::<f32>()
            .map_err(|e| MoodError::DetectionError(format!("Box extraction error: {}", e)))?;

        Ok(best_face(scores, boxes, min_score))
    }

    fn classify(&mut self, image: &RgbImage, face: FaceBox) -> Result<Option<Expressions>> {
        let input_name = self.config.expression_input.clone();
        let session = self
            .classifier
            .as_mut()
            .ok_or_else(|| MoodError::DetectionError("Expression classifier not loaded".into()))?;

        let Some((x, y, w, h)) = face.to_pixels(image.width(), image.height()) else {
            return Ok(None);
        };
        let crop = imageops::crop_imm(image, x, y, w, h).to_image();
        let gray = DynamicImage::ImageRgb8(crop).to_luma8();
        let gray = imageops::resize(&gray, CLASSIFIER_SIZE, CLASSIFIER_SIZE, FilterType::Triangle);

        let mut input = Array4::<f32>::zeros((1, 1, CLASSIFIER_SIZE as usize, CLASSIFIER_SIZE as usize));
        for (x, y, pixel) in gray.enumerate_pixels() {
            input[[0, 0, y as usize, x as usize]] = pixel[0] as f32;
        }

        let tensor = Tensor::from_array(input)
            .map_err(|e| MoodError::DetectionError(format!("Expression tensor error: {}", e)))?;
        let outputs = session
            .run(ort::inputs![input_name.as_str() => tensor])
            .map_err(|e| MoodError::DetectionError(format!("Classifier error: {}", e)))?;

        let (_, logits_value) = outputs
            .iter()
            .next()
            .ok_or_else(|| MoodError::DetectionError("Classifier produced no output".into()))?;
        let (_shape, logits) = logits_value
            .try_extract_tensor::<f32>()
            .map_err(|e| MoodError::DetectionError(format!("Logit extraction error: {}", e)))?;

        Ok(Some(expressions_from_logits(logits)?))
    }
}

impl ExpressionBackend for OnnxExpressionBackend {
    fn name(&self) -> &str {
        "onnx"
    }

    fn load_models(&mut self, config: &ModelConfig) -> Result<()> {
        let face_detector = load_session(&config.face_detector_path())?;
        let classifier = load_session(&config.expression_classifier_path())?;

        self.face_detector = Some(face_detector);
        self.classifier = Some(classifier);
        self.config = config.clone();
        info!(
            "Loaded face detector {} and classifier {}",
            config.face_detector, config.expression_classifier
        );
        Ok(())
    }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<Expressions>> {
        let image = frame.to_image()?;
        let Some(face) = self.find_face(&image)? else {
            return Ok(None);
        };
        debug!("Face at ({:.2}, {:.2}) score {:.2}", face.x1, face.y1, face.score);
        self.classify(&image, face)
    }
}

fn load_session(path: &Path) -> Result<Session> {
    if !path.exists() {
        return Err(MoodError::ModelLoadError(format!(
            "Model not found: {}",
            path.display()
        )));
    }

    Session::builder()
        .and_then(|b| b.with_intra_threads(1))
        .and_then(|b| b.commit_from_file(path))
        .map_err(|e| MoodError::ModelLoadError(format!("Failed to load {}: {}", path.display(), e)))
}

/// Highest scoring face at or above `min_score`
///
/// `scores` holds `[background, face]` pairs, `boxes` the matching
/// `[x1, y1, x2, y2]` quadruples.
pub fn best_face(scores: &[f32], boxes: &[f32], min_score: f32) -> Option<FaceBox> {
    let candidates = (scores.len() / 2).min(boxes.len() / 4);
    let mut best: Option<FaceBox> = None;

    for i in 0..candidates {
        let score = scores[i * 2 + 1];
        if score < min_score || best.is_some_and(|b| score <= b.score) {
            continue;
        }
        best = Some(FaceBox {
            x1: boxes[i * 4],
            y1: boxes[i * 4 + 1],
            x2: boxes[i * 4 + 2],
            y2: boxes[i * 4 + 3],
            score,
        });
    }
    best
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Turn classifier logits into reported expression scores
pub fn expressions_from_logits(logits: &[f32]) -> Result<Expressions> {
    if logits.len() < FERPLUS_LABELS.len() {
        return Err(MoodError::DetectionError(format!(
            "Expected {} logits, got {}",
            FERPLUS_LABELS.len(),
            logits.len()
        )));
    }

    let probs = softmax(&logits[..FERPLUS_LABELS.len()]);
    Ok(REPORTED
        .iter()
        .map(|(label, index)| (*label, probs[*index]))
        .collect())
}
