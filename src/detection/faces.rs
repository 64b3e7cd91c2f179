use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, RgbImage};

use crate::config::FACE_SCALE_FACTOR;
use crate::detection::preprocessing;
use crate::detection::steps::{FaceDetectionStep, GrayscaleStep};
use crate::error::ResourceError;
use crate::pipeline::{BoundingBox, Pipeline, PipelineContext};

/// A detected face as reported by the detector.
///
/// Coordinates are not clamped; a window may start left of or above the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl FaceRect {
    /// Part of this rectangle that lies inside a `width` x `height` image,
    /// or `None` if nothing does.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let x0 = i64::from(self.x).max(0);
        let y0 = i64::from(self.y).max(0);
        let x1 = (i64::from(self.x) + i64::from(self.width)).min(i64::from(width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).min(i64::from(height));

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(BoundingBox {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Pluggable face detection backend.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRect>;
}

/// Frontal-face cascade backed by the `rustface` crate (SeetaFace engine).
///
/// The model is read once from disk and shared by every detection.
pub struct CascadeFaceDetector {
    model: rustface::Model,
    scale_factor: f32,
}

impl CascadeFaceDetector {
    pub fn load(model_path: &Path) -> Result<Self, ResourceError> {
        if !model_path.is_file() {
            return Err(ResourceError::ClassifierMissing(model_path.to_path_buf()));
        }
        let file = File::open(model_path).map_err(|source| ResourceError::ClassifierLoad {
            path: model_path.to_path_buf(),
            source,
        })?;
        let model = rustface::read_model(BufReader::new(file)).map_err(|source| {
            ResourceError::ClassifierLoad {
                path: model_path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self {
            model,
            scale_factor: FACE_SCALE_FACTOR,
        })
    }
}

/// Convert a window growth factor (> 1) into the image pyramid's shrink
/// factor (< 1) that covers the same scales.
pub fn pyramid_scale(scale_factor: f32) -> f32 {
    (1.0 / scale_factor).clamp(0.01, 0.99)
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceRect> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(pyramid_scale(self.scale_factor));
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceRect {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                }
            })
            .collect()
    }
}

/// Faces found on one page.
#[derive(Debug, Clone)]
pub struct FaceScan {
    /// Color crops, in detector order
    pub faces: Vec<DynamicImage>,
    /// Where each crop came from
    pub regions: Vec<BoundingBox>,
    /// Grayscale page with each face outlined in red, when annotation is on
    pub annotated: Option<RgbImage>,
}

impl FaceScan {
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

pub struct FaceFinder {
    pipeline: Pipeline,
    annotate: bool,
}

impl FaceFinder {
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            pipeline: Pipeline::new()
                .add_step_boxed(Box::new(GrayscaleStep))
                .add_step_boxed(Box::new(FaceDetectionStep::new(detector))),
            annotate: false,
        }
    }

    pub fn with_annotation(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Detect faces in the image at `path`.
    ///
    /// A page without faces gives an empty scan; only an unreadable image is an error.
    pub fn find_faces(&self, path: &Path) -> anyhow::Result<FaceScan> {
        let img = image::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to decode image {:?}: {}", path, e))?;
        let gray = self.annotate.then(|| preprocessing::to_grayscale(&img));

        let context = PipelineContext {
            source: Some(path.display().to_string()),
        };
        let results = self.pipeline.run(img, &context)?;

        let mut faces = Vec::with_capacity(results.len());
        let mut regions = Vec::with_capacity(results.len());
        for item in results {
            if let Some(bbox) = item.bbox {
                regions.push(bbox);
                faces.push(item.image);
            }
        }

        let annotated = gray.map(|gray| preprocessing::outline_regions(&gray, &regions));

        Ok(FaceScan { faces, regions, annotated })
    }
}
