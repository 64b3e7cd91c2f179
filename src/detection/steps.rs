use crate::pipeline::{PipelineData, PipelineStep, PipelineContext, MetadataValue};
use crate::detection::faces::FaceDetector;
use crate::detection::ocr::TextRecognizer;
use crate::detection::preprocessing;
use anyhow::Result;
use std::sync::Arc;

/// Convert image to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, data: Vec<PipelineData>, _context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();
        for item in data {
            let gray = preprocessing::to_grayscale(&item.image);
            let new_item = PipelineData {
                image: image::DynamicImage::ImageLuma8(gray),
                original: item.original.clone(),
                bbox: item.bbox,
                metadata: item.metadata.clone(),
            };
            result.push(new_item);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Find faces in the grayscale image - splits one page into one item per face.
///
/// Each output item holds the face cropped from the color original, in the
/// order the detector reported them.
pub struct FaceDetectionStep {
    detector: Arc<dyn FaceDetector>,
}

impl FaceDetectionStep {
    pub const INDEX_KEY: &'static str = "face_index";

    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self { detector }
    }
}

impl PipelineStep for FaceDetectionStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let gray = item.image.to_luma8();
            let (width, height) = gray.dimensions();
            let faces = self.detector.detect(gray.as_raw(), width, height);

            tracing::debug!(
                source = context.source.as_deref().unwrap_or("-"),
                faces = faces.len(),
                "face detection finished"
            );

            let (img_width, img_height) = (item.original.width(), item.original.height());
            for (index, face) in faces.iter().enumerate() {
                // Detector windows can hang over the page edge
                let Some(bbox) = face.clamp_to(img_width, img_height) else {
                    continue;
                };

                let cropped = item.original.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);
                result.push(
                    PipelineData::from_region(cropped, item.original.clone(), bbox)
                        .with_metadata(Self::INDEX_KEY, MetadataValue::Int(index as i32)),
                );
            }
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "Face Detection"
    }
}

/// Run OCR over each item, recording the raw text under [`OcrStep::TEXT_KEY`]
pub struct OcrStep {
    recognizer: Arc<dyn TextRecognizer>,
}

impl OcrStep {
    pub const TEXT_KEY: &'static str = "ocr_text";

    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }
}

impl PipelineStep for OcrStep {
    fn process(&self, data: Vec<PipelineData>, context: &PipelineContext) -> Result<Vec<PipelineData>> {
        let mut result = Vec::new();

        for item in data {
            let text = self.recognizer.recognize(&item.image)?;
            tracing::debug!(
                source = context.source.as_deref().unwrap_or("-"),
                chars = text.chars().count(),
                "ocr finished"
            );
            result.push(item.with_metadata(Self::TEXT_KEY, MetadataValue::String(text)));
        }

        Ok(result)
    }

    fn name(&self) -> &str {
        "OCR Recognition"
    }
}
