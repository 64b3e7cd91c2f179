use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::detection::steps::OcrStep;
use crate::error::ResourceError;
use crate::pipeline::{Pipeline, PipelineContext};

pub const DETECTION_MODEL_FILE: &str = "text-detection.rten";
pub const RECOGNITION_MODEL_FILE: &str = "text-recognition.rten";

/// Anything that can turn a page image into text.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, img: &DynamicImage) -> anyhow::Result<String>;
}

/// Standard cache location used by ocrs-cli
pub fn default_models_dir() -> anyhow::Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Initialize OCR engine with models from `models_dir`
pub fn init_ocr_engine(models_dir: &Path) -> anyhow::Result<OcrEngine> {
    let detection_model_path = models_dir.join(DETECTION_MODEL_FILE);
    let recognition_model_path = models_dir.join(RECOGNITION_MODEL_FILE);

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        return Err(ResourceError::OcrModelsMissing {
            detection: detection_model_path.display().to_string(),
            recognition: recognition_model_path.display().to_string(),
        }
        .into());
    }

    let load = |path: &Path| {
        Model::load_file(path).map_err(|e| ResourceError::OcrModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    };
    let detection_model = load(detection_model_path.as_path())?;
    let recognition_model = load(recognition_model_path.as_path())?;

    let engine = OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })?;

    Ok(engine)
}

/// Recognizer backed by the ocrs engine
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    pub fn load(models_dir: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            engine: init_ocr_engine(models_dir)?,
        })
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(&self, img: &DynamicImage) -> anyhow::Result<String> {
        let rgb = img.to_rgb8();
        let img_source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())?;
        let ocr_input = self.engine.prepare_input(img_source)?;
        self.engine.get_text(&ocr_input)
    }
}

/// Reads the text of one page at a time.
pub struct TextReader {
    pipeline: Pipeline,
}

impl TextReader {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            pipeline: Pipeline::new().add_step(Arc::new(OcrStep::new(recognizer))),
        }
    }

    /// Lowercased text of the image at `path`.
    ///
    /// A page that cannot be decoded or recognized reads as empty text.
    pub fn read_text(&self, path: &Path) -> String {
        match self.try_read_text(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "could not read text, treating page as empty");
                String::new()
            }
        }
    }

    fn try_read_text(&self, path: &Path) -> anyhow::Result<String> {
        let img = image::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;
        let context = PipelineContext {
            source: Some(path.display().to_string()),
        };
        let results = self.pipeline.run(img, &context)?;

        let text = results
            .iter()
            .filter_map(|item| item.get_string(OcrStep::TEXT_KEY))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    struct Fixed(&'static str);

    impl TextRecognizer for Fixed {
        fn recognize(&self, _img: &DynamicImage) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl TextRecognizer for Failing {
        fn recognize(&self, _img: &DynamicImage) -> anyhow::Result<String> {
            anyhow::bail!("engine exploded")
        }
    }

    fn page(dir: &Path) -> PathBuf {
        let path = dir.join("page.png");
        RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])).save(&path).unwrap();
        path
    }

    #[test]
    fn text_is_lowercased() {
        let dir = tempfile::TempDir::new().unwrap();
        let reader = TextReader::new(Arc::new(Fixed("Ann Arbor, MICHIGAN\nÉTÉ")));
        let text = reader.read_text(&page(dir.path()));
        assert_eq!(text, "ann arbor, michigan\nété");
        assert_eq!(text, text.to_lowercase());
    }

    #[test]
    fn empty_recognition_is_returned_as_is() {
        let dir = tempfile::TempDir::new().unwrap();
        let reader = TextReader::new(Arc::new(Fixed("")));
        assert_eq!(reader.read_text(&page(dir.path())), "");
    }

    #[test]
    fn recognizer_failure_reads_as_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let reader = TextReader::new(Arc::new(Failing));
        assert_eq!(reader.read_text(&page(dir.path())), "");
    }

    #[test]
    fn undecodable_file_reads_as_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"not an image").unwrap();
        let reader = TextReader::new(Arc::new(Fixed("michigan")));
        assert_eq!(reader.read_text(&path), "");
    }

    #[test]
    fn missing_models_name_both_paths() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = init_ocr_engine(dir.path()).err().unwrap();
        let msg = err.to_string();
        assert!(msg.contains(DETECTION_MODEL_FILE));
        assert!(msg.contains(RECOGNITION_MODEL_FILE));
    }
}
