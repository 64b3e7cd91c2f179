use std::path::PathBuf;

/// Term searched for when the operator enters an empty line.
pub const DEFAULT_SEARCH_TERM: &str = "michigan";

/// Step between successive detection window sizes. Larger than the usual
/// default, trading recall for speed.
pub const FACE_SCALE_FACTOR: f32 = 1.18;

/// Contact sheets are always laid out in this many columns.
pub const SHEET_COLUMNS: u32 = 5;

/// Composed sheets are shrunk by this factor on each axis before display.
pub const SHEET_DOWNSCALE: u32 = 2;

pub const DEFAULT_ARCHIVE: &str = "readonly/images.zip";
pub const DEFAULT_WORK_DIR: &str = "imagesdir";
pub const DEFAULT_CLASSIFIER: &str = "readonly/seeta_fd_frontal_v1.0.bin";

/// Everything a run needs to know, resolved from the command line.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub archive: PathBuf,
    pub work_dir: PathBuf,
    pub classifier: PathBuf,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`.
    /// `None` means the ocrs cache directory under `$HOME`.
    pub ocr_models: Option<PathBuf>,
    /// Search term given up front; skips the interactive prompt.
    pub term: Option<String>,
    pub default_term: String,
    /// Where annotated copies of matched pages are written, if anywhere.
    pub annotate_dir: Option<PathBuf>,
    pub headless: bool,
}
