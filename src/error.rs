use std::path::PathBuf;

use thiserror::Error;

/// Startup resources that must be present before a search can run.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(
        "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
         Expected locations:\n  - {detection}\n  - {recognition}"
    )]
    OcrModelsMissing { detection: String, recognition: String },

    #[error("failed to load OCR model {path:?}: {reason}")]
    OcrModelLoad { path: PathBuf, reason: String },

    #[error("face classifier not found: {0:?}")]
    ClassifierMissing(PathBuf),

    #[error("failed to read face classifier {path:?}: {source}")]
    ClassifierLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SheetError {
    #[error("cannot build a contact sheet from an empty image set")]
    EmptyImageSet,

    #[error("contact sheet needs at least one column")]
    ZeroColumns,
}
