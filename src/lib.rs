pub mod archive;
pub mod config;
pub mod detection;
pub mod error;
pub mod pipeline;
pub mod search;
pub mod sheet;

pub use archive::extract_archive;
pub use config::SearchConfig;
pub use detection::{FaceDetector, FaceFinder, TextReader, TextRecognizer};
pub use error::{ResourceError, SheetError};
pub use pipeline::{
    Pipeline, PipelineData, PipelineStep, PipelineContext, BoundingBox, MetadataValue,
};
pub use search::{SearchSummary, Searcher, SheetPresenter, SummaryPresenter, TextIndex};
pub use sheet::{ContactSheet, build_contact_sheet};

#[cfg(feature = "gui")]
pub mod gui;
