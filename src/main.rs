use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use facesheet::config::{self, SearchConfig};
use facesheet::detection::{CascadeFaceDetector, FaceFinder, OcrsRecognizer, TextReader, ocr};
use facesheet::search::{self, Searcher, SheetPresenter, SummaryPresenter};
use facesheet::extract_archive;

#[derive(Parser)]
#[command(name = "facesheet")]
#[command(about = "Search scanned pages for a keyword and show the faces on matching pages")]
struct Cli {
    /// Image archive to search (zip, tar or tar.zst)
    #[arg(long, value_name = "FILE", default_value = config::DEFAULT_ARCHIVE)]
    archive: PathBuf,

    /// Directory the archive is extracted into (cleared on every run)
    #[arg(long, value_name = "DIR", default_value = config::DEFAULT_WORK_DIR)]
    work_dir: PathBuf,

    /// SeetaFace frontal face model
    #[arg(long, value_name = "FILE", default_value = config::DEFAULT_CLASSIFIER)]
    classifier: PathBuf,

    /// Directory with text-detection.rten and text-recognition.rten [default: ~/.cache/ocrs]
    #[arg(long, value_name = "DIR")]
    ocr_models: Option<PathBuf>,

    /// Search term; skips the interactive prompt
    #[arg(short, long)]
    term: Option<String>,

    /// Term used when the prompt is answered with an empty line
    #[arg(long, default_value = config::DEFAULT_SEARCH_TERM)]
    default_term: String,

    /// Save a copy of each matched page with its faces outlined in red
    #[arg(long, value_name = "DIR")]
    annotate_dir: Option<PathBuf>,

    /// Describe contact sheets on stdout instead of opening a viewer
    #[arg(long)]
    headless: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> SearchConfig {
        SearchConfig {
            archive: self.archive,
            work_dir: self.work_dir,
            classifier: self.classifier,
            ocr_models: self.ocr_models,
            term: self.term,
            default_term: self.default_term,
            annotate_dir: self.annotate_dir,
            headless: self.headless,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "warn,facesheet=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "gui")]
fn presenter(headless: bool) -> Box<dyn SheetPresenter> {
    if headless {
        Box::new(SummaryPresenter::new(io::stdout()))
    } else {
        Box::new(facesheet::gui::ViewerPresenter::new())
    }
}

#[cfg(not(feature = "gui"))]
fn presenter(_headless: bool) -> Box<dyn SheetPresenter> {
    Box::new(SummaryPresenter::new(io::stdout()))
}

fn run(config: &SearchConfig) -> anyhow::Result<()> {
    // Startup resources; any failure here ends the run
    let detector = CascadeFaceDetector::load(&config.classifier)?;
    tracing::info!(path = %config.classifier.display(), "face classifier loaded");

    let models_dir = match &config.ocr_models {
        Some(dir) => dir.clone(),
        None => ocr::default_models_dir()?,
    };
    let recognizer = OcrsRecognizer::load(&models_dir)?;
    tracing::info!(path = %models_dir.display(), "OCR engine initialized");

    extract_archive(&config.archive, &config.work_dir)?;

    let term = match &config.term {
        Some(term) => search::normalize_term(term, &config.default_term),
        None => search::prompt_search_term(io::stdin().lock(), io::stdout(), &config.default_term)?,
    };

    println!("Please wait...");
    let reader = TextReader::new(Arc::new(recognizer));
    let index = search::build_index(&config.work_dir, &reader)?;

    let finder = FaceFinder::new(Arc::new(detector))
        .with_annotation(config.annotate_dir.is_some());
    let mut presenter = presenter(config.headless);
    let mut searcher = Searcher::new(&config.work_dir, &finder, io::stdout())
        .with_annotate_dir(config.annotate_dir.clone());

    let summary = searcher.search(&term, &index, presenter.as_mut())?;
    tracing::info!(
        matched = summary.matched.len(),
        sheets = summary.sheets_shown,
        without_faces = summary.without_faces.len(),
        failed = summary.failed.len(),
        annotation_failed = summary.annotation_failed.len(),
        "search finished"
    );

    presenter.finish()
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);
    run(&args.into_config())
}
