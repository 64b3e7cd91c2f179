use std::collections::HashMap;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use facesheet::detection::{FaceDetector, FaceFinder, FaceRect, TextReader, TextRecognizer};
use facesheet::search::{self, SearchSummary, Searcher, SheetPresenter};
use facesheet::sheet::ContactSheet;
use image::{DynamicImage, ImageBuffer, Rgb};
use tar::{Builder, Header};
use zstd::stream::write::Encoder as ZstdEncoder;

/// A page in a test archive. Fakes below recognise pages by their width, so
/// every page in one archive needs a distinct width.
pub struct Page {
    pub name: &'static str,
    pub width: u32,
    pub text: &'static str,
    pub faces: Vec<FaceRect>,
}

impl Page {
    pub fn new(name: &'static str, width: u32, text: &'static str) -> Self {
        Self { name, width, text, faces: Vec::new() }
    }

    pub fn with_faces(mut self, faces: Vec<FaceRect>) -> Self {
        self.faces = faces;
        self
    }
}

pub const PAGE_HEIGHT: u32 = 80;

pub fn face(x: i32, y: i32, width: u32, height: u32) -> FaceRect {
    FaceRect { x, y, width, height }
}

/// PNG bytes for a colored page of the given width.
pub fn page_png(width: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, PAGE_HEIGHT, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128u8])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("Failed to encode test page");
    bytes
}

/// Writes `pages` into a tar.zst archive inside `dir` and returns its path.
pub fn create_archive(dir: &Path, pages: &[Page]) -> PathBuf {
    let path = dir.join("images.tar.zst");
    let out = File::create(&path).expect("Failed to create test archive");
    let encoder = ZstdEncoder::new(out, 3).expect("Failed to create zstd encoder");
    let mut tar = Builder::new(encoder);

    for page in pages {
        let data = page_png(page.width);
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        tar.append_data(&mut header, page.name, data.as_slice())
            .expect("Failed to add page to archive");
    }

    tar.into_inner()
        .expect("Failed to finalize tar")
        .finish()
        .expect("Failed to finalize zstd stream");
    path
}

/// Recognizer that returns each page's scripted text.
pub struct ScriptedText(HashMap<u32, &'static str>);

impl ScriptedText {
    pub fn for_pages(pages: &[Page]) -> Self {
        Self(pages.iter().map(|p| (p.width, p.text)).collect())
    }
}

impl TextRecognizer for ScriptedText {
    fn recognize(&self, img: &DynamicImage) -> anyhow::Result<String> {
        Ok(self.0.get(&img.width()).copied().unwrap_or_default().to_string())
    }
}

/// Detector that returns each page's scripted faces.
pub struct ScriptedFaces(HashMap<u32, Vec<FaceRect>>);

impl ScriptedFaces {
    pub fn for_pages(pages: &[Page]) -> Self {
        Self(pages.iter().map(|p| (p.width, p.faces.clone())).collect())
    }
}

impl FaceDetector for ScriptedFaces {
    fn detect(&self, _gray: &[u8], width: u32, _height: u32) -> Vec<FaceRect> {
        self.0.get(&width).cloned().unwrap_or_default()
    }
}

/// Keeps every presented sheet for inspection.
#[derive(Default)]
pub struct RecordingPresenter {
    pub shown: Vec<(String, String, ContactSheet)>,
    pub finished: bool,
    /// Sheets for this file are refused with an error instead of recorded
    pub refuse: Option<&'static str>,
}

impl RecordingPresenter {
    pub fn refusing(file: &'static str) -> Self {
        Self { refuse: Some(file), ..Self::default() }
    }
}

impl SheetPresenter for RecordingPresenter {
    fn present(&mut self, term: &str, file: &str, sheet: ContactSheet) -> anyhow::Result<()> {
        if self.refuse == Some(file) {
            anyhow::bail!("viewer closed before {} could be shown", file);
        }
        self.shown.push((term.to_string(), file.to_string(), sheet));
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.finished = true;
        Ok(())
    }
}

pub struct FlowResult {
    pub output: String,
    pub presenter: RecordingPresenter,
    pub summary: SearchSummary,
}

/// Extract, prompt with `typed`, index and search, the way the binary does.
pub fn run_flow(dir: &Path, pages: &[Page], typed: &str) -> anyhow::Result<FlowResult> {
    run_flow_with(dir, pages, typed, None, RecordingPresenter::default())
}

/// Like [`run_flow`], optionally saving annotated pages under `annotate_dir`
/// and presenting through `presenter`.
pub fn run_flow_with(
    dir: &Path,
    pages: &[Page],
    typed: &str,
    annotate_dir: Option<PathBuf>,
    mut presenter: RecordingPresenter,
) -> anyhow::Result<FlowResult> {
    let archive = create_archive(dir, pages);
    let work_dir = dir.join("imagesdir");
    facesheet::extract_archive(&archive, &work_dir)?;

    let mut output = Vec::new();
    let term = search::prompt_search_term(Cursor::new(typed.to_string()), &mut output, "michigan")?;

    let reader = TextReader::new(Arc::new(ScriptedText::for_pages(pages)));
    let index = search::build_index(&work_dir, &reader)?;

    let finder = FaceFinder::new(Arc::new(ScriptedFaces::for_pages(pages)))
        .with_annotation(annotate_dir.is_some());
    let mut searcher = Searcher::new(&work_dir, &finder, &mut output)
        .with_annotate_dir(annotate_dir);
    let summary = searcher.search(&term, &index, &mut presenter)?;
    presenter.finish()?;

    Ok(FlowResult {
        output: String::from_utf8(output)?,
        presenter,
        summary,
    })
}
