use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::archive::list_files;
use crate::detection::{FaceFinder, TextReader};
use crate::sheet::{ContactSheet, build_contact_sheet};

/// Lowercased page text keyed by the page's path inside the working directory.
#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    entries: BTreeMap<String, String>,
}

impl TextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the text of one page. The text is stored lowercased.
    pub fn insert(&mut self, file: impl Into<String>, text: &str) {
        self.entries.insert(file.into(), text.to_lowercase());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn text(&self, file: &str) -> Option<&str> {
        self.entries.get(file).map(String::as_str)
    }

    /// Files whose text contains `term`, ignoring case, in filename order.
    pub fn matches(&self, term: &str) -> Vec<&str> {
        let term = term.to_lowercase();
        self.entries
            .iter()
            .filter(|(_, text)| text.contains(&term))
            .map(|(file, _)| file.as_str())
            .collect()
    }
}

/// Apply the empty-input default and lowercase the term.
///
/// A line holding only whitespace counts as empty; otherwise only the line
/// ending is removed.
pub fn normalize_term(raw: &str, default: &str) -> String {
    if raw.trim().is_empty() {
        default.to_lowercase()
    } else {
        raw.trim_end_matches(['\r', '\n']).to_lowercase()
    }
}

/// Ask for a search term on `output` and read one line from `input`.
pub fn prompt_search_term(
    mut input: impl BufRead,
    mut output: impl Write,
    default: &str,
) -> io::Result<String> {
    write!(output, "Enter a search term: ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(normalize_term(&line, default))
}

/// OCR every file under `dir`, one after another.
pub fn build_index(dir: &Path, reader: &TextReader) -> anyhow::Result<TextIndex> {
    let mut index = TextIndex::new();
    for path in list_files(dir)? {
        let name = relative_name(dir, &path);
        let text = reader.read_text(&path);
        tracing::debug!(file = %name, chars = text.chars().count(), "indexed");
        index.insert(name, &text);
    }
    tracing::info!(files = index.len(), "text index built");
    Ok(index)
}

fn relative_name(dir: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(dir).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Receives each finished contact sheet.
pub trait SheetPresenter {
    fn present(&mut self, term: &str, file: &str, sheet: ContactSheet) -> anyhow::Result<()>;

    /// Called once after the last sheet of a run.
    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Describes each sheet on a line of text instead of showing it.
pub struct SummaryPresenter<W: Write> {
    out: W,
}

impl<W: Write> SummaryPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> SheetPresenter for SummaryPresenter<W> {
    fn present(&mut self, _term: &str, file: &str, sheet: ContactSheet) -> anyhow::Result<()> {
        writeln!(
            self.out,
            "[contact sheet for {}: {} face(s), {}x{} px, {} row(s) of {}]",
            file,
            sheet.face_count,
            sheet.image.width(),
            sheet.image.height(),
            sheet.rows,
            sheet.columns
        )?;
        Ok(())
    }
}

/// What happened during one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSummary {
    pub matched: Vec<String>,
    pub sheets_shown: usize,
    pub without_faces: Vec<String>,
    /// Matches whose face detection or display failed
    pub failed: Vec<String>,
    /// Matches whose annotated copy could not be saved
    pub annotation_failed: Vec<String>,
}

/// Runs face detection over matching pages and reports the results.
pub struct Searcher<'a, W: Write> {
    root: PathBuf,
    faces: &'a FaceFinder,
    out: W,
    annotate_dir: Option<PathBuf>,
}

impl<'a, W: Write> Searcher<'a, W> {
    /// `root` is the directory the index's filenames are relative to.
    pub fn new(root: impl Into<PathBuf>, faces: &'a FaceFinder, out: W) -> Self {
        Self {
            root: root.into(),
            faces,
            out,
            annotate_dir: None,
        }
    }

    /// Save each matched page's annotated copy under `dir`.
    pub fn with_annotate_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.annotate_dir = dir;
        self
    }

    pub fn search(
        &mut self,
        term: &str,
        index: &TextIndex,
        presenter: &mut dyn SheetPresenter,
    ) -> anyhow::Result<SearchSummary> {
        let term = term.to_lowercase();
        let mut summary = SearchSummary::default();

        let matches = index.matches(&term);
        if matches.is_empty() {
            writeln!(self.out, "Sorry, the search term ** {} ** was not found.", term)?;
            return Ok(summary);
        }

        for file in matches {
            summary.matched.push(file.to_string());

            let scan = match self.faces.find_faces(&self.root.join(file)) {
                Ok(scan) => scan,
                Err(e) => {
                    tracing::warn!(file, error = %e, "face detection failed");
                    summary.failed.push(file.to_string());
                    continue;
                }
            };

            if let (Some(dir), Some(annotated)) = (&self.annotate_dir, &scan.annotated) {
                if let Err(e) = save_annotation(dir, file, annotated) {
                    tracing::warn!(file, error = %format!("{e:#}"), "could not save annotated copy");
                    summary.annotation_failed.push(file.to_string());
                }
            }

            if scan.is_empty() {
                writeln!(self.out, "No faces found in file {}.", file)?;
                summary.without_faces.push(file.to_string());
                continue;
            }

            writeln!(self.out, "\nSearch term: {}.\nFaces found in file {}:", term, file)?;
            let sheet = build_contact_sheet(&scan.faces)?;
            match presenter.present(&term, file, sheet) {
                Ok(()) => summary.sheets_shown += 1,
                Err(e) => {
                    tracing::warn!(file, error = %e, "could not display contact sheet");
                    summary.failed.push(file.to_string());
                }
            }
        }

        self.out.flush()?;
        Ok(summary)
    }
}

/// Where the annotated copy of `file` goes: the page's relative path mirrored
/// under `dir`, with `.annotated.png` appended.
pub fn annotation_path(dir: &Path, file: &str) -> PathBuf {
    let mut path = dir.to_path_buf();
    path.extend(file.split('/').filter(|part| !part.is_empty()));
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.set_file_name(format!("{}.annotated.png", name));
    path
}

fn save_annotation(dir: &Path, file: &str, annotated: &image::RgbImage) -> anyhow::Result<()> {
    let path = annotation_path(dir, file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create annotation directory {:?}", parent))?;
    }
    annotated
        .save(&path)
        .with_context(|| format!("Failed to save annotated copy {:?}", path))?;
    tracing::debug!(path = %path.display(), "saved annotated copy");
    Ok(())
}
