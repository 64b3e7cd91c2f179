use std::{
    fs::{self, File},
    io::{BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use anyhow::Context;
use tar::Archive;
use zip::ZipArchive;
use zstd::stream::read::Decoder as ZstdDecoder;

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    Zip,
    TarZstd,
    Tar,
}

impl ArchiveFormat {
    fn detect(magic: Option<[u8; 4]>) -> Self {
        match magic {
            Some(ZIP_MAGIC) | Some(ZIP_EMPTY_MAGIC) => ArchiveFormat::Zip,
            Some(ZSTD_MAGIC) => ArchiveFormat::TarZstd,
            // Anything else, including files shorter than a header, goes to tar
            _ => ArchiveFormat::Tar,
        }
    }
}

/// Unpack `archive` (zip, tar or tar.zst) into `target_dir`.
///
/// The target directory is emptied first, so every run starts from exactly
/// the archive's contents.
pub fn extract_archive(archive: &Path, target_dir: &Path) -> anyhow::Result<()> {
    let mut f = File::open(archive)
        .with_context(|| format!("Failed to open archive {:?}", archive))?;

    let mut magic = [0u8; 4];
    let format = match f.read_exact(&mut magic) {
        Ok(()) => ArchiveFormat::detect(Some(magic)),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => ArchiveFormat::detect(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read archive {:?}", archive));
        }
    };
    f.seek(SeekFrom::Start(0))?;

    if target_dir.exists() {
        fs::remove_dir_all(target_dir)
            .with_context(|| format!("Failed to clear working directory {:?}", target_dir))?;
    }
    fs::create_dir_all(target_dir)
        .with_context(|| format!("Failed to create working directory {:?}", target_dir))?;

    match format {
        ArchiveFormat::Zip => {
            let mut zip = ZipArchive::new(BufReader::new(f))
                .with_context(|| format!("Invalid zip archive {:?}", archive))?;
            zip.extract(target_dir)
                .with_context(|| format!(
                    "Failed to extract archive {:?} into {:?}",
                    archive,
                    target_dir
                ))?;
        }
        ArchiveFormat::TarZstd => {
            let decoder = ZstdDecoder::new(f)
                .with_context(|| format!("Invalid zstd stream in {:?}", archive))?;
            unpack(Archive::new(decoder), archive, target_dir)?;
        }
        ArchiveFormat::Tar => {
            unpack(Archive::new(BufReader::new(f)), archive, target_dir)?;
        }
    }

    let extracted = list_files(target_dir)?.len();
    tracing::info!(archive = %archive.display(), files = extracted, "extracted archive");
    Ok(())
}

fn unpack<R: Read>(mut tar: Archive<R>, archive: &Path, target_dir: &Path) -> anyhow::Result<()> {
    tar.set_overwrite(true);
    tar.unpack(target_dir)
        .with_context(|| format!(
            "Failed to extract archive {:?} into {:?}",
            archive,
            target_dir
        ))
}

/// All regular files under `dir`, recursively, sorted by path.
pub fn list_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current)
            .with_context(|| format!("Failed to read directory {:?}", current))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
