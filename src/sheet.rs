use image::{DynamicImage, GrayImage, imageops};

use crate::config::{SHEET_COLUMNS, SHEET_DOWNSCALE};
use crate::detection::preprocessing;
use crate::error::SheetError;

/// A grid of face thumbnails for one page, ready for display.
#[derive(Debug, Clone)]
pub struct ContactSheet {
    /// Downscaled composition
    pub image: GrayImage,
    pub columns: u32,
    pub rows: u32,
    /// Cell size before downscaling
    pub cell_width: u32,
    pub cell_height: u32,
    pub face_count: usize,
}

/// Number of rows needed to hold `count` images in `columns` columns.
pub fn row_count(count: usize, columns: u32) -> u32 {
    (count as u32).div_ceil(columns)
}

/// Lay `faces` out in the standard five-column grid.
pub fn build_contact_sheet(faces: &[DynamicImage]) -> Result<ContactSheet, SheetError> {
    build_contact_sheet_with(faces, SHEET_COLUMNS, SHEET_DOWNSCALE)
}

/// Lay `faces` out left to right, top to bottom in `columns` columns, then
/// shrink the result by `downscale` on both axes.
///
/// Every cell is as wide as the widest face and as tall as the tallest one.
/// Faces sit at the top-left corner of their cell and are converted to
/// grayscale with [`preprocessing::to_grayscale`].
pub fn build_contact_sheet_with(
    faces: &[DynamicImage],
    columns: u32,
    downscale: u32,
) -> Result<ContactSheet, SheetError> {
    if faces.is_empty() {
        return Err(SheetError::EmptyImageSet);
    }
    if columns == 0 {
        return Err(SheetError::ZeroColumns);
    }

    let cell_width = faces.iter().map(|f| f.width()).max().unwrap_or(0);
    let cell_height = faces.iter().map(|f| f.height()).max().unwrap_or(0);
    let rows = row_count(faces.len(), columns);

    let mut canvas = GrayImage::new(cell_width * columns, cell_height * rows);
    for (i, face) in faces.iter().enumerate() {
        let i = i as u32;
        let x = (i % columns) * cell_width;
        let y = (i / columns) * cell_height;
        let gray = preprocessing::to_grayscale(face);
        imageops::replace(&mut canvas, &gray, i64::from(x), i64::from(y));
    }

    let downscale = downscale.max(1);
    let width = (canvas.width() / downscale).max(1);
    let height = (canvas.height() / downscale).max(1);
    let image = imageops::resize(&canvas, width, height, imageops::FilterType::CatmullRom);

    Ok(ContactSheet {
        image,
        columns,
        rows,
        cell_width,
        cell_height,
        face_count: faces.len(),
    })
}
