use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::pipeline::BoundingBox;

/// Convert image to grayscale.
///
/// Uses the `image` crate's luma conversion (ITU-R BT.709 weights,
/// `0.2126 R + 0.7152 G + 0.0722 B`); any alpha channel is dropped.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Grayscale copy of `gray` with a red outline around each box.
pub fn outline_regions(gray: &GrayImage, boxes: &[BoundingBox]) -> RgbImage {
    let mut annotated = DynamicImage::ImageLuma8(gray.clone()).to_rgb8();
    for bbox in boxes {
        if bbox.width == 0 || bbox.height == 0 {
            continue;
        }
        let rect = Rect::at(bbox.x as i32, bbox.y as i32).of_size(bbox.width, bbox.height);
        draw_hollow_rect_mut(&mut annotated, rect, Rgb([255u8, 0, 0]));
    }
    annotated
}
