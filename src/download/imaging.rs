//! Image processing capability: rescale, center crop, save
//!
//! All operations are synchronous and CPU bound; callers run them on the
//! blocking pool.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageResult};
use std::path::{Path, PathBuf};

/// Extension and format every processed image is written in
pub const OUTPUT_EXTENSION: &str = "png";

/// Target geometry applied to every downloaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transform {
    /// Smaller dimension after resizing (0 = keep original size)
    pub rescale_to: u32,

    /// Center crop box as (width, height); `None` disables cropping
    pub crop_to: Option<(u32, u32)>,
}

impl Transform {
    /// Builds a transform from raw settings, where 0 disables a step
    pub fn new(rescale_to: u32, crop_width: u32, crop_height: u32) -> Self {
        let crop_to = if crop_width == 0 || crop_height == 0 {
            None
        } else {
            Some((crop_width, crop_height))
        };
        Self {
            rescale_to,
            crop_to,
        }
    }

    /// Decodes an image and applies rescale then crop
    pub fn apply(&self, bytes: &[u8]) -> ImageResult<DynamicImage> {
        let mut img = image::load_from_memory(bytes)?;
        if self.rescale_to > 0 {
            img = rescale(&img, self.rescale_to);
        }
        if let Some((width, height)) = self.crop_to {
            img = center_crop(&img, width, height);
        }
        Ok(img)
    }
}

/// Computes the size whose smaller side equals `size`, keeping the aspect ratio
///
/// The longer side is rounded down and never drops below one pixel.
pub fn rescaled_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let (width, height, size) = (width as u64, height as u64, size as u64);
    if width >= height {
        let new_width = (size * width / height).max(1);
        (new_width as u32, size as u32)
    } else {
        let new_height = (size * height / width).max(1);
        (size as u32, new_height as u32)
    }
}

/// Resizes so the smaller dimension equals `size`
pub fn rescale(img: &DynamicImage, size: u32) -> DynamicImage {
    let (width, height) = rescaled_dimensions(img.width(), img.height(), size);
    if (width, height) == (img.width(), img.height()) {
        return img.clone();
    }
    img.resize_exact(width, height, FilterType::Lanczos3)
}

/// Computes the crop box `(left, top, width, height)` for a center crop
///
/// The box is clamped to the image on each axis; there is no padding or
/// upscaling. When the leftover is odd the extra pixel is taken from the
/// left (or top) side.
pub fn crop_box(width: u32, height: u32, crop_width: u32, crop_height: u32) -> (u32, u32, u32, u32) {
    let new_width = width.min(crop_width);
    let new_height = height.min(crop_height);
    let left = (width - new_width + 1) / 2;
    let top = (height - new_height + 1) / 2;
    (left, top, new_width, new_height)
}

/// Crops the centered `width x height` region
pub fn center_crop(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (left, top, new_width, new_height) = crop_box(img.width(), img.height(), width, height);
    img.crop_imm(left, top, new_width, new_height)
}

/// Writes the image as `<stem>.png` inside `directory`
pub fn save(img: &DynamicImage, directory: &Path, stem: &str) -> ImageResult<PathBuf> {
    let path = directory.join(format!("{}.{}", stem, OUTPUT_EXTENSION));
    img.save_with_format(&path, ImageFormat::Png)?;
    Ok(path)
}
