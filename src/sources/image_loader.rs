//! Loader for standard image formats (PNG, JPEG, BMP, TIFF, WebP).
//!
//! Color bands become channels of a single-plane volume.

use image::{ColorType, DynamicImage};
use ndarray::{Array3, Axis as NdAxis};

use crate::pixels::{PixelSource, Sample};
use crate::sources::ArraySource;
use crate::sources::loader::{LoaderError, SourceLoader};

/// Loader for standard image formats.
///
/// Grayscale images load as one channel, color images as three (alpha is
/// dropped). 16-bit and float images keep their sample depth.
pub struct ImageLoader;

impl ImageLoader {
    fn to_source(img: DynamicImage) -> Result<Box<dyn PixelSource>, LoaderError> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        match img.color() {
            ColorType::L8 | ColorType::La8 => {
                interleaved(img.to_luma8().into_raw(), width, height, 1)
            }
            ColorType::L16 | ColorType::La16 => {
                interleaved(img.to_luma16().into_raw(), width, height, 1)
            }
            ColorType::Rgb16 | ColorType::Rgba16 => {
                interleaved(img.to_rgb16().into_raw(), width, height, 3)
            }
            ColorType::Rgb32F | ColorType::Rgba32F => {
                interleaved(img.to_rgb32f().into_raw(), width, height, 3)
            }
            _ => interleaved(img.to_rgb8().into_raw(), width, height, 3),
        }
    }
}

/// Build a `(1, 1, C, H, W)` source from interleaved `H x W x C` samples.
fn interleaved<T: Sample>(
    raw: Vec<T>,
    width: usize,
    height: usize,
    channels: usize,
) -> Result<Box<dyn PixelSource>, LoaderError> {
    let hwc = Array3::from_shape_vec((height, width, channels), raw)
        .map_err(|e| LoaderError::new(format!("Unexpected pixel buffer size: {}", e)))?;
    let data = hwc
        .permuted_axes([2, 0, 1])
        .as_standard_layout()
        .into_owned()
        .insert_axis(NdAxis(0))
        .insert_axis(NdAxis(0));

    log::trace!(
        "ImageLoader: loaded {}x{} image as {} {:?} channel(s)",
        width,
        height,
        channels,
        T::PIXEL_TYPE
    );

    Ok(Box::new(ArraySource::new(data).with_little_endian(true)))
}

impl SourceLoader for ImageLoader {
    fn id(&self) -> &'static str {
        "image"
    }

    fn display_name(&self) -> &'static str {
        "Standard Image"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        if data.len() < 8 {
            return false;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
            // JPEG: FF D8 FF
            || data.starts_with(&[0xFF, 0xD8, 0xFF])
            // BMP: BM
            || data.starts_with(b"BM")
            // TIFF, little or big endian
            || data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
            // WebP: RIFF....WEBP
            || (data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP")
    }

    fn load(&self, data: &[u8]) -> Result<Box<dyn PixelSource>, LoaderError> {
        let img = image::load_from_memory(data)
            .map_err(|e| LoaderError::new(format!("Failed to decode image: {}", e)))?;
        Self::to_source(img)
    }
}
