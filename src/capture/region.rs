//! Pure region cropping logic: functional core.
//!
//! This module has zero infrastructure dependencies.
//! It takes an encoded frame and a CSS-pixel rectangle in, returns an
//! encoded crop out.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use super::types::{DevicePixelContext, EncodedBitmap, PixelRegion, SelectionRect};

/// How the source region is resampled onto the display-unit surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleFilter {
    /// Direct scaled blit.
    #[default]
    Nearest,
    Bilinear,
}

impl ResampleFilter {
    fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
        }
    }
}

/// Maps a CSS-pixel rect into bitmap pixels and clips it to the frame.
///
/// Edges are widened outward (floor / ceil) so fractional selections never
/// lose a partially covered pixel.
pub fn source_region(
    rect: &SelectionRect,
    dpr: &DevicePixelContext,
    img_width: u32,
    img_height: u32,
) -> Result<PixelRegion, CropError> {
    let ratio = dpr.ratio();

    let left = clamp_edge((rect.x * ratio).floor(), img_width);
    let top = clamp_edge((rect.y * ratio).floor(), img_height);
    let right = clamp_edge(((rect.x + rect.width) * ratio).ceil(), img_width);
    let bottom = clamp_edge(((rect.y + rect.height) * ratio).ceil(), img_height);

    if right <= left || bottom <= top {
        return Err(CropError::EmptyRegion);
    }

    Ok(PixelRegion {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}

fn clamp_edge(value: f64, limit: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= limit as f64 {
        limit
    } else {
        value as u32
    }
}

/// True when the scaled rect reaches past any edge of the frame.
fn is_clipped(rect: &SelectionRect, dpr: &DevicePixelContext, img_width: u32, img_height: u32) -> bool {
    let ratio = dpr.ratio();
    (rect.x * ratio).floor() < 0.0
        || (rect.y * ratio).floor() < 0.0
        || ((rect.x + rect.width) * ratio).ceil() > img_width as f64
        || ((rect.y + rect.height) * ratio).ceil() > img_height as f64
}

/// Output size in display units.
///
/// An unclipped rect keeps its own size; widening the source edges to whole
/// bitmap pixels must not grow the output. A clipped rect shrinks to what is
/// left of the source.
fn output_size(
    rect: &SelectionRect,
    region: &PixelRegion,
    dpr: &DevicePixelContext,
    clipped: bool,
) -> (u32, u32) {
    let (width, height) = if clipped {
        let ratio = dpr.ratio();
        (region.width as f64 / ratio, region.height as f64 / ratio)
    } else {
        (rect.width, rect.height)
    };
    (width.round().max(1.0) as u32, height.round().max(1.0) as u32)
}

/// Crops an already decoded frame to a CSS-pixel rect.
///
/// The result is expressed in display units: a `50x50` rect at `dpr = 2`
/// samples `100x100` bitmap pixels and yields a `50x50` image.
pub fn crop_decoded(
    image: &DynamicImage,
    rect: &SelectionRect,
    dpr: &DevicePixelContext,
    filter: ResampleFilter,
) -> Result<DynamicImage, CropError> {
    let region = source_region(rect, dpr, image.width(), image.height())?;
    let clipped = is_clipped(rect, dpr, image.width(), image.height());
    let (out_width, out_height) = output_size(rect, &region, dpr, clipped);

    let cropped = image.crop_imm(region.x, region.y, region.width, region.height);
    if (out_width, out_height) == (region.width, region.height) {
        return Ok(cropped);
    }

    Ok(cropped.resize_exact(out_width, out_height, filter.filter_type()))
}

/// Decodes `frame`, crops it to `rect` and returns PNG bytes.
///
/// This is a pure function with no side effects.
///
/// # Arguments
/// * `frame` - The full visible-area capture
/// * `rect` - Selection in CSS pixels
/// * `dpr` - Device pixel ratio read at crop time
/// * `filter` - Resampling used when bitmap and display units differ
///
/// # Returns
/// PNG-encoded bytes of the cropped region
pub fn crop_to_png_bytes(
    frame: &EncodedBitmap,
    rect: &SelectionRect,
    dpr: &DevicePixelContext,
    filter: ResampleFilter,
) -> Result<EncodedBitmap, CropError> {
    let image = decode_png(frame)?;
    let cropped = crop_decoded(&image, rect, dpr, filter)?;
    encode_png(&cropped)
}

pub fn decode_png(frame: &EncodedBitmap) -> Result<DynamicImage, CropError> {
    image::load_from_memory_with_format(frame.as_bytes(), ImageFormat::Png)
        .map_err(|e| CropError::DecodeFailed(e.to_string()))
}

pub fn encode_png(image: &DynamicImage) -> Result<EncodedBitmap, CropError> {
    let mut png_bytes: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| CropError::EncodingFailed(e.to_string()))?;
    Ok(EncodedBitmap::from_png(png_bytes))
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("Input image could not be decoded: {0}")]
    DecodeFailed(String),

    #[error("Crop rectangle has no overlap with the captured frame")]
    EmptyRegion,

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}
