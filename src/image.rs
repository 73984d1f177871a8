//! Bitmaps.
//!
//! Drawn bitmaps come in one of the platform's [`PixelFormat`]s. Before they can be
//! written to the PDF they are normalized to 8-bit RGBA, and transparency is
//! split off into a mask: a hard 1-bit mask for formats that only know "visible"
//! and "invisible", or a soft mask with an 8-bit alpha channel if the PDF version
//! supports it.
//!
//! Printing often draws the same bitmap many times (think of a logo in a page
//! header), so prepared images are kept in an [`ImageCache`] keyed by their
//! content.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use pdf_writer::Ref;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::configure::PdfVersion;
use crate::error::{OpError, OpResult};
use crate::geom::Rect;
use crate::util::SipHashable;

/// The magic value of a transparent pixel in 32-bit formats.
const TRANSPARENT_MAGIC_RGBA32: u32 = 0x77747474;
/// The magic value of a transparent pixel in 15-bit formats.
const TRANSPARENT_MAGIC_RGBA15: u16 = 0x39CE;
/// The palette index of a transparent pixel.
const TRANSPARENT_MAGIC_CMAP8: u8 = 0xFF;

/// The layout of the pixels of a bitmap.
///
/// Formats without the `Big` suffix store multi-byte pixels in little-endian order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// `B G R x`.
    Rgb32,
    /// `B G R A`.
    Rgba32,
    /// `x R G B`.
    Rgb32Big,
    /// `A R G B`.
    Rgba32Big,
    /// `B G R`.
    Rgb24,
    /// `R G B`.
    Rgb24Big,
    /// 5 bits red, 6 bits green, 5 bits blue.
    Rgb16,
    Rgb16Big,
    /// 1 unused bit, then 5 bits for each component.
    Rgb15,
    Rgb15Big,
    /// 1 bit alpha, then 5 bits for each component.
    Rgba15,
    Rgba15Big,
    /// An index into a [`ColorMap`].
    Cmap8,
    Gray8,
    /// One bit per pixel, least significant bit first.
    Gray1,
}

/// Static properties of a pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Bytes per pixel, `0` for bit-packed formats.
    pub bytes_per_pixel: u8,
    /// Whether pixels can be transparent.
    pub transparency: bool,
    /// Whether transparency is always expressed with a 1-bit mask.
    pub hard_mask: bool,
}

impl PixelFormat {
    /// The properties of the format.
    pub fn info(&self) -> FormatInfo {
        let (bytes_per_pixel, transparency, hard_mask) = match self {
            PixelFormat::Rgb32
            | PixelFormat::Rgba32
            | PixelFormat::Rgb32Big
            | PixelFormat::Rgba32Big => (4, true, false),
            PixelFormat::Rgb24 | PixelFormat::Rgb24Big => (3, false, false),
            PixelFormat::Rgb16 | PixelFormat::Rgb16Big => (2, false, false),
            PixelFormat::Rgb15
            | PixelFormat::Rgb15Big
            | PixelFormat::Rgba15
            | PixelFormat::Rgba15Big => (2, true, true),
            PixelFormat::Cmap8 => (1, true, true),
            PixelFormat::Gray8 => (1, false, false),
            PixelFormat::Gray1 => (0, false, false),
        };

        FormatInfo {
            bytes_per_pixel,
            transparency,
            hard_mask,
        }
    }

    /// The number of bytes a row of `width` pixels occupies at least.
    fn row_len(&self, width: u32) -> usize {
        match self.info().bytes_per_pixel {
            0 => (width as usize).div_ceil(8),
            n => n as usize * width as usize,
        }
    }

    /// Whether a pixel is transparent.
    fn is_transparent(&self, px: &[u8]) -> bool {
        match self {
            PixelFormat::Rgb32 => u32_le(px) == TRANSPARENT_MAGIC_RGBA32,
            PixelFormat::Rgba32 => px[3] < 128 || u32_le(px) == TRANSPARENT_MAGIC_RGBA32,
            PixelFormat::Rgb32Big => u32_be(px) == TRANSPARENT_MAGIC_RGBA32,
            PixelFormat::Rgba32Big => px[0] < 128 || u32_be(px) == TRANSPARENT_MAGIC_RGBA32,
            PixelFormat::Rgb15 => u16_le(px) == TRANSPARENT_MAGIC_RGBA15,
            PixelFormat::Rgb15Big => u16_be(px) == TRANSPARENT_MAGIC_RGBA15,
            PixelFormat::Rgba15 => {
                let v = u16_le(px);
                v & 0x8000 == 0 || v == TRANSPARENT_MAGIC_RGBA15
            }
            PixelFormat::Rgba15Big => {
                let v = u16_be(px);
                v & 0x8000 == 0 || v == TRANSPARENT_MAGIC_RGBA15
            }
            PixelFormat::Cmap8 => px[0] == TRANSPARENT_MAGIC_CMAP8,
            _ => false,
        }
    }

    /// Convert a pixel to `[r, g, b, a]`.
    fn to_rgba(&self, px: &[u8], color_map: &ColorMap) -> [u8; 4] {
        match self {
            PixelFormat::Rgb32 => [px[2], px[1], px[0], 255],
            PixelFormat::Rgba32 => [px[2], px[1], px[0], px[3]],
            PixelFormat::Rgb32Big => [px[1], px[2], px[3], 255],
            PixelFormat::Rgba32Big => [px[1], px[2], px[3], px[0]],
            PixelFormat::Rgb24 => [px[2], px[1], px[0], 255],
            PixelFormat::Rgb24Big => [px[0], px[1], px[2], 255],
            PixelFormat::Rgb16 => rgb16(u16_le(px)),
            PixelFormat::Rgb16Big => rgb16(u16_be(px)),
            PixelFormat::Rgb15 => rgb15(u16_le(px), false),
            PixelFormat::Rgb15Big => rgb15(u16_be(px), false),
            PixelFormat::Rgba15 => rgb15(u16_le(px), true),
            PixelFormat::Rgba15Big => rgb15(u16_be(px), true),
            PixelFormat::Cmap8 => {
                let c = color_map.get(px[0]);
                [c.r, c.g, c.b, c.a]
            }
            PixelFormat::Gray8 => [px[0], px[0], px[0], 255],
            // Bit-packed, handled by the caller.
            PixelFormat::Gray1 => [0, 0, 0, 255],
        }
    }
}

fn u16_le(px: &[u8]) -> u16 {
    u16::from_le_bytes([px[0], px[1]])
}

fn u16_be(px: &[u8]) -> u16 {
    u16::from_be_bytes([px[0], px[1]])
}

fn u32_le(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

fn u32_be(px: &[u8]) -> u32 {
    u32::from_be_bytes([px[0], px[1], px[2], px[3]])
}

/// Widen a 5-bit component, replicating the high bits into the low ones.
fn expand5(v: u16) -> u8 {
    let v = (v & 0x1F) as u8;
    (v << 3) | (v >> 2)
}

/// Widen a 6-bit component.
fn expand6(v: u16) -> u8 {
    let v = (v & 0x3F) as u8;
    (v << 2) | (v >> 4)
}

fn rgb16(v: u16) -> [u8; 4] {
    [expand5(v >> 11), expand6(v >> 5), expand5(v), 255]
}

fn rgb15(v: u16, has_alpha: bool) -> [u8; 4] {
    let a = if !has_alpha || v & 0x8000 != 0 { 255 } else { 0 };
    [expand5(v >> 10), expand5(v >> 5), expand5(v), a]
}

/// The palette of [`PixelFormat::Cmap8`] bitmaps.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap([Rgba; 256]);

static DEFAULT_COLOR_MAP: Lazy<ColorMap> = Lazy::new(|| {
    let mut colors = [Rgba::white(); 256];

    // A 6x6x6 color cube followed by a gray ramp.
    for (i, color) in colors.iter_mut().enumerate().take(216) {
        let level = |n: usize| (n * 51) as u8;
        *color = Rgba::rgb(level(i / 36), level(i / 6 % 6), level(i % 6));
    }

    for (i, color) in colors.iter_mut().enumerate().take(255).skip(216) {
        let gray = ((i - 216) * 255 / 38) as u8;
        *color = Rgba::rgb(gray, gray, gray);
    }

    colors[TRANSPARENT_MAGIC_CMAP8 as usize] = Rgba::new(255, 255, 255, 0);

    ColorMap(colors)
});

impl ColorMap {
    /// Create a new color map.
    pub fn new(colors: [Rgba; 256]) -> Self {
        Self(colors)
    }

    /// The color of an index.
    pub fn get(&self, index: u8) -> Rgba {
        self.0[index as usize]
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        DEFAULT_COLOR_MAP.clone()
    }
}

/// The transparency of an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ImageMask {
    /// One bit per pixel, most significant bit first, set bits are transparent.
    Hard(Vec<u8>),
    /// One alpha byte per pixel.
    Soft(Vec<u8>),
}

/// A bitmap normalized for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct NormalizedImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    /// Three bytes per pixel.
    pub(crate) rgb: Vec<u8>,
    pub(crate) mask: Option<ImageMask>,
}

/// The pixels of a [`DrawOp::DrawPixels`](crate::picture::DrawOp::DrawPixels).
#[derive(Debug, Clone, Copy)]
pub(crate) struct PixelSource<'a> {
    /// The part of the bitmap to draw, inclusive.
    pub(crate) src: Rect,
    pub(crate) bytes_per_row: u32,
    pub(crate) format: PixelFormat,
    pub(crate) data: &'a [u8],
}

impl PixelSource<'_> {
    /// Normalize the pixels to RGB and derive the mask.
    pub(crate) fn normalize(&self, color_map: &ColorMap, version: PdfVersion) -> OpResult<NormalizedImage> {
        let format = self.format;
        let info = format.info();
        let width = self.src.pixel_width();
        let height = self.src.pixel_height();
        let left = self.src.left.max(0.0) as usize;
        let top = self.src.top.max(0.0) as usize;
        let stride = self.bytes_per_row as usize;

        let buffer_error = || OpError::PixelBuffer {
            format,
            width,
            height,
        };

        if width == 0 || height == 0 {
            return Err(buffer_error());
        }

        // Offset of the first pixel in a row, in bytes or in bits for packed formats.
        let x_offset = match info.bytes_per_pixel {
            0 => left,
            n => left * n as usize,
        };
        let row_end = match info.bytes_per_pixel {
            0 => (left + width as usize).div_ceil(8),
            _ => x_offset + format.row_len(width),
        };
        let needed = stride * (top + height as usize - 1) + row_end;

        if self.data.len() < needed || (stride < row_end && height > 1) {
            return Err(buffer_error());
        }

        let hard = info.transparency && (info.hard_mask || !version.supports_soft_mask());
        let soft = info.transparency && !hard;
        let mask_stride = (width as usize).div_ceil(8);

        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        let mut hard_mask = vec![0u8; if hard { mask_stride * height as usize } else { 0 }];
        let mut soft_mask = Vec::with_capacity(if soft { width as usize * height as usize } else { 0 });
        let mut any_transparent = false;

        for y in 0..height as usize {
            let row = &self.data[stride * (top + y)..];

            for x in 0..width as usize {
                let (rgba, transparent) = if format == PixelFormat::Gray1 {
                    let bit = x_offset + x;
                    let gray = if row[bit / 8] & (1 << (bit % 8)) != 0 { 255 } else { 0 };
                    ([gray, gray, gray, 255], false)
                } else {
                    let n = info.bytes_per_pixel as usize;
                    let px = &row[x_offset + x * n..x_offset + (x + 1) * n];
                    (format.to_rgba(px, color_map), format.is_transparent(px))
                };

                rgb.extend_from_slice(&rgba[..3]);

                if hard && transparent {
                    hard_mask[y * mask_stride + x / 8] |= 0x80 >> (x % 8);
                    any_transparent = true;
                }

                if soft {
                    let alpha = if transparent && rgba[3] >= 128 { 0 } else { rgba[3] };
                    any_transparent |= alpha != 255;
                    soft_mask.push(alpha);
                }
            }
        }

        let mask = match (any_transparent, hard) {
            (false, _) => None,
            (true, true) => Some(ImageMask::Hard(hard_mask)),
            (true, false) => Some(ImageMask::Soft(soft_mask)),
        };

        Ok(NormalizedImage {
            width,
            height,
            rgb,
            mask,
        })
    }
}

/// An image written to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PreparedImage {
    pub(crate) image: Ref,
    pub(crate) mask: Option<Ref>,
}

/// Images already written to the document, keyed by their content.
#[derive(Debug, Default)]
pub(crate) struct ImageCache {
    images: HashMap<u128, PreparedImage>,
    pass: u32,
    hits: usize,
}

impl ImageCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Called whenever a new pass over a page starts.
    pub(crate) fn next_pass(&mut self) {
        self.pass += 1;
    }

    /// Find a previously written image.
    pub(crate) fn get(&mut self, image: &NormalizedImage) -> Option<PreparedImage> {
        let found = self.images.get(&image.sip_hash()).copied();
        self.hits += found.is_some() as usize;
        found
    }

    /// Remember a written image.
    pub(crate) fn insert(&mut self, image: &NormalizedImage, prepared: PreparedImage) {
        self.images.insert(image.sip_hash(), prepared);
    }

    pub(crate) fn len(&self) -> usize {
        self.images.len()
    }

    /// Forget all images, at the end of a job.
    pub(crate) fn flush(&mut self) {
        log::debug!(
            "image cache: {} images, {} reused, {} passes",
            self.images.len(),
            self.hits,
            self.pass
        );
        self.images.clear();
        self.hits = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(
        format: PixelFormat,
        width: u32,
        height: u32,
        data: &[u8],
        version: PdfVersion,
    ) -> OpResult<NormalizedImage> {
        let info = format.info();
        let stride = match info.bytes_per_pixel {
            0 => width.div_ceil(8),
            n => n as u32 * width,
        };

        PixelSource {
            src: Rect::from_ltrb(0.0, 0.0, (width - 1) as f32, (height - 1) as f32),
            bytes_per_row: stride,
            format,
            data,
        }
        .normalize(&ColorMap::default(), version)
    }

    fn first_pixel(format: PixelFormat, data: &[u8]) -> [u8; 3] {
        let image = normalize(format, 1, 1, data, PdfVersion::Pdf14).unwrap();
        [image.rgb[0], image.rgb[1], image.rgb[2]]
    }

    #[test]
    fn rgb15_red() {
        let v: u16 = 0b0_11111_00000_00000;
        assert_eq!(rgb15(v, false), [255, 0, 0, 255]);
        assert_eq!(first_pixel(PixelFormat::Rgb15, &v.to_le_bytes()), [255, 0, 0]);
        assert_eq!(first_pixel(PixelFormat::Rgb15Big, &v.to_be_bytes()), [255, 0, 0]);
    }

    #[test]
    fn one_pixel_per_format() {
        assert_eq!(first_pixel(PixelFormat::Rgb32, &[1, 2, 3, 0]), [3, 2, 1]);
        assert_eq!(first_pixel(PixelFormat::Rgba32, &[1, 2, 3, 255]), [3, 2, 1]);
        assert_eq!(first_pixel(PixelFormat::Rgb32Big, &[0, 1, 2, 3]), [1, 2, 3]);
        assert_eq!(first_pixel(PixelFormat::Rgba32Big, &[255, 1, 2, 3]), [1, 2, 3]);
        assert_eq!(first_pixel(PixelFormat::Rgb24, &[1, 2, 3]), [3, 2, 1]);
        assert_eq!(first_pixel(PixelFormat::Rgb24Big, &[1, 2, 3]), [1, 2, 3]);
        let green: u16 = 0b00000_111111_00000;
        assert_eq!(first_pixel(PixelFormat::Rgb16, &green.to_le_bytes()), [0, 255, 0]);
        assert_eq!(first_pixel(PixelFormat::Rgb16Big, &green.to_be_bytes()), [0, 255, 0]);
        let blue: u16 = 0b1_00000_00000_11111;
        assert_eq!(first_pixel(PixelFormat::Rgba15, &blue.to_le_bytes()), [0, 0, 255]);
        assert_eq!(first_pixel(PixelFormat::Rgba15Big, &blue.to_be_bytes()), [0, 0, 255]);
        assert_eq!(first_pixel(PixelFormat::Cmap8, &[215]), [255, 255, 255]);
        assert_eq!(first_pixel(PixelFormat::Cmap8, &[5]), [0, 0, 255]);
        assert_eq!(first_pixel(PixelFormat::Gray8, &[7]), [7, 7, 7]);
        assert_eq!(first_pixel(PixelFormat::Gray1, &[0b0000_0001]), [255, 255, 255]);
    }

    #[test]
    fn gray1_is_lsb_first() {
        let image = normalize(PixelFormat::Gray1, 3, 1, &[0b0000_0010], PdfVersion::Pdf13).unwrap();
        assert_eq!(image.rgb, vec![0, 0, 0, 255, 255, 255, 0, 0, 0]);
        assert_eq!(image.mask, None);
    }

    #[test]
    fn all_sentinel_image_masks_every_pixel() {
        let data = TRANSPARENT_MAGIC_RGBA15.to_le_bytes().repeat(10 * 2);
        let image = normalize(PixelFormat::Rgb15, 10, 2, &data, PdfVersion::Pdf14).unwrap();
        assert_eq!(
            image.mask,
            Some(ImageMask::Hard(vec![0xFF, 0xC0, 0xFF, 0xC0]))
        );
    }

    #[test]
    fn opaque_image_has_no_mask() {
        let data = [0x00, 0x80].repeat(4);
        let image = normalize(PixelFormat::Rgba15, 4, 1, &data, PdfVersion::Pdf14).unwrap();
        assert_eq!(image.mask, None);

        let data = [0u8, 0, 0, 0].repeat(4);
        let image = normalize(PixelFormat::Rgb32, 4, 1, &data, PdfVersion::Pdf14).unwrap();
        assert_eq!(image.mask, None);
    }

    #[test]
    fn soft_mask_only_for_newer_versions() {
        let data = [[0u8, 0, 0, 255], [0, 0, 0, 64]].concat();

        let image = normalize(PixelFormat::Rgba32, 2, 1, &data, PdfVersion::Pdf14).unwrap();
        assert_eq!(image.mask, Some(ImageMask::Soft(vec![255, 64])));

        let image = normalize(PixelFormat::Rgba32, 2, 1, &data, PdfVersion::Pdf13).unwrap();
        assert_eq!(image.mask, Some(ImageMask::Hard(vec![0b0100_0000])));
    }

    #[test]
    fn sentinel_in_rgb32_is_fully_transparent() {
        let data = TRANSPARENT_MAGIC_RGBA32.to_le_bytes();
        let image = normalize(PixelFormat::Rgb32, 1, 1, &data, PdfVersion::Pdf15).unwrap();
        assert_eq!(image.mask, Some(ImageMask::Soft(vec![0])));
    }

    #[test]
    fn cmap8_transparent_index() {
        let image = normalize(PixelFormat::Cmap8, 2, 1, &[0, 0xFF], PdfVersion::Pdf15).unwrap();
        assert_eq!(image.mask, Some(ImageMask::Hard(vec![0b0100_0000])));
    }

    #[test]
    fn short_buffer_is_an_error() {
        let result = normalize(PixelFormat::Rgb24, 4, 4, &[0; 10], PdfVersion::Pdf14);
        assert_eq!(
            result,
            Err(OpError::PixelBuffer {
                format: PixelFormat::Rgb24,
                width: 4,
                height: 4
            })
        );
    }

    #[test]
    fn source_rect_offsets_into_the_bitmap() {
        let data = [[0u8, 0, 0], [1, 2, 3], [0, 0, 0], [4, 5, 6]].concat();
        let image = PixelSource {
            src: Rect::from_ltrb(1.0, 0.0, 1.0, 1.0),
            bytes_per_row: 6,
            format: PixelFormat::Rgb24Big,
            data: &data,
        }
        .normalize(&ColorMap::default(), PdfVersion::Pdf14)
        .unwrap();

        assert_eq!(image.rgb, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn cache_keys_on_content() {
        let mut cache = ImageCache::new();
        let a = normalize(PixelFormat::Gray8, 2, 1, &[1, 2], PdfVersion::Pdf14).unwrap();
        let b = normalize(PixelFormat::Gray8, 2, 1, &[1, 3], PdfVersion::Pdf14).unwrap();
        let prepared = PreparedImage {
            image: Ref::new(5),
            mask: None,
        };

        assert_eq!(cache.get(&a), None);
        cache.insert(&a, prepared);
        assert_eq!(cache.get(&a.clone()), Some(prepared));
        assert_eq!(cache.get(&b), None);
        cache.flush();
        assert_eq!(cache.len(), 0);
    }
}
