//! Drawing bitmaps.

use std::io::Write;

use tiny_skia_path::Transform;

use super::{Failure, PageContext};
use crate::error::OpError;
use crate::geom::Rect;
use crate::image::{PixelFormat, PixelSource};
use crate::object::image::serialize_image;

impl<W: Write> PageContext<'_, W> {
    /// Draw the `src` part of a bitmap into `dest`. Identical bitmaps are written
    /// only once per job.
    pub(super) fn draw_pixels(
        &mut self,
        src: &Rect,
        dest: &Rect,
        bytes_per_row: u32,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<(), Failure> {
        if self.states.cur().clipping {
            return Err(OpError::PixelsInClip.into());
        }

        let (_, alpha) = self.resolve_paint()?;

        if !self.is_rendering() {
            // Only creates the transparency.
            self.paint(alpha, |_| {})?;
            return Ok(());
        }

        let job = &mut *self.job;
        let image = PixelSource {
            src: *src,
            bytes_per_row,
            format,
            data,
        }
        .normalize(&job.color_map, job.settings.pdf_compatibility)?;

        let prepared = match job.image_cache.get(&image) {
            Some(prepared) => prepared,
            None => {
                let compression_level = job.compression_level();
                let prepared = serialize_image(&image, &mut job.sc, compression_level)?;
                job.image_cache.insert(&image, prepared);
                prepared
            }
        };

        let system = self.states.cur().system;
        let scale = system.scale();
        let transform = Transform::from_row(
            (dest.width() + 1.0) * scale,
            0.0,
            0.0,
            (dest.height() + 1.0) * scale,
            system.tx(dest.left),
            system.ty(dest.bottom),
        );

        self.paint(alpha, |content| content.draw_image(prepared.image, &transform))?;

        Ok(())
    }
}
