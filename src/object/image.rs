//! Image XObjects.

use std::io::{self, Write};
use std::ops::DerefMut;

use pdf_writer::{Finish, Name};

use crate::image::{ImageMask, NormalizedImage, PreparedImage};
use crate::serialize::PdfSerializer;
use crate::stream::FilterStreamBuilder;

const DEVICE_RGB: Name = Name(b"DeviceRGB");
const DEVICE_GRAY: Name = Name(b"DeviceGray");

/// Write an image and its mask, returning the references of both.
///
/// The mask is written first so that the image can point to it.
pub(crate) fn serialize_image<W: Write>(
    image: &NormalizedImage,
    sc: &mut PdfSerializer<W>,
    compression_level: Option<u8>,
) -> io::Result<PreparedImage> {
    let width = image.width as i32;
    let height = image.height as i32;

    let mask_ref = match &image.mask {
        Some(mask) => {
            let mask_ref = sc.new_ref();
            let (data, soft) = match mask {
                ImageMask::Hard(data) => (data, false),
                ImageMask::Soft(data) => (data, true),
            };

            sc.emit(mask_ref, |chunk| {
                let mask_stream = FilterStreamBuilder::new(data, compression_level).finish();
                let mut mask_x_object = chunk.image_xobject(mask_ref, mask_stream.encoded_data());
                mask_stream.write_filters(mask_x_object.deref_mut().deref_mut());
                mask_x_object.width(width);
                mask_x_object.height(height);

                if soft {
                    // Mask color space must be device gray.
                    mask_x_object.pair(Name(b"ColorSpace"), DEVICE_GRAY);
                    mask_x_object.bits_per_component(8);
                } else {
                    mask_x_object.image_mask(true);
                    mask_x_object.bits_per_component(1);
                }

                mask_x_object.finish();
            })?;

            Some((mask_ref, soft))
        }
        None => None,
    };

    let image_ref = sc.new_ref();

    sc.emit(image_ref, |chunk| {
        let image_stream = FilterStreamBuilder::new(&image.rgb, compression_level).finish();
        let mut image_x_object = chunk.image_xobject(image_ref, image_stream.encoded_data());
        image_stream.write_filters(image_x_object.deref_mut().deref_mut());
        image_x_object.width(width);
        image_x_object.height(height);
        image_x_object.pair(Name(b"ColorSpace"), DEVICE_RGB);
        image_x_object.bits_per_component(8);

        match mask_ref {
            Some((mask_ref, true)) => {
                image_x_object.s_mask(mask_ref);
            }
            Some((mask_ref, false)) => {
                image_x_object.pair(Name(b"Mask"), mask_ref);
            }
            None => {}
        }

        image_x_object.finish();
    })?;

    Ok(PreparedImage {
        image: image_ref,
        mask: mask_ref.map(|(r, _)| r),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure::PdfVersion;

    fn image(mask: Option<ImageMask>) -> NormalizedImage {
        NormalizedImage {
            width: 2,
            height: 1,
            rgb: vec![255, 0, 0, 0, 0, 255],
            mask,
        }
    }

    fn write(image: &NormalizedImage) -> (PreparedImage, String) {
        let mut sc = PdfSerializer::new(Vec::new(), PdfVersion::Pdf14).unwrap();
        let prepared = serialize_image(image, &mut sc, None).unwrap();
        let catalog = sc.new_ref();
        let bytes = sc.finish(catalog, None).unwrap();

        (prepared, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[test]
    fn opaque_image() {
        let (prepared, text) = write(&image(None));

        assert_eq!(prepared.mask, None);
        assert!(text.contains("/ColorSpace /DeviceRGB"));
        assert!(!text.contains("/SMask"));
    }

    #[test]
    fn hard_mask_is_an_image_mask() {
        let (prepared, text) = write(&image(Some(ImageMask::Hard(vec![0b0100_0000]))));

        let mask = prepared.mask.unwrap();
        assert!(text.contains("/ImageMask true"));
        assert!(!text.contains("/Decode"));
        assert!(text.contains(&format!("/Mask {} 0 R", mask.get())));
    }

    #[test]
    fn soft_mask() {
        let (prepared, text) = write(&image(Some(ImageMask::Soft(vec![255, 64]))));

        let mask = prepared.mask.unwrap();
        assert!(text.contains(&format!("/SMask {} 0 R", mask.get())));
        assert!(text.contains("/ColorSpace /DeviceGray"));
    }
}
