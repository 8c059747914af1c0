//! Image encoding: `DynamicImage` → JPEG → base64, wrapped in [`EncodedImagePart`].
//!
//! A résumé page is mostly black text on white, which JPEG at quality 75
//! compresses to a few hundred kilobytes while staying legible to vision
//! models. JPEG has no alpha channel, so the pdfium RGBA bitmap is flattened
//! to RGB first.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// MIME type of every image produced by this crate.
pub const JPEG_MIME_TYPE: &str = "image/jpeg";

/// An image in request-ready form: `{mime_type, data}` with base64 `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImagePart {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImagePart {
    /// Wrap already-compressed JPEG bytes.
    pub fn from_jpeg_bytes(jpeg: &[u8]) -> Self {
        Self {
            mime_type: JPEG_MIME_TYPE.to_string(),
            data: STANDARD.encode(jpeg),
        }
    }

    /// Decode `data` back to the compressed image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }

    /// Size of the compressed image (not of the base64 text).
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|&b| b == b'=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }
}

/// JPEG-compress a rendered page.
pub fn jpeg_bytes(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}

/// Encode a rendered page as a base64 JPEG part.
pub fn encode_page(img: &DynamicImage, quality: u8) -> Result<EncodedImagePart, image::ImageError> {
    let jpeg = jpeg_bytes(img, quality)?;
    let part = EncodedImagePart::from_jpeg_bytes(&jpeg);
    debug!(
        "Encoded {}x{} page → {} bytes JPEG, {} bytes base64",
        img.width(),
        img.height(),
        jpeg.len(),
        part.data.len()
    );
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn page() -> DynamicImage {
        let mut img = RgbaImage::from_pixel(120, 160, Rgba([255, 255, 255, 255]));
        for x in 10..110 {
            img.put_pixel(x, 20, Rgba([0, 0, 0, 255]));
        }
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn mime_type_is_jpeg() {
        let part = encode_page(&page(), 75).expect("encode should succeed");
        assert_eq!(part.mime_type, JPEG_MIME_TYPE);
        assert!(!part.data.is_empty());
    }

    #[test]
    fn data_decodes_to_a_jpeg_of_the_same_size() {
        let part = encode_page(&page(), 75).unwrap();
        let bytes = part.decode().expect("valid base64");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");

        let decoded = image::load_from_memory(&bytes).expect("valid image");
        assert_eq!((decoded.width(), decoded.height()), (120, 160));
    }

    #[test]
    fn decode_reproduces_encoder_bytes() {
        let jpeg = jpeg_bytes(&page(), 60).unwrap();
        let part = EncodedImagePart::from_jpeg_bytes(&jpeg);
        assert_eq!(part.decode().unwrap(), jpeg);
        assert_eq!(part.decoded_len(), jpeg.len());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let part = EncodedImagePart::from_jpeg_bytes(b"\xFF\xD8\xFF");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["mime_type"], "image/jpeg");
        assert_eq!(json["data"], "/9j/");
    }
}
