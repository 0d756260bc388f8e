//! Signature image payload decoding
//!
//! Payloads arrive either as a data URI (`data:image/png;base64,...`) or as
//! raw base64. The declared media type picks the decoder when present;
//! otherwise the magic bytes do. Only PNG and JPEG are supported.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::SignError;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

/// Raster formats a signature image may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

/// A decoded signature image with its intrinsic pixel dimensions.
#[derive(Debug, Clone)]
pub struct SignatureImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl SignatureImage {
    /// Decode an encoded signature payload.
    ///
    /// A data-URI media type other than `image/png` or `image/jpeg` fails
    /// with [`SignError::UnsupportedImageFormat`] before any decoding, and
    /// the decoded bytes must carry the matching magic.
    pub fn decode(encoded: &str) -> Result<Self, SignError> {
        let (declared, payload) = split_data_uri(encoded)?;

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| SignError::InvalidRequest(format!("invalid base64 payload: {}", e)))?;

        if bytes.is_empty() {
            return Err(SignError::InvalidRequest(
                "empty signature image payload".into(),
            ));
        }

        let sniffed = sniff_format(&bytes).ok_or_else(|| {
            SignError::UnsupportedImageFormat("payload is neither PNG nor JPEG".into())
        })?;

        if let Some(declared) = declared {
            if declared != sniffed {
                return Err(SignError::UnsupportedImageFormat(
                    "declared media type does not match payload".into(),
                ));
            }
        }

        let size = imagesize::blob_size(&bytes).map_err(|e| {
            SignError::UnsupportedImageFormat(format!("cannot read image dimensions: {}", e))
        })?;

        Ok(Self {
            format: sniffed,
            bytes,
            width: size.width as u32,
            height: size.height as u32,
        })
    }
}

/// Split off a data-URI prefix, returning the declared format (if any) and
/// the base64 payload.
fn split_data_uri(encoded: &str) -> Result<(Option<ImageFormat>, &str), SignError> {
    if !encoded.starts_with("data:") {
        return Ok((None, encoded));
    }

    let rest = &encoded["data:".len()..];
    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        SignError::InvalidRequest("data URI is missing the payload separator".into())
    })?;

    let media_type = header.split(';').next().unwrap_or_default();
    let format = match media_type {
        "image/png" => ImageFormat::Png,
        "image/jpeg" | "image/jpg" => ImageFormat::Jpeg,
        other => {
            return Err(SignError::UnsupportedImageFormat(format!(
                "media type {:?} is not supported",
                other
            )))
        }
    };

    Ok((Some(format), payload))
}

fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(&PNG_MAGIC) {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(&JPEG_MAGIC) {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal PNG: signature + IHDR declaring the given dimensions.
    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        // bit depth, color type, compression, filter, interlace
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 0]); // CRC, not checked here
        bytes
    }

    /// Minimal JPEG: SOI followed by an SOF0 frame with the dimensions.
    fn jpeg_header(width: u16, height: u16) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&[
            0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01,
        ]);
        bytes
    }

    #[test]
    fn decodes_png_data_uri() {
        let encoded = format!(
            "data:image/png;base64,{}",
            BASE64.encode(png_header(320, 144))
        );
        let img = SignatureImage::decode(&encoded).unwrap();
        assert_eq!(img.format, ImageFormat::Png);
        assert_eq!((img.width, img.height), (320, 144));
    }

    #[test]
    fn decodes_jpeg_data_uri() {
        let encoded = format!(
            "data:image/jpeg;base64,{}",
            BASE64.encode(jpeg_header(640, 480))
        );
        let img = SignatureImage::decode(&encoded).unwrap();
        assert_eq!(img.format, ImageFormat::Jpeg);
        assert_eq!((img.width, img.height), (640, 480));
    }

    #[test]
    fn raw_base64_is_classified_by_magic() {
        let img = SignatureImage::decode(&BASE64.encode(png_header(10, 10))).unwrap();
        assert_eq!(img.format, ImageFormat::Png);

        let img = SignatureImage::decode(&BASE64.encode(jpeg_header(10, 10))).unwrap();
        assert_eq!(img.format, ImageFormat::Jpeg);
    }

    #[test]
    fn gif_media_type_is_rejected_before_decoding() {
        let err = SignatureImage::decode("data:image/gif;base64,AAAA").unwrap_err();
        assert!(matches!(err, SignError::UnsupportedImageFormat(_)));
    }

    #[test]
    fn mismatched_media_type_is_rejected() {
        let encoded = format!(
            "data:image/png;base64,{}",
            BASE64.encode(jpeg_header(10, 10))
        );
        let err = SignatureImage::decode(&encoded).unwrap_err();
        assert!(matches!(err, SignError::UnsupportedImageFormat(_)));
    }

    #[test]
    fn unclassifiable_bytes_are_rejected() {
        let err = SignatureImage::decode(&BASE64.encode(b"GIF89a....")).unwrap_err();
        assert!(matches!(err, SignError::UnsupportedImageFormat(_)));
    }

    #[test]
    fn garbage_base64_is_an_invalid_request() {
        let err = SignatureImage::decode("data:image/png;base64,!!!not-base64!!!").unwrap_err();
        assert!(matches!(err, SignError::InvalidRequest(_)));
    }
}
