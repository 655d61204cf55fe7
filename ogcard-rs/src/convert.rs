//! Decoding and PNG re-encoding of image payloads.
//!
//! This is the interactive-context conversion surface: inline payloads are
//! decoded into pixels at their natural dimensions (no resampling) and
//! re-encoded as PNG. The same codec core also backs the conversion endpoint's
//! server-side re-encoding.

use crate::error::NormalizeError;
use crate::reference::{classify, ImageMime, ImageRef, DATA_URL_PREFIX};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::ImageFormat;
use log::info;
use std::io::Cursor;

/// A parsed `data:` URL: the declared mime and the decoded payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePayload {
    pub mime: ImageMime,
    pub bytes: Vec<u8>,
}

/// Split a `data:` URL into its declared mime and decoded payload bytes.
/// Both base64 and percent-encoded payloads are supported.
pub fn parse_data_url(value: &str) -> Result<InlinePayload, NormalizeError> {
    let Some(rest) = value.strip_prefix(DATA_URL_PREFIX) else {
        return Err(NormalizeError::UnsupportedInputKind(format!(
            "expected an inline data URL, got `{value}`"
        )));
    };
    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        NormalizeError::DecodeFailure("data URL is missing the `,` payload separator".to_string())
    })?;

    let mut header_parts = header.split(';');
    let mime = ImageMime::from_declared(header_parts.next().unwrap_or(""));
    let is_base64 = header_parts.any(|part| part.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        BASE64.decode(payload.trim()).map_err(|err| {
            NormalizeError::DecodeFailure(format!("invalid base64 payload: {err}"))
        })?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(InlinePayload { mime, bytes })
}

/// Decode raster bytes in any supported format and re-encode them as PNG at
/// the image's natural dimensions.
pub fn raster_to_png_bytes(bytes: &[u8]) -> Result<Vec<u8>, NormalizeError> {
    let img = image::load_from_memory(bytes)
        .map_err(|err| NormalizeError::DecodeFailure(err.to_string()))?;
    info!(
        "Re-encoding {}x{} raster image as PNG",
        img.width(),
        img.height()
    );

    let mut png_bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|err| NormalizeError::ConversionFailure(err.to_string()))?;
    Ok(png_bytes)
}

/// Convert an inline-encoded image to a PNG data URL.
///
/// Remote references are rejected with `UnsupportedInputKind`: they are either
/// renderer-native already or rewritten through the conversion endpoint on the
/// server path, never decoded here.
pub fn convert_inline_to_png(value: &str) -> Result<String, NormalizeError> {
    match classify(value) {
        Some(ImageRef::Inline { .. }) => {}
        Some(ImageRef::Remote { url }) => {
            return Err(NormalizeError::UnsupportedInputKind(format!(
                "remote reference `{url}` cannot be converted in the interactive context"
            )));
        }
        None => {
            return Err(NormalizeError::UnsupportedInputKind(format!(
                "`{value}` is not an image reference"
            )));
        }
    }

    let payload = parse_data_url(value)?;
    let png_bytes = raster_to_png_bytes(&payload.bytes)?;
    Ok(format!(
        "data:image/png;base64,{}",
        BASE64.encode(&png_bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &[u8] = &[
        137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 1, 0, 0, 0, 1, 8,
        4, 0, 0, 0, 181, 28, 12, 2, 0, 0, 0, 11, 73, 68, 65, 84, 120, 218, 99, 252, 255, 15, 0, 2,
        3, 1, 128, 179, 248, 175, 217, 0, 0, 0, 0, 73, 69, 78, 68, 174, 66, 96, 130,
    ];

    fn encode_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = image::RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 40) as u8, (y * 60) as u8, 120, 255])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .expect("Failed to encode test image");
        bytes
    }

    fn data_url(mime: &str, bytes: &[u8]) -> String {
        format!("data:{mime};base64,{}", BASE64.encode(bytes))
    }

    #[test]
    fn test_parse_base64_data_url() {
        let payload = parse_data_url(&data_url("image/png", PNG_1X1)).unwrap();
        assert_eq!(payload.mime, ImageMime::Png);
        assert_eq!(payload.bytes, PNG_1X1);
    }

    #[test]
    fn test_parse_percent_encoded_data_url() {
        let payload = parse_data_url("data:image/svg+xml,%3Csvg%3E%3C%2Fsvg%3E").unwrap();
        assert_eq!(payload.mime, ImageMime::Svg);
        assert_eq!(payload.bytes, b"<svg></svg>");
    }

    #[test]
    fn test_inline_webp_becomes_png_with_same_dimensions() {
        let webp = encode_test_image(5, 3, ImageFormat::WebP);
        let converted = convert_inline_to_png(&data_url("image/webp", &webp)).unwrap();

        let payload = parse_data_url(&converted).unwrap();
        assert_eq!(payload.mime, ImageMime::Png);
        let img = image::load_from_memory(&payload.bytes).unwrap();
        assert_eq!(image::guess_format(&payload.bytes).unwrap(), ImageFormat::Png);
        assert_eq!((img.width(), img.height()), (5, 3));
    }

    #[test]
    fn test_malformed_payload_is_a_decode_failure() {
        let err = convert_inline_to_png("data:image/webp;base64,AAAA").unwrap_err();
        assert!(matches!(err, NormalizeError::DecodeFailure(_)), "{err}");

        let err = convert_inline_to_png("data:image/webp;base64,!!!not-base64!!!").unwrap_err();
        assert!(matches!(err, NormalizeError::DecodeFailure(_)), "{err}");
    }

    #[test]
    fn test_remote_reference_is_unsupported_input() {
        let err = convert_inline_to_png("https://cdn.example.com/logo.webp").unwrap_err();
        assert!(matches!(err, NormalizeError::UnsupportedInputKind(_)), "{err}");
    }

    #[test]
    fn test_non_image_string_is_unsupported_input() {
        let err = convert_inline_to_png("hello world").unwrap_err();
        assert!(matches!(err, NormalizeError::UnsupportedInputKind(_)), "{err}");
    }
}
