use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, ImageReader};

use crate::error::{ComposeError, ComposeResult};
use crate::fit::Dimensions;

/// Image payload ready to be anchored, with its natural size in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub mime_type: String,
    pub data: Vec<u8>,
    pub natural: Dimensions,
}

/// Decodes a base64 payload and probes its natural size.
///
/// A recognised `mime_type` selects the decoder; otherwise the format is
/// guessed from the leading bytes and its MIME type is reported instead.
pub fn decode_image(encoded: &str, mime_type: &str) -> ComposeResult<DecodedImage> {
    let data = STANDARD
        .decode(encoded.trim().as_bytes())
        .map_err(|err| ComposeError::InvalidImage(format!("base64 decoding failed: {err}")))?;

    let reader = match ImageFormat::from_mime_type(mime_type) {
        Some(format) => {
            let mut reader = ImageReader::new(Cursor::new(data.as_slice()));
            reader.set_format(format);
            reader
        }
        None => ImageReader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()
            .map_err(|err| ComposeError::InvalidImage(err.to_string()))?,
    };

    let Some(format) = reader.format() else {
        return Err(ComposeError::InvalidImage(format!(
            "unrecognised image format for type '{mime_type}'"
        )));
    };

    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| ComposeError::InvalidImage(err.to_string()))?;

    let mime_type = if mime_type.trim().is_empty() {
        format.to_mime_type().to_string()
    } else {
        mime_type.to_string()
    };

    Ok(DecodedImage {
        mime_type,
        data,
        natural: Dimensions::new(f64::from(height), f64::from(width)),
    })
}
