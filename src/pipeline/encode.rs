//! Image encoding: page JPEG on disk → base64 [`ImagePayload`].
//!
//! Multimodal APIs accept images as base64 data embedded in the JSON request
//! body. The rasteriser already wrote JPEG (scanned invoices compress well
//! and the provider accepts it natively), so this stage only reads the bytes
//! back and wraps them.

use crate::provider::ImagePayload;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Read a rendered page JPEG and wrap it as a base64 payload for the
/// model request.
pub fn encode_jpeg_file(path: &Path) -> Result<ImagePayload, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let b64 = STANDARD.encode(&bytes);
    debug!("Encoded {} -> {} bytes base64", path.display(), b64.len());
    Ok(ImagePayload::jpeg(b64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    #[test]
    fn encode_written_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page_1.jpg");
        RgbImage::from_pixel(10, 10, Rgb([240, 240, 240]))
            .save_with_format(&path, ImageFormat::Jpeg)
            .expect("write test jpeg");

        let payload = encode_jpeg_file(&path).expect("encode should succeed");
        assert_eq!(payload.mime_type, "image/jpeg");
        assert!(!payload.data.is_empty());
        // Verify it round-trips as base64
        let decoded = STANDARD.decode(&payload.data).expect("valid base64");
        assert!(!decoded.is_empty());
    }

    #[test]
    fn missing_page_is_an_io_error() {
        let err = encode_jpeg_file(Path::new("/nonexistent/page_1.jpg"));
        assert!(err.is_err());
    }
}
