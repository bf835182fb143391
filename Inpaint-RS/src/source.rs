use image::ImageFormat;

use crate::error::{InpaintError, Result};

/// An uploaded image, decoded once to learn its dimensions.
///
/// The uploaded bytes are kept untouched and sent to the service as-is.
#[derive(Debug, Clone)]
pub struct SourceImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    format: ImageFormat,
}

impl SourceImage {
    /// Decode user-provided bytes.
    ///
    /// # Errors
    ///
    /// Returns [`InpaintError::Validation`] if the bytes are empty or not a
    /// supported image.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(InpaintError::Validation("Image data is empty".into()));
        }
        let format = image::guess_format(&bytes)
            .map_err(|e| InpaintError::Validation(format!("Unrecognized image format: {}", e)))?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| InpaintError::Validation(format!("Cannot decode image: {}", e)))?;
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            bytes,
            format,
        })
    }

    /// Read and decode an image file.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type for the multipart part.
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Size the service crops to: each side rounded down to a multiple of 8.
    pub fn aligned_dimensions(&self) -> (u32, u32) {
        ((self.width / 8) * 8, (self.height / 8) * 8)
    }
}
