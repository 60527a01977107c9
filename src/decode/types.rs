//! Decoded-image types and decode errors.

use std::path::PathBuf;

use thiserror::Error;

/// Canonical pixel layout for decoded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8 bits per channel, blue first, 4 bytes per pixel.
    Bgra8,
}

impl PixelFormat {
    /// Bytes occupied by one pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 => 4,
        }
    }
}

/// Image metadata, available without holding the pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub has_alpha: bool,
}

impl ImageInfo {
    /// Decoded size in bytes.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// An in-memory decoded image: pixel buffer plus metadata.
///
/// Shared between the cache and its readers through `Arc`, so an evicted
/// entry's memory is freed only when the last reader lets go.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub info: ImageInfo,
    /// The file this image was decoded from.
    pub source_path: PathBuf,
    /// Pixels in `info.format` layout, tightly packed.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Decoded byte length; what the cache accounts against its capacity.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// Decode errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// I/O error reading the file or scanning a directory
    #[error("image I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File extension is not in the supported set
    #[error("unsupported image format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The decoder rejected the file contents
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgra8_is_four_bytes() {
        assert_eq!(PixelFormat::Bgra8.bytes_per_pixel(), 4);
    }

    #[test]
    fn info_byte_len_covers_all_pixels() {
        let info = ImageInfo {
            width: 640,
            height: 480,
            format: PixelFormat::Bgra8,
            has_alpha: true,
        };
        assert_eq!(info.byte_len(), 640 * 480 * 4);
    }

    #[test]
    fn unsupported_format_error_names_the_path() {
        let err = DecodeError::UnsupportedFormat {
            path: PathBuf::from("shot.xyz"),
        };
        assert!(err.to_string().contains("shot.xyz"));
    }
}
