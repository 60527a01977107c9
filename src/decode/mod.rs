//! Image decoding and the decoded-image data model.
//!
//! Decoding goes through the `image` crate and lands in a single canonical
//! pixel layout (32-bit BGRA) so the cache, converter, and GPU upload path
//! never have to branch on formats.

mod decoder;
mod types;

pub use decoder::{is_supported, scan_directory, ImageDecoder, ImageLoader, SUPPORTED_EXTENSIONS};
pub use types::{DecodeError, DecodedImage, ImageInfo, PixelFormat};
