//! File decoding via the `image` crate.

use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::types::{DecodeError, DecodedImage, ImageInfo, PixelFormat};
use crate::convert;

/// File extensions the decoder accepts, lowercase without the dot.
pub const SUPPORTED_EXTENSIONS: [&str; 9] = [
    "jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp", "ico",
];

/// Whether a path's extension is in the supported set (case-insensitive).
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// List the supported image files in a directory, sorted by name.
///
/// The sorted order is what gallery navigation and sequential prefetch
/// prediction both key off, so they always agree.
pub fn scan_directory(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported(path))
        .collect();
    images.sort();
    Ok(images)
}

/// Seam between the cache machinery and the concrete decoder.
///
/// The prefetcher and pipeline schedule work against this trait, so tests
/// (and future decode backends) can stand in for the real decoder.
pub trait ImageLoader: Send + Sync {
    /// Produce a decoded image for `path`, or fail.
    fn load(&self, path: &Path) -> Result<DecodedImage, DecodeError>;
}

/// Decoder producing canonical BGRA images.
#[derive(Debug, Default)]
pub struct ImageDecoder;

impl ImageDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a file at full resolution.
    pub fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        if !is_supported(path) {
            return Err(DecodeError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
        let decoded = image::open(path)?;
        trace!(path = %path.display(), "decoded image");
        Ok(self.finish(path, decoded))
    }

    /// Read image dimensions without decoding the pixels.
    pub fn probe(&self, path: &Path) -> Result<ImageInfo, DecodeError> {
        if !is_supported(path) {
            return Err(DecodeError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
        let (width, height) = image::image_dimensions(path)?;
        Ok(ImageInfo {
            width,
            height,
            format: PixelFormat::Bgra8,
            has_alpha: true,
        })
    }

    /// Decode a thumbnail whose longest edge is at most `max_edge`,
    /// preserving aspect ratio.
    pub fn decode_thumbnail(&self, path: &Path, max_edge: u32) -> Result<DecodedImage, DecodeError> {
        if !is_supported(path) {
            return Err(DecodeError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
        let decoded = image::open(path)?;
        let thumbnail = decoded.thumbnail(max_edge, max_edge);
        Ok(self.finish(path, thumbnail))
    }

    /// Swizzle a decoded frame into the canonical BGRA layout, then run
    /// the pixel-conversion stage into the output buffer.
    fn finish(&self, path: &Path, decoded: image::DynamicImage) -> DecodedImage {
        let has_alpha = decoded.color().has_alpha();
        let rgba = decoded.into_rgba8();
        let (width, height) = rgba.dimensions();

        let mut staged = rgba.into_raw();
        for pixel in staged.chunks_exact_mut(4) {
            pixel.swap(0, 2); // RGBA -> BGRA
        }

        let pixel_count = width as usize * height as usize;
        let mut pixels = vec![0u8; staged.len()];
        convert::convert_pixels(&mut pixels, &staged, pixel_count);

        DecodedImage {
            info: ImageInfo {
                width,
                height,
                format: PixelFormat::Bgra8,
                has_alpha,
            },
            source_path: path.to_path_buf(),
            pixels,
        }
    }
}

impl ImageLoader for ImageDecoder {
    fn load(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        self.decode(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, rgba: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(is_supported(Path::new("a.png")));
        assert!(is_supported(Path::new("b.JPEG")));
        assert!(is_supported(Path::new("c.WebP")));
        assert!(!is_supported(Path::new("d.raw")));
        assert!(!is_supported(Path::new("no_extension")));
    }

    #[test]
    fn decode_produces_bgra_pixels() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "red.png", 4, 3, [200, 20, 40, 255]);

        let image = ImageDecoder::new().decode(&path).unwrap();
        assert_eq!(image.info.width, 4);
        assert_eq!(image.info.height, 3);
        assert_eq!(image.byte_len(), 4 * 3 * 4);
        assert_eq!(image.source_path, path);
        // RGBA [200, 20, 40, 255] stored as BGRA.
        assert_eq!(&image.pixels[..4], &[40, 20, 200, 255]);
    }

    #[test]
    fn decode_rejects_unsupported_extension() {
        let decoder = ImageDecoder::new();
        let err = decoder.decode(Path::new("document.pdf")).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat { .. }));
    }

    #[test]
    fn decode_fails_on_garbage_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png at all").unwrap();

        let err = ImageDecoder::new().decode(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Decode(_)));
    }

    #[test]
    fn probe_reads_dimensions_without_pixels() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "wide.png", 64, 16, [0, 0, 0, 255]);

        let info = ImageDecoder::new().probe(&path).unwrap();
        assert_eq!((info.width, info.height), (64, 16));
        assert_eq!(info.byte_len(), 64 * 16 * 4);
    }

    #[test]
    fn thumbnail_preserves_aspect_ratio() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "landscape.png", 64, 32, [1, 2, 3, 255]);

        let thumb = ImageDecoder::new().decode_thumbnail(&path, 16).unwrap();
        assert_eq!((thumb.info.width, thumb.info.height), (16, 8));
    }

    #[test]
    fn scan_directory_lists_supported_files_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("c.png"), b"").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let listing = scan_directory(dir.path()).unwrap();
        let names: Vec<_> = listing
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.jpg", "c.png"]);
    }

    #[test]
    fn scan_missing_directory_errors() {
        assert!(scan_directory(Path::new("/definitely/not/here")).is_err());
    }
}
