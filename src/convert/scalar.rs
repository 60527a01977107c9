//! Byte-wise fallback conversion path.

use super::BYTES_PER_PIXEL;

/// Copy `pixel_count` pixels byte-for-byte.
///
/// The reference behavior every vector tier must match.
pub(super) fn convert(dst: &mut [u8], src: &[u8], pixel_count: usize) {
    let byte_len = pixel_count * BYTES_PER_PIXEL;
    dst[..byte_len].copy_from_slice(&src[..byte_len]);
}
