//! x86_64 vector conversion tiers.
//!
//! Both tiers are straight load/transform/store loops; today the transform
//! is the identity. The scalar path handles whatever does not fill a full
//! vector chunk.

use super::{scalar, BYTES_PER_PIXEL};

/// AVX2 tier: 8 pixels (32 bytes) per iteration.
///
/// # Safety
///
/// Caller must have verified AVX2 support.
#[target_feature(enable = "avx2")]
pub(super) unsafe fn convert_avx2(dst: &mut [u8], src: &[u8], pixel_count: usize) {
    use std::arch::x86_64::{__m256i, _mm256_loadu_si256, _mm256_storeu_si256};

    const PIXELS_PER_CHUNK: usize = 8;

    let mut i = 0;
    while i + PIXELS_PER_CHUNK <= pixel_count {
        let offset = i * BYTES_PER_PIXEL;
        let data = _mm256_loadu_si256(src.as_ptr().add(offset) as *const __m256i);
        // Per-pixel transforms (gamma, color correction) apply here.
        _mm256_storeu_si256(dst.as_mut_ptr().add(offset) as *mut __m256i, data);
        i += PIXELS_PER_CHUNK;
    }

    if i < pixel_count {
        let offset = i * BYTES_PER_PIXEL;
        scalar::convert(&mut dst[offset..], &src[offset..], pixel_count - i);
    }
}

/// SSE4.2 tier: 4 pixels (16 bytes) per iteration.
///
/// # Safety
///
/// Caller must have verified SSE4.2 support.
#[target_feature(enable = "sse4.2")]
pub(super) unsafe fn convert_sse42(dst: &mut [u8], src: &[u8], pixel_count: usize) {
    use std::arch::x86_64::{__m128i, _mm_loadu_si128, _mm_storeu_si128};

    const PIXELS_PER_CHUNK: usize = 4;

    let mut i = 0;
    while i + PIXELS_PER_CHUNK <= pixel_count {
        let offset = i * BYTES_PER_PIXEL;
        let data = _mm_loadu_si128(src.as_ptr().add(offset) as *const __m128i);
        _mm_storeu_si128(dst.as_mut_ptr().add(offset) as *mut __m128i, data);
        i += PIXELS_PER_CHUNK;
    }

    if i < pixel_count {
        let offset = i * BYTES_PER_PIXEL;
        scalar::convert(&mut dst[offset..], &src[offset..], pixel_count - i);
    }
}
