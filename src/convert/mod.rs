//! SIMD-accelerated pixel buffer conversion.
//!
//! Converts buffers of 32-bit pixels between staging and output buffers
//! using the widest vector instruction set the CPU offers: AVX2 moves
//! 8 pixels per iteration, SSE4.2 moves 4, and anything the vector loop
//! cannot cover falls back to a byte-wise copy. The conversion is
//! currently an identity transform; the loop bodies are where per-pixel
//! work (gamma, color correction) goes when it lands, without changing
//! the chunking or fallback structure.
//!
//! Every tier produces output byte-identical to a plain copy.

use std::sync::OnceLock;

mod scalar;
#[cfg(target_arch = "x86_64")]
mod x86;

/// Size of one pixel in bytes (32-bit BGRA).
pub const BYTES_PER_PIXEL: usize = 4;

/// Vector instruction tier used for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdTier {
    /// AVX2, 8 pixels per iteration.
    Avx2,
    /// SSE4.2, 4 pixels per iteration.
    Sse42,
    /// Plain byte-wise copy.
    Scalar,
}

/// CPU vector capabilities, probed once per process.
#[derive(Debug, Clone, Copy)]
struct CpuFeatures {
    avx2: bool,
    sse42: bool,
}

static CPU_FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

#[cfg(target_arch = "x86_64")]
fn probe_cpu_features() -> CpuFeatures {
    // Each tier is checked independently: a CPU can lack AVX2 but still
    // have SSE4.2, or lack both.
    CpuFeatures {
        avx2: is_x86_feature_detected!("avx2"),
        sse42: is_x86_feature_detected!("sse4.2"),
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn probe_cpu_features() -> CpuFeatures {
    CpuFeatures {
        avx2: false,
        sse42: false,
    }
}

fn cpu_features() -> CpuFeatures {
    *CPU_FEATURES.get_or_init(probe_cpu_features)
}

/// Returns the widest conversion tier supported by this CPU.
///
/// The probe runs once; subsequent calls return the cached result.
pub fn detected_tier() -> SimdTier {
    let features = cpu_features();
    if features.avx2 {
        SimdTier::Avx2
    } else if features.sse42 {
        SimdTier::Sse42
    } else {
        SimdTier::Scalar
    }
}

/// Convert `pixel_count` pixels from `src` into `dst` using the widest
/// supported instruction set.
///
/// # Panics
///
/// Panics if either slice is shorter than `pixel_count * BYTES_PER_PIXEL`.
pub fn convert_pixels(dst: &mut [u8], src: &[u8], pixel_count: usize) {
    convert_pixels_with(detected_tier(), dst, src, pixel_count);
}

/// Convert with an explicitly requested tier.
///
/// A tier the CPU does not support degrades to the next narrower one
/// (AVX2 falls back to SSE4.2, SSE4.2 to the byte-wise copy), so forcing
/// a tier is always safe. Output is byte-identical regardless of which
/// tier ends up executing.
pub fn convert_pixels_with(tier: SimdTier, dst: &mut [u8], src: &[u8], pixel_count: usize) {
    let byte_len = pixel_count * BYTES_PER_PIXEL;
    assert!(
        src.len() >= byte_len,
        "source buffer too small: {} < {}",
        src.len(),
        byte_len
    );
    assert!(
        dst.len() >= byte_len,
        "destination buffer too small: {} < {}",
        dst.len(),
        byte_len
    );

    if pixel_count == 0 {
        return;
    }

    match resolve_tier(tier) {
        #[cfg(target_arch = "x86_64")]
        // SAFETY: resolve_tier only returns Avx2 when the probe saw AVX2.
        SimdTier::Avx2 => unsafe { x86::convert_avx2(dst, src, pixel_count) },
        #[cfg(target_arch = "x86_64")]
        // SAFETY: resolve_tier only returns Sse42 when the probe saw SSE4.2.
        SimdTier::Sse42 => unsafe { x86::convert_sse42(dst, src, pixel_count) },
        _ => scalar::convert(dst, src, pixel_count),
    }
}

/// Degrade a requested tier to the widest one the CPU actually supports.
fn resolve_tier(requested: SimdTier) -> SimdTier {
    let features = cpu_features();
    match requested {
        SimdTier::Avx2 if features.avx2 => SimdTier::Avx2,
        SimdTier::Avx2 if features.sse42 => SimdTier::Sse42,
        SimdTier::Sse42 if features.sse42 => SimdTier::Sse42,
        _ => SimdTier::Scalar,
    }
}
