//! Execution strategy selection.
//!
//! Capability detection lives with the host; the engine only receives the
//! two flags and picks a strategy once, at construction.

/// CPU capabilities reported by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuCaps {
    /// 4-wide f32 vectors (SSE2 / NEON / wasm simd128)
    pub simd4: bool,
    /// 8-wide f32 vectors (AVX)
    pub simd8: bool,
}

impl CpuCaps {
    pub fn new(simd4: bool, simd8: bool) -> Self {
        Self { simd4, simd8 }
    }

    /// Scalar-only host.
    pub fn none() -> Self {
        Self::default()
    }

    /// Flags implied by the compilation target features.
    pub fn from_target() -> Self {
        let simd4 = cfg!(any(
            target_feature = "sse2",
            target_feature = "neon",
            target_feature = "simd128"
        ));
        let simd8 = cfg!(target_feature = "avx");
        Self { simd4, simd8 }
    }
}

/// Closed set of numeric code paths.
///
/// All three produce the same grain counts structure and the same
/// intersection booleans; the vector paths only differ from the scalar
/// one by float rounding in transcendental functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimdLevel {
    Scalar,
    Vector4,
    Vector8,
}

impl SimdLevel {
    /// The widest path the host supports. 8-wide needs the 4-wide path too,
    /// since grain cells and densities are still generated 4 lanes at a time.
    pub fn from_caps(caps: CpuCaps) -> Self {
        match (caps.simd4, caps.simd8) {
            (true, true) => SimdLevel::Vector8,
            (true, false) => SimdLevel::Vector4,
            _ => SimdLevel::Scalar,
        }
    }

    /// Generation (density, cell building) uses the batched RNG.
    #[inline]
    pub fn batched_generation(self) -> bool {
        self != SimdLevel::Scalar
    }

    pub fn name(self) -> &'static str {
        match self {
            SimdLevel::Scalar => "scalar",
            SimdLevel::Vector4 => "vector4",
            SimdLevel::Vector8 => "vector8",
        }
    }
}
