//! Core building blocks shared by every stage of the grain pipeline.
//!
//! - hash   - stateless integer hash feeding all random draws
//! - simd   - execution strategy selected once per processor
//! - plane  - strided float planes (input luminance, output grain)
//! - error  - configuration errors

pub mod error;
pub mod hash;
pub mod plane;
pub mod simd;

pub use error::GrainError;
pub use plane::{PlaneMut, PlaneRef};
pub use simd::{CpuCaps, SimdLevel};
