//! Grain Engine - physically-based film grain synthesis in WASM
//!
//! Every output pixel is the fraction of reconstruction-kernel sample
//! points covered by at least one disc of a Boolean grain model whose
//! density follows the input luminance.
//!
//! Architecture:
//! - core/        - Hashing, planes, SIMD strategy, errors
//! - domain/      - Filter parameters
//! - systems/     - RNG, kernel, density field
//! - spatial/     - Grain cells and the sliding cell cache
//! - simulation/  - Two-pass synthesizer, dispatch, processor, JS facade

pub mod core;
pub mod domain;
pub mod spatial;
pub mod systems;
pub mod simulation;

use wasm_bindgen::prelude::*;

// Thread pool initialization for the rayon dispatcher in the browser
#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
pub use wasm_bindgen_rayon::init_thread_pool;

// Better error messages in debug mode
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the engine
#[wasm_bindgen]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    web_sys::console::log_1(&"Grain engine initialized".into());
}

/// Get engine version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Re-export main types
pub use crate::core::{CpuCaps, GrainError, PlaneMut, PlaneRef, SimdLevel};
pub use domain::GrainParams;
pub use simulation::{FrameStats, GrainFilter, GrainProcessor, GrainSynthesizer, TaskDispatcher};
pub use systems::kernel::ReconstructionKernel;
