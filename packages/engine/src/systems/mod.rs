//! Numeric stages of the grain model.
//!
//! - prng     - counter-based random draws (scalar and 4-lane)
//! - kernel   - reconstruction kernel sample points
//! - density  - per-pixel grain counts and row costs (pass 1)

pub mod density;
pub mod kernel;
pub mod prng;
