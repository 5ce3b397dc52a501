//! User-facing configuration.

pub mod params;

pub use params::GrainParams;
