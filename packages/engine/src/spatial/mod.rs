//! Spatial storage for grain cells.
//!
//! - cell  - grains of one source pixel and the intersection tests
//! - cache - per-worker toroidal window over the cells

pub mod cache;
pub mod cell;

pub use cache::{CacheStats, CellWindowCache};
pub use cell::{CellProvider, GrainCell, GrainRadius};
