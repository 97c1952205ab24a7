//! Re-export public algorithms.

pub mod communicator;
pub mod halo;
pub mod launch;
pub mod scatter;

pub use halo::exchange_patch_values;
pub use scatter::{FaceScatter, FnScatter, UpwindWeights, ZeroValue, scatter_boundary_cells, scatter_patch};
