//! Face interpolation schemes.
//!
//! - [`InterpolationScheme`]: weights plus optional explicit correction.
//! - [`Linear`]: fixed geometric weights.
//! - [`BoundaryStabilizedScheme`]: upwinds the faces next to outflow patches
//!   of any base scheme.

pub mod field;
pub mod linear;
pub mod scheme;
pub mod stabilised;

pub use field::{PatchFieldKind, VolField};
pub use linear::Linear;
pub use scheme::InterpolationScheme;
pub use stabilised::BoundaryStabilizedScheme;
