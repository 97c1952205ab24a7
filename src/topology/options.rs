//! Construction options for [`CellFaceGraph`](super::CellFaceGraph).

use serde::{Deserialize, Serialize};

/// What to do with face pairs that are not in `(lower, upper)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReorderPolicy {
    /// Compute the upper-triangular permutation and apply it.
    Sort,
    /// Fail with [`MeshError::FacesNotSorted`](crate::mesh_error::MeshError::FacesNotSorted).
    Reject,
}

/// Behavior for faces that connect the same pair of cells twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateFaceHandling {
    /// Accept silently.
    Ignore,
    /// Log a warning and accept.
    Warn,
    /// Return an error.
    Error,
}

/// Validation and normalisation toggles for addressing construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressingOptions {
    /// Ensure every face references cells inside `0..n_cells`.
    pub check_cell_bounds: bool,
    /// How to treat unsorted face pairs.
    pub reorder: ReorderPolicy,
    /// How to treat duplicate cell pairs.
    pub duplicate_faces: DuplicateFaceHandling,
}

impl Default for AddressingOptions {
    fn default() -> Self {
        Self {
            check_cell_bounds: true,
            reorder: ReorderPolicy::Sort,
            duplicate_faces: DuplicateFaceHandling::Warn,
        }
    }
}

impl AddressingOptions {
    /// Require pre-sorted, duplicate-free input.
    pub fn strict() -> Self {
        Self {
            check_cell_bounds: true,
            reorder: ReorderPolicy::Reject,
            duplicate_faces: DuplicateFaceHandling::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_roundtrip_through_json() {
        let opts = AddressingOptions::strict();
        let json = serde_json::to_string(&opts).unwrap();
        let back: AddressingOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, opts);
    }
}
