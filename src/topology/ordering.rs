//! Upper-triangular face ordering.
//!
//! A face list is in upper-triangular order when every face has
//! `lower < upper` and the `(lower, upper)` pairs are non-decreasing in face
//! order. This is the row-major sparsity pattern of the strictly upper part
//! of the cell matrix.

use itertools::Itertools;

use super::Label;
use super::options::DuplicateFaceHandling;
use crate::mesh_error::MeshError;

/// Permutation that sorts faces by `(lower, upper)`.
///
/// `order[new_face] = old_face`. The sort is stable, so faces with identical
/// cell pairs keep their relative input order and the result is a pure
/// function of the input.
pub fn upper_tri_order(lower: &[Label], upper: &[Label]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..lower.len()).collect();
    order.sort_by_key(|&f| (lower[f], upper[f]));
    order
}

/// First face whose pair sorts before its predecessor, if any.
pub fn first_unsorted_face(lower: &[Label], upper: &[Label]) -> Option<usize> {
    lower
        .iter()
        .zip(upper)
        .tuple_windows()
        .position(|((l0, u0), (l1, u1))| (l1, u1) < (l0, u0))
        .map(|i| i + 1)
}

/// Whether the pairs are already in `(lower, upper)` order.
#[inline]
pub fn is_upper_tri_sorted(lower: &[Label], upper: &[Label]) -> bool {
    first_unsorted_face(lower, upper).is_none()
}

/// Ensure `lower[f] < upper[f]` for every face.
pub fn check_upper_triangular(lower: &[Label], upper: &[Label]) -> Result<(), MeshError> {
    match lower.iter().zip(upper).position(|(l, u)| l >= u) {
        Some(face) => Err(MeshError::NotUpperTriangular {
            face,
            lower: lower[face],
            upper: upper[face],
        }),
        None => Ok(()),
    }
}

/// Ensure the pairs are sorted.
pub fn check_sorted(lower: &[Label], upper: &[Label]) -> Result<(), MeshError> {
    match first_unsorted_face(lower, upper) {
        Some(face) => Err(MeshError::FacesNotSorted {
            face,
            lower: lower[face],
            upper: upper[face],
        }),
        None => Ok(()),
    }
}

/// Ensure every cell index lies in `0..n_cells`.
pub fn check_cell_bounds(n_cells: usize, lower: &[Label], upper: &[Label]) -> Result<(), MeshError> {
    for (face, (&l, &u)) in lower.iter().zip(upper).enumerate() {
        for cell in [l, u] {
            if usize::try_from(cell).map_or(true, |c| c >= n_cells) {
                return Err(MeshError::CellOutOfRange {
                    face,
                    cell,
                    n_cells,
                });
            }
        }
    }
    Ok(())
}

/// Apply the duplicate-face policy to sorted addressing.
pub fn check_duplicate_faces(
    lower: &[Label],
    upper: &[Label],
    handling: DuplicateFaceHandling,
) -> Result<(), MeshError> {
    if handling == DuplicateFaceHandling::Ignore {
        return Ok(());
    }
    let dups = lower
        .iter()
        .zip(upper)
        .enumerate()
        .tuple_windows()
        .filter(|((_, a), (_, b))| a == b);
    for ((first, (&l, &u)), (second, _)) in dups {
        match handling {
            DuplicateFaceHandling::Warn => {
                log::warn!("Duplicate faces {first} and {second} between cells ({l}, {u})");
            }
            DuplicateFaceHandling::Error => {
                return Err(MeshError::DuplicateFace {
                    first,
                    second,
                    lower: l,
                    upper: u,
                });
            }
            DuplicateFaceHandling::Ignore => {}
        }
    }
    Ok(())
}

/// Reorder the first `order.len()` entries of `values` so that
/// `values[new] = old_values[order[new]]`.
pub fn permute_in_place<T: Copy>(values: &mut [T], order: &[usize]) {
    let permuted: Vec<T> = order.iter().map(|&old| values[old]).collect();
    values[..order.len()].copy_from_slice(&permuted);
}
