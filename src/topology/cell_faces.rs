//! Cell → face incidence index.
//!
//! CSR layout over cells: `ranges[c]` gives the contiguous block of
//! `faces` incident to cell `c`. Within a block the owned internal faces
//! come first, then the neighboured internal faces, then boundary faces,
//! each group in ascending face order. Both arrays live in device memory so
//! scatter kernels can walk them directly.

use bytemuck::{Pod, Zeroable};

use super::Label;
use crate::data::DeviceBuffer;
use crate::mesh_error::MeshError;

/// Start and length of one cell's face block.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct CellRange {
    pub start: Label,
    pub n_faces: Label,
}

impl CellRange {
    #[inline]
    pub fn start(&self) -> usize {
        self.start as usize
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n_faces as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_faces == 0
    }
}

/// Immutable cell → face incidence.
#[derive(Debug)]
pub struct CellFaces {
    ranges: DeviceBuffer<CellRange>,
    faces: DeviceBuffer<Label>,
}

fn cell_index(cell: Label, face: usize, n_cells: usize) -> Result<usize, MeshError> {
    usize::try_from(cell)
        .ok()
        .filter(|&c| c < n_cells)
        .ok_or(MeshError::CellOutOfRange {
            face,
            cell,
            n_cells,
        })
}

fn to_label(v: usize) -> Result<Label, MeshError> {
    Label::try_from(v).map_err(|_| MeshError::LabelOverflow(v))
}

impl CellFaces {
    /// Build from internal-face addressing plus boundary face-cell lists.
    ///
    /// Boundary faces are numbered from `lower.len()` upwards in the order
    /// the lists are given.
    pub fn build<'b>(
        n_cells: usize,
        lower: &[Label],
        upper: &[Label],
        boundary: impl IntoIterator<Item = &'b [Label]> + Clone,
    ) -> Result<Self, MeshError> {
        let n_internal = lower.len();

        // 1) degree counts
        let mut degree = vec![0usize; n_cells];
        for (face, &cell) in lower.iter().chain(upper).enumerate() {
            degree[cell_index(cell, face % n_internal.max(1), n_cells)?] += 1;
        }
        let mut n_boundary = 0usize;
        for face_cells in boundary.clone() {
            for &cell in face_cells {
                degree[cell_index(cell, n_internal + n_boundary, n_cells)?] += 1;
                n_boundary += 1;
            }
        }
        // face numbers and CSR offsets below are stored as labels
        to_label(n_internal + n_boundary)?;

        // prefix sums
        let mut offsets = vec![0usize; n_cells + 1];
        for c in 0..n_cells {
            offsets[c + 1] = offsets[c] + degree[c];
        }
        let total = offsets[n_cells];
        to_label(total)?;

        // 2) fill owned, neighboured, then boundary faces
        let mut faces = vec![0 as Label; total];
        let mut cursor = offsets.clone();
        let mut push = |cell: Label, face: usize| {
            let c = cell as usize;
            faces[cursor[c]] = face as Label;
            cursor[c] += 1;
        };
        for (face, &cell) in lower.iter().enumerate() {
            push(cell, face);
        }
        for (face, &cell) in upper.iter().enumerate() {
            push(cell, face);
        }
        let mut face = n_internal;
        for face_cells in boundary {
            for &cell in face_cells {
                push(cell, face);
                face += 1;
            }
        }

        let ranges: Vec<CellRange> = offsets
            .windows(2)
            .map(|w| CellRange {
                start: w[0] as Label,
                n_faces: (w[1] - w[0]) as Label,
            })
            .collect();

        Ok(Self {
            ranges: DeviceBuffer::reuse(ranges),
            faces: DeviceBuffer::reuse(faces),
        })
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.ranges.len()
    }

    /// Face block of `cell`.
    #[inline]
    pub fn range(&self, cell: usize) -> CellRange {
        self.ranges.device_slice()[cell]
    }

    /// Incident faces of `cell`.
    pub fn faces_of(&self, cell: usize) -> &[Label] {
        let r = self.range(cell);
        &self.faces.device_slice()[r.start()..r.start() + r.len()]
    }

    #[inline]
    pub fn ranges(&self) -> &DeviceBuffer<CellRange> {
        &self.ranges
    }

    #[inline]
    pub fn faces(&self) -> &DeviceBuffer<Label> {
        &self.faces
    }

    /// Total number of (cell, face) incidences.
    #[inline]
    pub fn n_incidences(&self) -> usize {
        self.faces.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_with_boundary() {
        // 0 -f0- 1 -f1- 2, boundary face on cell 2
        let cf = CellFaces::build(3, &[0, 1], &[1, 2], [&[2][..]]).unwrap();
        assert_eq!(cf.faces_of(0), &[0]);
        assert_eq!(cf.faces_of(1), &[1, 0]);
        assert_eq!(cf.faces_of(2), &[1, 2]);
        assert_eq!(cf.n_incidences(), 5);
        assert_eq!(cf.range(2), CellRange { start: 3, n_faces: 2 });
    }

    #[test]
    fn bad_boundary_cell_is_rejected() {
        let err = CellFaces::build(2, &[0], &[1], [&[5][..]]).unwrap_err();
        assert_eq!(
            err,
            MeshError::CellOutOfRange {
                face: 1,
                cell: 5,
                n_cells: 2
            }
        );
    }

    #[test]
    fn labels_beyond_i32_are_refused() {
        assert_eq!(to_label(Label::MAX as usize), Ok(Label::MAX));
        let too_big = Label::MAX as usize + 1;
        assert_eq!(to_label(too_big), Err(MeshError::LabelOverflow(too_big)));
    }

    #[test]
    fn isolated_cell_has_empty_range() {
        let cf = CellFaces::build(3, &[0], &[1], std::iter::empty::<&[Label]>()).unwrap();
        assert!(cf.range(2).is_empty());
        assert!(cf.faces_of(2).is_empty());
    }
}
