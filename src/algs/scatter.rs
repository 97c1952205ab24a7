//! Boundary-cell scatter passes.
//!
//! Given the face-cell list of a boundary patch, a scatter pass visits every
//! listed cell's face block in the incidence index and updates the entries
//! of a face-indexed array at the *internal* faces found there (index below
//! `n_internal_faces`). The boundary faces themselves are never touched.
//!
//! The pass runs in two kernels: the first marks reachable internal faces
//! (one task per boundary cell), the second updates every marked face
//! (one task per face). Two boundary cells sharing an internal face
//! therefore still produce exactly one update of that face.

use std::sync::atomic::{AtomicBool, Ordering};

use num_traits::Zero;

use super::launch;
use crate::data::{DeviceBuffer, ReadCache};
use crate::mesh_error::MeshError;
use crate::topology::{CellFaceGraph, Label, Scalar};

/// Element-wise update applied to one face entry.
pub trait FaceScatter<T>: Sync {
    fn apply(&self, face: usize, value: &mut T);

    /// Number of face entries the functor reads from, if it reads any.
    /// A scatter pass rejects functors that cannot cover every internal face.
    fn input_len(&self) -> Option<usize> {
        None
    }
}

/// `1` where the face flux is positive, `0` otherwise (zero flux gives `0`).
#[inline]
pub fn upwind_indicator(flux: Scalar) -> Scalar {
    if flux > 0.0 { 1.0 } else { 0.0 }
}

/// Sets each weight to the upwind indicator of the face flux.
#[derive(Debug)]
pub struct UpwindWeights<'a> {
    flux: ReadCache<'a, Scalar>,
}

impl<'a> UpwindWeights<'a> {
    pub fn new(face_flux: &'a DeviceBuffer<Scalar>) -> Self {
        Self {
            flux: ReadCache::bind(face_flux),
        }
    }
}

impl FaceScatter<Scalar> for UpwindWeights<'_> {
    #[inline]
    fn apply(&self, face: usize, w: &mut Scalar) {
        *w = upwind_indicator(self.flux.fetch(face));
    }

    fn input_len(&self) -> Option<usize> {
        Some(self.flux.count())
    }
}

/// Sets each value to zero.
#[derive(Copy, Clone, Debug, Default)]
pub struct ZeroValue;

impl<T: Zero> FaceScatter<T> for ZeroValue {
    #[inline]
    fn apply(&self, _face: usize, value: &mut T) {
        *value = T::zero();
    }
}

/// Adapter for closure updates.
pub struct FnScatter<F>(pub F);

impl<T, F> FaceScatter<T> for FnScatter<F>
where
    F: Fn(usize, &mut T) + Sync,
{
    #[inline]
    fn apply(&self, face: usize, value: &mut T) {
        (self.0)(face, value)
    }
}

/// Scatter `functor` over the internal faces incident to `face_cells`.
///
/// Returns the number of distinct internal faces updated.
pub fn scatter_boundary_cells<T, S>(
    graph: &CellFaceGraph,
    face_cells: &DeviceBuffer<Label>,
    target: &mut [T],
    functor: &S,
) -> Result<usize, MeshError>
where
    T: Send,
    S: FaceScatter<T>,
{
    let n_internal = graph.n_internal_faces();
    if target.len() < n_internal {
        return Err(MeshError::FaceFieldLength {
            expected: n_internal,
            found: target.len(),
        });
    }
    if let Some(found) = functor.input_len().filter(|&len| len < n_internal) {
        return Err(MeshError::FaceFieldLength {
            expected: n_internal,
            found,
        });
    }
    let n_cells = graph.n_cells();
    if let Some((k, &cell)) = face_cells
        .device_slice()
        .iter()
        .enumerate()
        .find(|(_, c)| usize::try_from(**c).map_or(true, |c| c >= n_cells))
    {
        return Err(MeshError::CellOutOfRange {
            face: k,
            cell,
            n_cells,
        });
    }

    let cells = ReadCache::bind(face_cells);
    let faces = ReadCache::bind(graph.cell_faces().faces());
    let ranges = graph.cell_faces().ranges().device_slice();
    let marks: Vec<AtomicBool> = (0..n_internal).map(|_| AtomicBool::new(false)).collect();

    launch::for_each_index(cells.count(), |k| {
        let range = ranges[cells.fetch(k) as usize];
        for i in range.start()..range.start() + range.len() {
            let face = faces.fetch(i) as usize;
            if face < n_internal {
                marks[face].store(true, Ordering::Relaxed);
            }
        }
    });

    launch::for_each_mut(&mut target[..n_internal], |face, value| {
        if marks[face].load(Ordering::Relaxed) {
            functor.apply(face, value);
        }
    });

    let touched = marks.iter().filter(|m| m.load(Ordering::Relaxed)).count();
    log::trace!(
        "scatter over {} boundary cells updated {touched} internal faces",
        cells.count()
    );
    cells.destroy();
    faces.destroy();
    Ok(touched)
}

/// Scatter over the boundary cells of patch `patch`.
pub fn scatter_patch<T, S>(
    graph: &CellFaceGraph,
    patch: usize,
    target: &mut [T],
    functor: &S,
) -> Result<usize, MeshError>
where
    T: Send,
    S: FaceScatter<T>,
{
    let face_cells = graph.patch_addr(patch)?;
    scatter_boundary_cells(graph, face_cells, target, functor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{AddressingOptions, CommId, build_non_blocking_schedule};
    use crate::topology::interface::PatchInterface;

    fn chain(n: usize) -> CellFaceGraph {
        let lower: Vec<Label> = (0..n as Label - 1).collect();
        let upper: Vec<Label> = (1..n as Label).collect();
        CellFaceGraph::from_host(0, n, &lower, &upper, CommId::WORLD, &AddressingOptions::default())
            .unwrap()
    }

    #[test]
    fn indicator_treats_zero_as_non_positive() {
        assert_eq!(upwind_indicator(2.0), 1.0);
        assert_eq!(upwind_indicator(0.0), 0.0);
        assert_eq!(upwind_indicator(-0.0), 0.0);
        assert_eq!(upwind_indicator(-1.0), 0.0);
    }

    #[test]
    fn scatter_skips_boundary_faces() {
        let mut g = chain(3);
        let ifaces = vec![Some(PatchInterface::local(&[2]).unwrap())];
        let s = build_non_blocking_schedule(&ifaces);
        g.add_interfaces(ifaces, s).unwrap();

        // face 2 is the boundary face of cell 2; only internal face 1 is reachable
        let mut w = vec![0.5; g.n_faces()];
        let n = scatter_patch(&g, 0, &mut w, &FnScatter(|_f: usize, v: &mut f64| *v = 7.0)).unwrap();
        assert_eq!(n, 1);
        assert_eq!(w, vec![0.5, 7.0, 0.5]);
    }

    #[test]
    fn shared_face_is_updated_once() {
        let g = chain(3);
        let cells = DeviceBuffer::from_host(&[0, 1]).unwrap();
        let mut counts = vec![0u32; g.n_internal_faces()];
        let n = scatter_boundary_cells(&g, &cells, &mut counts, &FnScatter(|_f: usize, c: &mut u32| *c += 1))
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(counts, vec![1, 1]);
    }

    #[test]
    fn short_target_is_rejected() {
        let g = chain(4);
        let cells = DeviceBuffer::from_host(&[3]).unwrap();
        let mut w = vec![0.0; 2];
        let err = scatter_boundary_cells(&g, &cells, &mut w, &ZeroValue).unwrap_err();
        assert_eq!(err, MeshError::FaceFieldLength { expected: 3, found: 2 });
    }

    #[test]
    fn short_flux_is_rejected_before_launch() {
        let mut g = chain(3);
        let ifaces = vec![Some(PatchInterface::local(&[2]).unwrap())];
        let s = build_non_blocking_schedule(&ifaces);
        g.add_interfaces(ifaces, s).unwrap();

        let flux = DeviceBuffer::from_host(&[1.0]).unwrap();
        let mut w = vec![0.5; g.n_faces()];
        let err = scatter_patch(&g, 0, &mut w, &UpwindWeights::new(&flux)).unwrap_err();
        assert_eq!(err, MeshError::FaceFieldLength { expected: 2, found: 1 });
        assert_eq!(w, vec![0.5; 3]);
    }

    #[test]
    fn bad_cell_is_rejected() {
        let g = chain(2);
        let cells = DeviceBuffer::from_host(&[0, 9]).unwrap();
        let mut w = vec![1.0; 1];
        assert!(matches!(
            scatter_boundary_cells(&g, &cells, &mut w, &ZeroValue),
            Err(MeshError::CellOutOfRange { face: 1, cell: 9, .. })
        ));
    }
}
