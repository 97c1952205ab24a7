//! Outlet-stabilised interpolation.
//!
//! [`BoundaryStabilizedScheme`] wraps any [`InterpolationScheme`] and
//! switches the internal faces next to outflow-type patches to upwind
//! interpolation. For every patch whose field condition
//! [`stabilises_weights`](PatchFieldKind::stabilises_weights), the weight of
//! each internal face incident to a patch cell becomes `1` where the face
//! flux is positive and `0` otherwise. For patches that
//! [`stabilise_correction`](PatchFieldKind::stabilises_correction), the
//! explicit correction at those faces is zeroed.
//!
//! Boundary faces keep the base scheme's values.

use bytemuck::Pod;
use num_traits::Zero;

use super::field::{PatchFieldKind, VolField};
use super::scheme::InterpolationScheme;
use crate::algs::scatter::{FaceScatter, UpwindWeights, ZeroValue, scatter_patch};
use crate::data::DeviceBuffer;
use crate::mesh_error::MeshError;
use crate::topology::{CellFaceGraph, Scalar};

/// Upwind-near-boundary decorator over a base scheme `S`.
#[derive(Debug)]
pub struct BoundaryStabilizedScheme<'m, S> {
    graph: &'m CellFaceGraph,
    face_flux: &'m DeviceBuffer<Scalar>,
    base: S,
}

impl<'m, S> BoundaryStabilizedScheme<'m, S> {
    /// `face_flux` must cover at least the internal faces of `graph`.
    pub fn new(
        graph: &'m CellFaceGraph,
        face_flux: &'m DeviceBuffer<Scalar>,
        base: S,
    ) -> Result<Self, MeshError> {
        if face_flux.len() < graph.n_internal_faces() {
            return Err(MeshError::FaceFieldLength {
                expected: graph.n_internal_faces(),
                found: face_flux.len(),
            });
        }
        Ok(Self {
            graph,
            face_flux,
            base,
        })
    }

    #[inline]
    pub fn base(&self) -> &S {
        &self.base
    }

    #[inline]
    pub fn graph(&self) -> &'m CellFaceGraph {
        self.graph
    }

    #[inline]
    pub fn face_flux(&self) -> &'m DeviceBuffer<Scalar> {
        self.face_flux
    }

    pub fn into_base(self) -> S {
        self.base
    }

    /// Patches selected by `select`, checked against the graph.
    fn selected_patches(
        &self,
        kinds: &[PatchFieldKind],
        select: fn(PatchFieldKind) -> bool,
    ) -> Result<Vec<usize>, MeshError> {
        if kinds.len() != self.graph.n_patches() {
            return Err(MeshError::PatchCountMismatch {
                expected: self.graph.n_patches(),
                found: kinds.len(),
            });
        }
        kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| select(**k))
            .map(|(patch, _)| self.graph.interface(patch).map(|_| patch))
            .collect()
    }

    fn scatter_patches<T, F>(&self, patches: &[usize], target: &mut [T], functor: &F) -> Result<(), MeshError>
    where
        T: Send,
        F: FaceScatter<T>,
    {
        for &patch in patches {
            let n = scatter_patch(self.graph, patch, target, functor)?;
            log::trace!("patch {patch}: stabilised {n} near-boundary faces");
        }
        Ok(())
    }
}

impl<T, S> InterpolationScheme<T> for BoundaryStabilizedScheme<'_, S>
where
    T: Pod + Zero + Send,
    S: InterpolationScheme<T>,
{
    fn weights(&self, field: &VolField<T>) -> Result<DeviceBuffer<Scalar>, MeshError> {
        let patches = self.selected_patches(field.patch_kinds(), PatchFieldKind::stabilises_weights)?;
        let mut w = self.base.weights(field)?;
        let upwind = UpwindWeights::new(self.face_flux);
        self.scatter_patches(&patches, w.device_slice_mut(), &upwind)?;
        Ok(w)
    }

    fn corrected(&self) -> bool {
        self.base.corrected()
    }

    fn correction(&self, field: &VolField<T>) -> Result<Option<DeviceBuffer<T>>, MeshError> {
        if !self.base.corrected() {
            return Ok(None);
        }
        let patches =
            self.selected_patches(field.patch_kinds(), PatchFieldKind::stabilises_correction)?;
        let Some(mut corr) = self.base.correction(field)? else {
            return Ok(None);
        };
        self.scatter_patches(&patches, corr.device_slice_mut(), &ZeroValue)?;
        Ok(Some(corr))
    }
}
