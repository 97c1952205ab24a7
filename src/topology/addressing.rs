//! Upper-triangular cell/face addressing.
//!
//! [`CellFaceGraph`] is the connectivity of one mesh level: for every
//! internal face the owner (`lower`) and neighbour (`upper`) cell, with
//! `lower < upper` and faces sorted by `(lower, upper)`. The same arrays are
//! the sparsity pattern of the strictly upper triangle of the cell matrix.
//!
//! Construction is either
//! 1. bare ([`CellFaceGraph::new`], [`CellFaceGraph::from_host`]): input may
//!    be unsorted and is normalised; interfaces are attached once later with
//!    [`CellFaceGraph::add_interfaces`], or
//! 2. full ([`CellFaceGraph::with_interfaces`]): input must already be in
//!    upper-triangular order, interfaces are attached immediately.
//!
//! When normalisation reorders faces, the permutation is kept
//! ([`CellFaceGraph::face_permutation`]); owners of other face-indexed data
//! must apply it themselves ([`CellFaceGraph::permute_face_values`]).

use super::cell_faces::CellFaces;
use super::interface::{InterfaceList, PatchInterface};
use super::options::{AddressingOptions, ReorderPolicy};
use super::ordering::{
    check_cell_bounds, check_duplicate_faces, check_sorted, check_upper_triangular,
    first_unsorted_face, permute_in_place, upper_tri_order,
};
use super::schedule::PatchSchedule;
use super::{CommId, Label};
use crate::data::{DeviceBuffer, DualBuffer};
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;

/// Connectivity of one mesh level.
#[derive(Debug)]
pub struct CellFaceGraph {
    level: usize,
    n_cells: usize,
    lower: DualBuffer<Label>,
    upper: DualBuffer<Label>,
    /// `None` until interfaces are attached.
    interfaces: Option<InterfaceList>,
    /// First boundary face of each patch (absent patches get the running
    /// offset with zero faces).
    patch_starts: Vec<usize>,
    schedule: PatchSchedule,
    comm: CommId,
    cell_faces: CellFaces,
    face_permutation: Option<Vec<usize>>,
}

impl CellFaceGraph {
    /// Bare construction, reusing `lower`/`upper` storage in place.
    pub fn new(
        level: usize,
        n_cells: usize,
        mut lower: DeviceBuffer<Label>,
        mut upper: DeviceBuffer<Label>,
        comm: CommId,
        opts: &AddressingOptions,
    ) -> Result<Self, MeshError> {
        Self::check_input(n_cells, &lower, &upper, opts)?;

        let face_permutation =
            match first_unsorted_face(lower.device_slice(), upper.device_slice()) {
                None => None,
                Some(_) if opts.reorder == ReorderPolicy::Reject => {
                    check_sorted(lower.device_slice(), upper.device_slice())?;
                    None
                }
                Some(face) => {
                    let order = upper_tri_order(lower.device_slice(), upper.device_slice());
                    permute_in_place(lower.device_slice_mut(), &order);
                    permute_in_place(upper.device_slice_mut(), &order);
                    log::debug!(
                        "level {level}: reordered {} faces to upper-triangular order (first unsorted face {face})",
                        order.len()
                    );
                    Some(order)
                }
            };

        let (l, u) = (lower.device_slice(), upper.device_slice());
        check_upper_triangular(l, u)?;
        check_duplicate_faces(l, u, opts.duplicate_faces)?;
        let cell_faces = CellFaces::build(n_cells, l, u, std::iter::empty::<&[Label]>())?;

        let graph = Self {
            level,
            n_cells,
            lower: DualBuffer::new(lower),
            upper: DualBuffer::new(upper),
            interfaces: None,
            patch_starts: Vec::new(),
            schedule: PatchSchedule::default(),
            comm,
            cell_faces,
            face_permutation,
        };
        graph.debug_assert_invariants();
        Ok(graph)
    }

    /// Bare construction, copying host addressing.
    pub fn from_host(
        level: usize,
        n_cells: usize,
        lower: &[Label],
        upper: &[Label],
        comm: CommId,
        opts: &AddressingOptions,
    ) -> Result<Self, MeshError> {
        Self::new(
            level,
            n_cells,
            DeviceBuffer::from_host(lower)?,
            DeviceBuffer::from_host(upper)?,
            comm,
            opts,
        )
    }

    /// Full construction from addressing that is already upper-triangular.
    #[allow(clippy::too_many_arguments)]
    pub fn with_interfaces(
        level: usize,
        n_cells: usize,
        lower: DeviceBuffer<Label>,
        upper: DeviceBuffer<Label>,
        interfaces: InterfaceList,
        schedule: PatchSchedule,
        comm: CommId,
        opts: &AddressingOptions,
    ) -> Result<Self, MeshError> {
        check_sorted(lower.device_slice(), upper.device_slice())?;
        let mut graph = Self::new(level, n_cells, lower, upper, comm, opts)?;
        graph.attach(interfaces, schedule)?;
        Ok(graph)
    }

    fn check_input(
        n_cells: usize,
        lower: &DeviceBuffer<Label>,
        upper: &DeviceBuffer<Label>,
        opts: &AddressingOptions,
    ) -> Result<(), MeshError> {
        if lower.len() != upper.len() {
            return Err(MeshError::AddressingLengthMismatch {
                lower: lower.len(),
                upper: upper.len(),
            });
        }
        if opts.check_cell_bounds {
            check_cell_bounds(n_cells, lower.device_slice(), upper.device_slice())?;
        }
        Ok(())
    }

    /// Attach patch interfaces and their evaluation schedule.
    ///
    /// Allowed exactly once per graph; a second call, or a call on a graph
    /// built with [`with_interfaces`](Self::with_interfaces), fails with
    /// [`MeshError::InterfacesAlreadyAttached`].
    pub fn add_interfaces(
        &mut self,
        interfaces: InterfaceList,
        schedule: PatchSchedule,
    ) -> Result<(), MeshError> {
        self.attach(interfaces, schedule)
    }

    fn attach(&mut self, interfaces: InterfaceList, schedule: PatchSchedule) -> Result<(), MeshError> {
        if self.interfaces.is_some() {
            return Err(MeshError::InterfacesAlreadyAttached { level: self.level });
        }
        schedule.validate(&interfaces)?;

        let n_internal = self.n_internal_faces();
        let mut patch_starts = Vec::with_capacity(interfaces.len());
        let mut next = n_internal;
        for iface in &interfaces {
            patch_starts.push(next);
            next += iface.as_ref().map_or(0, PatchInterface::size);
        }

        let boundary = interfaces
            .iter()
            .flatten()
            .map(|p| p.face_cells().device_slice());
        self.cell_faces = CellFaces::build(
            self.n_cells,
            self.lower.device().device_slice(),
            self.upper.device().device_slice(),
            boundary,
        )?;

        log::debug!(
            "level {}: attached {} interfaces ({} available, {} boundary faces)",
            self.level,
            interfaces.len(),
            interfaces.iter().flatten().count(),
            next - n_internal
        );
        self.interfaces = Some(interfaces);
        self.patch_starts = patch_starts;
        self.schedule = schedule;
        self.debug_assert_invariants();
        Ok(())
    }

    // --- access ---------------------------------------------------------------

    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    #[inline]
    pub fn comm(&self) -> CommId {
        self.comm
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    #[inline]
    pub fn n_internal_faces(&self) -> usize {
        self.lower.len()
    }

    /// Internal faces plus the faces of every available patch.
    pub fn n_faces(&self) -> usize {
        self.n_internal_faces()
            + self
                .interfaces()
                .iter()
                .flatten()
                .map(PatchInterface::size)
                .sum::<usize>()
    }

    /// Lower (owner) addressing, device-resident.
    #[inline]
    pub fn lower_addr(&self) -> &DeviceBuffer<Label> {
        self.lower.device()
    }

    /// Upper (neighbour) addressing, device-resident.
    #[inline]
    pub fn upper_addr(&self) -> &DeviceBuffer<Label> {
        self.upper.device()
    }

    /// Lower addressing, host mirror.
    #[inline]
    pub fn lower_addr_host(&self) -> &[Label] {
        self.lower.host()
    }

    /// Upper addressing, host mirror.
    #[inline]
    pub fn upper_addr_host(&self) -> &[Label] {
        self.upper.host()
    }

    /// Whether interfaces have been attached.
    #[inline]
    pub fn has_interfaces(&self) -> bool {
        self.interfaces.is_some()
    }

    /// Attached interfaces (empty before attachment).
    pub fn interfaces(&self) -> &[Option<PatchInterface>] {
        self.interfaces.as_deref().unwrap_or(&[])
    }

    #[inline]
    pub fn n_patches(&self) -> usize {
        self.interfaces().len()
    }

    /// Whether patch `i` has a local interface.
    pub fn patch_available(&self, i: usize) -> bool {
        matches!(self.interfaces().get(i), Some(Some(_)))
    }

    /// Interface of patch `i`.
    pub fn interface(&self, i: usize) -> Result<&PatchInterface, MeshError> {
        match self.interfaces().get(i) {
            Some(Some(iface)) => Ok(iface),
            Some(None) => Err(MeshError::PatchUnavailable(i)),
            None => Err(MeshError::PatchOutOfRange {
                patch: i,
                n_patches: self.n_patches(),
            }),
        }
    }

    /// Face-cell list of patch `i`, device-resident.
    pub fn patch_addr(&self, i: usize) -> Result<&DeviceBuffer<Label>, MeshError> {
        self.interface(i).map(PatchInterface::face_cells)
    }

    /// Face-cell list of patch `i`, host mirror.
    pub fn patch_addr_host(&self, i: usize) -> Result<&[Label], MeshError> {
        self.interface(i).map(PatchInterface::face_cells_host)
    }

    /// Global index of the first boundary face of patch `i`.
    pub fn patch_start(&self, i: usize) -> Result<usize, MeshError> {
        self.patch_starts
            .get(i)
            .copied()
            .ok_or(MeshError::PatchOutOfRange {
                patch: i,
                n_patches: self.n_patches(),
            })
    }

    #[inline]
    pub fn patch_schedule(&self) -> &PatchSchedule {
        &self.schedule
    }

    /// Cell → face incidence index.
    #[inline]
    pub fn cell_faces(&self) -> &CellFaces {
        &self.cell_faces
    }

    /// `order[new_face] = old_face` if construction reordered the faces.
    pub fn face_permutation(&self) -> Option<&[usize]> {
        self.face_permutation.as_deref()
    }

    /// Apply the construction-time face permutation to the internal-face part
    /// of a face-indexed array. A no-op when no reordering took place.
    pub fn permute_face_values<T: Copy>(&self, values: &mut [T]) -> Result<(), MeshError> {
        let n = self.n_internal_faces();
        if values.len() < n {
            return Err(MeshError::FaceFieldLength {
                expected: n,
                found: values.len(),
            });
        }
        if let Some(order) = &self.face_permutation {
            permute_in_place(values, order);
        }
        Ok(())
    }
}

impl DebugInvariants for CellFaceGraph {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        let (l, u) = (self.lower.device().device_slice(), self.upper.device().device_slice());
        check_upper_triangular(l, u)?;
        check_sorted(l, u)?;
        let expected = 2 * self.n_internal_faces() + (self.n_faces() - self.n_internal_faces());
        if self.cell_faces.n_incidences() != expected || self.cell_faces.n_cells() != self.n_cells {
            return Err(MeshError::IncidenceMismatch {
                expected,
                found: self.cell_faces.n_incidences(),
                n_cells: self.n_cells,
                found_cells: self.cell_faces.n_cells(),
            });
        }
        Ok(())
    }
}
