//! Boundary patch interfaces.
//!
//! Each boundary patch that is present on this process carries a
//! [`PatchInterface`] with the list of cells adjacent to its faces. Patches
//! whose faces are owned elsewhere are represented by `None` in an
//! [`InterfaceList`].

use super::Label;
use crate::data::{DeviceBuffer, DualBuffer};
use crate::mesh_error::MeshError;

/// Whether a patch couples to another process.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum InterfaceKind {
    /// Boundary or coupling resolved on this process.
    Local,
    /// Halo exchange with `neighbour_rank`, matched on `tag` by both sides.
    Processor { neighbour_rank: usize, tag: u16 },
}

/// Face-cell addressing of one boundary patch.
#[derive(Debug)]
pub struct PatchInterface {
    face_cells: DualBuffer<Label>,
    kind: InterfaceKind,
}

/// Per-patch interfaces; `None` marks a patch not available locally.
pub type InterfaceList = Vec<Option<PatchInterface>>;

impl PatchInterface {
    pub fn new(face_cells: DeviceBuffer<Label>, kind: InterfaceKind) -> Self {
        Self {
            face_cells: DualBuffer::new(face_cells),
            kind,
        }
    }

    /// Local patch from host face-cells (copied).
    pub fn local(face_cells: &[Label]) -> Result<Self, MeshError> {
        Ok(Self {
            face_cells: DualBuffer::from_host(face_cells)?,
            kind: InterfaceKind::Local,
        })
    }

    /// Processor patch from host face-cells (copied).
    pub fn processor(
        face_cells: &[Label],
        neighbour_rank: usize,
        tag: u16,
    ) -> Result<Self, MeshError> {
        Ok(Self {
            face_cells: DualBuffer::from_host(face_cells)?,
            kind: InterfaceKind::Processor {
                neighbour_rank,
                tag,
            },
        })
    }

    /// Device-resident face-cell list.
    #[inline]
    pub fn face_cells(&self) -> &DeviceBuffer<Label> {
        self.face_cells.device()
    }

    /// Host mirror of the face-cell list.
    #[inline]
    pub fn face_cells_host(&self) -> &[Label] {
        self.face_cells.host()
    }

    /// Number of faces on the patch.
    #[inline]
    pub fn size(&self) -> usize {
        self.face_cells.len()
    }

    #[inline]
    pub fn kind(&self) -> InterfaceKind {
        self.kind
    }

    #[inline]
    pub fn is_processor(&self) -> bool {
        matches!(self.kind, InterfaceKind::Processor { .. })
    }

    pub fn neighbour_rank(&self) -> Option<usize> {
        match self.kind {
            InterfaceKind::Processor { neighbour_rank, .. } => Some(neighbour_rank),
            InterfaceKind::Local => None,
        }
    }
}
