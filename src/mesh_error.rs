//! MeshError: Unified error type for ldu-mesh public APIs
//!
//! Every fallible operation in this crate returns `Result<_, MeshError>`.
//! Variants fall into three groups: structural faults in the supplied
//! connectivity, protocol misuse by the caller, and device resource faults.
//! None of them is retried internally.

use thiserror::Error;

use crate::topology::Label;

/// Unified error type for ldu-mesh operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    // --- structural faults -------------------------------------------------
    /// `lower` and `upper` addressing have different lengths.
    #[error("Addressing length mismatch: lower has {lower} faces, upper has {upper}")]
    AddressingLengthMismatch { lower: usize, upper: usize },
    /// A face references a cell outside `0..n_cells`.
    #[error("Face {face} references cell {cell} outside 0..{n_cells}")]
    CellOutOfRange {
        face: usize,
        cell: Label,
        n_cells: usize,
    },
    /// A face has `lower >= upper`.
    #[error("Face {face} is not upper-triangular: lower={lower}, upper={upper}")]
    NotUpperTriangular {
        face: usize,
        lower: Label,
        upper: Label,
    },
    /// Face `face` sorts before its predecessor in `(lower, upper)` order.
    #[error("Face {face} ({lower}, {upper}) is out of upper-triangular order")]
    FacesNotSorted {
        face: usize,
        lower: Label,
        upper: Label,
    },
    /// Two faces connect the same pair of cells.
    #[error("Faces {first} and {second} both connect cells ({lower}, {upper})")]
    DuplicateFace {
        first: usize,
        second: usize,
        lower: Label,
        upper: Label,
    },

    /// The cell→face incidence index does not match the addressing it was
    /// built from.
    #[error("Incidence index covers {found_cells} cells with {found} entries, expected {n_cells} cells with {expected}")]
    IncidenceMismatch {
        expected: usize,
        found: usize,
        n_cells: usize,
        found_cells: usize,
    },
    /// A face or incidence index does not fit in a [`Label`].
    #[error("Index {0} does not fit in a 32-bit label")]
    LabelOverflow(usize),

    // --- protocol misuse ---------------------------------------------------
    /// `add_interfaces` was called on a graph that already has interfaces.
    #[error("Interfaces already attached to level-{level} addressing")]
    InterfacesAlreadyAttached { level: usize },
    /// The patch has no local interface (it lives on another process).
    #[error("Patch {0} is not available on this process")]
    PatchUnavailable(usize),
    /// The patch index is outside `0..n_patches`.
    #[error("Patch {patch} out of range (n_patches = {n_patches})")]
    PatchOutOfRange { patch: usize, n_patches: usize },
    /// A schedule does not list every available patch once per direction.
    #[error("Invalid patch schedule: {0}")]
    ScheduleInvalid(String),
    /// Field boundary classification does not match the mesh patches.
    #[error("Field has {found} boundary patches, mesh has {expected}")]
    PatchCountMismatch { expected: usize, found: usize },
    /// A face-indexed array is shorter than the internal face count.
    #[error("Face field has {found} entries, at least {expected} required")]
    FaceFieldLength { expected: usize, found: usize },
    /// A cell-indexed array does not have one entry per cell.
    #[error("Cell field has {found} entries, mesh has {expected} cells")]
    CellFieldLength { expected: usize, found: usize },
    /// A cache region extends beyond the backing buffer.
    #[error("Cache region [{offset}, {offset}+{count}) exceeds buffer of {len} elements")]
    CacheRegionOutOfRange {
        offset: usize,
        count: usize,
        len: usize,
    },
    /// A host/device transfer range extends beyond the buffer.
    #[error("Transfer [{offset}, {offset}+{len}) exceeds device buffer of {size} elements")]
    TransferOutOfRange {
        offset: usize,
        len: usize,
        size: usize,
    },

    // --- resource faults ---------------------------------------------------
    /// Device memory could not be allocated.
    #[error("Device allocation of {elements} elements ({bytes} bytes) failed")]
    DeviceAllocation { elements: usize, bytes: usize },

    // --- halo exchange -----------------------------------------------------
    /// Received halo data does not match the patch size.
    #[error("Halo exchange on patch {patch}: expected {expected} values, got {found}")]
    HaloSizeMismatch {
        patch: usize,
        expected: usize,
        found: usize,
    },
    /// A receive completed without data.
    #[error("Halo exchange on patch {patch}: no data received from rank {peer}")]
    HaloReceiveFailed { patch: usize, peer: usize },
}
