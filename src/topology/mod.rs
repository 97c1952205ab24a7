//! Topology module: cell/face addressing, patch interfaces and schedules.

pub mod addressing;
pub mod cell_faces;
pub mod interface;
pub mod options;
pub mod ordering;
pub mod schedule;

/// Cell or face index as stored in device memory.
pub type Label = i32;

/// Floating-point field value.
pub type Scalar = f64;

/// Opaque handle of the process group a graph belongs to. Informational:
/// halo exchange uses whichever communicator the caller passes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CommId(pub usize);

impl CommId {
    /// The group of all processes.
    pub const WORLD: CommId = CommId(0);
}

pub use addressing::CellFaceGraph;
pub use cell_faces::{CellFaces, CellRange};
pub use interface::{InterfaceKind, InterfaceList, PatchInterface};
pub use options::{AddressingOptions, DuplicateFaceHandling, ReorderPolicy};
pub use schedule::{
    CommsDirection, PatchSchedule, ScheduleEntry, build_blocking_schedule,
    build_non_blocking_schedule,
};
