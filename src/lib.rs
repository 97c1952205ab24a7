#![cfg_attr(docsrs, feature(doc_cfg))]
//! # ldu-mesh
//!
//! ldu-mesh is the connectivity and device-data layer of a finite-volume
//! solver. It stores the cell/face graph of each mesh level in
//! upper-triangular (LDU) form, keeps face-indexed data on the accelerator,
//! and updates faces next to boundary patches in bulk.
//!
//! ## Features
//! - [`CellFaceGraph`](topology::CellFaceGraph): owner/neighbour addressing
//!   normalised to upper-triangular order, a cell→face incidence index, and
//!   boundary patch interfaces with their communication schedule
//! - [`DeviceBuffer`](data::DeviceBuffer) / [`DualBuffer`](data::DualBuffer):
//!   device-resident arrays with explicit transfers and a lazily synchronised
//!   host mirror
//! - [`ReadCache`](data::ReadCache): read-only cached view over a device buffer,
//!   with 64-bit floats carried as two 32-bit words
//! - Scatter passes over the internal faces adjacent to a patch, and the
//!   [`BoundaryStabilizedScheme`](interpolation::BoundaryStabilizedScheme)
//!   interpolation decorator built on them
//! - Halo exchange over pluggable communication backends (serial, threads, MPI)
//!
//! ## Execution model
//!
//! The accelerator is simulated on the host. Kernels launch one independent
//! task per element; with the `rayon` feature they run on the global thread
//! pool, otherwise serially. Results never depend on task order.
//!
//! ## Usage
//! Add `ldu-mesh` as a dependency in your `Cargo.toml` and enable features as needed:
//!
//! ```toml
//! [dependencies]
//! ldu-mesh = "0.3"
//! # Optional features:
//! # features = ["rayon", "mpi-support"]
//! ```
//!
//! ```
//! use ldu_mesh::prelude::*;
//!
//! let graph = CellFaceGraph::from_host(
//!     0,
//!     3,
//!     &[1, 0],
//!     &[2, 1],
//!     CommId::WORLD,
//!     &AddressingOptions::default(),
//! )?;
//! assert_eq!(graph.lower_addr_host(), &[0, 1]);
//! assert_eq!(graph.upper_addr_host(), &[1, 2]);
//! # Ok::<(), ldu_mesh::mesh_error::MeshError>(())
//! ```

// Re-export our major subsystems:
pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod interpolation;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{Communicator, LocalComm, NoComm, Wait};
    pub use crate::algs::halo::exchange_patch_values;
    pub use crate::algs::scatter::{
        FaceScatter, FnScatter, UpwindWeights, ZeroValue, scatter_boundary_cells, scatter_patch,
    };
    pub use crate::data::{DeviceBuffer, DualBuffer, ReadCache, Vector, VectorSpace};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::interpolation::{
        BoundaryStabilizedScheme, InterpolationScheme, Linear, PatchFieldKind, VolField,
    };
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::{
        AddressingOptions, CellFaceGraph, CommId, InterfaceKind, InterfaceList, Label,
        PatchInterface, PatchSchedule, Scalar, build_blocking_schedule,
        build_non_blocking_schedule,
    };
}
