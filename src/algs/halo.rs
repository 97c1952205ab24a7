//! Halo exchange of boundary-cell values driven by the patch schedule.
//!
//! For each entry of [`CellFaceGraph::patch_schedule`], in order:
//! - `Send` gathers the values of the patch face-cells and posts them to the
//!   neighbour rank (processor patches only);
//! - `Receive` waits for the neighbour's values (processor patches) or
//!   copies the local gathered values (local patches).
//!
//! All sends are waited on after the schedule has run.

use crate::algs::communicator::{Communicator, Wait};
use crate::mesh_error::MeshError;
use crate::topology::{CellFaceGraph, CommsDirection, InterfaceKind, Scalar};

/// Per-patch halo values: `None` for patches not available locally.
pub type PatchValues = Vec<Option<Vec<Scalar>>>;

fn gather(face_cells: &[crate::topology::Label], cell_values: &[Scalar]) -> Vec<Scalar> {
    face_cells.iter().map(|&c| cell_values[c as usize]).collect()
}

/// Exchange the boundary-cell values of every available patch.
///
/// `cell_values` must hold one entry per cell. On return, entry `p` holds
/// the values adjacent to patch `p` as seen from the other side: the
/// neighbour's face-cell values for processor patches, this side's own for
/// local patches.
///
/// Messages travel over `comm` alone. The graph's
/// [`CommId`](crate::topology::CommId) only labels the process group the
/// addressing was built for and is not checked against `comm`.
pub fn exchange_patch_values<C: Communicator>(
    graph: &CellFaceGraph,
    cell_values: &[Scalar],
    comm: &C,
) -> Result<PatchValues, MeshError> {
    if cell_values.len() != graph.n_cells() {
        return Err(MeshError::CellFieldLength {
            expected: graph.n_cells(),
            found: cell_values.len(),
        });
    }

    let mut received: PatchValues = vec![None; graph.n_patches()];
    let mut pending = Vec::new();

    for entry in graph.patch_schedule() {
        let iface = graph.interface(entry.patch)?;
        match (entry.direction, iface.kind()) {
            (CommsDirection::Send, InterfaceKind::Processor { neighbour_rank, tag }) => {
                let values = gather(iface.face_cells_host(), cell_values);
                log::trace!(
                    "rank {}: send {} values on patch {} to rank {neighbour_rank}",
                    comm.rank(),
                    values.len(),
                    entry.patch
                );
                pending.push(comm.isend(neighbour_rank, tag, bytemuck::cast_slice(&values)));
            }
            (CommsDirection::Send, InterfaceKind::Local) => {}
            (CommsDirection::Receive, InterfaceKind::Processor { neighbour_rank, tag }) => {
                let expected = iface.size();
                let bytes = comm
                    .irecv(
                        neighbour_rank,
                        tag,
                        expected * std::mem::size_of::<Scalar>(),
                    )
                    .wait()
                    .ok_or(MeshError::HaloReceiveFailed {
                        patch: entry.patch,
                        peer: neighbour_rank,
                    })?;
                if bytes.len() != expected * std::mem::size_of::<Scalar>() {
                    return Err(MeshError::HaloSizeMismatch {
                        patch: entry.patch,
                        expected,
                        found: bytes.len() / std::mem::size_of::<Scalar>(),
                    });
                }
                received[entry.patch] = Some(
                    bytes
                        .chunks_exact(std::mem::size_of::<Scalar>())
                        .map(bytemuck::pod_read_unaligned)
                        .collect(),
                );
            }
            (CommsDirection::Receive, InterfaceKind::Local) => {
                received[entry.patch] = Some(gather(iface.face_cells_host(), cell_values));
            }
        }
    }

    for handle in pending {
        let _ = handle.wait();
    }
    Ok(received)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::topology::interface::PatchInterface;
    use crate::topology::{AddressingOptions, CommId, build_non_blocking_schedule};

    #[test]
    fn local_patches_see_own_values() {
        let mut g =
            CellFaceGraph::from_host(0, 3, &[0, 1], &[1, 2], CommId::WORLD, &AddressingOptions::default())
                .unwrap();
        let ifaces = vec![None, Some(PatchInterface::local(&[2, 0]).unwrap())];
        let s = build_non_blocking_schedule(&ifaces);
        g.add_interfaces(ifaces, s).unwrap();

        let out = exchange_patch_values(&g, &[1.0, 2.0, 3.0], &NoComm).unwrap();
        assert_eq!(out, vec![None, Some(vec![3.0, 1.0])]);
    }

    #[test]
    fn graph_comm_id_does_not_select_the_transport() {
        let mut g =
            CellFaceGraph::from_host(0, 2, &[0], &[1], CommId(7), &AddressingOptions::default())
                .unwrap();
        let ifaces = vec![Some(PatchInterface::local(&[1]).unwrap())];
        let s = build_non_blocking_schedule(&ifaces);
        g.add_interfaces(ifaces, s).unwrap();
        assert_eq!(g.comm(), CommId(7));
        let out = exchange_patch_values(&g, &[4.0, 5.0], &NoComm).unwrap();
        assert_eq!(out, vec![Some(vec![5.0])]);
    }

    #[test]
    fn wrong_cell_count_is_rejected() {
        let g = CellFaceGraph::from_host(0, 2, &[0], &[1], CommId::WORLD, &AddressingOptions::default())
            .unwrap();
        let err = exchange_patch_values(&g, &[1.0], &NoComm).unwrap_err();
        assert_eq!(err, MeshError::CellFieldLength { expected: 2, found: 1 });
    }

    #[test]
    fn missing_peer_data_is_reported() {
        let mut g = CellFaceGraph::from_host(0, 2, &[0], &[1], CommId::WORLD, &AddressingOptions::default())
            .unwrap();
        let ifaces = vec![Some(PatchInterface::processor(&[1], 1, 5).unwrap())];
        let s = build_non_blocking_schedule(&ifaces);
        g.add_interfaces(ifaces, s).unwrap();
        let err = exchange_patch_values(&g, &[0.0, 1.0], &NoComm).unwrap_err();
        assert_eq!(err, MeshError::HaloReceiveFailed { patch: 0, peer: 1 });
    }
}
