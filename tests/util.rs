#![allow(dead_code)]
use ldu_mesh::{
    algs::communicator::LocalComm,
    topology::{AddressingOptions, CellFaceGraph, CommId, Label},
};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Internal faces of an `nx × ny` structured grid (cell `i + nx*j`),
/// in upper-triangular order.
pub fn grid_faces(nx: usize, ny: usize) -> (Vec<Label>, Vec<Label>) {
    let id = |i: usize, j: usize| (i + nx * j) as Label;
    let mut faces = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            if i + 1 < nx {
                faces.push((id(i, j), id(i + 1, j)));
            }
            if j + 1 < ny {
                faces.push((id(i, j), id(i, j + 1)));
            }
        }
    }
    faces.sort_unstable();
    faces.into_iter().unzip()
}

/// Bare graph of an `nx × ny` grid.
pub fn grid(nx: usize, ny: usize) -> CellFaceGraph {
    let (l, u) = grid_faces(nx, ny);
    CellFaceGraph::from_host(0, nx * ny, &l, &u, CommId::WORLD, &AddressingOptions::default())
        .unwrap()
}

/// Bare graph of a line of `n` cells.
pub fn chain(n: usize) -> CellFaceGraph {
    let l: Vec<Label> = (0..n as Label - 1).collect();
    let u: Vec<Label> = (1..n as Label).collect();
    CellFaceGraph::from_host(0, n, &l, &u, CommId::WORLD, &AddressingOptions::default()).unwrap()
}

/// Shuffle faces with a fixed seed.
pub fn shuffled(lower: &[Label], upper: &[Label], seed: u64) -> (Vec<Label>, Vec<Label>) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut faces: Vec<(Label, Label)> = lower.iter().copied().zip(upper.iter().copied()).collect();
    faces.shuffle(&mut rng);
    faces.into_iter().unzip()
}

/// Two-rank in-process comms (ranks 0 and 1).
pub fn local_pair() -> (LocalComm, LocalComm) {
    let mut comms = LocalComm::group(2);
    let c1 = comms.pop().unwrap();
    let c0 = comms.pop().unwrap();
    (c0, c1)
}
