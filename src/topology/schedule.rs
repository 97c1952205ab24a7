//! Patch communication schedules.
//!
//! A schedule is the literal order in which a process initiates (`Send`) and
//! completes (`Receive`) the halo exchange of each available patch. Two
//! builders are provided:
//!
//! - [`build_non_blocking_schedule`]: every send is posted before the first
//!   receive is waited on, so computation can overlap communication and no
//!   process ever blocks while a peer waits on it.
//! - [`build_blocking_schedule`]: pairwise alternation for transports without
//!   buffering guarantees. Of two neighbouring ranks, the lower one sends
//!   first and the higher one receives first. Every rank visits its
//!   processor patches in ascending `(neighbour_rank, tag)` order, so all
//!   ranks walk the global list of rank pairs in the same order and no
//!   cycle of blocked ranks can form.

use serde::{Deserialize, Serialize};

use super::interface::{InterfaceKind, PatchInterface};
use crate::mesh_error::MeshError;

/// Phase of a patch exchange.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommsDirection {
    /// Initiate: post the outgoing halo values.
    Send,
    /// Complete: wait for the incoming halo values.
    Receive,
}

/// One step of a [`PatchSchedule`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub patch: usize,
    pub direction: CommsDirection,
}

impl ScheduleEntry {
    #[inline]
    pub fn send(patch: usize) -> Self {
        Self {
            patch,
            direction: CommsDirection::Send,
        }
    }

    #[inline]
    pub fn receive(patch: usize) -> Self {
        Self {
            patch,
            direction: CommsDirection::Receive,
        }
    }
}

/// Ordered list of patch operations executed by one process.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSchedule(Vec<ScheduleEntry>);

impl PatchSchedule {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Self(entries)
    }

    #[inline]
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleEntry> {
        self.0.iter()
    }

    /// Whether every send precedes every receive.
    pub fn is_non_blocking(&self) -> bool {
        let first_receive = self
            .0
            .iter()
            .position(|e| e.direction == CommsDirection::Receive)
            .unwrap_or(self.0.len());
        self.0[first_receive..]
            .iter()
            .all(|e| e.direction == CommsDirection::Receive)
    }

    /// Check that every available patch appears exactly once per direction
    /// and that no entry names a missing patch.
    pub fn validate(&self, interfaces: &[Option<PatchInterface>]) -> Result<(), MeshError> {
        let n = interfaces.len();
        let mut sent = vec![false; n];
        let mut received = vec![false; n];
        for (k, e) in self.0.iter().enumerate() {
            if e.patch >= n {
                return Err(MeshError::ScheduleInvalid(format!(
                    "entry {k} names patch {} but there are {n} patches",
                    e.patch
                )));
            }
            if interfaces[e.patch].is_none() {
                return Err(MeshError::ScheduleInvalid(format!(
                    "entry {k} names unavailable patch {}",
                    e.patch
                )));
            }
            let seen = match e.direction {
                CommsDirection::Send => &mut sent[e.patch],
                CommsDirection::Receive => &mut received[e.patch],
            };
            if *seen {
                return Err(MeshError::ScheduleInvalid(format!(
                    "patch {} scheduled twice for {:?}",
                    e.patch, e.direction
                )));
            }
            *seen = true;
        }
        for (patch, iface) in interfaces.iter().enumerate() {
            if iface.is_some() && !(sent[patch] && received[patch]) {
                return Err(MeshError::ScheduleInvalid(format!(
                    "patch {patch} missing from schedule"
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<ScheduleEntry> for PatchSchedule {
    fn from_iter<I: IntoIterator<Item = ScheduleEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PatchSchedule {
    type Item = &'a ScheduleEntry;
    type IntoIter = std::slice::Iter<'a, ScheduleEntry>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn available(interfaces: &[Option<PatchInterface>]) -> impl Iterator<Item = (usize, &PatchInterface)> + Clone {
    interfaces
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.as_ref().map(|p| (i, p)))
}

/// All sends in patch order, then all receives in patch order.
pub fn build_non_blocking_schedule(interfaces: &[Option<PatchInterface>]) -> PatchSchedule {
    let patches = available(interfaces);
    patches
        .clone()
        .map(|(i, _)| ScheduleEntry::send(i))
        .chain(patches.map(|(i, _)| ScheduleEntry::receive(i)))
        .collect()
}

/// Local patches first, then processor patches by `(neighbour_rank, tag)`;
/// per patch, send-then-receive or receive-then-send depending on which
/// side of the pair `my_rank` is.
pub fn build_blocking_schedule(
    interfaces: &[Option<PatchInterface>],
    my_rank: usize,
) -> PatchSchedule {
    let mut order: Vec<(usize, InterfaceKind)> =
        available(interfaces).map(|(i, iface)| (i, iface.kind())).collect();
    order.sort_by_key(|&(i, kind)| match kind {
        InterfaceKind::Local => (false, 0, 0, i),
        InterfaceKind::Processor { neighbour_rank, tag } => (true, neighbour_rank, tag, i),
    });

    let mut entries = Vec::with_capacity(2 * order.len());
    for (i, kind) in order {
        let receive_first = match kind {
            InterfaceKind::Processor { neighbour_rank, .. } => neighbour_rank < my_rank,
            InterfaceKind::Local => false,
        };
        if receive_first {
            entries.push(ScheduleEntry::receive(i));
            entries.push(ScheduleEntry::send(i));
        } else {
            entries.push(ScheduleEntry::send(i));
            entries.push(ScheduleEntry::receive(i));
        }
    }
    PatchSchedule(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procs(neighbours: &[Option<usize>]) -> Vec<Option<PatchInterface>> {
        neighbours
            .iter()
            .enumerate()
            .map(|(i, n)| n.map(|r| PatchInterface::processor(&[0], r, i as u16).unwrap()))
            .collect()
    }

    #[test]
    fn non_blocking_sends_first() {
        let ifaces = procs(&[Some(1), None, Some(2)]);
        let s = build_non_blocking_schedule(&ifaces);
        assert_eq!(
            s.entries(),
            &[
                ScheduleEntry::send(0),
                ScheduleEntry::send(2),
                ScheduleEntry::receive(0),
                ScheduleEntry::receive(2)
            ]
        );
        assert!(s.is_non_blocking());
        s.validate(&ifaces).unwrap();
    }

    #[test]
    fn blocking_alternates_by_rank() {
        let ifaces = procs(&[Some(0), Some(2)]);
        let s = build_blocking_schedule(&ifaces, 1);
        assert_eq!(
            s.entries(),
            &[
                ScheduleEntry::receive(0),
                ScheduleEntry::send(0),
                ScheduleEntry::send(1),
                ScheduleEntry::receive(1)
            ]
        );
        assert!(!s.is_non_blocking());
        s.validate(&ifaces).unwrap();
    }

    #[test]
    fn blocking_visits_neighbours_in_rank_order() {
        let mut ifaces = procs(&[Some(3), Some(0), None]);
        ifaces[2] = Some(PatchInterface::local(&[0]).unwrap());
        let s = build_blocking_schedule(&ifaces, 2);
        assert_eq!(
            s.entries(),
            &[
                ScheduleEntry::send(2),
                ScheduleEntry::receive(2),
                ScheduleEntry::receive(1),
                ScheduleEntry::send(1),
                ScheduleEntry::send(0),
                ScheduleEntry::receive(0)
            ]
        );
        s.validate(&ifaces).unwrap();
    }

    #[test]
    fn validate_rejects_bad_schedules() {
        let ifaces = procs(&[Some(1), None]);
        let twice = PatchSchedule::new(vec![
            ScheduleEntry::send(0),
            ScheduleEntry::send(0),
            ScheduleEntry::receive(0),
        ]);
        assert!(matches!(twice.validate(&ifaces), Err(MeshError::ScheduleInvalid(_))));
        let absent = PatchSchedule::new(vec![
            ScheduleEntry::send(0),
            ScheduleEntry::receive(0),
            ScheduleEntry::send(1),
        ]);
        assert!(absent.validate(&ifaces).is_err());
        let missing = PatchSchedule::new(vec![ScheduleEntry::send(0)]);
        assert!(missing.validate(&ifaces).is_err());
        let out_of_range = PatchSchedule::new(vec![ScheduleEntry::send(7)]);
        assert!(out_of_range.validate(&ifaces).is_err());
    }
}
