//! Thin façade over intra-process (mailbox) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable**: `isend` returns after posting, `irecv`
//! returns immediately and the data is only trusted after `.wait()`.
//! The halo executor in [`crate::algs::halo`] decides when to wait, following
//! the patch schedule.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Non-blocking communication interface (minimal by design).
pub trait Communicator: Send + Sync + 'static {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    /// Post `buf` to `peer` under `tag`.
    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive from `peer` under `tag`, expecting `len` bytes.
    ///
    /// The handle yields the whole message as sent; callers compare its
    /// length against `len` themselves.
    fn irecv(&self, peer: usize, tag: u16, len: usize) -> Self::RecvHandle;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Single-process comm: every send is dropped and every receive is empty.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _len: usize) {}

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
}

// --- LocalComm: intra-process / multi-thread ---
type Key = (u64, usize, usize, u16); // (group, src, dst, tag)

/// Messages on one key are delivered in send order.
static MAILBOX: Lazy<DashMap<Key, VecDeque<Bytes>>> = Lazy::new(DashMap::new);
static NEXT_GROUP: AtomicU64 = AtomicU64::new(1);

/// Pending receive on a [`LocalComm`] mailbox.
#[derive(Debug)]
pub struct LocalHandle {
    key: Key,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        loop {
            let next = MAILBOX.get_mut(&self.key).and_then(|mut q| q.pop_front());
            if let Some(bytes) = next {
                MAILBOX.remove_if(&self.key, |_, q| q.is_empty());
                return Some(bytes.to_vec());
            }
            std::thread::yield_now();
        }
    }
}

/// Ranks simulated as threads of one process, exchanging through a shared
/// mailbox. Each group created by [`LocalComm::group`] is isolated from
/// every other group.
#[derive(Clone, Debug)]
pub struct LocalComm {
    group: u64,
    rank: usize,
    size: usize,
}

impl LocalComm {
    /// One handle per rank of a fresh group of `size` ranks.
    pub fn group(size: usize) -> Vec<LocalComm> {
        let group = NEXT_GROUP.fetch_add(1, Ordering::Relaxed);
        (0..size).map(|rank| LocalComm { group, rank, size }).collect()
    }
}

impl Communicator for LocalComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        let key = (self.group, self.rank, peer, tag);
        MAILBOX
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, _len: usize) -> LocalHandle {
        LocalHandle {
            key: (self.group, peer, self.rank, tag),
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::environment::Universe;
    use mpi::point_to_point::{Destination, Source};
    use mpi::topology::{Communicator as _, SimpleCommunicator};
    use std::sync::Arc;

    /// World communicator of an initialised MPI environment.
    #[derive(Clone)]
    pub struct MpiComm {
        _universe: Arc<Universe>,
        world: Arc<SimpleCommunicator>,
        rank: usize,
        size: usize,
    }

    // SAFETY: the controlling thread is the only caller of MPI routines.
    unsafe impl Send for MpiComm {}
    unsafe impl Sync for MpiComm {}

    impl MpiComm {
        /// Initialise MPI; `None` if it was already initialised.
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Some(Self {
                _universe: Arc::new(universe),
                world: Arc::new(world),
                rank,
                size,
            })
        }
    }

    /// Posted send; owns the message buffer until completion.
    pub struct MpiSendHandle(Box<dyn FnOnce()>);

    impl Wait for MpiSendHandle {
        fn wait(self) -> Option<Vec<u8>> {
            (self.0)();
            None
        }
    }

    /// Deferred receive, completed by `wait`.
    pub struct MpiRecvHandle {
        world: Arc<SimpleCommunicator>,
        peer: i32,
        tag: i32,
    }

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            let (data, _status) = self
                .world
                .process_at_rank(self.peer)
                .receive_vec_with_tag::<u8>(self.tag);
            Some(data)
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSendHandle;
        type RecvHandle = MpiRecvHandle;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSendHandle {
            let owned: &'static mut [u8] = Box::leak(buf.to_vec().into_boxed_slice());
            let raw: *mut [u8] = owned;
            // SAFETY: `raw` is freshly leaked and only reclaimed after the
            // request completes inside the returned closure.
            let msg: &'static [u8] = unsafe { &*raw };
            let req = self.world.process_at_rank(peer as i32).immediate_send_with_tag(
                mpi::request::StaticScope,
                msg,
                i32::from(tag),
            );
            MpiSendHandle(Box::new(move || {
                req.wait();
                // SAFETY: the request has completed; nothing references the buffer.
                drop(unsafe { Box::from_raw(raw) });
            }))
        }

        fn irecv(&self, peer: usize, tag: u16, _len: usize) -> MpiRecvHandle {
            MpiRecvHandle {
                world: Arc::clone(&self.world),
                peer: peer as i32,
                tag: i32::from(tag),
            }
        }

        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
