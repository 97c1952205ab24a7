//! Read-only cached views over linear device memory.
//!
//! A [`ReadCache`] is the analogue of a hardware texture object bound to a
//! linear buffer: kernels fetch elements by index through a 32-bit word
//! channel instead of dereferencing the buffer directly. Each element type
//! carries a [`ChannelFormat`] and a decode rule:
//!
//! | type  | channel              | decode                                  |
//! |-------|----------------------|-----------------------------------------|
//! | `f32` | one float word       | as-is                                   |
//! | `i32` | one signed word      | as-is                                   |
//! | `f64` | two signed words     | `(hi << 32) \| lo`, low word fetched first |
//!
//! The `f64` reconstruction is bit-exact, including signed zero, subnormals,
//! infinities and NaN payloads.
//!
//! # Lifetime
//! A cache borrows the [`DeviceBuffer`] it is bound to, so it can never
//! outlive it and the buffer cannot be written or freed while bound. There is
//! no unbound state: fetch-before-bind and fetch-after-destroy do not
//! type-check. [`ReadCache::rebind`] releases the current handle before
//! binding the next region.

use core::fmt::{self, Debug};
use core::marker::PhantomData;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bytemuck::Pod;
use static_assertions::const_assert_eq;

use super::device_buffer::DeviceBuffer;
use crate::mesh_error::MeshError;

const_assert_eq!(core::mem::size_of::<f64>(), 2 * core::mem::size_of::<u32>());
const_assert_eq!(core::mem::size_of::<f32>(), core::mem::size_of::<u32>());
const_assert_eq!(core::mem::size_of::<i32>(), core::mem::size_of::<u32>());

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);
static LIVE_HANDLES: AtomicUsize = AtomicUsize::new(0);

/// Channel interpretation of the 32-bit words.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Float,
    Signed,
}

/// Per-type channel layout of a cached element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChannelFormat {
    pub kind: ChannelKind,
    /// Number of 32-bit words per element.
    pub words: usize,
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for i32 {}
    impl Sealed for f64 {}
}

/// Element types that can be fetched through a [`ReadCache`].
pub trait CacheElement: Pod + sealed::Sealed {
    const FORMAT: ChannelFormat;

    /// Rebuild one element from its `FORMAT.words` words, in memory order.
    fn decode(words: &[u32]) -> Self;
}

impl CacheElement for f32 {
    const FORMAT: ChannelFormat = ChannelFormat {
        kind: ChannelKind::Float,
        words: 1,
    };

    #[inline]
    fn decode(words: &[u32]) -> Self {
        f32::from_bits(words[0])
    }
}

impl CacheElement for i32 {
    const FORMAT: ChannelFormat = ChannelFormat {
        kind: ChannelKind::Signed,
        words: 1,
    };

    #[inline]
    fn decode(words: &[u32]) -> Self {
        words[0] as i32
    }
}

impl CacheElement for f64 {
    const FORMAT: ChannelFormat = ChannelFormat {
        kind: ChannelKind::Signed,
        words: 2,
    };

    #[inline]
    fn decode(words: &[u32]) -> Self {
        let (lo, hi) = if cfg!(target_endian = "little") {
            (words[0], words[1])
        } else {
            (words[1], words[0])
        };
        hilo_to_f64(hi, lo)
    }
}

/// Compose an `f64` from its high and low 32-bit halves.
#[inline]
pub fn hilo_to_f64(hi: u32, lo: u32) -> f64 {
    f64::from_bits((u64::from(hi) << 32) | u64::from(lo))
}

/// Split an `f64` into its `(hi, lo)` 32-bit halves.
#[inline]
pub fn f64_to_hilo(v: f64) -> (u32, u32) {
    let bits = v.to_bits();
    ((bits >> 32) as u32, bits as u32)
}

/// Opaque identifier of a bound cache object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheHandle(u64);

impl CacheHandle {
    fn acquire() -> Self {
        LIVE_HANDLES.fetch_add(1, Ordering::Relaxed);
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    fn release(self) {
        LIVE_HANDLES.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Read-only cached view of `count` elements of a device buffer.
pub struct ReadCache<'a, T: CacheElement> {
    words: &'a [u32],
    count: usize,
    handle: CacheHandle,
    _pd: PhantomData<T>,
}

impl<T: CacheElement> Debug for ReadCache<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadCache")
            .field("handle", &self.handle)
            .field("count", &self.count)
            .field("format", &T::FORMAT)
            .finish()
    }
}

impl<'a, T: CacheElement> ReadCache<'a, T> {
    fn region_words(
        buffer: &'a DeviceBuffer<T>,
        offset: usize,
        count: usize,
    ) -> Result<&'a [u32], MeshError> {
        let region = offset
            .checked_add(count)
            .and_then(|end| buffer.device_slice().get(offset..end))
            .ok_or(MeshError::CacheRegionOutOfRange {
                offset,
                count,
                len: buffer.len(),
            })?;
        Ok(bytemuck::cast_slice(region))
    }

    /// Bind a cache over the whole buffer.
    pub fn bind(buffer: &'a DeviceBuffer<T>) -> Self {
        let words: &'a [u32] = bytemuck::cast_slice(buffer.device_slice());
        Self::from_words(words, buffer.len())
    }

    /// Bind a cache over `count` elements starting at element `offset`.
    pub fn bind_region(
        buffer: &'a DeviceBuffer<T>,
        offset: usize,
        count: usize,
    ) -> Result<Self, MeshError> {
        let words = Self::region_words(buffer, offset, count)?;
        Ok(Self::from_words(words, count))
    }

    fn from_words(words: &'a [u32], count: usize) -> Self {
        let handle = CacheHandle::acquire();
        log::trace!(
            "bound read cache {:?} over {count} elements ({:?})",
            handle,
            T::FORMAT
        );
        Self {
            words,
            count,
            handle,
            _pd: PhantomData,
        }
    }

    /// Release the current handle and bind the whole of `buffer` instead.
    pub fn rebind(&mut self, buffer: &'a DeviceBuffer<T>) {
        let words: &'a [u32] = bytemuck::cast_slice(buffer.device_slice());
        self.rebind_words(words, buffer.len());
    }

    /// Release the current handle and bind a region of `buffer` instead.
    ///
    /// On error the current binding is left untouched.
    pub fn rebind_region(
        &mut self,
        buffer: &'a DeviceBuffer<T>,
        offset: usize,
        count: usize,
    ) -> Result<(), MeshError> {
        let words = Self::region_words(buffer, offset, count)?;
        self.rebind_words(words, count);
        Ok(())
    }

    fn rebind_words(&mut self, words: &'a [u32], count: usize) {
        log::trace!("releasing read cache {:?} for rebind", self.handle);
        self.handle.release();
        self.handle = CacheHandle::acquire();
        self.words = words;
        self.count = count;
    }

    /// Fetch element `i`.
    ///
    /// Precondition: `i < self.count()`. This backend panics on violation;
    /// hardware caches give undefined results, so callers must not rely on
    /// the panic.
    #[inline]
    pub fn fetch(&self, i: usize) -> T {
        let w = T::FORMAT.words;
        T::decode(&self.words[i * w..(i + 1) * w])
    }

    /// Number of elements the cache is bound over.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn format(&self) -> ChannelFormat {
        T::FORMAT
    }

    #[inline]
    pub fn handle(&self) -> CacheHandle {
        self.handle
    }

    /// Release the cache handle.
    pub fn destroy(self) {
        drop(self);
    }

    /// Number of cache handles currently bound in this process.
    pub fn live_handles() -> usize {
        LIVE_HANDLES.load(Ordering::Relaxed)
    }
}

impl<T: CacheElement> Drop for ReadCache<'_, T> {
    fn drop(&mut self) {
        log::trace!("destroying read cache {:?}", self.handle);
        self.handle.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hilo_split_and_join_agree() {
        for v in [1.0f64, -2.75, f64::MIN_POSITIVE, 1e300] {
            let (hi, lo) = f64_to_hilo(v);
            assert_eq!(hilo_to_f64(hi, lo).to_bits(), v.to_bits());
        }
    }

    #[test]
    fn formats_match_channel_layout() {
        assert_eq!(f32::FORMAT.kind, ChannelKind::Float);
        assert_eq!(i32::FORMAT.words, 1);
        assert_eq!(f64::FORMAT.words, 2);
        assert_eq!(f64::FORMAT.kind, ChannelKind::Signed);
    }

    #[test]
    fn decode_f64_reads_low_word_first() {
        let v = -123.456f64;
        let (hi, lo) = f64_to_hilo(v);
        let words: [u32; 2] = bytemuck::cast(v);
        if cfg!(target_endian = "little") {
            assert_eq!(words, [lo, hi]);
        }
        assert_eq!(f64::decode(&words).to_bits(), v.to_bits());
    }

    #[test]
    fn region_fetch_is_offset() {
        let buf = DeviceBuffer::from_host(&[10i32, 20, 30, 40]).unwrap();
        let cache = ReadCache::bind_region(&buf, 1, 2).unwrap();
        assert_eq!(cache.count(), 2);
        assert_eq!(cache.fetch(0), 20);
        assert_eq!(cache.fetch(1), 30);
    }

    #[test]
    fn region_out_of_range_is_rejected() {
        let buf = DeviceBuffer::from_host(&[1.0f32, 2.0]).unwrap();
        let err = ReadCache::bind_region(&buf, 1, 2).unwrap_err();
        assert_eq!(
            err,
            MeshError::CacheRegionOutOfRange {
                offset: 1,
                count: 2,
                len: 2
            }
        );
    }

    #[test]
    #[should_panic]
    fn fetch_past_count_panics() {
        let buf = DeviceBuffer::from_host(&[1.0f64]).unwrap();
        let cache = ReadCache::bind(&buf);
        let _ = cache.fetch(1);
    }
}
