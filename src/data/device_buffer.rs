//! Linear device memory.
//!
//! `DeviceBuffer<T>` owns one contiguous block of accelerator memory. The
//! backend in this crate is host-simulated: the block lives on the heap but is
//! reached only through explicit transfers ([`DeviceBuffer::copy_from_host`],
//! [`DeviceBuffer::copy_to_host`]) or through kernel access
//! ([`DeviceBuffer::device_slice`] and the raw pointer accessors).
//!
//! Buffers are move-only. Use [`DeviceBuffer::try_clone`] for an explicit
//! device-to-device copy.

use core::fmt::{self, Debug};

use bytemuck::Pod;

use crate::mesh_error::MeshError;

/// How a [`DeviceBuffer`] came by its storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// Freshly allocated by the buffer.
    Owned,
    /// Taken over from caller-supplied storage without a copy.
    Reused,
}

/// Contiguous block of device-resident `T`.
pub struct DeviceBuffer<T: Pod> {
    data: Vec<T>,
    ownership: Ownership,
}

impl<T: Pod> Debug for DeviceBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("len", &self.data.len())
            .field("bytes", &self.byte_len())
            .field("ownership", &self.ownership)
            .finish()
    }
}

impl<T: Pod> DeviceBuffer<T> {
    fn try_alloc(n: usize) -> Result<Vec<T>, MeshError> {
        let mut data = Vec::new();
        data.try_reserve_exact(n)
            .map_err(|_| MeshError::DeviceAllocation {
                elements: n,
                bytes: n.saturating_mul(core::mem::size_of::<T>()),
            })?;
        Ok(data)
    }

    /// Allocate `n` zero-initialised elements.
    pub fn allocate(n: usize) -> Result<Self, MeshError> {
        let mut data = Self::try_alloc(n)?;
        data.resize(n, T::zeroed());
        Ok(Self {
            data,
            ownership: Ownership::Owned,
        })
    }

    /// Allocate fresh storage and copy `src` into it.
    pub fn from_host(src: &[T]) -> Result<Self, MeshError> {
        let mut data = Self::try_alloc(src.len())?;
        data.extend_from_slice(src);
        Ok(Self {
            data,
            ownership: Ownership::Owned,
        })
    }

    /// Take over `storage` without copying.
    ///
    /// The vector is moved in, so the caller cannot free or touch it
    /// independently afterwards.
    pub fn reuse(storage: Vec<T>) -> Self {
        Self {
            data: storage,
            ownership: Ownership::Reused,
        }
    }

    /// Explicitly free the device block.
    pub fn release(self) {
        log::trace!(
            "releasing {:?} device buffer of {} bytes",
            self.ownership,
            self.byte_len()
        );
        drop(self);
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size of the block in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        core::mem::size_of_val(self.data.as_slice())
    }

    #[inline]
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Copy `src` into the range `[offset .. offset + src.len())`.
    pub fn copy_from_host(&mut self, offset: usize, src: &[T]) -> Result<(), MeshError> {
        let size = self.data.len();
        let dst = offset
            .checked_add(src.len())
            .and_then(|end| self.data.get_mut(offset..end))
            .ok_or(MeshError::TransferOutOfRange {
                offset,
                len: src.len(),
                size,
            })?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Copy the range `[offset .. offset + dst.len())` into `dst`.
    pub fn copy_to_host(&self, offset: usize, dst: &mut [T]) -> Result<(), MeshError> {
        let src = offset
            .checked_add(dst.len())
            .and_then(|end| self.data.get(offset..end))
            .ok_or(MeshError::TransferOutOfRange {
                offset,
                len: dst.len(),
                size: self.data.len(),
            })?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Download the whole buffer.
    pub fn to_host_vec(&self) -> Vec<T> {
        self.data.clone()
    }

    /// Explicit device-to-device copy into a new owned buffer.
    pub fn try_clone(&self) -> Result<Self, MeshError> {
        Self::from_host(&self.data)
    }

    /// Fill every element with `value` (a device memset).
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Typed view for kernel code.
    #[inline]
    pub fn device_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable typed view for kernel code.
    #[inline]
    pub fn device_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Raw device pointer for kernel launches.
    #[inline]
    pub fn as_device_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    /// Raw mutable device pointer for kernel launches.
    #[inline]
    pub fn as_device_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    /// Give the storage back to the host without a copy.
    pub fn into_host_vec(self) -> Vec<T> {
        self.data
    }
}
