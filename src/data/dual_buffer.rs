//! Device buffer with an on-demand host mirror.
//!
//! The host copy is populated the first time [`DualBuffer::host`] is called
//! and dropped whenever the device side is borrowed mutably, so it is never
//! read while stale.

use bytemuck::Pod;
use once_cell::sync::OnceCell;

use super::device_buffer::DeviceBuffer;
use crate::mesh_error::MeshError;

/// A [`DeviceBuffer`] paired with a lazily synchronised host copy.
#[derive(Debug)]
pub struct DualBuffer<T: Pod> {
    device: DeviceBuffer<T>,
    host: OnceCell<Vec<T>>,
}

impl<T: Pod + Send + Sync> DualBuffer<T> {
    /// Wrap an existing device buffer; the host side starts out stale.
    pub fn new(device: DeviceBuffer<T>) -> Self {
        Self {
            device,
            host: OnceCell::new(),
        }
    }

    /// Upload from host data. The host side is seeded with the same values,
    /// so it starts out fresh.
    pub fn from_host(src: &[T]) -> Result<Self, MeshError> {
        let device = DeviceBuffer::from_host(src)?;
        Ok(Self {
            device,
            host: OnceCell::with_value(src.to_vec()),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.device.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.device.is_empty()
    }

    #[inline]
    pub fn device(&self) -> &DeviceBuffer<T> {
        &self.device
    }

    /// Mutable device access; marks the host mirror stale.
    pub fn device_mut(&mut self) -> &mut DeviceBuffer<T> {
        self.host.take();
        &mut self.device
    }

    /// Whether the next [`host`](Self::host) call has to download.
    #[inline]
    pub fn is_host_stale(&self) -> bool {
        self.host.get().is_none()
    }

    /// Host copy, synchronised from the device if stale.
    pub fn host(&self) -> &[T] {
        self.host.get_or_init(|| {
            log::trace!("syncing {} elements device -> host", self.device.len());
            self.device.to_host_vec()
        })
    }

    /// Drop the mirror and hand back the device buffer.
    pub fn into_device(self) -> DeviceBuffer<T> {
        self.device
    }
}

impl<T: Pod + Send + Sync> From<DeviceBuffer<T>> for DualBuffer<T> {
    fn from(device: DeviceBuffer<T>) -> Self {
        Self::new(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_syncs_on_demand() {
        let dual = DualBuffer::new(DeviceBuffer::reuse(vec![1i32, 2, 3]));
        assert!(dual.is_host_stale());
        assert_eq!(dual.host(), &[1, 2, 3]);
        assert!(!dual.is_host_stale());
    }

    #[test]
    fn device_write_invalidates_host() {
        let mut dual = DualBuffer::from_host(&[1.0f64, 2.0]).unwrap();
        assert!(!dual.is_host_stale());
        dual.device_mut().copy_from_host(0, &[5.0]).unwrap();
        assert!(dual.is_host_stale());
        assert_eq!(dual.host(), &[5.0, 2.0]);
    }
}
