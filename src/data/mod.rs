//! Data module: device memory, read caches and field value types

pub mod device_buffer;
pub mod dual_buffer;
pub mod read_cache;
pub mod vector_space;

pub use device_buffer::{DeviceBuffer, Ownership};
pub use dual_buffer::DualBuffer;
pub use read_cache::{CacheElement, CacheHandle, ChannelFormat, ChannelKind, ReadCache};
pub use vector_space::{Vector, VectorSpace};
