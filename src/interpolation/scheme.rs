//! Face interpolation capability.

use bytemuck::Pod;

use super::field::VolField;
use crate::data::DeviceBuffer;
use crate::mesh_error::MeshError;
use crate::topology::Scalar;

/// Provider of face interpolation weights and an optional explicit
/// correction for fields of `T`.
///
/// Both arrays are face-indexed (internal faces first, then boundary faces
/// patch by patch).
pub trait InterpolationScheme<T: Pod> {
    /// Weight of the owner cell value at each face.
    fn weights(&self, field: &VolField<T>) -> Result<DeviceBuffer<Scalar>, MeshError>;

    /// Whether [`correction`](Self::correction) yields a value.
    fn corrected(&self) -> bool {
        false
    }

    /// Explicit correction added to the weighted interpolate.
    fn correction(&self, _field: &VolField<T>) -> Result<Option<DeviceBuffer<T>>, MeshError> {
        Ok(None)
    }
}

impl<T: Pod, S: InterpolationScheme<T> + ?Sized> InterpolationScheme<T> for &S {
    fn weights(&self, field: &VolField<T>) -> Result<DeviceBuffer<Scalar>, MeshError> {
        (**self).weights(field)
    }

    fn corrected(&self) -> bool {
        (**self).corrected()
    }

    fn correction(&self, field: &VolField<T>) -> Result<Option<DeviceBuffer<T>>, MeshError> {
        (**self).correction(field)
    }
}

impl<T: Pod, S: InterpolationScheme<T> + ?Sized> InterpolationScheme<T> for Box<S> {
    fn weights(&self, field: &VolField<T>) -> Result<DeviceBuffer<Scalar>, MeshError> {
        (**self).weights(field)
    }

    fn corrected(&self) -> bool {
        (**self).corrected()
    }

    fn correction(&self, field: &VolField<T>) -> Result<Option<DeviceBuffer<T>>, MeshError> {
        (**self).correction(field)
    }
}
