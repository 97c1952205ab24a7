//! Linear (geometric) interpolation.

use bytemuck::Pod;

use super::field::VolField;
use super::scheme::InterpolationScheme;
use crate::data::DeviceBuffer;
use crate::mesh_error::MeshError;
use crate::topology::Scalar;

/// Uncorrected scheme returning fixed per-face weights, typically the
/// geometric distance ratios computed by the mesh.
#[derive(Debug)]
pub struct Linear {
    weights: DeviceBuffer<Scalar>,
}

impl Linear {
    pub fn new(weights: DeviceBuffer<Scalar>) -> Self {
        Self { weights }
    }

    pub fn from_host(weights: &[Scalar]) -> Result<Self, MeshError> {
        Ok(Self::new(DeviceBuffer::from_host(weights)?))
    }

    /// Midpoint weights (`0.5`) on `n_faces` faces.
    pub fn midpoint(n_faces: usize) -> Result<Self, MeshError> {
        let mut weights = DeviceBuffer::allocate(n_faces)?;
        weights.fill(0.5);
        Ok(Self::new(weights))
    }

    #[inline]
    pub fn geometric_weights(&self) -> &DeviceBuffer<Scalar> {
        &self.weights
    }
}

impl<T: Pod> InterpolationScheme<T> for Linear {
    fn weights(&self, _field: &VolField<T>) -> Result<DeviceBuffer<Scalar>, MeshError> {
        self.weights.try_clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_are_fresh_copies() {
        let lin = Linear::from_host(&[0.25, 0.75]).unwrap();
        let f = VolField::from_host("p", &[0.0f64; 3], vec![]).unwrap();
        let mut w = lin.weights(&f).unwrap();
        w.fill(1.0);
        assert_eq!(lin.geometric_weights().to_host_vec(), vec![0.25, 0.75]);
        assert!(!InterpolationScheme::<f64>::corrected(&lin));
        assert!(lin.correction(&f).unwrap().is_none());
    }

    #[test]
    fn midpoint_is_half() {
        let lin = Linear::midpoint(3).unwrap();
        assert_eq!(lin.geometric_weights().to_host_vec(), vec![0.5; 3]);
    }
}
