//! Fixed-size vector values for face and cell fields.
//!
//! All arithmetic is component-wise, so a vector-valued correction field is
//! manipulated exactly like a scalar one.

use core::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub};

use bytemuck::{Pod, Zeroable};
use num_traits::Zero;

use crate::topology::Scalar;

/// `N` scalar components stored contiguously.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(transparent)]
pub struct VectorSpace<const N: usize>(pub [Scalar; N]);

// SAFETY: transparent over `[f64; N]`, which has no padding and no invalid bit patterns.
unsafe impl<const N: usize> Zeroable for VectorSpace<N> {}
unsafe impl<const N: usize> Pod for VectorSpace<N> {}

/// Three-component vector.
pub type Vector = VectorSpace<3>;

impl<const N: usize> VectorSpace<N> {
    #[inline]
    pub const fn new(components: [Scalar; N]) -> Self {
        Self(components)
    }

    /// Every component set to `s`.
    #[inline]
    pub const fn uniform(s: Scalar) -> Self {
        Self([s; N])
    }

    #[inline]
    fn zip_with(self, rhs: Self, op: impl Fn(Scalar, Scalar) -> Scalar) -> Self {
        let mut out = self;
        for (o, r) in out.0.iter_mut().zip(rhs.0) {
            *o = op(*o, r);
        }
        out
    }

    #[inline]
    fn map(self, op: impl Fn(Scalar) -> Scalar) -> Self {
        let mut out = self;
        out.0.iter_mut().for_each(|o| *o = op(*o));
        out
    }

    /// Inner product.
    pub fn dot(&self, rhs: &Self) -> Scalar {
        self.0.iter().zip(rhs.0.iter()).map(|(a, b)| a * b).sum()
    }

    /// Euclidean norm.
    pub fn mag(&self) -> Scalar {
        self.dot(self).sqrt()
    }
}

impl<const N: usize> Default for VectorSpace<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> Zero for VectorSpace<N> {
    fn zero() -> Self {
        Self([0.0; N])
    }

    fn is_zero(&self) -> bool {
        self.0.iter().all(|c| *c == 0.0)
    }
}

impl<const N: usize> Add for VectorSpace<N> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<const N: usize> AddAssign for VectorSpace<N> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<const N: usize> Sub for VectorSpace<N> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl<const N: usize> Neg for VectorSpace<N> {
    type Output = Self;
    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

impl<const N: usize> Mul<Scalar> for VectorSpace<N> {
    type Output = Self;
    fn mul(self, s: Scalar) -> Self {
        self.map(|a| a * s)
    }
}

impl<const N: usize> Mul<VectorSpace<N>> for Scalar {
    type Output = VectorSpace<N>;
    fn mul(self, v: VectorSpace<N>) -> VectorSpace<N> {
        v * self
    }
}

impl<const N: usize> Index<usize> for VectorSpace<N> {
    type Output = Scalar;
    fn index(&self, i: usize) -> &Scalar {
        &self.0[i]
    }
}

impl<const N: usize> IndexMut<usize> for VectorSpace<N> {
    fn index_mut(&mut self, i: usize) -> &mut Scalar {
        &mut self.0[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn componentwise_ops() {
        let a = Vector::new([1.0, 2.0, 3.0]);
        let b = Vector::uniform(1.0);
        assert_eq!(a + b, Vector::new([2.0, 3.0, 4.0]));
        assert_eq!(a - b, Vector::new([0.0, 1.0, 2.0]));
        assert_eq!(2.0 * a, Vector::new([2.0, 4.0, 6.0]));
        assert_eq!(-a, Vector::new([-1.0, -2.0, -3.0]));
        assert_eq!(a.dot(&b), 6.0);
        assert_eq!(a[2], 3.0);
    }

    #[test]
    fn zero_is_all_components() {
        assert!(Vector::zero().is_zero());
        assert!(!Vector::new([0.0, 0.0, 1e-300]).is_zero());
        assert_eq!(Vector::default(), Vector::uniform(0.0));
    }
}
