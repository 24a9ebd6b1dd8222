//! Symmetric and skew second-order tensors in packed form.
//!
//! A [`Symmetric`] is stored as its Mandel vector so that the double
//! contraction `A : B = tr(A·B)` is the plain dot product of the packed
//! vectors. A [`Skew`] is stored as its axial vector. Fourth-order tensors
//! acting on symmetric tensors are 6x6 matrices in the same basis.
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use nalgebra::{DMatrix, DVector, Matrix3, SMatrix, SVector, Vector3};

use crate::error::{KinematicsError, Result};
use crate::mandel::{axial_to_tensor, mandel_to_tensor, tensor_to_axial, tensor_to_mandel, MANDEL_IDENTITY};

/// Symmetric-symmetric fourth order tensor.
pub type SymSymR4 = SMatrix<f64, 6, 6>;
/// Linear map from skew tensors to symmetric tensors.
pub type SymSkewR4 = SMatrix<f64, 6, 3>;
/// Linear map from symmetric tensors to skew tensors.
pub type SkewSymR4 = SMatrix<f64, 3, 6>;
/// Linear map from skew tensors to skew tensors.
pub type SkewSkewR4 = SMatrix<f64, 3, 3>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Symmetric(SVector<f64, 6>);

impl Symmetric {
    pub fn new(mandel: SVector<f64, 6>) -> Self {
        Self(mandel)
    }

    pub fn zero() -> Self {
        Self(SVector::zeros())
    }

    pub fn identity() -> Self {
        Self(MANDEL_IDENTITY)
    }

    /// Symmetrizes the full tensor.
    pub fn from_full(tensor: &Matrix3<f64>) -> Self {
        Self(tensor_to_mandel(tensor))
    }

    /// Accepts either a packed Mandel vector (6 entries) or a row-major
    /// full tensor (9 entries).
    pub fn from_slice(data: &[f64]) -> Result<Self> {
        match data.len() {
            6 => Ok(Self(SVector::<f64, 6>::from_column_slice(data))),
            9 => Ok(Self::from_full(&Matrix3::from_row_slice(data))),
            n => Err(KinematicsError::shape("6 or 9 components", n)),
        }
    }

    pub fn from_dmatrix(tensor: &DMatrix<f64>) -> Result<Self> {
        if tensor.shape() != (3, 3) {
            return Err(KinematicsError::shape("3x3", format!("{}x{}", tensor.nrows(), tensor.ncols())));
        }
        Ok(Self::from_full(&tensor.fixed_view::<3, 3>(0, 0).into_owned()))
    }

    pub fn to_full(&self) -> Matrix3<f64> {
        mandel_to_tensor(&self.0)
    }

    pub fn as_vector(&self) -> &SVector<f64, 6> {
        &self.0
    }

    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    pub fn dot(&self, other: &Symmetric) -> f64 {
        self.0.dot(&other.0)
    }

    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    pub fn trace(&self) -> f64 {
        crate::mandel::trace(&self.0)
    }

    /// `C : self`
    pub fn premultiply(&self, tensor: &SymSymR4) -> Symmetric {
        Symmetric(tensor * self.0)
    }

    /// `self : C`
    pub fn postmultiply(&self, tensor: &SymSymR4) -> Symmetric {
        Symmetric(tensor.tr_mul(&self.0))
    }

    /// `self ⊗ other` as a fourth order tensor.
    pub fn outer(&self, other: &Symmetric) -> SymSymR4 {
        self.0 * other.0.transpose()
    }

    pub fn approx_eq(&self, other: &Symmetric, rtol: f64, atol: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= atol + rtol * b.abs())
    }
}

impl From<SVector<f64, 6>> for Symmetric {
    fn from(mandel: SVector<f64, 6>) -> Self {
        Self(mandel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Skew(Vector3<f64>);

impl Skew {
    pub fn new(axial: Vector3<f64>) -> Self {
        Self(axial)
    }

    pub fn zero() -> Self {
        Self(Vector3::zeros())
    }

    /// Keeps only the antisymmetric part of the full tensor.
    pub fn from_full(tensor: &Matrix3<f64>) -> Self {
        Self(tensor_to_axial(tensor))
    }

    /// Accepts either an axial vector (3 entries) or a row-major full tensor
    /// (9 entries).
    pub fn from_slice(data: &[f64]) -> Result<Self> {
        match data.len() {
            3 => Ok(Self(Vector3::from_column_slice(data))),
            9 => Ok(Self::from_full(&Matrix3::from_row_slice(data))),
            n => Err(KinematicsError::shape("3 or 9 components", n)),
        }
    }

    pub fn from_dmatrix(tensor: &DMatrix<f64>) -> Result<Self> {
        if tensor.shape() != (3, 3) {
            return Err(KinematicsError::shape("3x3", format!("{}x{}", tensor.nrows(), tensor.ncols())));
        }
        Ok(Self::from_full(&tensor.fixed_view::<3, 3>(0, 0).into_owned()))
    }

    pub fn to_full(&self) -> Matrix3<f64> {
        axial_to_tensor(&self.0)
    }

    pub fn as_vector(&self) -> &Vector3<f64> {
        &self.0
    }

    pub fn as_slice(&self) -> &[f64] {
        self.0.as_slice()
    }

    pub fn dot(&self, other: &Skew) -> f64 {
        self.0.dot(&other.0)
    }

    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    pub fn approx_eq(&self, other: &Skew, rtol: f64, atol: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= atol + rtol * b.abs())
    }
}

impl From<Vector3<f64>> for Skew {
    fn from(axial: Vector3<f64>) -> Self {
        Self(axial)
    }
}

macro_rules! packed_arithmetic {
    ($t:ty) => {
        impl Add for $t {
            type Output = $t;
            fn add(self, rhs: $t) -> $t {
                Self(self.0 + rhs.0)
            }
        }
        impl Sub for $t {
            type Output = $t;
            fn sub(self, rhs: $t) -> $t {
                Self(self.0 - rhs.0)
            }
        }
        impl AddAssign for $t {
            fn add_assign(&mut self, rhs: $t) {
                self.0 += rhs.0;
            }
        }
        impl SubAssign for $t {
            fn sub_assign(&mut self, rhs: $t) {
                self.0 -= rhs.0;
            }
        }
        impl Neg for $t {
            type Output = $t;
            fn neg(self) -> $t {
                Self(-self.0)
            }
        }
        impl Mul<f64> for $t {
            type Output = $t;
            fn mul(self, rhs: f64) -> $t {
                Self(self.0 * rhs)
            }
        }
        impl Mul<$t> for f64 {
            type Output = $t;
            fn mul(self, rhs: $t) -> $t {
                rhs * self
            }
        }
    };
}

packed_arithmetic!(Symmetric);
packed_arithmetic!(Skew);

/// Dynamic matrix product with an explicit shape check.
pub fn matmul(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    if a.ncols() != b.nrows() {
        return Err(KinematicsError::shape(
            format!("{} rows on the right operand", a.ncols()),
            b.nrows(),
        ));
    }
    Ok(a * b)
}

/// Dynamic matrix-vector product with an explicit shape check.
pub fn matvec(a: &DMatrix<f64>, x: &DVector<f64>) -> Result<DVector<f64>> {
    if a.ncols() != x.len() {
        return Err(KinematicsError::shape(format!("vector of length {}", a.ncols()), x.len()));
    }
    Ok(a * x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_full_symmetrizes() {
        let full = Matrix3::new(1.0, 2.0, 0.0, 4.0, 5.0, 6.0, 0.0, 6.0, 9.0);
        let s = Symmetric::from_full(&full);
        let back = s.to_full();
        assert_relative_eq!(back, back.transpose());
        assert_relative_eq!(back.m12, 3.0, epsilon = 1e-14);
        assert_relative_eq!(back.m23, 6.0, epsilon = 1e-14);
    }

    #[test]
    fn from_full_antisymmetrizes() {
        let full = Matrix3::new(7.0, 2.0, 0.0, 4.0, 5.0, 6.0, 3.0, 6.0, 9.0);
        let w = Skew::from_full(&full).to_full();
        assert_relative_eq!(w, -w.transpose());
        assert_eq!(w.diagonal(), Vector3::zeros());
        assert_relative_eq!(w.m21, 1.0, epsilon = 1e-14);
    }

    #[test]
    fn wrong_sizes_are_shape_errors() {
        assert!(matches!(Symmetric::from_slice(&[1.0; 5]), Err(KinematicsError::Shape { .. })));
        assert!(matches!(Skew::from_slice(&[1.0; 4]), Err(KinematicsError::Shape { .. })));
        let rect = DMatrix::<f64>::zeros(3, 2);
        assert!(Symmetric::from_dmatrix(&rect).is_err());
        assert!(Skew::from_dmatrix(&rect).is_err());
        assert!(matmul(&DMatrix::zeros(6, 2), &DMatrix::zeros(3, 1)).is_err());
        assert!(matvec(&DMatrix::zeros(6, 2), &DVector::zeros(3)).is_err());
    }

    #[test]
    fn inner_product_matches_trace() {
        let a = Symmetric::from_slice(&[100.0, -25.0, 10.0, -25.0, -17.0, 15.0, 10.0, 15.0, 35.0]).unwrap();
        let b = Symmetric::from_slice(&[4.1, 2.95, 1.4, 2.95, 7.1, 1.1, 1.4, 1.1, 3.0]).unwrap();
        assert_relative_eq!(a.dot(&b), (a.to_full() * b.to_full()).trace(), epsilon = 1e-10);
    }

    #[test]
    fn fourth_order_contraction() {
        let c = SymSymR4::from_fn(|i, j| (i * 6 + j) as f64);
        let a = Symmetric::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_relative_eq!(*a.premultiply(&c).as_vector(), c * a.as_vector());
        assert_relative_eq!(*a.postmultiply(&c).as_vector(), c.transpose() * a.as_vector());
    }
}
