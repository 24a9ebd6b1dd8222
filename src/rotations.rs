//! Crystal orientations.
//!
//! An [`Orientation`] maps lattice-frame quantities to the sample frame.
//! Euler angles follow the Bunge convention internally; the Kocks
//! convention is converted with `φ1 = Ψ + π/2`, `Φ = Θ`, `φ2 = π/2 − φ`.
use std::f64::consts::FRAC_PI_2;

use nalgebra::{Matrix3, Rotation3, Vector3};
use strum_macros::{Display, EnumString};

use crate::error::{KinematicsError, Result};
use crate::stress_strain::mandel_rotation;
use crate::tensors::{Skew, SymSymR4, Symmetric};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AngleUnit {
    Degrees,
    Radians,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum EulerConvention {
    Kocks,
    Bunge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    rotation: Rotation3<f64>,
}

impl Orientation {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
        }
    }

    pub fn from_euler_angles(a: f64, b: f64, c: f64, unit: AngleUnit, convention: EulerConvention) -> Self {
        let (a, b, c) = match unit {
            AngleUnit::Degrees => (a.to_radians(), b.to_radians(), c.to_radians()),
            AngleUnit::Radians => (a, b, c),
        };
        let (phi1, big_phi, phi2) = match convention {
            EulerConvention::Bunge => (a, b, c),
            EulerConvention::Kocks => (a + FRAC_PI_2, b, FRAC_PI_2 - c),
        };
        let (s1, c1) = phi1.sin_cos();
        let (s, c) = big_phi.sin_cos();
        let (s2, c2) = phi2.sin_cos();
        // Bunge matrix, sample to crystal
        let g = Matrix3::new(
            c1 * c2 - s1 * s2 * c,
            s1 * c2 + c1 * s2 * c,
            s2 * s,
            -c1 * s2 - s1 * c2 * c,
            -s1 * s2 + c1 * c2 * c,
            c2 * s,
            s1 * s,
            -c1 * s,
            c,
        );
        Self {
            rotation: Rotation3::from_matrix_unchecked(g.transpose()),
        }
    }

    /// Fails unless `matrix` is orthogonal with unit determinant.
    pub fn from_matrix(matrix: &Matrix3<f64>) -> Result<Self> {
        let defect = (matrix * matrix.transpose() - Matrix3::identity()).amax();
        if defect > 1.0e-8 {
            return Err(KinematicsError::NumericDomain(format!(
                "matrix is not orthogonal (defect {defect:e})"
            )));
        }
        if matrix.determinant() < 0.0 {
            return Err(KinematicsError::NumericDomain("improper rotation".to_string()));
        }
        Ok(Self {
            rotation: Rotation3::from_matrix_unchecked(*matrix),
        })
    }

    /// Exponential map of the axial vector `axial`.
    pub fn from_axis_angle(axial: &Vector3<f64>) -> Self {
        Self {
            rotation: Rotation3::new(*axial),
        }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        self.rotation.matrix()
    }

    pub fn euler_angles(&self, unit: AngleUnit, convention: EulerConvention) -> (f64, f64, f64) {
        let g = self.rotation.matrix().transpose();
        let big_phi = g.m33.clamp(-1.0, 1.0).acos();
        let (phi1, phi2) = if big_phi.sin().abs() > 1.0e-12 {
            (g.m31.atan2(-g.m32), g.m13.atan2(g.m23))
        } else {
            (g.m12.atan2(g.m11), 0.0)
        };
        let (a, b, c) = match convention {
            EulerConvention::Bunge => (phi1, big_phi, phi2),
            EulerConvention::Kocks => (phi1 - FRAC_PI_2, big_phi, FRAC_PI_2 - phi2),
        };
        match unit {
            AngleUnit::Degrees => (a.to_degrees(), b.to_degrees(), c.to_degrees()),
            AngleUnit::Radians => (a, b, c),
        }
    }

    pub fn apply_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.transform_vector(v)
    }

    pub fn apply_symmetric(&self, a: &Symmetric) -> Symmetric {
        let q = self.rotation.matrix();
        Symmetric::from_full(&(q * a.to_full() * q.transpose()))
    }

    pub fn apply_skew(&self, w: &Skew) -> Skew {
        Skew::new(self.rotation.transform_vector(w.as_vector()))
    }

    pub fn mandel_rotation(&self) -> SymSymR4 {
        mandel_rotation(self.rotation.matrix())
    }

    /// `exp(W)·Q` for the spin `W` with axial vector `axial`.
    pub fn perturbed(&self, axial: &Vector3<f64>) -> Self {
        Self {
            rotation: Rotation3::new(*axial) * self.rotation,
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            rotation: self.rotation.inverse(),
        }
    }

    pub fn compose(&self, other: &Orientation) -> Self {
        Self {
            rotation: self.rotation * other.rotation,
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::str::FromStr;

    #[test]
    fn euler_angles_give_proper_rotations() {
        let q = Orientation::from_euler_angles(35.0, 17.0, 14.0, AngleUnit::Degrees, EulerConvention::Kocks);
        let m = q.matrix();
        assert_relative_eq!(m * m.transpose(), Matrix3::identity(), epsilon = 1e-12);
        assert_relative_eq!(m.determinant(), 1.0, epsilon = 1e-12);

        let (a, b, c) = q.euler_angles(AngleUnit::Degrees, EulerConvention::Kocks);
        assert_relative_eq!(a, 35.0, epsilon = 1e-9);
        assert_relative_eq!(b, 17.0, epsilon = 1e-9);
        assert_relative_eq!(c, 14.0, epsilon = 1e-9);
    }

    #[test]
    fn conventions_agree() {
        let kocks = Orientation::from_euler_angles(10.0, 20.0, 30.0, AngleUnit::Degrees, EulerConvention::Kocks);
        let bunge = Orientation::from_euler_angles(100.0, 20.0, 60.0, AngleUnit::Degrees, EulerConvention::Bunge);
        assert_relative_eq!(*kocks.matrix(), *bunge.matrix(), epsilon = 1e-12);
    }

    #[test]
    fn options_parse_from_strings() {
        assert_eq!(AngleUnit::from_str("degrees").unwrap(), AngleUnit::Degrees);
        assert_eq!(EulerConvention::from_str("kocks").unwrap(), EulerConvention::Kocks);
        assert!(AngleUnit::from_str("gradians").is_err());
    }

    #[test]
    fn from_matrix_rejects_non_rotations() {
        let reflection = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
        assert!(matches!(Orientation::from_matrix(&reflection), Err(KinematicsError::NumericDomain(_))));
        assert!(Orientation::from_matrix(&(2.0 * Matrix3::identity())).is_err());
        assert!(Orientation::from_matrix(&Matrix3::identity()).is_ok());
    }

    #[test]
    fn tensors_rotate_consistently() {
        let q = Orientation::from_euler_angles(0.4, 1.1, -0.3, AngleUnit::Radians, EulerConvention::Bunge);
        let w = Skew::new(Vector3::new(0.2, -1.0, 3.0));
        let full = q.matrix() * w.to_full() * q.matrix().transpose();
        assert_relative_eq!(q.apply_skew(&w).to_full(), full, epsilon = 1e-12);

        let s = Symmetric::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_relative_eq!(q.mandel_rotation() * s.as_vector(), *q.apply_symmetric(&s).as_vector(), epsilon = 1e-12);

        let back = q.inverse().apply_symmetric(&q.apply_symmetric(&s));
        assert!(back.approx_eq(&s, 1e-12, 1e-12));
        assert_relative_eq!(*q.compose(&q.inverse()).matrix(), Matrix3::identity(), epsilon = 1e-12);
    }
}
