//! Contracts the kinematic model consumes from its collaborators.
//!
//! History-sized blocks are dynamic matrices whose history axis follows the
//! layout of the [`History`] passed in. Orientation derivatives are taken
//! with respect to a spin perturbation `q ← exp(δ W_k) q`, one column (or
//! one matrix) per axial direction `k`.
use std::fmt::Debug;

use nalgebra::{DMatrix, DVector};

use crate::crystallography::Lattice;
use crate::error::{KinematicsError, Result};
use crate::history::History;
use crate::rotations::Orientation;
use crate::stress_strain::{d_rotated_fourth_order, rotate_fourth_order};
use crate::tensors::{SkewSkewR4, SkewSymR4, Skew, SymSkewR4, SymSymR4, Symmetric};

pub trait ElasticModel: Debug + Send + Sync {
    /// Stiffness in the lattice frame.
    fn c_lattice(&self, temperature: f64) -> SymSymR4;

    /// Compliance in the lattice frame.
    fn s_lattice(&self, temperature: f64) -> Result<SymSymR4> {
        self.c_lattice(temperature)
            .try_inverse()
            .ok_or_else(|| KinematicsError::NumericDomain("stiffness tensor is singular".to_string()))
    }

    /// Stiffness in the sample frame.
    fn c_tensor(&self, temperature: f64, q: &Orientation) -> SymSymR4 {
        rotate_fourth_order(&self.c_lattice(temperature), q.matrix())
    }

    /// Compliance in the sample frame.
    fn s_tensor(&self, temperature: f64, q: &Orientation) -> Result<SymSymR4> {
        Ok(rotate_fourth_order(&self.s_lattice(temperature)?, q.matrix()))
    }

    fn d_c_tensor_d_orientation(&self, temperature: f64, q: &Orientation) -> [SymSymR4; 3] {
        d_rotated_fourth_order(&self.c_tensor(temperature, q))
    }

    fn d_s_tensor_d_orientation(&self, temperature: f64, q: &Orientation) -> Result<[SymSymR4; 3]> {
        Ok(d_rotated_fourth_order(&self.s_tensor(temperature, q)?))
    }
}

/// A plastic flow law: plastic deformation rate, plastic spin and the
/// evolution of the history variables it declares.
pub trait InelasticModel: Debug + Send + Sync {
    fn populate_history(&self, history: &mut History) -> Result<()>;

    fn init_history(&self, history: &mut History) -> Result<()>;

    fn d_p(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<Symmetric>;

    fn d_d_p_d_stress(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<SymSymR4>;

    fn d_d_p_d_orientation(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<SymSkewR4>;

    /// `6 x nh`
    fn d_d_p_d_history(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DMatrix<f64>>;

    fn w_p(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<Skew>;

    fn d_w_p_d_stress(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<SkewSymR4>;

    fn d_w_p_d_orientation(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<SkewSkewR4>;

    /// `3 x nh`
    fn d_w_p_d_history(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DMatrix<f64>>;

    fn history_rate(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DVector<f64>>;

    /// `nh x 6`
    fn d_history_rate_d_stress(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DMatrix<f64>>;

    /// `nh x 3`
    fn d_history_rate_d_orientation(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DMatrix<f64>>;

    /// `nh x nh`
    fn d_history_rate_d_history(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DMatrix<f64>>;
}
