//! Slip system strength and its evolution.
//!
//! Rates and derivatives are returned over the full history layout: a
//! hardening model writes only the entries of the variables it registered
//! and leaves the rest zero.
use std::collections::HashMap;
use std::fmt::Debug;

use nalgebra::{DMatrix, DVector};

use crate::crystallography::Lattice;
use crate::error::{KinematicsError, Result};
use crate::history::History;
use crate::parameters::{required, Parameter};
use crate::rotations::Orientation;
use crate::sliprules::SlipRule;
use crate::tensors::Symmetric;

pub trait SlipHardening: Debug + Send + Sync {
    fn populate_history(&self, history: &mut History) -> Result<()>;

    fn init_history(&self, history: &mut History) -> Result<()>;

    /// Current strength of slip system `(g, i)`.
    fn hist_to_tau(&self, g: usize, i: usize, history: &History, lattice: &Lattice, temperature: f64) -> Result<f64>;

    /// Length `nh`.
    fn d_hist_to_tau(&self, g: usize, i: usize, history: &History, lattice: &Lattice, temperature: f64) -> Result<DVector<f64>>;

    /// Length `nh`.
    fn hist_rate(
        &self,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
        rule: &dyn SlipRule,
    ) -> Result<DVector<f64>>;

    /// `nh x 6`
    fn d_hist_rate_d_stress(
        &self,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
        rule: &dyn SlipRule,
    ) -> Result<DMatrix<f64>>;

    /// `nh x nh`
    fn d_hist_rate_d_hist(
        &self,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
        rule: &dyn SlipRule,
    ) -> Result<DMatrix<f64>>;

    /// `nh x 3`
    fn d_hist_rate_d_orientation(
        &self,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
        rule: &dyn SlipRule,
    ) -> Result<DMatrix<f64>>;
}

/// Voce saturation hardening of one strength shared by every slip system:
/// `τ̄ = s + τ_0`, `ṡ = b (τ_sat − s) Σ|γ̇_i|`.
#[derive(Debug, Clone)]
pub struct VoceSlipHardening {
    tau_sat: Parameter,
    b: Parameter,
    tau_0: Parameter,
    var_name: String,
}

impl VoceSlipHardening {
    pub fn new(tau_sat: impl Into<Parameter>, b: impl Into<Parameter>, tau_0: impl Into<Parameter>) -> Self {
        Self {
            tau_sat: tau_sat.into(),
            b: b.into(),
            tau_0: tau_0.into(),
            var_name: "strength".to_string(),
        }
    }

    pub fn with_name(mut self, var_name: &str) -> Self {
        self.var_name = var_name.to_string();
        self
    }

    pub fn var_name(&self) -> &str {
        &self.var_name
    }

    /// Reads `tau_sat`, `b` and `tau_0`. The strength starts at `tau_0`, so
    /// it must be positive.
    pub fn from_parameters(parameters: &HashMap<String, f64>) -> Result<Self> {
        let tau_0 = required(parameters, "tau_0")?;
        if tau_0.is_nan() || tau_0 <= 0.0 {
            return Err(KinematicsError::NumericDomain(format!("initial strength tau_0 = {tau_0}")));
        }
        Ok(Self::new(required(parameters, "tau_sat")?, required(parameters, "b")?, tau_0))
    }

    /// `b (τ_sat − s)` and the offset of `s`.
    fn prefactor(&self, history: &History, temperature: f64) -> Result<(f64, usize)> {
        let offset = history.offset(&self.var_name)?;
        let s = history.scalar_at(offset);
        Ok((self.b.value(temperature) * (self.tau_sat.value(temperature) - s), offset))
    }
}

impl SlipHardening for VoceSlipHardening {
    fn populate_history(&self, history: &mut History) -> Result<()> {
        history.add_scalar(&self.var_name).map(|_| ())
    }

    fn init_history(&self, history: &mut History) -> Result<()> {
        history.set_scalar(&self.var_name, 0.0)
    }

    fn hist_to_tau(&self, _g: usize, _i: usize, history: &History, _lattice: &Lattice, temperature: f64) -> Result<f64> {
        Ok(history.get_scalar(&self.var_name)? + self.tau_0.value(temperature))
    }

    fn d_hist_to_tau(&self, _g: usize, _i: usize, history: &History, _lattice: &Lattice, _temperature: f64) -> Result<DVector<f64>> {
        let mut d = DVector::zeros(history.size());
        d[history.offset(&self.var_name)?] = 1.0;
        Ok(d)
    }

    fn hist_rate(
        &self,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
        rule: &dyn SlipRule,
    ) -> Result<DVector<f64>> {
        let (factor, offset) = self.prefactor(history, temperature)?;
        let mut rate = DVector::zeros(history.size());
        rate[offset] = factor * rule.sum_slip(stress, q, history, lattice, temperature)?;
        Ok(rate)
    }

    fn d_hist_rate_d_stress(
        &self,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
        rule: &dyn SlipRule,
    ) -> Result<DMatrix<f64>> {
        let (factor, offset) = self.prefactor(history, temperature)?;
        let d = rule.d_sum_slip_d_stress(stress, q, history, lattice, temperature)?;
        let mut out = DMatrix::zeros(history.size(), 6);
        for j in 0..6 {
            out[(offset, j)] = factor * d.as_vector()[j];
        }
        Ok(out)
    }

    fn d_hist_rate_d_hist(
        &self,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
        rule: &dyn SlipRule,
    ) -> Result<DMatrix<f64>> {
        let (factor, offset) = self.prefactor(history, temperature)?;
        let nh = history.size();
        let d = rule.d_sum_slip_d_hist(stress, q, history, lattice, temperature)?;
        let mut out = DMatrix::zeros(nh, nh);
        for j in 0..nh {
            out[(offset, j)] = factor * d[j];
        }
        out[(offset, offset)] -= self.b.value(temperature) * rule.sum_slip(stress, q, history, lattice, temperature)?;
        Ok(out)
    }

    fn d_hist_rate_d_orientation(
        &self,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
        rule: &dyn SlipRule,
    ) -> Result<DMatrix<f64>> {
        let (factor, offset) = self.prefactor(history, temperature)?;
        let d = rule.d_sum_slip_d_orientation(stress, q, history, lattice, temperature)?;
        let mut out = DMatrix::zeros(history.size(), 3);
        for k in 0..3 {
            out[(offset, k)] = factor * d[k];
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crystallography::LatticeBuilder;
    use crate::error::KinematicsError;

    #[test]
    fn registers_and_initializes_strength() {
        let voce = VoceSlipHardening::new(50.0, 2.5, 10.0);
        let mut history = History::new();
        voce.populate_history(&mut history).unwrap();
        assert_eq!(history.size(), 1);
        history.set_scalar("strength", 12.0).unwrap();
        voce.init_history(&mut history).unwrap();
        assert_eq!(history.get_scalar("strength").unwrap(), 0.0);
        assert!(matches!(voce.populate_history(&mut history), Err(KinematicsError::DuplicateName(_))));
    }

    #[test]
    fn strength_offsets_by_tau_0() {
        let voce = VoceSlipHardening::new(50.0, 2.5, 10.0).with_name("tau");
        let lattice = LatticeBuilder::cubic(1.0).add_slip_system([1, 1, 0], [1, 1, 1]).unwrap().build();
        let mut history = History::new();
        history.add_scalar("other").unwrap();
        voce.populate_history(&mut history).unwrap();
        history.set_scalar("tau", 35.0).unwrap();
        assert_eq!(voce.hist_to_tau(0, 3, &history, &lattice, 300.0).unwrap(), 45.0);
        assert_eq!(voce.d_hist_to_tau(0, 3, &history, &lattice, 300.0).unwrap().as_slice(), &[0.0, 1.0]);
    }

    #[test]
    fn configuration_requires_saturation_and_rate() {
        let map = HashMap::from([("tau_sat".to_string(), 50.0), ("tau_0".to_string(), 10.0)]);
        assert_eq!(
            VoceSlipHardening::from_parameters(&map).unwrap_err(),
            KinematicsError::MissingParameter("b".to_string())
        );
    }

    #[test]
    fn configuration_requires_positive_initial_strength() {
        let mut map = HashMap::from([("tau_sat".to_string(), 50.0), ("b".to_string(), 2.5)]);
        assert_eq!(
            VoceSlipHardening::from_parameters(&map).unwrap_err(),
            KinematicsError::MissingParameter("tau_0".to_string())
        );
        map.insert("tau_0".to_string(), 0.0);
        assert!(matches!(
            VoceSlipHardening::from_parameters(&map),
            Err(KinematicsError::NumericDomain(_))
        ));

        map.insert("tau_0".to_string(), 10.0);
        let voce = VoceSlipHardening::from_parameters(&map).unwrap();
        let lattice = LatticeBuilder::cubic(1.0).add_slip_system([1, 1, 0], [1, 1, 1]).unwrap().build();
        let mut history = History::new();
        voce.populate_history(&mut history).unwrap();
        voce.init_history(&mut history).unwrap();
        assert_eq!(voce.hist_to_tau(0, 0, &history, &lattice, 300.0).unwrap(), 10.0);
    }
}
