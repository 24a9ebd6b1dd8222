//! Slip rates on individual slip systems.
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector, Vector3};

use crate::crystallography::Lattice;
use crate::error::{KinematicsError, Result};
use crate::history::History;
use crate::parameters::{optional, required, Parameter};
use crate::rotations::Orientation;
use crate::slipharden::SlipHardening;
use crate::tensors::Symmetric;

pub trait SlipRule: Debug + Send + Sync {
    fn populate_history(&self, history: &mut History) -> Result<()>;

    fn init_history(&self, history: &mut History) -> Result<()>;

    /// Slip rate `γ̇` on system `(g, i)`.
    fn slip(&self, g: usize, i: usize, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<f64>;

    fn d_slip_d_s(&self, g: usize, i: usize, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<Symmetric>;

    /// Length `nh`.
    fn d_slip_d_h(&self, g: usize, i: usize, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DVector<f64>>;

    fn d_slip_d_orientation(
        &self,
        g: usize,
        i: usize,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
    ) -> Result<Vector3<f64>>;

    fn hist_rate(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DVector<f64>>;

    /// `nh x 6`
    fn d_hist_rate_d_stress(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DMatrix<f64>>;

    /// `nh x nh`
    fn d_hist_rate_d_hist(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DMatrix<f64>>;

    /// `nh x 3`
    fn d_hist_rate_d_orientation(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DMatrix<f64>>;

    /// `Σ |γ̇_i|` over every slip system.
    fn sum_slip(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<f64> {
        let mut total = 0.0;
        for (g, i) in lattice.systems() {
            total += self.slip(g, i, stress, q, history, lattice, temperature)?.abs();
        }
        Ok(total)
    }

    fn d_sum_slip_d_stress(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<Symmetric> {
        let mut total = Symmetric::zero();
        for (g, i) in lattice.systems() {
            let sign = self.slip(g, i, stress, q, history, lattice, temperature)?.signum();
            total += sign * self.d_slip_d_s(g, i, stress, q, history, lattice, temperature)?;
        }
        Ok(total)
    }

    fn d_sum_slip_d_hist(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DVector<f64>> {
        let mut total = DVector::zeros(history.size());
        for (g, i) in lattice.systems() {
            let sign = self.slip(g, i, stress, q, history, lattice, temperature)?.signum();
            total += sign * self.d_slip_d_h(g, i, stress, q, history, lattice, temperature)?;
        }
        Ok(total)
    }

    fn d_sum_slip_d_orientation(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<Vector3<f64>> {
        let mut total = Vector3::zeros();
        for (g, i) in lattice.systems() {
            let sign = self.slip(g, i, stress, q, history, lattice, temperature)?.signum();
            total += sign * self.d_slip_d_orientation(g, i, stress, q, history, lattice, temperature)?;
        }
        Ok(total)
    }
}

/// `γ̇ = γ̇_0 (τ/τ̄) |τ/τ̄|^(n−1)` over the strength of a hardening model.
#[derive(Debug, Clone)]
pub struct PowerLawSlipRule {
    strength: Arc<dyn SlipHardening>,
    gamma0: Parameter,
    n: Parameter,
}

impl PowerLawSlipRule {
    pub fn new(strength: Arc<dyn SlipHardening>, gamma0: impl Into<Parameter>, n: impl Into<Parameter>) -> Self {
        Self {
            strength,
            gamma0: gamma0.into(),
            n: n.into(),
        }
    }

    /// Reads `n` and optionally `gamma0` (default one).
    pub fn from_parameters(strength: Arc<dyn SlipHardening>, parameters: &HashMap<String, f64>) -> Result<Self> {
        Ok(Self::new(strength, optional(parameters, "gamma0", 1.0), required(parameters, "n")?))
    }

    pub fn hardening(&self) -> &Arc<dyn SlipHardening> {
        &self.strength
    }

    /// `(γ̇, ∂γ̇/∂τ, ∂γ̇/∂τ̄)` on system `(g, i)`.
    fn evaluate(
        &self,
        g: usize,
        i: usize,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
    ) -> Result<(f64, f64, f64)> {
        let tau = lattice.shear(g, i, q, stress);
        let tau_bar = self.strength.hist_to_tau(g, i, history, lattice, temperature)?;
        if tau_bar == 0.0 {
            return Err(KinematicsError::NumericDomain(format!("zero strength on slip system ({g}, {i})")));
        }
        let g0 = self.gamma0.value(temperature);
        let n = self.n.value(temperature);
        let x = tau / tau_bar;
        let pow = x.abs().powf(n - 1.0);
        Ok((g0 * x * pow, g0 * n * pow / tau_bar, -g0 * n * pow * tau / (tau_bar * tau_bar)))
    }
}

impl SlipRule for PowerLawSlipRule {
    fn populate_history(&self, history: &mut History) -> Result<()> {
        self.strength.populate_history(history)
    }

    fn init_history(&self, history: &mut History) -> Result<()> {
        self.strength.init_history(history)
    }

    fn slip(&self, g: usize, i: usize, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<f64> {
        Ok(self.evaluate(g, i, stress, q, history, lattice, temperature)?.0)
    }

    fn d_slip_d_s(&self, g: usize, i: usize, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<Symmetric> {
        let (_, d_tau, _) = self.evaluate(g, i, stress, q, history, lattice, temperature)?;
        Ok(d_tau * lattice.d_shear_d_stress(g, i, q))
    }

    fn d_slip_d_h(&self, g: usize, i: usize, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DVector<f64>> {
        let (_, _, d_tau_bar) = self.evaluate(g, i, stress, q, history, lattice, temperature)?;
        Ok(d_tau_bar * self.strength.d_hist_to_tau(g, i, history, lattice, temperature)?)
    }

    fn d_slip_d_orientation(
        &self,
        g: usize,
        i: usize,
        stress: &Symmetric,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
    ) -> Result<Vector3<f64>> {
        let (_, d_tau, _) = self.evaluate(g, i, stress, q, history, lattice, temperature)?;
        Ok(d_tau * lattice.d_shear_d_orientation(g, i, q, stress))
    }

    fn hist_rate(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DVector<f64>> {
        self.strength.hist_rate(stress, q, history, lattice, temperature, self)
    }

    fn d_hist_rate_d_stress(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DMatrix<f64>> {
        self.strength.d_hist_rate_d_stress(stress, q, history, lattice, temperature, self)
    }

    fn d_hist_rate_d_hist(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DMatrix<f64>> {
        self.strength.d_hist_rate_d_hist(stress, q, history, lattice, temperature, self)
    }

    fn d_hist_rate_d_orientation(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64)
        -> Result<DMatrix<f64>> {
        self.strength.d_hist_rate_d_orientation(stress, q, history, lattice, temperature, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crystallography::LatticeBuilder;
    use crate::numdiff::{
        diff_history_history, diff_history_orientation, diff_history_symmetric, jacobians_agree, DEFAULT_STEP,
    };
    use crate::rotations::{AngleUnit, EulerConvention};
    use crate::slipharden::VoceSlipHardening;
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    struct Fixture {
        rule: PowerLawSlipRule,
        lattice: Lattice,
        stress: Symmetric,
        q: Orientation,
        history: History,
    }

    fn fixture() -> Fixture {
        let rule = PowerLawSlipRule::new(Arc::new(VoceSlipHardening::new(50.0, 2.5, 10.0)), 1.0, 3.0);
        let mut history = History::new();
        rule.populate_history(&mut history).unwrap();
        rule.init_history(&mut history).unwrap();
        history.set_scalar("strength", 35.0).unwrap();
        Fixture {
            rule,
            lattice: LatticeBuilder::cubic(1.0).add_slip_system([1, 1, 0], [1, 1, 1]).unwrap().build(),
            stress: Symmetric::from_full(&Matrix3::new(100.0, -25.0, 10.0, -25.0, -17.0, 15.0, 10.0, 15.0, 35.0)),
            q: Orientation::from_euler_angles(35.0, 17.0, 14.0, AngleUnit::Degrees, EulerConvention::Kocks),
            history,
        }
    }

    #[test]
    fn power_law_values() {
        let f = fixture();
        for (g, i) in f.lattice.systems() {
            let x = f.lattice.shear(g, i, &f.q, &f.stress) / 45.0;
            let slip = f.rule.slip(g, i, &f.stress, &f.q, &f.history, &f.lattice, 300.0).unwrap();
            assert_relative_eq!(slip, x * x.abs().powi(2), max_relative = 1e-12);
        }
    }

    #[test]
    fn slip_derivatives() {
        let f = fixture();
        let h = DEFAULT_STEP;
        for (g, i) in f.lattice.systems() {
            let slip = |s: &Symmetric, hist: &History, q: &Orientation| f.rule.slip(g, i, s, q, hist, &f.lattice, 300.0);

            let d_s = f.rule.d_slip_d_s(g, i, &f.stress, &f.q, &f.history, &f.lattice, 300.0).unwrap();
            for j in 0..6 {
                let mut dx = nalgebra::SVector::<f64, 6>::zeros();
                dx[j] = h * f.stress.as_vector()[j].abs().max(1.0);
                let plus = slip(&Symmetric::new(f.stress.as_vector() + dx), &f.history, &f.q).unwrap();
                let minus = slip(&Symmetric::new(f.stress.as_vector() - dx), &f.history, &f.q).unwrap();
                assert_relative_eq!(d_s.as_vector()[j], (plus - minus) / (2.0 * dx[j]), epsilon = 1e-6, max_relative = 1e-5);
            }

            let d_h = f.rule.d_slip_d_h(g, i, &f.stress, &f.q, &f.history, &f.lattice, 300.0).unwrap();
            let step = h * 35.0;
            let plus = slip(&f.stress, &f.history.with_vector(&[35.0 + step]).unwrap(), &f.q).unwrap();
            let minus = slip(&f.stress, &f.history.with_vector(&[35.0 - step]).unwrap(), &f.q).unwrap();
            assert_relative_eq!(d_h[0], (plus - minus) / (2.0 * step), epsilon = 1e-6, max_relative = 1e-5);

            let d_q = f.rule.d_slip_d_orientation(g, i, &f.stress, &f.q, &f.history, &f.lattice, 300.0).unwrap();
            for k in 0..3 {
                let mut axial = Vector3::zeros();
                axial[k] = h;
                let plus = slip(&f.stress, &f.history, &f.q.perturbed(&axial)).unwrap();
                let minus = slip(&f.stress, &f.history, &f.q.perturbed(&-axial)).unwrap();
                assert_relative_eq!(d_q[k], (plus - minus) / (2.0 * h), epsilon = 1e-6, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn voce_rate_through_the_rule() {
        let f = fixture();
        let sum = f.rule.sum_slip(&f.stress, &f.q, &f.history, &f.lattice, 300.0).unwrap();
        let rate = f.rule.hist_rate(&f.stress, &f.q, &f.history, &f.lattice, 300.0).unwrap();
        assert_relative_eq!(rate[0], 2.5 * (50.0 - 35.0) * sum, max_relative = 1e-12);
    }

    #[test]
    fn history_rate_derivatives() {
        let f = fixture();
        let (lattice, q, history) = (&f.lattice, &f.q, &f.history);
        let rule = &f.rule;

        let d_s = rule.d_hist_rate_d_stress(&f.stress, q, history, lattice, 300.0).unwrap();
        let n_s = diff_history_symmetric(|s| rule.hist_rate(s, q, history, lattice, 300.0), &f.stress, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d_s, &n_s, 1e-5, 1e-8));

        let d_h = rule.d_hist_rate_d_hist(&f.stress, q, history, lattice, 300.0).unwrap();
        let n_h = diff_history_history(|h| rule.hist_rate(&f.stress, q, h, lattice, 300.0), history, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d_h, &n_h, 1e-5, 1e-8));

        let d_q = rule.d_hist_rate_d_orientation(&f.stress, q, history, lattice, 300.0).unwrap();
        let n_q = diff_history_orientation(|q| rule.hist_rate(&f.stress, q, history, lattice, 300.0), q, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d_q, &n_q, 1e-5, 1e-8));
    }

    #[test]
    fn zero_strength_is_rejected() {
        let rule = PowerLawSlipRule::new(Arc::new(VoceSlipHardening::new(50.0, 2.5, 0.0)), 1.0, 3.0);
        let lattice = LatticeBuilder::cubic(1.0).add_slip_system([1, 1, 0], [1, 1, 1]).unwrap().build();
        let mut history = History::new();
        rule.populate_history(&mut history).unwrap();
        rule.init_history(&mut history).unwrap();
        let stress = Symmetric::from_slice(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(matches!(
            rule.slip(0, 0, &stress, &Orientation::identity(), &history, &lattice, 300.0),
            Err(KinematicsError::NumericDomain(_))
        ));
    }
}
