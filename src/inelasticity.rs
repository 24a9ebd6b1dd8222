use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::crystallography::Lattice;
use crate::error::Result;
use crate::history::History;
use crate::interfaces::InelasticModel;
use crate::rotations::Orientation;
use crate::sliprules::SlipRule;
use crate::tensors::{SkewSkewR4, SkewSymR4, Skew, SymSkewR4, SymSymR4, Symmetric};

/// Purely elastic material: zero plastic rates, no history.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInelasticity;

impl InelasticModel for NoInelasticity {
    fn populate_history(&self, _history: &mut History) -> Result<()> {
        Ok(())
    }

    fn init_history(&self, _history: &mut History) -> Result<()> {
        Ok(())
    }

    fn d_p(&self, _stress: &Symmetric, _q: &Orientation, _history: &History, _lattice: &Lattice, _temperature: f64) -> Result<Symmetric> {
        Ok(Symmetric::zero())
    }

    fn d_d_p_d_stress(&self, _stress: &Symmetric, _q: &Orientation, _history: &History, _lattice: &Lattice, _temperature: f64) -> Result<SymSymR4> {
        Ok(SymSymR4::zeros())
    }

    fn d_d_p_d_orientation(&self, _stress: &Symmetric, _q: &Orientation, _history: &History, _lattice: &Lattice, _temperature: f64) -> Result<SymSkewR4> {
        Ok(SymSkewR4::zeros())
    }

    fn d_d_p_d_history(&self, _stress: &Symmetric, _q: &Orientation, history: &History, _lattice: &Lattice, _temperature: f64) -> Result<DMatrix<f64>> {
        Ok(DMatrix::zeros(6, history.size()))
    }

    fn w_p(&self, _stress: &Symmetric, _q: &Orientation, _history: &History, _lattice: &Lattice, _temperature: f64) -> Result<Skew> {
        Ok(Skew::zero())
    }

    fn d_w_p_d_stress(&self, _stress: &Symmetric, _q: &Orientation, _history: &History, _lattice: &Lattice, _temperature: f64) -> Result<SkewSymR4> {
        Ok(SkewSymR4::zeros())
    }

    fn d_w_p_d_orientation(&self, _stress: &Symmetric, _q: &Orientation, _history: &History, _lattice: &Lattice, _temperature: f64) -> Result<SkewSkewR4> {
        Ok(SkewSkewR4::zeros())
    }

    fn d_w_p_d_history(&self, _stress: &Symmetric, _q: &Orientation, history: &History, _lattice: &Lattice, _temperature: f64) -> Result<DMatrix<f64>> {
        Ok(DMatrix::zeros(3, history.size()))
    }

    fn history_rate(&self, _stress: &Symmetric, _q: &Orientation, history: &History, _lattice: &Lattice, _temperature: f64) -> Result<DVector<f64>> {
        Ok(DVector::zeros(history.size()))
    }

    fn d_history_rate_d_stress(&self, _stress: &Symmetric, _q: &Orientation, history: &History, _lattice: &Lattice, _temperature: f64) -> Result<DMatrix<f64>> {
        Ok(DMatrix::zeros(history.size(), 6))
    }

    fn d_history_rate_d_orientation(&self, _stress: &Symmetric, _q: &Orientation, history: &History, _lattice: &Lattice, _temperature: f64) -> Result<DMatrix<f64>> {
        Ok(DMatrix::zeros(history.size(), 3))
    }

    fn d_history_rate_d_history(&self, _stress: &Symmetric, _q: &Orientation, history: &History, _lattice: &Lattice, _temperature: f64) -> Result<DMatrix<f64>> {
        let nh = history.size();
        Ok(DMatrix::zeros(nh, nh))
    }
}

/// Plastic flow as the sum of crystallographic slip,
/// `d_p = Σ γ̇_i M_i` and `w_p = Σ γ̇_i N_i`, with `M_i` and `N_i` the
/// symmetric and skew parts of `s_i ⊗ n_i` in the sample frame.
#[derive(Debug, Clone)]
pub struct AsaroInelasticity {
    rule: Arc<dyn SlipRule>,
}

impl AsaroInelasticity {
    pub fn new(rule: Arc<dyn SlipRule>) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &Arc<dyn SlipRule> {
        &self.rule
    }
}

impl InelasticModel for AsaroInelasticity {
    fn populate_history(&self, history: &mut History) -> Result<()> {
        self.rule.populate_history(history)
    }

    fn init_history(&self, history: &mut History) -> Result<()> {
        self.rule.init_history(history)
    }

    fn d_p(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<Symmetric> {
        let mut d = Symmetric::zero();
        for (g, i) in lattice.systems() {
            d += self.rule.slip(g, i, stress, q, history, lattice, temperature)? * lattice.m(g, i, q);
        }
        Ok(d)
    }

    fn d_d_p_d_stress(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<SymSymR4> {
        let mut d = SymSymR4::zeros();
        for (g, i) in lattice.systems() {
            let dslip = self.rule.d_slip_d_s(g, i, stress, q, history, lattice, temperature)?;
            d += lattice.m(g, i, q).outer(&dslip);
        }
        Ok(d)
    }

    fn d_d_p_d_orientation(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<SymSkewR4> {
        let mut d = SymSkewR4::zeros();
        for (g, i) in lattice.systems() {
            let slip = self.rule.slip(g, i, stress, q, history, lattice, temperature)?;
            let dslip = self.rule.d_slip_d_orientation(g, i, stress, q, history, lattice, temperature)?;
            d += lattice.m(g, i, q).as_vector() * dslip.transpose() + slip * lattice.d_m_d_orientation(g, i, q);
        }
        Ok(d)
    }

    fn d_d_p_d_history(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DMatrix<f64>> {
        let mut d = DMatrix::zeros(6, history.size());
        for (g, i) in lattice.systems() {
            let dslip = self.rule.d_slip_d_h(g, i, stress, q, history, lattice, temperature)?;
            let m = lattice.m(g, i, q);
            d += DVector::from_column_slice(m.as_slice()) * dslip.transpose();
        }
        Ok(d)
    }

    fn w_p(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<Skew> {
        let mut w = Skew::zero();
        for (g, i) in lattice.systems() {
            w += self.rule.slip(g, i, stress, q, history, lattice, temperature)? * lattice.n(g, i, q);
        }
        Ok(w)
    }

    fn d_w_p_d_stress(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<SkewSymR4> {
        let mut d = SkewSymR4::zeros();
        for (g, i) in lattice.systems() {
            let dslip = self.rule.d_slip_d_s(g, i, stress, q, history, lattice, temperature)?;
            d += lattice.n(g, i, q).as_vector() * dslip.as_vector().transpose();
        }
        Ok(d)
    }

    fn d_w_p_d_orientation(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<SkewSkewR4> {
        let mut d = SkewSkewR4::zeros();
        for (g, i) in lattice.systems() {
            let slip = self.rule.slip(g, i, stress, q, history, lattice, temperature)?;
            let dslip = self.rule.d_slip_d_orientation(g, i, stress, q, history, lattice, temperature)?;
            d += lattice.n(g, i, q).as_vector() * dslip.transpose() + slip * lattice.d_n_d_orientation(g, i, q);
        }
        Ok(d)
    }

    fn d_w_p_d_history(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DMatrix<f64>> {
        let mut d = DMatrix::zeros(3, history.size());
        for (g, i) in lattice.systems() {
            let dslip = self.rule.d_slip_d_h(g, i, stress, q, history, lattice, temperature)?;
            let n = lattice.n(g, i, q);
            d += DVector::from_column_slice(n.as_slice()) * dslip.transpose();
        }
        Ok(d)
    }

    fn history_rate(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DVector<f64>> {
        self.rule.hist_rate(stress, q, history, lattice, temperature)
    }

    fn d_history_rate_d_stress(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DMatrix<f64>> {
        self.rule.d_hist_rate_d_stress(stress, q, history, lattice, temperature)
    }

    fn d_history_rate_d_orientation(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DMatrix<f64>> {
        self.rule.d_hist_rate_d_orientation(stress, q, history, lattice, temperature)
    }

    fn d_history_rate_d_history(&self, stress: &Symmetric, q: &Orientation, history: &History, lattice: &Lattice, temperature: f64) -> Result<DMatrix<f64>> {
        self.rule.d_hist_rate_d_hist(stress, q, history, lattice, temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crystallography::LatticeBuilder;
    use crate::numdiff::*;
    use crate::rotations::{AngleUnit, EulerConvention};
    use crate::slipharden::VoceSlipHardening;
    use crate::sliprules::PowerLawSlipRule;
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    const T: f64 = 300.0;

    fn setup() -> (AsaroInelasticity, Lattice, Symmetric, Orientation, History) {
        let hardening = Arc::new(VoceSlipHardening::new(50.0, 2.5, 10.0));
        let model = AsaroInelasticity::new(Arc::new(PowerLawSlipRule::new(hardening, 1.0, 3.0)));
        let mut history = History::new();
        model.populate_history(&mut history).unwrap();
        model.init_history(&mut history).unwrap();
        history.set_scalar("strength", 35.0).unwrap();
        let lattice = LatticeBuilder::cubic(1.0).add_slip_system([1, 1, 0], [1, 1, 1]).unwrap().build();
        let stress = Symmetric::from_full(&Matrix3::new(100.0, -25.0, 10.0, -25.0, -17.0, 15.0, 10.0, 15.0, 35.0));
        let q = Orientation::from_euler_angles(35.0, 17.0, 14.0, AngleUnit::Degrees, EulerConvention::Kocks);
        (model, lattice, stress, q, history)
    }

    #[test]
    fn plastic_rates_sum_slip_dyads() {
        let (model, lattice, stress, q, history) = setup();
        let mut lp = Matrix3::zeros();
        for (g, i) in lattice.systems() {
            let slip = model.rule().slip(g, i, &stress, &q, &history, &lattice, T).unwrap();
            lp += slip * lattice.slip_direction(g, i, &q) * lattice.slip_normal(g, i, &q).transpose();
        }
        let dp = model.d_p(&stress, &q, &history, &lattice, T).unwrap();
        let wp = model.w_p(&stress, &q, &history, &lattice, T).unwrap();
        assert_relative_eq!(dp.to_full(), 0.5 * (lp + lp.transpose()), epsilon = 1e-10);
        assert_relative_eq!(wp.to_full(), 0.5 * (lp - lp.transpose()), epsilon = 1e-10);
        // incompressible flow
        assert_relative_eq!(dp.trace(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn stress_derivatives() {
        let (model, lattice, stress, q, history) = setup();
        let d = model.d_d_p_d_stress(&stress, &q, &history, &lattice, T).unwrap();
        let n = diff_symmetric_symmetric(|s| model.d_p(s, &q, &history, &lattice, T), &stress, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d, &n, 1e-5, 1e-8));

        let d = model.d_w_p_d_stress(&stress, &q, &history, &lattice, T).unwrap();
        let n = diff_skew_symmetric(|s| model.w_p(s, &q, &history, &lattice, T), &stress, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d, &n, 1e-5, 1e-8));

        let d = model.d_history_rate_d_stress(&stress, &q, &history, &lattice, T).unwrap();
        let n = diff_history_symmetric(|s| model.history_rate(s, &q, &history, &lattice, T), &stress, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d, &n, 1e-5, 1e-8));
    }

    #[test]
    fn history_derivatives() {
        let (model, lattice, stress, q, history) = setup();
        let d = model.d_d_p_d_history(&stress, &q, &history, &lattice, T).unwrap();
        let n = diff_symmetric_history(|h| model.d_p(&stress, &q, h, &lattice, T), &history, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d, &n, 1e-5, 1e-8));

        let d = model.d_w_p_d_history(&stress, &q, &history, &lattice, T).unwrap();
        let n = diff_skew_history(|h| model.w_p(&stress, &q, h, &lattice, T), &history, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d, &n, 1e-5, 1e-8));

        let d = model.d_history_rate_d_history(&stress, &q, &history, &lattice, T).unwrap();
        let n = diff_history_history(|h| model.history_rate(&stress, &q, h, &lattice, T), &history, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d, &n, 1e-5, 1e-8));
    }

    #[test]
    fn orientation_derivatives() {
        let (model, lattice, stress, q, history) = setup();
        let d = model.d_d_p_d_orientation(&stress, &q, &history, &lattice, T).unwrap();
        let n = diff_symmetric_orientation(|q| model.d_p(&stress, q, &history, &lattice, T), &q, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d, &n, 1e-5, 1e-8));

        let d = model.d_w_p_d_orientation(&stress, &q, &history, &lattice, T).unwrap();
        let n = diff_skew_orientation(|q| model.w_p(&stress, q, &history, &lattice, T), &q, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d, &n, 1e-5, 1e-8));

        let d = model.d_history_rate_d_orientation(&stress, &q, &history, &lattice, T).unwrap();
        let n = diff_history_orientation(|q| model.history_rate(&stress, q, &history, &lattice, T), &q, DEFAULT_STEP).unwrap();
        assert!(jacobians_agree(&d, &n, 1e-5, 1e-8));
    }

    #[test]
    fn no_inelasticity_has_no_state() {
        let (_, lattice, stress, q, _) = setup();
        let model = NoInelasticity;
        let mut history = History::new();
        model.populate_history(&mut history).unwrap();
        assert!(history.is_empty());
        assert_eq!(model.d_p(&stress, &q, &history, &lattice, T).unwrap(), Symmetric::zero());
        assert_eq!(model.d_d_p_d_history(&stress, &q, &history, &lattice, T).unwrap().shape(), (6, 0));
        assert_eq!(model.history_rate(&stress, &q, &history, &lattice, T).unwrap().len(), 0);
    }
}
