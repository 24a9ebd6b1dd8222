//! Kinematic decoupling of the velocity gradient into elastic, plastic and
//! lattice parts.
//!
//! With `e = S_c : S` the elastic strain and `Ω = w − (e·d_p − d_p·e)` the
//! corotational spin, the model produces
//!
//! * the lattice spin `Ω − w_p`,
//! * the stress rate `C : (d − d_p − (e·Ω − Ω·e))`,
//! * the history rate of the inelastic model,
//!
//! and their exact derivatives with respect to stress, deformation rate,
//! vorticity and history.
use std::sync::Arc;

use nalgebra::storage::RawStorage;
use nalgebra::{DMatrix, DVector, Dim, Matrix};
use tracing::{debug, trace};

use crate::crystallography::Lattice;
use crate::error::{KinematicsError, Result};
use crate::history::History;
use crate::interfaces::{ElasticModel, InelasticModel};
use crate::parameters::check_temperature;
use crate::rotations::Orientation;
use crate::stress_strain::{jaumann_correction, jaumann_operator, skew_commutator, sym_skew_commutator, symmetric_commutator};
use crate::tensors::{SkewSkewR4, SkewSymR4, Skew, SymSkewR4, SymSymR4, Symmetric};

fn to_dynamic<R: Dim, C: Dim, S: RawStorage<f64, R, C>>(m: &Matrix<f64, R, C, S>) -> DMatrix<f64> {
    DMatrix::from_iterator(m.nrows(), m.ncols(), m.iter().copied())
}

fn check_shape(what: &str, m: &DMatrix<f64>, rows: usize, cols: usize) -> Result<()> {
    if m.shape() != (rows, cols) {
        return Err(KinematicsError::shape(
            format!("{what} of shape {rows}x{cols}"),
            format!("{}x{}", m.nrows(), m.ncols()),
        ));
    }
    Ok(())
}

/// Everything the rates and their derivatives need from one evaluation of
/// the elastic and inelastic laws.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoupled {
    d: Symmetric,
    w: Skew,
    c: SymSymR4,
    compliance: SymSymR4,
    e: Symmetric,
    d_p: Symmetric,
    w_p: Skew,
    d_d_p_d_stress: SymSymR4,
    d_d_p_d_history: DMatrix<f64>,
    d_w_p_d_stress: SkewSymR4,
    d_w_p_d_history: DMatrix<f64>,
    history_rate: DVector<f64>,
    d_history_rate_d_stress: DMatrix<f64>,
    d_history_rate_d_history: DMatrix<f64>,
}

impl Decoupled {
    pub fn stiffness(&self) -> &SymSymR4 {
        &self.c
    }

    pub fn compliance(&self) -> &SymSymR4 {
        &self.compliance
    }

    pub fn elastic_strain(&self) -> &Symmetric {
        &self.e
    }

    pub fn plastic_deformation_rate(&self) -> &Symmetric {
        &self.d_p
    }

    pub fn plastic_spin(&self) -> &Skew {
        &self.w_p
    }

    pub fn history_size(&self) -> usize {
        self.history_rate.len()
    }

    /// Corotational spin `Ω = w_p + spin`.
    fn omega(&self) -> Skew {
        self.w - symmetric_commutator(&self.e, &self.d_p)
    }

    fn d_omega_d_stress(&self) -> SkewSymR4 {
        -skew_commutator(&self.e) * self.d_d_p_d_stress + skew_commutator(&self.d_p) * self.compliance
    }

    /// `3 x nh`
    fn d_omega_d_history(&self) -> DMatrix<f64> {
        -to_dynamic(&skew_commutator(&self.e)) * &self.d_d_p_d_history
    }

    pub fn spin(&self) -> Skew {
        self.omega() - self.w_p
    }

    pub fn stress_rate(&self) -> Symmetric {
        (self.d - self.d_p - jaumann_correction(&self.e, &self.omega())).premultiply(&self.c)
    }

    pub fn history_rate(&self) -> DVector<f64> {
        self.history_rate.clone()
    }

    pub fn d_stress_rate_d_stress(&self) -> SymSymR4 {
        let omega = self.omega();
        -self.c
            * (self.d_d_p_d_stress
                + jaumann_operator(&omega) * self.compliance
                + sym_skew_commutator(&self.e) * self.d_omega_d_stress())
    }

    pub fn d_stress_rate_d_d(&self) -> SymSymR4 {
        self.c
    }

    pub fn d_stress_rate_d_w(&self) -> SymSkewR4 {
        -self.c * sym_skew_commutator(&self.e)
    }

    /// `6 x nh`
    pub fn d_stress_rate_d_history(&self) -> DMatrix<f64> {
        let inner = &self.d_d_p_d_history + to_dynamic(&sym_skew_commutator(&self.e)) * self.d_omega_d_history();
        -to_dynamic(&self.c) * inner
    }

    /// `nh x 6`
    pub fn d_history_rate_d_stress(&self) -> DMatrix<f64> {
        self.d_history_rate_d_stress.clone()
    }

    /// `nh x 6`
    pub fn d_history_rate_d_d(&self) -> DMatrix<f64> {
        DMatrix::zeros(self.history_size(), 6)
    }

    /// `nh x 3`
    pub fn d_history_rate_d_w(&self) -> DMatrix<f64> {
        DMatrix::zeros(self.history_size(), 3)
    }

    /// `nh x nh`
    pub fn d_history_rate_d_history(&self) -> DMatrix<f64> {
        self.d_history_rate_d_history.clone()
    }

    pub fn d_spin_d_stress(&self) -> SkewSymR4 {
        self.d_omega_d_stress() - self.d_w_p_d_stress
    }

    pub fn d_spin_d_d(&self) -> SkewSymR4 {
        SkewSymR4::zeros()
    }

    pub fn d_spin_d_w(&self) -> SkewSkewR4 {
        SkewSkewR4::identity()
    }

    /// `3 x nh`
    pub fn d_spin_d_history(&self) -> DMatrix<f64> {
        self.d_omega_d_history() - &self.d_w_p_d_history
    }
}

/// Decouple, then evaluate one quantity.
macro_rules! one_shot {
    ($($name:ident -> $out:ty),* $(,)?) => {
        $(
            #[allow(clippy::too_many_arguments)]
            pub fn $name(
                &self,
                stress: &Symmetric,
                d: &Symmetric,
                w: &Skew,
                q: &Orientation,
                history: &History,
                lattice: &Lattice,
                temperature: f64,
            ) -> Result<$out> {
                Ok(self.decouple(stress, d, w, q, history, lattice, temperature)?.$name())
            }
        )*
    };
}

/// Composes one elastic and one inelastic law into stress, spin and history
/// rates.
#[derive(Debug, Clone)]
pub struct StandardKinematicModel {
    emodel: Arc<dyn ElasticModel>,
    imodel: Arc<dyn InelasticModel>,
}

impl StandardKinematicModel {
    pub fn new(emodel: Arc<dyn ElasticModel>, imodel: Arc<dyn InelasticModel>) -> Self {
        debug!(?emodel, ?imodel, "kinematic model");
        Self { emodel, imodel }
    }

    pub fn elastic_model(&self) -> &Arc<dyn ElasticModel> {
        &self.emodel
    }

    pub fn inelastic_model(&self) -> &Arc<dyn InelasticModel> {
        &self.imodel
    }

    pub fn populate_history(&self, history: &mut History) -> Result<()> {
        self.imodel.populate_history(history)
    }

    pub fn init_history(&self, history: &mut History) -> Result<()> {
        self.imodel.init_history(history)
    }

    /// `S_c : S` in the sample frame.
    pub fn elastic_strains(&self, stress: &Symmetric, q: &Orientation, temperature: f64) -> Result<Symmetric> {
        Ok(stress.premultiply(&self.emodel.s_tensor(temperature, q)?))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn decouple(
        &self,
        stress: &Symmetric,
        d: &Symmetric,
        w: &Skew,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
    ) -> Result<Decoupled> {
        check_temperature(temperature)?;
        let nh = history.size();
        trace!(nh, temperature, "decoupling");

        let c = self.emodel.c_tensor(temperature, q);
        let compliance = self.emodel.s_tensor(temperature, q)?;
        let im = &self.imodel;

        let d_d_p_d_history = im.d_d_p_d_history(stress, q, history, lattice, temperature)?;
        check_shape("d_p history derivative", &d_d_p_d_history, 6, nh)?;
        let d_w_p_d_history = im.d_w_p_d_history(stress, q, history, lattice, temperature)?;
        check_shape("w_p history derivative", &d_w_p_d_history, 3, nh)?;
        let history_rate = im.history_rate(stress, q, history, lattice, temperature)?;
        if history_rate.len() != nh {
            return Err(KinematicsError::shape(format!("history rate of length {nh}"), history_rate.len()));
        }
        let d_history_rate_d_stress = im.d_history_rate_d_stress(stress, q, history, lattice, temperature)?;
        check_shape("history rate stress derivative", &d_history_rate_d_stress, nh, 6)?;
        let d_history_rate_d_history = im.d_history_rate_d_history(stress, q, history, lattice, temperature)?;
        check_shape("history rate history derivative", &d_history_rate_d_history, nh, nh)?;

        Ok(Decoupled {
            d: *d,
            w: *w,
            c,
            compliance,
            e: stress.premultiply(&compliance),
            d_p: im.d_p(stress, q, history, lattice, temperature)?,
            w_p: im.w_p(stress, q, history, lattice, temperature)?,
            d_d_p_d_stress: im.d_d_p_d_stress(stress, q, history, lattice, temperature)?,
            d_d_p_d_history,
            d_w_p_d_stress: im.d_w_p_d_stress(stress, q, history, lattice, temperature)?,
            d_w_p_d_history,
            history_rate,
            d_history_rate_d_stress,
            d_history_rate_d_history,
        })
    }

    one_shot! {
        spin -> Skew,
        stress_rate -> Symmetric,
        history_rate -> DVector<f64>,
        d_stress_rate_d_stress -> SymSymR4,
        d_stress_rate_d_d -> SymSymR4,
        d_stress_rate_d_w -> SymSkewR4,
        d_stress_rate_d_history -> DMatrix<f64>,
        d_history_rate_d_stress -> DMatrix<f64>,
        d_history_rate_d_d -> DMatrix<f64>,
        d_history_rate_d_w -> DMatrix<f64>,
        d_history_rate_d_history -> DMatrix<f64>,
        d_spin_d_stress -> SkewSymR4,
        d_spin_d_d -> SkewSymR4,
        d_spin_d_w -> SkewSkewR4,
        d_spin_d_history -> DMatrix<f64>,
    }
}

#[derive(Debug, Clone)]
struct DecoupleKey {
    stress: Symmetric,
    d: Symmetric,
    w: Skew,
    q: Orientation,
    history: History,
    lattice: Lattice,
    temperature: f64,
}

/// Stateful `decouple → rates` protocol for drivers that evaluate the rates
/// one at a time. Every query must repeat the arguments of the last
/// [`CachedKinematicModel::decouple`] call, otherwise it fails with
/// [`KinematicsError::StaleCache`].
#[derive(Debug, Clone)]
pub struct CachedKinematicModel {
    model: StandardKinematicModel,
    cache: Option<(DecoupleKey, Decoupled)>,
}

/// Check the arguments against the cache, then evaluate one quantity.
macro_rules! cached {
    ($($name:ident -> $out:ty),* $(,)?) => {
        $(
            #[allow(clippy::too_many_arguments)]
            pub fn $name(
                &self,
                stress: &Symmetric,
                d: &Symmetric,
                w: &Skew,
                q: &Orientation,
                history: &History,
                lattice: &Lattice,
                temperature: f64,
            ) -> Result<$out> {
                Ok(self.lookup(stress, d, w, q, history, lattice, temperature)?.$name())
            }
        )*
    };
}

impl CachedKinematicModel {
    pub fn new(model: StandardKinematicModel) -> Self {
        Self { model, cache: None }
    }

    pub fn model(&self) -> &StandardKinematicModel {
        &self.model
    }

    pub fn populate_history(&self, history: &mut History) -> Result<()> {
        self.model.populate_history(history)
    }

    pub fn init_history(&self, history: &mut History) -> Result<()> {
        self.model.init_history(history)
    }

    /// Replaces the cache. A failed call leaves it empty.
    #[allow(clippy::too_many_arguments)]
    pub fn decouple(
        &mut self,
        stress: &Symmetric,
        d: &Symmetric,
        w: &Skew,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
    ) -> Result<()> {
        self.cache = None;
        let decoupled = self.model.decouple(stress, d, w, q, history, lattice, temperature)?;
        let key = DecoupleKey {
            stress: *stress,
            d: *d,
            w: *w,
            q: *q,
            history: history.clone(),
            lattice: lattice.clone(),
            temperature,
        };
        self.cache = Some((key, decoupled));
        Ok(())
    }

    /// The cached result, if it was computed from these arguments.
    #[allow(clippy::too_many_arguments)]
    pub fn lookup(
        &self,
        stress: &Symmetric,
        d: &Symmetric,
        w: &Skew,
        q: &Orientation,
        history: &History,
        lattice: &Lattice,
        temperature: f64,
    ) -> Result<&Decoupled> {
        let (key, decoupled) = self.cache.as_ref().ok_or(KinematicsError::StaleCache)?;
        let fresh = key.stress == *stress
            && key.d == *d
            && key.w == *w
            && key.q == *q
            && key.temperature == temperature
            && key.history.as_slice() == history.as_slice()
            && key.history.slots() == history.slots()
            && key.lattice == *lattice;
        if !fresh {
            return Err(KinematicsError::StaleCache);
        }
        Ok(decoupled)
    }

    cached! {
        spin -> Skew,
        stress_rate -> Symmetric,
        history_rate -> DVector<f64>,
        d_stress_rate_d_stress -> SymSymR4,
        d_stress_rate_d_d -> SymSymR4,
        d_stress_rate_d_w -> SymSkewR4,
        d_stress_rate_d_history -> DMatrix<f64>,
        d_history_rate_d_stress -> DMatrix<f64>,
        d_history_rate_d_d -> DMatrix<f64>,
        d_history_rate_d_w -> DMatrix<f64>,
        d_history_rate_d_history -> DMatrix<f64>,
        d_spin_d_stress -> SkewSymR4,
        d_spin_d_d -> SkewSymR4,
        d_spin_d_w -> SkewSkewR4,
        d_spin_d_history -> DMatrix<f64>,
    }
}
