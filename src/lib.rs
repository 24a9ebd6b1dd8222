pub mod crystallography;
pub mod elasticity;
pub mod error;
pub mod history;
pub mod inelasticity;
pub mod interfaces;
pub mod kinematics;
pub mod mandel;
pub mod numdiff;
pub mod parameters;
pub mod rotations;
pub mod slipharden;
pub mod sliprules;
pub mod stress_strain;
pub mod tensors;

#[cfg(feature = "python")]
mod python;

pub use crystallography::{Lattice, LatticeBuilder, SlipSystem};
pub use elasticity::{CubicLinearElasticModel, CubicParameterization, IsotropicLinearElasticModel};
pub use error::{KinematicsError, Result};
pub use history::{History, HistoryKind};
pub use inelasticity::{AsaroInelasticity, NoInelasticity};
pub use interfaces::{ElasticModel, InelasticModel};
pub use kinematics::{CachedKinematicModel, Decoupled, StandardKinematicModel};
pub use parameters::{Parameter, Table};
pub use rotations::{AngleUnit, EulerConvention, Orientation};
pub use slipharden::{SlipHardening, VoceSlipHardening};
pub use sliprules::{PowerLawSlipRule, SlipRule};
pub use tensors::{SkewSkewR4, SkewSymR4, Skew, SymSkewR4, SymSymR4, Symmetric};
