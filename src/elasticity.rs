use std::collections::HashMap;

use strum_macros::{Display, EnumString};

use crate::error::Result;
use crate::interfaces::ElasticModel;
use crate::mandel::MANDEL_IDENTITY;
use crate::parameters::{required, Parameter};
use crate::rotations::Orientation;
use crate::tensors::SymSymR4;

#[derive(Debug, Clone)]
pub struct IsotropicLinearElasticModel {
    youngs: Parameter,
    poisson: Parameter,
}

impl IsotropicLinearElasticModel {
    pub fn new(youngs: impl Into<Parameter>, poisson: impl Into<Parameter>) -> Self {
        Self {
            youngs: youngs.into(),
            poisson: poisson.into(),
        }
    }

    pub fn from_parameters(parameters: &HashMap<String, f64>) -> Result<Self> {
        Ok(Self::new(required(parameters, "E")?, required(parameters, "nu")?))
    }

    /// Lamé constants `(λ, μ)`.
    pub fn lame(&self, temperature: f64) -> (f64, f64) {
        let e = self.youngs.value(temperature);
        let nu = self.poisson.value(temperature);
        let mu = e / (2.0 * (1.0 + nu));
        let lambda = e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu));
        (lambda, mu)
    }
}

impl ElasticModel for IsotropicLinearElasticModel {
    fn c_lattice(&self, temperature: f64) -> SymSymR4 {
        let (lambda, mu) = self.lame(temperature);
        lambda * MANDEL_IDENTITY * MANDEL_IDENTITY.transpose() + 2.0 * mu * SymSymR4::identity()
    }

    fn c_tensor(&self, temperature: f64, _q: &Orientation) -> SymSymR4 {
        self.c_lattice(temperature)
    }

    fn s_tensor(&self, temperature: f64, _q: &Orientation) -> Result<SymSymR4> {
        self.s_lattice(temperature)
    }

    fn d_c_tensor_d_orientation(&self, _temperature: f64, _q: &Orientation) -> [SymSymR4; 3] {
        [SymSymR4::zeros(); 3]
    }

    fn d_s_tensor_d_orientation(&self, _temperature: f64, _q: &Orientation) -> Result<[SymSymR4; 3]> {
        Ok([SymSymR4::zeros(); 3])
    }
}

/// How the three cubic constants are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CubicParameterization {
    /// Young's modulus, Poisson's ratio and shear modulus.
    Moduli,
    /// `C11`, `C12`, `C44`.
    Components,
}

#[derive(Debug, Clone)]
pub struct CubicLinearElasticModel {
    constants: [Parameter; 3],
    method: CubicParameterization,
}

impl CubicLinearElasticModel {
    pub fn new(
        m1: impl Into<Parameter>,
        m2: impl Into<Parameter>,
        m3: impl Into<Parameter>,
        method: CubicParameterization,
    ) -> Self {
        Self {
            constants: [m1.into(), m2.into(), m3.into()],
            method,
        }
    }

    /// Reads `E`, `nu`, `mu` if present, otherwise `C11`, `C12`, `C44`.
    pub fn from_parameters(parameters: &HashMap<String, f64>) -> Result<Self> {
        if parameters.contains_key("E") {
            Ok(Self::new(
                required(parameters, "E")?,
                required(parameters, "nu")?,
                required(parameters, "mu")?,
                CubicParameterization::Moduli,
            ))
        } else {
            Ok(Self::new(
                required(parameters, "C11")?,
                required(parameters, "C12")?,
                required(parameters, "C44")?,
                CubicParameterization::Components,
            ))
        }
    }

    /// `(C11, C12, C44)` at `temperature`.
    pub fn components(&self, temperature: f64) -> (f64, f64, f64) {
        let [m1, m2, m3] = &self.constants;
        let (m1, m2, m3) = (m1.value(temperature), m2.value(temperature), m3.value(temperature));
        match self.method {
            CubicParameterization::Components => (m1, m2, m3),
            CubicParameterization::Moduli => {
                let (e, nu, mu) = (m1, m2, m3);
                let f = e / ((1.0 + nu) * (1.0 - 2.0 * nu));
                (f * (1.0 - nu), f * nu, mu)
            }
        }
    }
}

impl ElasticModel for CubicLinearElasticModel {
    fn c_lattice(&self, temperature: f64) -> SymSymR4 {
        let (c11, c12, c44) = self.components(temperature);
        let mut c = SymSymR4::zeros();
        for i in 0..3 {
            for j in 0..3 {
                c[(i, j)] = if i == j { c11 } else { c12 };
            }
            c[(i + 3, i + 3)] = 2.0 * c44;
        }
        c
    }
}
