use std::collections::HashMap;

use crate::error::{KinematicsError, Result};

/// A material parameter that may depend on temperature.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Constant(f64),
    /// Polynomial coefficients, highest power first.
    Polynomial(Vec<f64>),
    /// Linear interpolation in a [`Table`], clamped outside it.
    PiecewiseLinear(Table),
}

/// `(temperature, value)` pairs with finite, strictly increasing
/// temperatures.
#[derive(Debug, Clone, PartialEq)]
pub struct Table(Vec<(f64, f64)>);

impl Table {
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self> {
        if points.is_empty() {
            return Err(KinematicsError::NumericDomain("empty parameter table".to_string()));
        }
        if points.iter().any(|(t, v)| !t.is_finite() || !v.is_finite()) {
            return Err(KinematicsError::NumericDomain("non-finite entry in parameter table".to_string()));
        }
        if points.windows(2).any(|pair| pair[1].0 <= pair[0].0) {
            return Err(KinematicsError::NumericDomain(
                "parameter table temperatures must be strictly increasing".to_string(),
            ));
        }
        Ok(Self(points))
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.0
    }
}

impl Parameter {
    pub fn value(&self, temperature: f64) -> f64 {
        match self {
            Parameter::Constant(value) => *value,
            Parameter::Polynomial(coefs) => coefs.iter().fold(0.0, |acc, c| acc * temperature + c),
            Parameter::PiecewiseLinear(table) => piecewise(table.points(), temperature),
        }
    }
}

fn piecewise(points: &[(f64, f64)], t: f64) -> f64 {
    match points {
        _ if t.is_nan() => f64::NAN,
        [] => f64::NAN,
        [(_, v)] => *v,
        [(t0, v0), ..] if t <= *t0 => *v0,
        [.., (tn, vn)] if t >= *tn => *vn,
        _ => {
            let i = points.partition_point(|(ti, _)| *ti <= t);
            let (t0, v0) = points[i - 1];
            let (t1, v1) = points[i];
            v0 + (v1 - v0) * (t - t0) / (t1 - t0)
        }
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Constant(value)
    }
}

/// Temperatures the laws can be evaluated at.
pub fn check_temperature(temperature: f64) -> Result<()> {
    if !temperature.is_finite() {
        return Err(KinematicsError::NumericDomain(format!("temperature {temperature}")));
    }
    Ok(())
}

/// Reads a required entry from a parameter map.
pub fn required(parameters: &HashMap<String, f64>, name: &str) -> Result<f64> {
    parameters
        .get(name)
        .copied()
        .ok_or_else(|| KinematicsError::MissingParameter(name.to_string()))
}

pub fn optional(parameters: &HashMap<String, f64>, name: &str, default: f64) -> f64 {
    parameters.get(name).copied().unwrap_or(default)
}
