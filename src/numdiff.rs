//! Central-difference Jacobians used to check the analytic derivatives.
//!
//! Tensor and history inputs are perturbed one packed component at a time
//! by `±ε·max(|x_i|, 1)`. Orientations are perturbed through the exponential
//! map `q ← exp(±ε W_k) q`, which matches the convention of the analytic
//! orientation derivatives.
use nalgebra::storage::RawStorage;
use nalgebra::{DMatrix, DVector, Dim, Matrix, SMatrix, Vector3};

use crate::error::{KinematicsError, Result};
use crate::history::History;
use crate::rotations::Orientation;
use crate::tensors::{SkewSkewR4, SkewSymR4, Skew, SymSkewR4, SymSymR4, Symmetric};

pub const DEFAULT_STEP: f64 = 1.0e-6;

fn central<F>(x: &[f64], eps: f64, relative: bool, mut f: F) -> Result<DMatrix<f64>>
where
    F: FnMut(&[f64]) -> Result<DVector<f64>>,
{
    let nout = f(x)?.len();
    let mut jac = DMatrix::zeros(nout, x.len());
    let mut shifted = x.to_vec();
    for j in 0..x.len() {
        let h = if relative { eps * x[j].abs().max(1.0) } else { eps };
        shifted[j] = x[j] + h;
        let plus = f(&shifted)?;
        shifted[j] = x[j] - h;
        let minus = f(&shifted)?;
        shifted[j] = x[j];
        if plus.len() != nout || minus.len() != nout {
            return Err(KinematicsError::shape(nout, plus.len().max(minus.len())));
        }
        jac.set_column(j, &((plus - minus) / (2.0 * h)));
    }
    Ok(jac)
}

fn fixed<const R: usize, const C: usize>(m: DMatrix<f64>) -> Result<SMatrix<f64, R, C>> {
    if m.shape() != (R, C) {
        return Err(KinematicsError::shape(format!("{R}x{C}"), format!("{}x{}", m.nrows(), m.ncols())));
    }
    Ok(SMatrix::<f64, R, C>::from_column_slice(m.as_slice()))
}

fn sym_out(s: Symmetric) -> DVector<f64> {
    DVector::from_column_slice(s.as_slice())
}

fn skew_out(w: Skew) -> DVector<f64> {
    DVector::from_column_slice(w.as_slice())
}

fn over_symmetric<F>(x: &Symmetric, eps: f64, mut f: F) -> Result<DMatrix<f64>>
where
    F: FnMut(&Symmetric) -> Result<DVector<f64>>,
{
    central(x.as_slice(), eps, true, |v| f(&Symmetric::from_slice(v)?))
}

fn over_skew<F>(x: &Skew, eps: f64, mut f: F) -> Result<DMatrix<f64>>
where
    F: FnMut(&Skew) -> Result<DVector<f64>>,
{
    central(x.as_slice(), eps, true, |v| f(&Skew::from_slice(v)?))
}

fn over_history<F>(x: &History, eps: f64, mut f: F) -> Result<DMatrix<f64>>
where
    F: FnMut(&History) -> Result<DVector<f64>>,
{
    let mut shifted = x.clone();
    central(x.as_slice(), eps, true, |v| {
        shifted.set_vector(v)?;
        f(&shifted)
    })
}

fn over_orientation<F>(q: &Orientation, eps: f64, mut f: F) -> Result<DMatrix<f64>>
where
    F: FnMut(&Orientation) -> Result<DVector<f64>>,
{
    central(&[0.0; 3], eps, false, |v| f(&q.perturbed(&Vector3::from_column_slice(v))))
}

pub fn diff_symmetric_symmetric<F>(mut f: F, x: &Symmetric, eps: f64) -> Result<SymSymR4>
where
    F: FnMut(&Symmetric) -> Result<Symmetric>,
{
    fixed(over_symmetric(x, eps, |s| f(s).map(sym_out))?)
}

pub fn diff_symmetric_skew<F>(mut f: F, x: &Skew, eps: f64) -> Result<SymSkewR4>
where
    F: FnMut(&Skew) -> Result<Symmetric>,
{
    fixed(over_skew(x, eps, |w| f(w).map(sym_out))?)
}

/// `6 x nh`
pub fn diff_symmetric_history<F>(mut f: F, x: &History, eps: f64) -> Result<DMatrix<f64>>
where
    F: FnMut(&History) -> Result<Symmetric>,
{
    over_history(x, eps, |h| f(h).map(sym_out))
}

/// `nh x 6`
pub fn diff_history_symmetric<F>(f: F, x: &Symmetric, eps: f64) -> Result<DMatrix<f64>>
where
    F: FnMut(&Symmetric) -> Result<DVector<f64>>,
{
    over_symmetric(x, eps, f)
}

/// `nh x 3`
pub fn diff_history_skew<F>(f: F, x: &Skew, eps: f64) -> Result<DMatrix<f64>>
where
    F: FnMut(&Skew) -> Result<DVector<f64>>,
{
    over_skew(x, eps, f)
}

/// `nh x nh`
pub fn diff_history_history<F>(f: F, x: &History, eps: f64) -> Result<DMatrix<f64>>
where
    F: FnMut(&History) -> Result<DVector<f64>>,
{
    over_history(x, eps, f)
}

pub fn diff_skew_symmetric<F>(mut f: F, x: &Symmetric, eps: f64) -> Result<SkewSymR4>
where
    F: FnMut(&Symmetric) -> Result<Skew>,
{
    fixed(over_symmetric(x, eps, |s| f(s).map(skew_out))?)
}

pub fn diff_skew_skew<F>(mut f: F, x: &Skew, eps: f64) -> Result<SkewSkewR4>
where
    F: FnMut(&Skew) -> Result<Skew>,
{
    fixed(over_skew(x, eps, |w| f(w).map(skew_out))?)
}

/// `3 x nh`
pub fn diff_skew_history<F>(mut f: F, x: &History, eps: f64) -> Result<DMatrix<f64>>
where
    F: FnMut(&History) -> Result<Skew>,
{
    over_history(x, eps, |h| f(h).map(skew_out))
}

pub fn diff_symmetric_orientation<F>(mut f: F, q: &Orientation, eps: f64) -> Result<SymSkewR4>
where
    F: FnMut(&Orientation) -> Result<Symmetric>,
{
    fixed(over_orientation(q, eps, |q| f(q).map(sym_out))?)
}

pub fn diff_skew_orientation<F>(mut f: F, q: &Orientation, eps: f64) -> Result<SkewSkewR4>
where
    F: FnMut(&Orientation) -> Result<Skew>,
{
    fixed(over_orientation(q, eps, |q| f(q).map(skew_out))?)
}

/// `nh x 3`
pub fn diff_history_orientation<F>(f: F, q: &Orientation, eps: f64) -> Result<DMatrix<f64>>
where
    F: FnMut(&Orientation) -> Result<DVector<f64>>,
{
    over_orientation(q, eps, f)
}

/// One 6x6 derivative per axial direction.
pub fn diff_matrix_orientation<F>(mut f: F, q: &Orientation, eps: f64) -> Result<[SymSymR4; 3]>
where
    F: FnMut(&Orientation) -> Result<SymSymR4>,
{
    let flat = over_orientation(q, eps, |q| Ok(DVector::from_column_slice(f(q)?.as_slice())))?;
    let mut out = [SymSymR4::zeros(); 3];
    for (k, block) in out.iter_mut().enumerate() {
        *block = SymSymR4::from_iterator(flat.column(k).iter().copied());
    }
    Ok(out)
}

/// True when both matrices have the same shape and every entry of `a` is
/// within `atol + rtol·max|b|` of the matching entry of `b`.
pub fn jacobians_agree<R, C, SA, SB>(a: &Matrix<f64, R, C, SA>, b: &Matrix<f64, R, C, SB>, rtol: f64, atol: f64) -> bool
where
    R: Dim,
    C: Dim,
    SA: RawStorage<f64, R, C>,
    SB: RawStorage<f64, R, C>,
{
    if a.shape() != b.shape() {
        return false;
    }
    let scale = b.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= atol + rtol * scale)
}
