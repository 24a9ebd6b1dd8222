use nalgebra::{Matrix3, SMatrix, SVector};

use crate::mandel::{mandel_basis, skew_basis, tensor_to_axial, tensor_to_mandel};
use crate::tensors::{SkewSymR4, Symmetric, Skew, SymSkewR4, SymSymR4};

/// `sym(a·w − w·a)`, the Jaumann correction of a symmetric tensor rotating
/// with the spin `w`. The commutator of a symmetric and a skew tensor is
/// already symmetric.
pub fn jaumann_correction(a: &Symmetric, w: &Skew) -> Symmetric {
    let a = a.to_full();
    let w = w.to_full();
    Symmetric::from_full(&(a * w - w * a))
}

/// `skew(a·b − b·a)` for two symmetric tensors.
pub fn symmetric_commutator(a: &Symmetric, b: &Symmetric) -> Skew {
    let a = a.to_full();
    let b = b.to_full();
    Skew::from_full(&(a * b - b * a))
}

/// 6x6 matrix of `a ↦ a·w − w·a` for a fixed spin `w`.
pub fn jaumann_operator(w: &Skew) -> SymSymR4 {
    let w = w.to_full();
    SymSymR4::from_fn(|i, j| {
        let b = mandel_basis(j);
        tensor_to_mandel(&(b * w - w * b))[i]
    })
}

/// 6x3 matrix of `w ↦ a·w − w·a` for a fixed symmetric `a`.
pub fn sym_skew_commutator(a: &Symmetric) -> SymSkewR4 {
    let a = a.to_full();
    SymSkewR4::from_fn(|i, k| {
        let w = skew_basis(k);
        tensor_to_mandel(&(a * w - w * a))[i]
    })
}

/// 3x6 matrix of `b ↦ skew(a·b − b·a)` for a fixed symmetric `a`.
pub fn skew_commutator(a: &Symmetric) -> SkewSymR4 {
    let a = a.to_full();
    SkewSymR4::from_fn(|k, j| {
        let b = mandel_basis(j);
        tensor_to_axial(&(a * b - b * a))[k]
    })
}

/// 6x6 matrix of `a ↦ q·a·qᵀ` in the Mandel basis. Orthogonal whenever `q`
/// is.
pub fn mandel_rotation(q: &Matrix3<f64>) -> SymSymR4 {
    SymSymR4::from_fn(|i, j| {
        let b = mandel_basis(j);
        tensor_to_mandel(&(q * b * q.transpose()))[i]
    })
}

/// Rotates a fourth order tensor given in the Mandel basis.
pub fn rotate_fourth_order(tensor: &SymSymR4, q: &Matrix3<f64>) -> SymSymR4 {
    let r = mandel_rotation(q);
    r * tensor * r.transpose()
}

/// Derivatives of `q·c·qᵀ` with respect to a spin perturbation
/// `q ← exp(δ W_k) q`, one 6x6 matrix per axial direction `k`.
pub fn d_rotated_fourth_order(rotated: &SymSymR4) -> [SymSymR4; 3] {
    let mut out = [SMatrix::<f64, 6, 6>::zeros(); 3];
    for (k, block) in out.iter_mut().enumerate() {
        let mut axial = SVector::<f64, 3>::zeros();
        axial[k] = 1.0;
        // A ↦ W A − A W
        let m = -jaumann_operator(&Skew::new(axial));
        *block = m * rotated - rotated * m;
    }
    out
}
