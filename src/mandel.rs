use nalgebra::{Matrix3, SVector, Vector3};

pub const SQRT2: f64 = std::f64::consts::SQRT_2;
pub const INV_SQRT2: f64 = std::f64::consts::FRAC_1_SQRT_2;

pub const MANDEL_IDENTITY: SVector<f64, 6> = SVector::<f64, 6>::new(1.0, 1.0, 1.0, 0.0, 0.0, 0.0);

/// Packs the symmetric part of a 3x3 tensor as
/// `[t11, t22, t33, √2 t23, √2 t13, √2 t12]`.
pub fn tensor_to_mandel(tensor: &Matrix3<f64>) -> SVector<f64, 6> {
    SVector::<f64, 6>::new(
        tensor.m11,
        tensor.m22,
        tensor.m33,
        INV_SQRT2 * (tensor.m23 + tensor.m32),
        INV_SQRT2 * (tensor.m13 + tensor.m31),
        INV_SQRT2 * (tensor.m12 + tensor.m21),
    )
}

pub fn mandel_to_tensor(mandel: &SVector<f64, 6>) -> Matrix3<f64> {
    Matrix3::new(
        mandel.x,
        INV_SQRT2 * mandel.b,
        INV_SQRT2 * mandel.a,
        INV_SQRT2 * mandel.b,
        mandel.y,
        INV_SQRT2 * mandel.w,
        INV_SQRT2 * mandel.a,
        INV_SQRT2 * mandel.w,
        mandel.z,
    )
}

/// Axial vector of the skew part of a 3x3 tensor, with
/// `W = [[0, -w3, w2], [w3, 0, -w1], [-w2, w1, 0]]`.
pub fn tensor_to_axial(tensor: &Matrix3<f64>) -> Vector3<f64> {
    Vector3::new(
        0.5 * (tensor.m32 - tensor.m23),
        0.5 * (tensor.m13 - tensor.m31),
        0.5 * (tensor.m21 - tensor.m12),
    )
}

pub fn axial_to_tensor(axial: &Vector3<f64>) -> Matrix3<f64> {
    axial.cross_matrix()
}

/// Full tensor of the i-th Mandel basis element.
pub fn mandel_basis(i: usize) -> Matrix3<f64> {
    let mut unit = SVector::<f64, 6>::zeros();
    unit[i] = 1.0;
    mandel_to_tensor(&unit)
}

/// Full tensor of the k-th axial basis element.
pub fn skew_basis(k: usize) -> Matrix3<f64> {
    let mut unit = Vector3::zeros();
    unit[k] = 1.0;
    axial_to_tensor(&unit)
}

pub fn trace(vector: &SVector<f64, 6>) -> f64 {
    vector.x + vector.y + vector.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mandel_dot_is_tensor_contraction() {
        let a = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0);
        let b = Matrix3::new(-1.0, 0.5, 2.0, 0.5, 3.0, -4.0, 2.0, -4.0, 1.5);
        let full = (a * b).trace();
        assert_relative_eq!(tensor_to_mandel(&a).dot(&tensor_to_mandel(&b)), full, epsilon = 1e-12);
    }

    #[test]
    fn axial_convention() {
        let w = Vector3::new(1.0, -2.0, 3.0);
        let tensor = axial_to_tensor(&w);
        assert_eq!(tensor.m23, -1.0);
        assert_eq!(tensor.m13, -2.0);
        assert_eq!(tensor.m12, -3.0);
        assert_relative_eq!(tensor_to_axial(&tensor), w);
    }
}
