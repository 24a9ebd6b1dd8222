//! Cubic lattices and their slip systems.
//!
//! Slip families are expanded over the 24 proper rotations of the cube while
//! the lattice is being built; [`LatticeBuilder::build`] freezes the result.
use nalgebra::{Matrix3, Vector3};
use tracing::debug;

use crate::error::{KinematicsError, Result};
use crate::rotations::Orientation;
use crate::stress_strain::sym_skew_commutator;
use crate::tensors::{SkewSkewR4, Skew, SymSkewR4, Symmetric};

#[derive(Debug, Clone, PartialEq)]
pub struct SlipSystem {
    pub miller_direction: [i32; 3],
    pub miller_plane: [i32; 3],
    /// Unit slip direction, lattice frame.
    pub direction: Vector3<f64>,
    /// Unit plane normal, lattice frame.
    pub normal: Vector3<f64>,
    schmid: Symmetric,
    rotation: Skew,
}

impl SlipSystem {
    fn new(direction: [i32; 3], plane: [i32; 3]) -> Self {
        let d = to_vector(direction).normalize();
        let n = to_vector(plane).normalize();
        let dyad = d * n.transpose();
        Self {
            miller_direction: direction,
            miller_plane: plane,
            direction: d,
            normal: n,
            schmid: Symmetric::from_full(&dyad),
            rotation: Skew::from_full(&dyad),
        }
    }
}

fn to_vector(v: [i32; 3]) -> Vector3<f64> {
    Vector3::new(v[0] as f64, v[1] as f64, v[2] as f64)
}

fn dot(a: &[i32; 3], b: &[i32; 3]) -> i32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// The 24 proper rotations of the cube as signed permutation matrices.
fn cubic_symmetry_operators() -> Vec<Matrix3<i32>> {
    const PERMUTATIONS: [[usize; 3]; 6] = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    let mut ops = Vec::with_capacity(24);
    for p in PERMUTATIONS {
        for signs in 0..8 {
            let mut op = Matrix3::<i32>::zeros();
            for (row, col) in p.iter().enumerate() {
                op[(row, *col)] = if signs & (1 << row) == 0 { 1 } else { -1 };
            }
            let det = op[(0, 0)] * (op[(1, 1)] * op[(2, 2)] - op[(1, 2)] * op[(2, 1)])
                - op[(0, 1)] * (op[(1, 0)] * op[(2, 2)] - op[(1, 2)] * op[(2, 0)])
                + op[(0, 2)] * (op[(1, 0)] * op[(2, 1)] - op[(1, 1)] * op[(2, 0)]);
            if det == 1 {
                ops.push(op);
            }
        }
    }
    ops
}

/// Symmetry-equivalent vectors, keeping one of each `±v` pair.
fn equivalent_vectors(v: [i32; 3], ops: &[Matrix3<i32>]) -> Vec<[i32; 3]> {
    let mut out: Vec<[i32; 3]> = Vec::new();
    for op in ops {
        let r = op * Vector3::new(v[0], v[1], v[2]);
        let r = [r.x, r.y, r.z];
        let neg = [-r[0], -r[1], -r[2]];
        if !out.contains(&r) && !out.contains(&neg) {
            out.push(r);
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct LatticeBuilder {
    a: f64,
    groups: Vec<Vec<SlipSystem>>,
}

impl LatticeBuilder {
    pub fn cubic(a: f64) -> Self {
        Self { a, groups: Vec::new() }
    }

    /// Adds the family `<direction>{plane}` as a new slip group: every pair
    /// of symmetry-equivalent directions and planes that are orthogonal.
    pub fn add_slip_system(mut self, direction: [i32; 3], plane: [i32; 3]) -> Result<Self> {
        if direction == [0; 3] || plane == [0; 3] {
            return Err(KinematicsError::InvalidSlipSystem("zero Miller index".to_string()));
        }
        let ops = cubic_symmetry_operators();
        let directions = equivalent_vectors(direction, &ops);
        let planes = equivalent_vectors(plane, &ops);
        let group: Vec<SlipSystem> = planes
            .iter()
            .flat_map(|n| {
                directions
                    .iter()
                    .filter(move |d| dot(d, n) == 0)
                    .map(move |d| SlipSystem::new(*d, *n))
            })
            .collect();
        if group.is_empty() {
            return Err(KinematicsError::InvalidSlipSystem(format!(
                "no direction of <{}{}{}> lies in a plane of {{{}{}{}}}",
                direction[0], direction[1], direction[2], plane[0], plane[1], plane[2]
            )));
        }
        debug!(?direction, ?plane, nslip = group.len(), "added slip family");
        self.groups.push(group);
        Ok(self)
    }

    pub fn build(self) -> Lattice {
        let mut offsets = Vec::with_capacity(self.groups.len());
        let mut total = 0;
        for group in &self.groups {
            offsets.push(total);
            total += group.len();
        }
        debug!(ngroup = self.groups.len(), ntotal = total, "lattice finalized");
        Lattice {
            a: self.a,
            groups: self.groups,
            offsets,
            total,
        }
    }
}

/// Immutable cubic lattice with its slip groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    a: f64,
    groups: Vec<Vec<SlipSystem>>,
    offsets: Vec<usize>,
    total: usize,
}

impl Lattice {
    pub fn lattice_parameter(&self) -> f64 {
        self.a
    }

    pub fn ngroup(&self) -> usize {
        self.groups.len()
    }

    pub fn nslip(&self, g: usize) -> usize {
        self.groups[g].len()
    }

    pub fn ntotal(&self) -> usize {
        self.total
    }

    pub fn flat(&self, g: usize, i: usize) -> usize {
        self.offsets[g] + i
    }

    /// `(group, index)` pairs in flat order.
    pub fn systems(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.groups
            .iter()
            .enumerate()
            .flat_map(|(g, group)| (0..group.len()).map(move |i| (g, i)))
    }

    pub fn slip_system(&self, g: usize, i: usize) -> &SlipSystem {
        &self.groups[g][i]
    }

    pub fn slip_direction(&self, g: usize, i: usize, q: &Orientation) -> Vector3<f64> {
        q.apply_vector(&self.groups[g][i].direction)
    }

    pub fn slip_normal(&self, g: usize, i: usize, q: &Orientation) -> Vector3<f64> {
        q.apply_vector(&self.groups[g][i].normal)
    }

    /// Schmid tensor `sym(s ⊗ n)` in the sample frame.
    pub fn m(&self, g: usize, i: usize, q: &Orientation) -> Symmetric {
        q.apply_symmetric(&self.groups[g][i].schmid)
    }

    /// `skew(s ⊗ n)` in the sample frame.
    pub fn n(&self, g: usize, i: usize, q: &Orientation) -> Skew {
        q.apply_skew(&self.groups[g][i].rotation)
    }

    /// Resolved shear stress.
    pub fn shear(&self, g: usize, i: usize, q: &Orientation, stress: &Symmetric) -> f64 {
        stress.dot(&self.m(g, i, q))
    }

    pub fn d_shear_d_stress(&self, g: usize, i: usize, q: &Orientation) -> Symmetric {
        self.m(g, i, q)
    }

    pub fn d_shear_d_orientation(&self, g: usize, i: usize, q: &Orientation, stress: &Symmetric) -> Vector3<f64> {
        self.d_m_d_orientation(g, i, q).tr_mul(stress.as_vector())
    }

    /// Derivative of [`Lattice::m`] for `q ← exp(δ W_k) q`.
    pub fn d_m_d_orientation(&self, g: usize, i: usize, q: &Orientation) -> SymSkewR4 {
        -sym_skew_commutator(&self.m(g, i, q))
    }

    /// Derivative of [`Lattice::n`] for `q ← exp(δ W_k) q`.
    pub fn d_n_d_orientation(&self, g: usize, i: usize, q: &Orientation) -> SkewSkewR4 {
        -self.n(g, i, q).as_vector().cross_matrix()
    }
}
