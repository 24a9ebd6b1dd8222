use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use nalgebra::storage::RawStorage;
use nalgebra::{Dim, Matrix};
use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::crystallography::{Lattice, LatticeBuilder};
use crate::elasticity::{CubicLinearElasticModel, IsotropicLinearElasticModel};
use crate::error::KinematicsError;
use crate::history::History;
use crate::inelasticity::{AsaroInelasticity, NoInelasticity};
use crate::interfaces::{ElasticModel, InelasticModel};
use crate::kinematics::{CachedKinematicModel, Decoupled, StandardKinematicModel};
use crate::rotations::{AngleUnit, EulerConvention, Orientation};
use crate::slipharden::VoceSlipHardening;
use crate::sliprules::PowerLawSlipRule;
use crate::tensors::{Skew, Symmetric};

impl From<KinematicsError> for PyErr {
    fn from(err: KinematicsError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn to_py<'py, R: Dim, C: Dim, S: RawStorage<f64, R, C>>(py: Python<'py>, m: &Matrix<f64, R, C, S>) -> &'py PyArray2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)]).into_pyarray(py)
}

fn parse<T: FromStr>(value: &str, what: &str) -> PyResult<T> {
    T::from_str(value).map_err(|_| PyValueError::new_err(format!("unknown {what} `{value}`")))
}

fn elastic_from(parameters: &HashMap<String, f64>) -> PyResult<Arc<dyn ElasticModel>> {
    if parameters.contains_key("mu") || parameters.contains_key("C11") {
        Ok(Arc::new(CubicLinearElasticModel::from_parameters(parameters)?))
    } else {
        Ok(Arc::new(IsotropicLinearElasticModel::from_parameters(parameters)?))
    }
}

fn inelastic_from(parameters: &HashMap<String, f64>) -> PyResult<Arc<dyn InelasticModel>> {
    if !parameters.contains_key("tau_sat") {
        return Ok(Arc::new(NoInelasticity));
    }
    let hardening = Arc::new(VoceSlipHardening::from_parameters(parameters)?);
    let rule = Arc::new(PowerLawSlipRule::from_parameters(hardening, parameters)?);
    Ok(Arc::new(AsaroInelasticity::new(rule)))
}

struct Args {
    stress: Symmetric,
    d: Symmetric,
    w: Skew,
    history: History,
    temperature: f64,
}

/// Single crystal model driven from NumPy arrays.
///
/// `decouple` must be called with the same arguments before any rate or
/// derivative is requested.
#[pyclass]
struct KinematicModel {
    model: CachedKinematicModel,
    lattice: Lattice,
    orientation: Orientation,
    history: History,
}

impl KinematicModel {
    fn args(
        &self,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<Args> {
        Ok(Args {
            stress: Symmetric::from_slice(stress.as_slice()?)?,
            d: Symmetric::from_slice(d.as_slice()?)?,
            w: Skew::from_slice(w.as_slice()?)?,
            history: self.history.with_vector(history.as_slice()?)?,
            temperature,
        })
    }

    fn cached(&self, a: &Args) -> PyResult<&Decoupled> {
        Ok(self
            .model
            .lookup(&a.stress, &a.d, &a.w, &self.orientation, &a.history, &self.lattice, a.temperature)?)
    }
}

#[pymethods]
impl KinematicModel {
    #[new]
    #[pyo3(signature = (parameters, slip_systems, euler_angles, angle_unit = "degrees", convention = "kocks", lattice_parameter = 1.0))]
    fn new(
        parameters: HashMap<String, f64>,
        slip_systems: Vec<([i32; 3], [i32; 3])>,
        euler_angles: (f64, f64, f64),
        angle_unit: &str,
        convention: &str,
        lattice_parameter: f64,
    ) -> PyResult<Self> {
        let mut builder = LatticeBuilder::cubic(lattice_parameter);
        for (direction, plane) in slip_systems {
            builder = builder.add_slip_system(direction, plane)?;
        }
        let (a, b, c) = euler_angles;
        let orientation = Orientation::from_euler_angles(
            a,
            b,
            c,
            parse::<AngleUnit>(angle_unit, "angle unit")?,
            parse::<EulerConvention>(convention, "Euler convention")?,
        );
        let model = StandardKinematicModel::new(elastic_from(&parameters)?, inelastic_from(&parameters)?);
        let mut history = History::new();
        model.populate_history(&mut history)?;
        model.init_history(&mut history)?;
        Ok(Self {
            model: CachedKinematicModel::new(model),
            lattice: builder.build(),
            orientation,
            history,
        })
    }

    fn history_names(&self) -> Vec<String> {
        self.history.names().map(str::to_string).collect()
    }

    fn initial_history<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_slice(py, self.history.as_slice())
    }

    fn set_orientation(&mut self, a: f64, b: f64, c: f64, angle_unit: &str, convention: &str) -> PyResult<()> {
        self.orientation = Orientation::from_euler_angles(
            a,
            b,
            c,
            parse::<AngleUnit>(angle_unit, "angle unit")?,
            parse::<EulerConvention>(convention, "Euler convention")?,
        );
        Ok(())
    }

    fn decouple(
        &mut self,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<()> {
        let a = self.args(stress, d, w, history, temperature)?;
        self.model
            .decouple(&a.stress, &a.d, &a.w, &self.orientation, &a.history, &self.lattice, a.temperature)?;
        Ok(())
    }

    fn spin<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray1<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(PyArray1::from_slice(py, self.cached(&a)?.spin().as_slice()))
    }

    fn stress_rate<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray1<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(PyArray1::from_slice(py, self.cached(&a)?.stress_rate().as_slice()))
    }

    fn history_rate<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray1<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(PyArray1::from_slice(py, self.cached(&a)?.history_rate().as_slice()))
    }

    fn d_stress_rate_d_stress<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_stress_rate_d_stress()))
    }

    fn d_stress_rate_d_d<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_stress_rate_d_d()))
    }

    fn d_stress_rate_d_w<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_stress_rate_d_w()))
    }

    fn d_stress_rate_d_history<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_stress_rate_d_history()))
    }

    fn d_history_rate_d_stress<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_history_rate_d_stress()))
    }

    fn d_history_rate_d_d<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_history_rate_d_d()))
    }

    fn d_history_rate_d_w<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_history_rate_d_w()))
    }

    fn d_history_rate_d_history<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_history_rate_d_history()))
    }

    fn d_spin_d_stress<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_spin_d_stress()))
    }

    fn d_spin_d_d<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_spin_d_d()))
    }

    fn d_spin_d_w<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_spin_d_w()))
    }

    fn d_spin_d_history<'py>(
        &self,
        py: Python<'py>,
        stress: PyReadonlyArray1<f64>,
        d: PyReadonlyArray1<f64>,
        w: PyReadonlyArray1<f64>,
        history: PyReadonlyArray1<f64>,
        temperature: f64,
    ) -> PyResult<&'py PyArray2<f64>> {
        let a = self.args(stress, d, w, history, temperature)?;
        Ok(to_py(py, &self.cached(&a)?.d_spin_d_history()))
    }
}

#[pymodule]
fn cpkernel(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<KinematicModel>()?;
    Ok(())
}
