use crate::error::{ErrorCategory, TraitError};
use crate::schema::Schema;
use crate::store::InstanceId;
use crate::value::Value;
use ndarray::ArrayViewD;
use pyo3::exceptions::{PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyList, PyTuple};

fn to_py_err(e: TraitError) -> PyErr {
    match e.category() {
        ErrorCategory::Type => PyTypeError::new_err(e.to_string()),
        ErrorCategory::Value | ErrorCategory::Declaration => PyValueError::new_err(e.to_string()),
    }
}

/// Python numbers, strings, (nested) lists/tuples and anything exposing
/// `tolist()` such as numpy arrays.
fn to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if let Ok(i) = obj.extract::<i64>() {
        return Ok(Value::Int(i));
    }
    if let Ok(x) = obj.extract::<f64>() {
        return Ok(Value::Float(x));
    }
    if let Ok(s) = obj.extract::<String>() {
        return Ok(Value::Text(s));
    }
    if obj.is_instance_of::<PyList>() || obj.is_instance_of::<PyTuple>() {
        let items = obj
            .try_iter()?
            .map(|item| item.and_then(|i| to_value(&i)))
            .collect::<PyResult<Vec<_>>>()?;
        return Ok(Value::List(items));
    }
    if obj.hasattr("tolist")? {
        return to_value(&obj.call_method0("tolist")?);
    }
    // Complex numbers, None and the like: the core rejects these as
    // non-numeric under the attribute's name.
    Ok(Value::Text(obj.repr()?.to_string()))
}

fn array_to_py(py: Python<'_>, a: ArrayViewD<'_, f64>) -> PyResult<Py<PyAny>> {
    if a.ndim() == 0 {
        let x = a.iter().next().copied().unwrap_or(f64::NAN);
        return Ok(x.into_pyobject(py)?.into_any().unbind());
    }
    let rows = a
        .outer_iter()
        .map(|row| array_to_py(py, row))
        .collect::<PyResult<Vec<_>>>()?;
    Ok(PyList::new(py, rows)?.into_any().unbind())
}

fn to_py(py: Python<'_>, value: &Value) -> PyResult<Py<PyAny>> {
    match value {
        Value::Float(x) => Ok(x.into_pyobject(py)?.into_any().unbind()),
        Value::Int(i) => Ok(i.into_pyobject(py)?.into_any().unbind()),
        Value::Text(s) => Ok(s.into_pyobject(py)?.into_any().unbind()),
        Value::List(items) => {
            let items = items.iter().map(|v| to_py(py, v)).collect::<PyResult<Vec<_>>>()?;
            Ok(PyList::new(py, items)?.into_any().unbind())
        }
        Value::Array(a) => array_to_py(py, a.view()),
        // Quantities only come from Rust callers; hand back their text form.
        Value::Quantity(q) => Ok(q.to_string().into_pyobject(py)?.into_any().unbind()),
    }
}

#[pyclass(name = "_Schema")]
#[derive(Debug, Clone)]
pub struct PySchema {
    inner: Schema,
}

#[pymethods]
impl PySchema {
    #[new]
    pub fn new(declaration: &str) -> PyResult<Self> {
        Schema::from_json_str(declaration)
            .map(|inner| Self { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn spawn(&mut self) -> PyResult<u64> {
        self.inner.spawn().map(InstanceId::to_bits).map_err(to_py_err)
    }

    pub fn release(&mut self, instance: u64) -> PyResult<()> {
        self.inner.release(InstanceId::from_bits(instance)).map_err(to_py_err)
    }

    pub fn get(&self, py: Python<'_>, instance: u64, name: &str) -> PyResult<Option<Py<PyAny>>> {
        self.inner
            .get_by_name(InstanceId::from_bits(instance), name)
            .map_err(to_py_err)?
            .map(|v| to_py(py, v))
            .transpose()
    }

    pub fn set(&mut self, instance: u64, name: &str, value: &Bound<'_, PyAny>) -> PyResult<()> {
        let value = to_value(value)?;
        self.inner.set_by_name(InstanceId::from_bits(instance), name, value).map_err(to_py_err)
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.attributes().map(|(_, a)| a.name().to_string()).collect()
    }
}
