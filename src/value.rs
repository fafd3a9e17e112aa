//! The dynamic values an attribute can be assigned.
//!
//! Values arrive without a declared type: bare numbers, text, nested
//! sequences, dense arrays or unit-bearing quantities. Validation first
//! classifies them as scalar or array and densifies sequences into an
//! `ArrayD<f64>`.
use crate::error::TraitError;
use crate::shape::Shape;
use crate::units::UnitObject;
use ndarray::{arr0, Array, ArrayD, CowArray, IxDyn};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Value {
    Float(f64),
    Int(i64),
    /// Non-numeric scalar; always rejected by validation.
    Text(String),
    /// A nested tuple/list of values, densified on assignment.
    List(Vec<Value>),
    Array(ArrayD<f64>),
    Quantity(Arc<dyn UnitObject>),
}

impl Value {
    pub fn quantity(q: impl UnitObject) -> Self {
        Value::Quantity(Arc::new(q))
    }

    /// The scalar payload, if this is a number or a 0-d array/quantity.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            Value::Array(a) if a.ndim() == 0 => a.iter().next().copied(),
            Value::Quantity(q) => q.magnitude().filter(|m| m.ndim() == 0).and_then(|m| m.iter().next().copied()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayD<f64>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Numeric view used for shape and domain checks. `None` for text and
    /// for sequences that haven't been densified.
    pub fn numbers(&self) -> Option<CowArray<'_, f64, IxDyn>> {
        match self {
            Value::Float(x) => Some(CowArray::from(arr0(*x).into_dyn())),
            Value::Int(i) => Some(CowArray::from(arr0(*i as f64).into_dyn())),
            Value::Array(a) => Some(CowArray::from(a.view())),
            Value::Quantity(q) => q.magnitude().map(|m| CowArray::from(m.view())),
            Value::Text(_) | Value::List(_) => None,
        }
    }

    pub fn shape(&self) -> Option<Shape> {
        self.numbers().map(|n| Shape::from(n.shape()))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Quantity(a), Value::Quantity(b)) => {
                Arc::ptr_eq(a, b) || (a.to_string() == b.to_string() && a.magnitude() == b.magnitude())
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(x) => write!(f, "{x}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Array(a) => write!(f, "{a}"),
            Value::Quantity(q) => write!(f, "{q}"),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Float(x) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Int(i64::from(i)) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Text(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Text(s) }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self { Value::List(items.into_iter().map(Into::into).collect()) }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self { Value::List(items.into_iter().map(Into::into).collect()) }
}

impl<D: ndarray::Dimension> From<Array<f64, D>> for Value {
    fn from(a: Array<f64, D>) -> Self { Value::Array(a.into_dyn()) }
}

/// Classifies `raw` and densifies it, returning the value to store.
///
/// Scalars are kept as given; sequences become `Array`; quantities are kept
/// whole (their magnitude is what later checks compare).
pub(crate) fn normalize(name: &str, raw: Value) -> Result<Value, TraitError> {
    match raw {
        Value::Text(_) => Err(TraitError::NotNumeric { name: name.to_string() }),
        Value::List(items) => densify(&items).map(Value::Array).map_err(|reason| {
            TraitError::ConversionFailed { name: name.to_string(), reason }
        }),
        Value::Quantity(q) if q.magnitude().is_none() => Err(TraitError::ConversionFailed {
            name: name.to_string(),
            reason: format!("{} has no numerical magnitude", q.type_name()),
        }),
        other => Ok(other),
    }
}

/// Converts nested sequences into a dense float array.
///
/// Every sibling at a given depth must have the same shape; the error text
/// names the depth at which the nesting becomes ragged.
pub fn densify(items: &[Value]) -> Result<ArrayD<f64>, String> {
    let shape = list_shape(items, 0)?;
    let mut data = Vec::with_capacity(shape.iter().product());
    for item in items {
        flatten(item, &mut data)?;
    }
    ArrayD::from_shape_vec(IxDyn(&shape), data).map_err(|e| e.to_string())
}

fn list_shape(items: &[Value], depth: usize) -> Result<Vec<usize>, String> {
    let mut iter = items.iter();
    let inner = match iter.next() {
        Some(first) => shape_of(first, depth + 1)?,
        None => Vec::new(),
    };
    for item in iter {
        if shape_of(item, depth + 1)? != inner {
            return Err(format!(
                "setting an array element with a sequence; the nesting is inhomogeneous after {} dimensions",
                depth + 1
            ));
        }
    }
    let mut shape = Vec::with_capacity(inner.len() + 1);
    shape.push(items.len());
    shape.extend(inner);
    Ok(shape)
}

fn shape_of(value: &Value, depth: usize) -> Result<Vec<usize>, String> {
    match value {
        Value::Float(_) | Value::Int(_) => Ok(Vec::new()),
        Value::Text(s) => Err(format!("could not convert string to float: {s:?}")),
        Value::Array(a) => Ok(a.shape().to_vec()),
        Value::Quantity(q) => q
            .magnitude()
            .map(|m| m.shape().to_vec())
            .ok_or_else(|| format!("{} has no numerical magnitude", q.type_name())),
        Value::List(items) => list_shape(items, depth),
    }
}

fn flatten(value: &Value, out: &mut Vec<f64>) -> Result<(), String> {
    match value {
        Value::Float(x) => out.push(*x),
        Value::Int(i) => out.push(*i as f64),
        Value::Array(a) => out.extend(a.iter().copied()),
        Value::Quantity(q) => {
            if let Some(m) = q.magnitude() {
                out.extend(m.iter().copied());
            }
        }
        Value::List(items) => {
            for item in items {
                flatten(item, out)?;
            }
        }
        Value::Text(s) => return Err(format!("could not convert string to float: {s:?}")),
    }
    Ok(())
}
