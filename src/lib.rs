//! Validated numeric attributes.
//!
//! A [`NumericAttribute`] guards one attribute of a host object: every write
//! is classified as scalar or array, checked for rank, shape, unit
//! compatibility and sign/range domain, and only then stored against the
//! writing instance. A [`Schema`] groups attributes the way a class does and
//! owns the instance lifecycle.

pub mod attribute;
pub mod config;
pub mod error;
pub mod schema;
pub mod shape;
pub mod spec;
pub mod store;
pub mod units;
pub mod value;

#[cfg(feature = "python")]
mod bindings {
    pub mod python;
}

pub use attribute::NumericAttribute;
pub use config::ConfigError;
pub use error::{ErrorCategory, ErrorKind, TraitError};
pub use schema::{Schema, SchemaBuilder};
pub use shape::Shape;
pub use spec::{AttributeSpec, Domain, ShapeSpec};
pub use store::{AttrId, InstanceId};
pub use units::{check_compatible, identify_framework, Framework, UnitObject};
pub use value::Value;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `_core` extension module.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", VERSION)?;
    m.add_class::<bindings::python::PySchema>()?;
    Ok(())
}
