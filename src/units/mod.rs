//! Unit-compatibility checking against pluggable unit frameworks.
//!
//! A target unit is classified into exactly one [`Framework`] by probing the
//! installed adapters in a fixed order (symbolic, registry, dimensional). The
//! assigned value must then be a quantity of that same framework whose
//! dimensionality matches the target's. Magnitudes are never rescaled.

pub mod container;
pub mod dimension;
#[cfg(feature = "dimensional")]
pub mod dimensional;
#[cfg(feature = "registry")]
pub mod registry;
#[cfg(feature = "symbolic")]
pub mod symbolic;

pub use container::UnitsContainer;
pub use dimension::{Dimensionality, UnitExpr, UnitParseError};

use crate::error::TraitError;
use crate::value::Value;
use ndarray::{arr0, Array, Array1, ArrayD};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// Anything that can be given as a target unit or assigned as a quantity.
///
/// Framework detection is structural: adapters downcast through
/// [`as_any`](UnitObject::as_any) or look for the optional markers below.
pub trait UnitObject: Any + fmt::Debug + fmt::Display + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Short type name used when no framework recognizes the object.
    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Registry-framework marker.
    fn units_container(&self) -> Option<&UnitsContainer> {
        None
    }

    /// Numeric payload; present for quantities, absent for bare units.
    fn magnitude(&self) -> Option<&ArrayD<f64>> {
        None
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

impl UnitObject for String {
    fn as_any(&self) -> &dyn Any { self }
}

impl UnitObject for &'static str {
    fn as_any(&self) -> &dyn Any { self }
}

/// Conversion of plain numbers and arrays into a quantity magnitude.
pub trait IntoMagnitude {
    fn into_magnitude(self) -> ArrayD<f64>;
}

impl IntoMagnitude for f64 {
    fn into_magnitude(self) -> ArrayD<f64> { arr0(self).into_dyn() }
}

impl IntoMagnitude for Vec<f64> {
    fn into_magnitude(self) -> ArrayD<f64> { Array1::from(self).into_dyn() }
}

impl<const N: usize> IntoMagnitude for [f64; N] {
    fn into_magnitude(self) -> ArrayD<f64> { Array1::from(self.to_vec()).into_dyn() }
}

impl<D: ndarray::Dimension> IntoMagnitude for Array<f64, D> {
    fn into_magnitude(self) -> ArrayD<f64> { self.into_dyn() }
}

/// The supported unit frameworks, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// Units are symbolic compositions such as `cm / s`.
    Symbolic,
    /// Units and quantities carry a [`UnitsContainer`] of long unit names.
    Registry,
    /// Units are themselves unit-magnitude quantities with a dimensionality.
    Dimensional,
}

const PRIORITY: [Framework; 3] = [Framework::Symbolic, Framework::Registry, Framework::Dimensional];

static INSTALLED: Lazy<Vec<Framework>> = Lazy::new(|| {
    let installed: Vec<Framework> = PRIORITY.into_iter().filter(|f| f.adapter().is_some()).collect();
    tracing::debug!(?installed, "unit frameworks available");
    installed
});

/// Per-framework detection and comparison.
pub(crate) trait FrameworkAdapter: Sync {
    /// Whether `unit` structurally belongs to this framework.
    fn recognizes(&self, unit: &dyn UnitObject) -> bool;
    /// Dimensionality of a recognized target unit.
    fn unit_dimensionality(&self, unit: &dyn UnitObject) -> Option<Dimensionality>;
    /// Dimensionality of `value` if it is a quantity of this framework.
    fn quantity_dimensionality(&self, value: &dyn UnitObject) -> Option<Dimensionality>;
    /// How the target unit is spelled in messages.
    fn describe(&self, unit: &dyn UnitObject) -> String;
}

impl Framework {
    /// Frameworks compiled into this build, in detection order. Built once.
    pub fn installed() -> &'static [Framework] {
        &INSTALLED
    }

    pub fn quantity_label(self) -> &'static str {
        match self {
            Self::Symbolic => "a symbolic Quantity",
            Self::Registry => "a registry Quantity",
            Self::Dimensional => "a dimensional Quantity",
        }
    }

    pub(crate) fn adapter(self) -> Option<&'static dyn FrameworkAdapter> {
        match self {
            #[cfg(feature = "symbolic")]
            Self::Symbolic => Some(&symbolic::SymbolicAdapter),
            #[cfg(feature = "registry")]
            Self::Registry => Some(&registry::RegistryAdapter),
            #[cfg(feature = "dimensional")]
            Self::Dimensional => Some(&dimensional::DimensionalAdapter),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Symbolic => "symbolic",
            Self::Registry => "registry",
            Self::Dimensional => "dimensional",
        };
        write!(f, "{name}")
    }
}

/// Determines which installed framework `target` belongs to.
pub fn identify_framework(name: &str, target: &dyn UnitObject) -> Result<Framework, TraitError> {
    Framework::installed()
        .iter()
        .copied()
        .find(|f| f.adapter().is_some_and(|a| a.recognizes(target)))
        .ok_or_else(|| TraitError::UnrecognizedUnitFramework {
            name: name.to_string(),
            type_name: target.type_name().to_string(),
        })
}

/// Checks that `value` is a quantity of `framework` whose units are
/// dimensionally equivalent to `target`.
pub fn check_compatible(
    name: &str,
    value: &Value,
    target: &dyn UnitObject,
    framework: Framework,
) -> Result<(), TraitError> {
    let wrong_type = || TraitError::WrongQuantityType { name: name.to_string(), framework };

    let adapter = framework.adapter().ok_or_else(wrong_type)?;
    let quantity = match value {
        Value::Quantity(q) => q.as_ref(),
        _ => return Err(wrong_type()),
    };
    let found = adapter.quantity_dimensionality(quantity).ok_or_else(wrong_type)?;

    if adapter.unit_dimensionality(target) != Some(found) {
        return Err(TraitError::IncompatibleUnits {
            name: name.to_string(),
            target: adapter.describe(target),
        });
    }
    Ok(())
}
