//! Registry-style units: both units and quantities expose a
//! [`UnitsContainer`] of long unit names (`centimeter / second`).
use super::container::UnitsContainer;
use super::dimension::{Dimensionality, UnitExpr, UnitParseError};
use super::{FrameworkAdapter, IntoMagnitude, UnitObject};
use crate::value::Value;
use ndarray::ArrayD;
use std::any::Any;
use std::fmt;
use std::ops::{Div, Mul};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryUnit {
    units: UnitsContainer,
}

impl RegistryUnit {
    /// Accepts long names (`meter / second`) or symbols (`m/s`).
    pub fn parse(s: &str) -> Result<Self, UnitParseError> {
        UnitExpr::parse(s).map(|expr| Self { units: UnitsContainer::new(expr) })
    }

    pub fn units(&self) -> &UnitsContainer { &self.units }

    pub fn dimensionality(&self) -> Dimensionality { self.units.dimensionality() }

    pub fn quantity(&self, magnitude: impl IntoMagnitude) -> RegistryQuantity {
        RegistryQuantity { magnitude: magnitude.into_magnitude(), units: self.units.clone() }
    }
}

impl fmt::Display for RegistryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.units)
    }
}

impl UnitObject for RegistryUnit {
    fn as_any(&self) -> &dyn Any { self }

    fn units_container(&self) -> Option<&UnitsContainer> { Some(&self.units) }
}

impl Mul for RegistryUnit {
    type Output = RegistryUnit;
    fn mul(self, rhs: RegistryUnit) -> RegistryUnit {
        let mut expr = self.units.expr().clone();
        expr.multiply(rhs.units.expr());
        RegistryUnit { units: UnitsContainer::new(expr) }
    }
}

impl Div for RegistryUnit {
    type Output = RegistryUnit;
    fn div(self, rhs: RegistryUnit) -> RegistryUnit {
        let mut expr = self.units.expr().clone();
        expr.divide(rhs.units.expr());
        RegistryUnit { units: UnitsContainer::new(expr) }
    }
}

impl Mul<RegistryUnit> for f64 {
    type Output = RegistryQuantity;
    fn mul(self, unit: RegistryUnit) -> RegistryQuantity {
        unit.quantity(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryQuantity {
    magnitude: ArrayD<f64>,
    units: UnitsContainer,
}

impl RegistryQuantity {
    pub fn units(&self) -> &UnitsContainer { &self.units }

    pub fn dimensionality(&self) -> Dimensionality { self.units.dimensionality() }
}

impl fmt::Display for RegistryQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.units)
    }
}

impl UnitObject for RegistryQuantity {
    fn as_any(&self) -> &dyn Any { self }

    fn units_container(&self) -> Option<&UnitsContainer> { Some(&self.units) }

    fn magnitude(&self) -> Option<&ArrayD<f64>> { Some(&self.magnitude) }
}

impl From<RegistryQuantity> for Value {
    fn from(q: RegistryQuantity) -> Self { Value::Quantity(Arc::new(q)) }
}

pub(crate) struct RegistryAdapter;

impl FrameworkAdapter for RegistryAdapter {
    fn recognizes(&self, unit: &dyn UnitObject) -> bool {
        unit.units_container().is_some()
    }

    fn unit_dimensionality(&self, unit: &dyn UnitObject) -> Option<Dimensionality> {
        unit.units_container().map(UnitsContainer::dimensionality)
    }

    fn quantity_dimensionality(&self, value: &dyn UnitObject) -> Option<Dimensionality> {
        value.magnitude()?;
        value.units_container().map(UnitsContainer::dimensionality)
    }

    fn describe(&self, unit: &dyn UnitObject) -> String {
        unit.units_container().map(|c| c.to_string()).unwrap_or_else(|| unit.to_string())
    }
}
