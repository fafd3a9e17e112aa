//! Dimensional units: every unit is also usable as a quantity, and both are
//! compared through their simplified dimensionality (`cm/s`).
use super::dimension::{Dimensionality, Notation, UnitExpr, UnitParseError};
use super::{FrameworkAdapter, IntoMagnitude, UnitObject};
use crate::value::Value;
use ndarray::ArrayD;
use std::any::Any;
use std::fmt;
use std::ops::{Div, Mul};
use std::sync::Arc;

const NOTATION: Notation = Notation {
    long_names: false,
    product: "*",
    quotient: "/",
    power: "**",
    group_denominator: true,
    dimensionless: "dimensionless",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionalUnit {
    dimensionality: UnitExpr,
}

impl DimensionalUnit {
    pub fn parse(s: &str) -> Result<Self, UnitParseError> {
        UnitExpr::parse(s).map(|dimensionality| Self { dimensionality })
    }

    /// The dimensionality reduced to base quantities.
    pub fn simplified(&self) -> Dimensionality { self.dimensionality.dimensionality() }

    pub fn quantity(&self, magnitude: impl IntoMagnitude) -> DimensionalQuantity {
        DimensionalQuantity {
            magnitude: magnitude.into_magnitude(),
            dimensionality: self.dimensionality.clone(),
        }
    }
}

impl fmt::Display for DimensionalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dimensionality.render(&NOTATION))
    }
}

impl UnitObject for DimensionalUnit {
    fn as_any(&self) -> &dyn Any { self }
}

impl Mul for DimensionalUnit {
    type Output = DimensionalUnit;
    fn mul(mut self, rhs: DimensionalUnit) -> DimensionalUnit {
        self.dimensionality.multiply(&rhs.dimensionality);
        self
    }
}

impl Div for DimensionalUnit {
    type Output = DimensionalUnit;
    fn div(mut self, rhs: DimensionalUnit) -> DimensionalUnit {
        self.dimensionality.divide(&rhs.dimensionality);
        self
    }
}

impl Mul<DimensionalUnit> for f64 {
    type Output = DimensionalQuantity;
    fn mul(self, unit: DimensionalUnit) -> DimensionalQuantity {
        unit.quantity(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionalQuantity {
    magnitude: ArrayD<f64>,
    dimensionality: UnitExpr,
}

impl DimensionalQuantity {
    pub fn simplified(&self) -> Dimensionality { self.dimensionality.dimensionality() }

    fn dimensionality_string(&self) -> String { self.dimensionality.render(&NOTATION) }
}

impl fmt::Display for DimensionalQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.dimensionality_string())
    }
}

impl UnitObject for DimensionalQuantity {
    fn as_any(&self) -> &dyn Any { self }

    fn magnitude(&self) -> Option<&ArrayD<f64>> { Some(&self.magnitude) }
}

impl From<DimensionalQuantity> for Value {
    fn from(q: DimensionalQuantity) -> Self { Value::Quantity(Arc::new(q)) }
}

pub(crate) struct DimensionalAdapter;

impl FrameworkAdapter for DimensionalAdapter {
    fn recognizes(&self, unit: &dyn UnitObject) -> bool {
        let any = unit.as_any();
        any.is::<DimensionalUnit>() || any.is::<DimensionalQuantity>()
    }

    fn unit_dimensionality(&self, unit: &dyn UnitObject) -> Option<Dimensionality> {
        let any = unit.as_any();
        any.downcast_ref::<DimensionalUnit>()
            .map(DimensionalUnit::simplified)
            .or_else(|| any.downcast_ref::<DimensionalQuantity>().map(DimensionalQuantity::simplified))
    }

    fn quantity_dimensionality(&self, value: &dyn UnitObject) -> Option<Dimensionality> {
        value.as_any().downcast_ref::<DimensionalQuantity>().map(DimensionalQuantity::simplified)
    }

    fn describe(&self, unit: &dyn UnitObject) -> String {
        let any = unit.as_any();
        match any.downcast_ref::<DimensionalQuantity>() {
            Some(q) => q.dimensionality_string(),
            None => unit.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{check_compatible, identify_framework, Framework};
    use ndarray::Array2;

    fn unit(s: &str) -> DimensionalUnit { DimensionalUnit::parse(s).unwrap() }

    #[test]
    fn test_units_and_quantities_are_targets() {
        assert_eq!(identify_framework("a", &unit("m")).unwrap(), Framework::Dimensional);
        assert_eq!(identify_framework("a", &(2.0 * unit("m"))).unwrap(), Framework::Dimensional);
    }

    #[test]
    fn test_valid_assignments() {
        let target = unit("cm") / unit("s");
        for q in [
            3.0 * (unit("m") / unit("yr")),
            (unit("cm") / unit("s")).quantity(vec![1.0, 2.0, 3.0]),
            (unit("pc") / unit("s")).quantity(Array2::<f64>::ones((2, 2))),
        ] {
            assert!(check_compatible("b", &q.into(), &target, Framework::Dimensional).is_ok());
        }
    }

    #[test]
    fn test_incompatible_units_message() {
        let err = check_compatible("a", &(5.0 * unit("s")).into(), &unit("m"), Framework::Dimensional).unwrap_err();
        assert_eq!(err.to_string(), "a should be in units convertible to m");

        let target = 1.0 * (unit("cm") / unit("s"));
        let err = check_compatible("b", &unit("s").quantity(Array2::<f64>::ones((2, 5))).into(), &target, Framework::Dimensional)
            .unwrap_err();
        assert_eq!(err.to_string(), "b should be in units convertible to cm/s");
    }

    #[test]
    fn test_power_notation() {
        assert_eq!(unit("kg*m/s^2").to_string(), "kg*m/s**2");
        assert_eq!((unit("kg") / (unit("m") * unit("s"))).to_string(), "kg/(m*s)");
    }
}
