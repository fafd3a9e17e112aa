//! Symbolic units: compositions of named units, spelled `cm / s`.
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
    product: " ",
    quotient: " / ",
    power: "",
    group_denominator: true,
    dimensionless: "",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicUnit {
    expr: UnitExpr,
}

impl SymbolicUnit {
    pub fn parse(s: &str) -> Result<Self, UnitParseError> {
        UnitExpr::parse(s).map(|expr| Self { expr })
    }

    pub fn dimensionality(&self) -> Dimensionality { self.expr.dimensionality() }

    /// Whether values in `other` could be converted to this unit.
    pub fn is_equivalent(&self, other: &SymbolicUnit) -> bool {
        self.dimensionality() == other.dimensionality()
    }

    pub fn quantity(&self, magnitude: impl IntoMagnitude) -> SymbolicQuantity {
        SymbolicQuantity { value: magnitude.into_magnitude(), unit: self.clone() }
    }
}

impl fmt::Display for SymbolicUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr.render(&NOTATION))
    }
}

impl UnitObject for SymbolicUnit {
    fn as_any(&self) -> &dyn Any { self }
}

impl Mul for SymbolicUnit {
    type Output = SymbolicUnit;
    fn mul(mut self, rhs: SymbolicUnit) -> SymbolicUnit {
        self.expr.multiply(&rhs.expr);
        self
    }
}

impl Div for SymbolicUnit {
    type Output = SymbolicUnit;
    fn div(mut self, rhs: SymbolicUnit) -> SymbolicUnit {
        self.expr.divide(&rhs.expr);
        self
    }
}

impl Mul<SymbolicUnit> for f64 {
    type Output = SymbolicQuantity;
    fn mul(self, unit: SymbolicUnit) -> SymbolicQuantity {
        SymbolicQuantity { value: self.into_magnitude(), unit }
    }
}

/// A magnitude (scalar or array) tagged with a [`SymbolicUnit`].
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicQuantity {
    value: ArrayD<f64>,
    unit: SymbolicUnit,
}

impl SymbolicQuantity {
    pub fn value(&self) -> &ArrayD<f64> { &self.value }

    pub fn unit(&self) -> &SymbolicUnit { &self.unit }
}

impl fmt::Display for SymbolicQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

impl UnitObject for SymbolicQuantity {
    fn as_any(&self) -> &dyn Any { self }

    fn magnitude(&self) -> Option<&ArrayD<f64>> { Some(&self.value) }
}

impl From<SymbolicQuantity> for Value {
    fn from(q: SymbolicQuantity) -> Self { Value::Quantity(Arc::new(q)) }
}

pub(crate) struct SymbolicAdapter;

impl FrameworkAdapter for SymbolicAdapter {
    fn recognizes(&self, unit: &dyn UnitObject) -> bool {
        unit.as_any().is::<SymbolicUnit>()
    }

    fn unit_dimensionality(&self, unit: &dyn UnitObject) -> Option<Dimensionality> {
        unit.as_any().downcast_ref::<SymbolicUnit>().map(SymbolicUnit::dimensionality)
    }

    fn quantity_dimensionality(&self, value: &dyn UnitObject) -> Option<Dimensionality> {
        value.as_any().downcast_ref::<SymbolicQuantity>().map(|q| q.unit.dimensionality())
    }

    fn describe(&self, unit: &dyn UnitObject) -> String {
        unit.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{check_compatible, identify_framework, Framework};
    use ndarray::Array2;
    use rstest::rstest;

    fn unit(s: &str) -> SymbolicUnit { SymbolicUnit::parse(s).unwrap() }

    #[rstest]
    #[case("m", "m")]
    #[case("cm/s", "cm / s")]
    #[case("kg*m/s^2", "kg m / s2")]
    #[case("m^2", "m2")]
    fn test_display(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(unit(input).to_string(), expected);
    }

    #[test]
    fn test_grouped_denominator() {
        let u = unit("kg") / (unit("m") * unit("s^2"));
        assert_eq!(u.to_string(), "kg / (m s2)");
    }

    #[test]
    fn test_operators_compose() {
        let speed = unit("cm") / unit("s");
        assert_eq!(speed, unit("cm/s"));
        let q = 3.0 * unit("m");
        assert_eq!(q.value(), &ndarray::arr0(3.0).into_dyn());
    }

    #[test]
    fn test_detected_as_symbolic() {
        assert_eq!(identify_framework("a", &unit("m")).unwrap(), Framework::Symbolic);
        // A quantity is not a unit in this framework.
        assert!(identify_framework("a", &(3.0 * unit("m"))).is_err());
    }

    #[rstest]
    #[case(unit("m").quantity(3.0))]
    #[case(unit("cm").quantity(vec![1.0, 2.0, 3.0]))]
    #[case(unit("pc").quantity(Array2::<f64>::ones((2, 2))))]
    fn test_equivalent_lengths(#[case] q: SymbolicQuantity) {
        let target = unit("m");
        assert!(check_compatible("a", &q.into(), &target, Framework::Symbolic).is_ok());
    }

    #[test]
    fn test_incompatible_units_message() {
        let target = unit("cm") / unit("s");
        let err = check_compatible("b", &unit("s").quantity(Array2::<f64>::ones((2, 5))).into(), &target, Framework::Symbolic)
            .unwrap_err();
        assert_eq!(err.to_string(), "b should be in units convertible to cm / s");
        assert!(target.is_equivalent(&(unit("m") / unit("yr"))));
    }
}
