//! The `UnitsContainer` marker carried by registry-style units and quantities.
use super::dimension::{Dimensionality, Notation, UnitExpr};
use std::fmt;

/// Long-name notation: `centimeter / second`, `meter ** 2`.
pub const LONG_NAMES: Notation = Notation {
    long_names: true,
    product: " * ",
    quotient: " / ",
    power: " ** ",
    group_denominator: false,
    dimensionless: "dimensionless",
};

/// A product of named units. Any unit object exposing one through
/// [`UnitObject::units_container`](super::UnitObject::units_container) is
/// treated as belonging to the registry framework.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitsContainer {
    expr: UnitExpr,
}

impl UnitsContainer {
    pub fn new(expr: UnitExpr) -> Self { Self { expr } }

    pub fn expr(&self) -> &UnitExpr { &self.expr }

    pub fn dimensionality(&self) -> Dimensionality { self.expr.dimensionality() }
}

impl fmt::Display for UnitsContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr.render(&LONG_NAMES))
    }
}
