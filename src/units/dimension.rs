//! Dimensional analysis shared by all unit framework adapters.
//!
//! A unit expression is parsed into terms of known units with integer
//! exponents. Its dimensionality is the sum of each unit's base-quantity
//! exponents, so `cm/s` and `pc/yr` both reduce to length / time.
use std::fmt;
use std::ops::{Div, Mul};
use thiserror::Error;

/// Exponents over the seven SI base quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensionality([i32; 7]);

const BASE_SYMBOLS: [&str; 7] = ["L", "M", "T", "I", "Θ", "N", "J"];

impl Dimensionality {
    pub const DIMENSIONLESS: Self = Self([0; 7]);
    pub const LENGTH: Self = Self([1, 0, 0, 0, 0, 0, 0]);
    pub const MASS: Self = Self([0, 1, 0, 0, 0, 0, 0]);
    pub const TIME: Self = Self([0, 0, 1, 0, 0, 0, 0]);
    pub const CURRENT: Self = Self([0, 0, 0, 1, 0, 0, 0]);
    pub const TEMPERATURE: Self = Self([0, 0, 0, 0, 1, 0, 0]);
    pub const AMOUNT: Self = Self([0, 0, 0, 0, 0, 1, 0]);
    pub const LUMINOSITY: Self = Self([0, 0, 0, 0, 0, 0, 1]);

    const fn of(l: i32, m: i32, t: i32) -> Self { Self([l, m, t, 0, 0, 0, 0]) }

    pub fn powi(self, exp: i32) -> Self {
        let mut out = self.0;
        for e in out.iter_mut() {
            *e *= exp;
        }
        Self(out)
    }

    pub fn is_dimensionless(&self) -> bool { *self == Self::DIMENSIONLESS }
}

impl Mul for Dimensionality {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut out = self.0;
        for (e, r) in out.iter_mut().zip(rhs.0) {
            *e += r;
        }
        Self(out)
    }
}

impl Div for Dimensionality {
    type Output = Self;
    fn div(self, rhs: Self) -> Self { self * rhs.powi(-1) }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let parts: Vec<String> = BASE_SYMBOLS
            .iter()
            .zip(self.0)
            .filter(|(_, e)| *e != 0)
            .map(|(s, e)| if e == 1 { s.to_string() } else { format!("{s}^{e}") })
            .collect();
        write!(f, "{}", parts.join("*"))
    }
}

/// A unit every adapter knows by symbol and by long name.
#[derive(Debug, PartialEq, Eq)]
pub struct UnitDef {
    pub symbol: &'static str,
    pub name: &'static str,
    pub dimensionality: Dimensionality,
}

const fn def(symbol: &'static str, name: &'static str, dimensionality: Dimensionality) -> UnitDef {
    UnitDef { symbol, name, dimensionality }
}

static UNITS: &[UnitDef] = &[
    def("m", "meter", Dimensionality::LENGTH),
    def("mm", "millimeter", Dimensionality::LENGTH),
    def("cm", "centimeter", Dimensionality::LENGTH),
    def("km", "kilometer", Dimensionality::LENGTH),
    def("au", "astronomical_unit", Dimensionality::LENGTH),
    def("pc", "parsec", Dimensionality::LENGTH),
    def("s", "second", Dimensionality::TIME),
    def("min", "minute", Dimensionality::TIME),
    def("h", "hour", Dimensionality::TIME),
    def("yr", "year", Dimensionality::TIME),
    def("Myr", "megayear", Dimensionality::TIME),
    def("kg", "kilogram", Dimensionality::MASS),
    def("g", "gram", Dimensionality::MASS),
    def("A", "ampere", Dimensionality::CURRENT),
    def("K", "kelvin", Dimensionality::TEMPERATURE),
    def("mol", "mole", Dimensionality::AMOUNT),
    def("cd", "candela", Dimensionality::LUMINOSITY),
    def("Hz", "hertz", Dimensionality::of(0, 0, -1)),
    def("N", "newton", Dimensionality::of(1, 1, -2)),
    def("J", "joule", Dimensionality::of(2, 1, -2)),
    def("W", "watt", Dimensionality::of(2, 1, -3)),
];

/// Finds a unit by symbol (`cm`) or long name (`centimeter`).
pub fn lookup(token: &str) -> Option<&'static UnitDef> {
    UNITS.iter().find(|u| u.symbol == token || u.name == token)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitParseError {
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),
    #[error("malformed unit expression '{0}'")]
    Malformed(String),
}

/// A product of known units raised to integer powers, e.g. `kg*m/s^2`.
///
/// Terms are kept sorted by symbol with zero exponents removed, so two
/// spellings of the same product compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitExpr {
    terms: Vec<(&'static UnitDef, i32)>,
}

impl UnitExpr {
    pub fn dimensionless() -> Self { Self::default() }

    pub fn of(unit: &'static UnitDef) -> Self { Self { terms: vec![(unit, 1)] } }

    /// Parses `num[/den]`, where each side is a product of factors joined by
    /// `*` or whitespace and each factor is `unit`, `unit^n` or `unit**n`.
    pub fn parse(s: &str) -> Result<Self, UnitParseError> {
        if s.trim().is_empty() {
            return Err(UnitParseError::Malformed(s.to_string()));
        }

        let normalized = s.replace("**", "^");
        let mut parts = normalized.split('/');
        let mut expr = Self::default();

        if let Some(num) = parts.next() {
            expr.parse_product(num, 1, s)?;
        }
        if let Some(den) = parts.next() {
            if den.trim().is_empty() {
                return Err(UnitParseError::Malformed(s.to_string()));
            }
            expr.parse_product(den, -1, s)?;
        }
        if parts.next().is_some() {
            return Err(UnitParseError::Malformed(s.to_string()));
        }

        Ok(expr)
    }

    fn parse_product(&mut self, product: &str, sign: i32, original: &str) -> Result<(), UnitParseError> {
        let product = product.trim();
        if product.is_empty() || product == "1" {
            return Ok(());
        }

        for factor in product.split(|c: char| c == '*' || c.is_whitespace()).filter(|f| !f.is_empty()) {
            let mut pieces = factor.split('^');
            let base = pieces.next().unwrap_or_default().trim();
            if base.is_empty() {
                return Err(UnitParseError::Malformed(original.to_string()));
            }
            let exponent = match pieces.next() {
                Some(exp) => exp
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| UnitParseError::Malformed(original.to_string()))?,
                None => 1,
            };
            if pieces.next().is_some() {
                return Err(UnitParseError::Malformed(original.to_string()));
            }
            let unit = lookup(base).ok_or_else(|| UnitParseError::UnknownUnit(base.to_string()))?;
            self.add_term(unit, exponent * sign);
        }
        Ok(())
    }

    fn add_term(&mut self, unit: &'static UnitDef, exponent: i32) {
        match self.terms.iter_mut().find(|(u, _)| u.symbol == unit.symbol) {
            Some((_, e)) => *e += exponent,
            None => self.terms.push((unit, exponent)),
        }
        self.terms.retain(|(_, e)| *e != 0);
        self.terms.sort_by_key(|(u, _)| u.symbol);
    }

    pub fn multiply(&mut self, other: &Self) {
        for &(unit, exp) in &other.terms {
            self.add_term(unit, exp);
        }
    }

    pub fn divide(&mut self, other: &Self) {
        for &(unit, exp) in &other.terms {
            self.add_term(unit, -exp);
        }
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.terms
            .iter()
            .fold(Dimensionality::DIMENSIONLESS, |acc, (u, e)| acc * u.dimensionality.powi(*e))
    }

    pub fn is_dimensionless(&self) -> bool { self.terms.is_empty() }

    /// Renders the expression in one of the adapters' notations.
    pub fn render(&self, style: &Notation) -> String {
        let (num, den): (Vec<_>, Vec<_>) = self.terms.iter().partition(|(_, e)| *e > 0);

        let term = |(unit, exp): &&(&'static UnitDef, i32)| {
            let label = if style.long_names { unit.name } else { unit.symbol };
            match exp.abs() {
                1 => label.to_string(),
                n => format!("{label}{}{n}", style.power),
            }
        };
        let product = |terms: &[&(&'static UnitDef, i32)]| {
            terms.iter().map(term).collect::<Vec<_>>().join(style.product)
        };

        match (num.is_empty(), den.is_empty()) {
            (true, true) => style.dimensionless.to_string(),
            (false, true) => product(num.as_slice()),
            (num_empty, false) => {
                let top = if num_empty { "1".to_string() } else { product(num.as_slice()) };
                let bottom = product(den.as_slice());
                if den.len() > 1 && style.group_denominator {
                    format!("{top}{}({bottom})", style.quotient)
                } else {
                    format!("{top}{}{bottom}", style.quotient)
                }
            }
        }
    }
}

/// How an adapter spells unit expressions in messages.
#[derive(Debug, Clone, Copy)]
pub struct Notation {
    pub long_names: bool,
    pub product: &'static str,
    pub quotient: &'static str,
    pub power: &'static str,
    pub group_denominator: bool,
    pub dimensionless: &'static str,
}
