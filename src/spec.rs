//! Declarations of what an attribute accepts.
//!
//! An [`AttributeSpec`] is an immutable description built with chained
//! setters. It is checked for consistency only when it becomes a
//! [`NumericAttribute`](crate::NumericAttribute), so a spec can be assembled
//! in any order.
use crate::shape::Shape;
use crate::units::UnitObject;
use crate::value::Value;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Where an attribute's expected shape comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeSpec {
    Fixed(Shape),
    /// Match the shape of whatever the named sibling currently holds.
    Sibling(String),
}

/// Sign or range constraint applied to every element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// `x >= 0`
    Positive,
    /// `x > 0`
    StrictlyPositive,
    /// `x <= 0`
    Negative,
    /// `x < 0`
    StrictlyNegative,
    /// `low <= x <= high`
    Range(f64, f64),
}

impl Domain {
    /// Whether `x` falls outside the domain. NaN never does.
    #[inline]
    pub fn violated_by(&self, x: f64) -> bool {
        match *self {
            Self::Positive => x < 0.0,
            Self::StrictlyPositive => x <= 0.0,
            Self::Negative => x > 0.0,
            Self::StrictlyNegative => x >= 0.0,
            Self::Range(low, high) => x < low || x > high,
        }
    }

    /// The phrase completing "`name` should be ...".
    pub fn requirement(&self) -> String {
        match *self {
            Self::Positive => "positive".to_string(),
            Self::StrictlyPositive => "strictly positive".to_string(),
            Self::Negative => "negative".to_string(),
            Self::StrictlyNegative => "strictly negative".to_string(),
            Self::Range(low, high) => {
                format!("in the range [{}:{}]", format_general(low), format_general(high))
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown domain '{0}' (expected positive, strictly-positive, negative or strictly-negative)")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Self::Positive),
            "strictly-positive" => Ok(Self::StrictlyPositive),
            "negative" => Ok(Self::Negative),
            "strictly-negative" => Ok(Self::StrictlyNegative),
            other => Err(UnknownDomain(other.to_string())),
        }
    }
}

/// Formats `x` like C's `%g`: six significant digits, trailing zeros
/// dropped, exponent form outside `1e-4 <= |x| < 1e6`.
pub fn format_general(x: f64) -> String {
    const PRECISION: i32 = 6;

    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; the exponent after rounding
    // decides the notation.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{x:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// The validation contract for one attribute.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    pub(crate) name: String,
    pub(crate) rank: Option<usize>,
    pub(crate) shape: Option<ShapeSpec>,
    pub(crate) domain: Option<Domain>,
    pub(crate) default: Option<Value>,
    pub(crate) target: Option<Arc<dyn UnitObject>>,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), rank: None, shape: None, domain: None, default: None, target: None }
    }

    /// Number of dimensions; 0 means scalar.
    pub fn rank(mut self, rank: usize) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn shape(mut self, shape: impl Into<Shape>) -> Self {
        self.shape = Some(ShapeSpec::Fixed(shape.into()));
        self
    }

    /// Require the same shape as the sibling attribute `sibling`.
    pub fn shape_like(mut self, sibling: impl Into<String>) -> Self {
        self.shape = Some(ShapeSpec::Sibling(sibling.into()));
        self
    }

    pub fn domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Returned by reads of instances that were never assigned. Sequences
    /// are densified at declaration; nothing else is checked.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn convertible_to(self, unit: impl UnitObject) -> Self {
        self.convertible_to_shared(Arc::new(unit))
    }

    pub fn convertible_to_shared(mut self, unit: Arc<dyn UnitObject>) -> Self {
        self.target = Some(unit);
        self
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn shape_spec(&self) -> Option<&ShapeSpec> { self.shape.as_ref() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(3.0, "3")]
    #[case(4.0, "4")]
    #[case(-1.5, "-1.5")]
    #[case(0.1, "0.1")]
    #[case(1e-5, "1e-05")]
    #[case(0.0001, "0.0001")]
    #[case(123456.0, "123456")]
    #[case(1234567.0, "1.23457e+06")]
    #[case(1e100, "1e+100")]
    #[case(2.0 / 3.0, "0.666667")]
    #[case(0.0, "0")]
    fn test_format_general(#[case] x: f64, #[case] expected: &str) {
        assert_eq!(format_general(x), expected);
    }

    #[rstest]
    #[case(Domain::Positive, 0.0, false)]
    #[case(Domain::Positive, -0.1, true)]
    #[case(Domain::StrictlyPositive, 0.0, true)]
    #[case(Domain::Negative, 0.0, false)]
    #[case(Domain::Negative, 1.0, true)]
    #[case(Domain::StrictlyNegative, 0.0, true)]
    #[case(Domain::Range(3.0, 4.0), 3.0, false)]
    #[case(Domain::Range(3.0, 4.0), 4.0, false)]
    #[case(Domain::Range(3.0, 4.0), 4.5, true)]
    fn test_violations(#[case] domain: Domain, #[case] x: f64, #[case] violated: bool) {
        assert_eq!(domain.violated_by(x), violated);
    }

    #[test]
    fn test_nan_is_never_a_violation() {
        for d in [Domain::Positive, Domain::StrictlyNegative, Domain::Range(0.0, 1.0)] {
            assert!(!d.violated_by(f64::NAN));
        }
    }

    #[test]
    fn test_domain_names() {
        assert_eq!("strictly-positive".parse::<Domain>(), Ok(Domain::StrictlyPositive));
        assert_eq!("sideways".parse::<Domain>(), Err(UnknownDomain("sideways".into())));
        assert_eq!(Domain::Range(-1.0, 2.5).requirement(), "in the range [-1:2.5]");
    }

    #[test]
    fn test_builder_keeps_last_shape() {
        let spec = AttributeSpec::new("w").shape([3]).shape_like("a");
        assert_eq!(spec.shape_spec(), Some(&ShapeSpec::Sibling("a".into())));
        assert_eq!(spec.name(), "w");
    }
}
