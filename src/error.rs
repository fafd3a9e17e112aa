//! Defines the error types for attribute declaration and validation.
use crate::shape::Shape;
use crate::spec::Domain;
use crate::store::InstanceId;
use crate::units::Framework;
use thiserror::Error;

/// Which check failed, for branching without matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InconsistentRankShape,
    NotScalar,
    WrongRank,
    NotNumeric,
    ConversionFailed,
    WrongShape,
    UnrecognizedUnitFramework,
    WrongQuantityType,
    IncompatibleUnits,
    OutOfDomain,
    DuplicateAttribute,
    UnknownSibling,
    UnknownAttribute,
    UnknownInstance,
    InstanceLimit,
}

/// Coarse grouping of errors, used by the Python bindings to pick an
/// exception class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The value is the wrong kind of thing (a list where a scalar is
    /// expected, text, a bare number where a quantity is expected).
    Type,
    /// The value is the right kind but its content is rejected.
    Value,
    /// The attribute or schema declaration itself is invalid, or the caller
    /// addressed something that does not exist.
    Declaration,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraitError {
    #[error("shape={shape} and rank={rank} are inconsistent")]
    InconsistentRankShape { name: String, shape: Shape, rank: usize },

    #[error("{name} should be a scalar value")]
    NotScalar { name: String },

    #[error("{name} should be {}", rank_requirement(.rank))]
    WrongRank { name: String, rank: usize },

    #[error("{name} should be a numerical value")]
    NotNumeric { name: String },

    #[error("Could not convert value of {name} to a numeric array ({reason})")]
    ConversionFailed { name: String, reason: String },

    #[error("{name} has incorrect {}", shape_mismatch(.expected, .found, .as_length))]
    WrongShape { name: String, expected: Shape, found: Shape, as_length: bool },

    #[error("Could not identify unit framework for target unit of type {type_name}")]
    UnrecognizedUnitFramework { name: String, type_name: String },

    #[error("{name} should be given as {} instance", quantity_label(.framework))]
    WrongQuantityType { name: String, framework: Framework },

    #[error("{name} should be in units convertible to {target}")]
    IncompatibleUnits { name: String, target: String },

    #[error("{}{name} should be {}", domain_prefix(.elementwise), requirement(.domain))]
    OutOfDomain { name: String, domain: Domain, elementwise: bool },

    #[error("attribute {name} is declared more than once")]
    DuplicateAttribute { name: String },

    #[error("{name} takes its shape from {sibling}, which is not a declared attribute")]
    UnknownSibling { name: String, sibling: String },

    #[error("no attribute named {name}")]
    UnknownAttribute { name: String },

    #[error("instance {instance} does not exist or has been released")]
    UnknownInstance { instance: InstanceId },

    #[error("no instance slots left ({live} instances are live)")]
    InstanceLimit { live: usize },
}

impl TraitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InconsistentRankShape { .. } => ErrorKind::InconsistentRankShape,
            Self::NotScalar { .. } => ErrorKind::NotScalar,
            Self::WrongRank { .. } => ErrorKind::WrongRank,
            Self::NotNumeric { .. } => ErrorKind::NotNumeric,
            Self::ConversionFailed { .. } => ErrorKind::ConversionFailed,
            Self::WrongShape { .. } => ErrorKind::WrongShape,
            Self::UnrecognizedUnitFramework { .. } => ErrorKind::UnrecognizedUnitFramework,
            Self::WrongQuantityType { .. } => ErrorKind::WrongQuantityType,
            Self::IncompatibleUnits { .. } => ErrorKind::IncompatibleUnits,
            Self::OutOfDomain { .. } => ErrorKind::OutOfDomain,
            Self::DuplicateAttribute { .. } => ErrorKind::DuplicateAttribute,
            Self::UnknownSibling { .. } => ErrorKind::UnknownSibling,
            Self::UnknownAttribute { .. } => ErrorKind::UnknownAttribute,
            Self::UnknownInstance { .. } => ErrorKind::UnknownInstance,
            Self::InstanceLimit { .. } => ErrorKind::InstanceLimit,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.kind() {
            ErrorKind::NotScalar
            | ErrorKind::WrongRank
            | ErrorKind::NotNumeric
            | ErrorKind::ConversionFailed
            | ErrorKind::WrongQuantityType => ErrorCategory::Type,
            ErrorKind::WrongShape | ErrorKind::IncompatibleUnits | ErrorKind::OutOfDomain => {
                ErrorCategory::Value
            }
            ErrorKind::InconsistentRankShape
            | ErrorKind::UnrecognizedUnitFramework
            | ErrorKind::DuplicateAttribute
            | ErrorKind::UnknownSibling
            | ErrorKind::UnknownAttribute
            | ErrorKind::UnknownInstance
            | ErrorKind::InstanceLimit => ErrorCategory::Declaration,
        }
    }
}

fn rank_requirement(rank: &usize) -> String {
    if *rank == 1 {
        "a 1-d sequence".to_string()
    } else {
        format!("a {rank}-d array")
    }
}

fn quantity_label(framework: &Framework) -> &'static str {
    framework.quantity_label()
}

fn domain_prefix(elementwise: &bool) -> &'static str {
    if *elementwise { "All values of " } else { "" }
}

fn requirement(domain: &Domain) -> String {
    domain.requirement()
}

fn shape_mismatch(expected: &Shape, found: &Shape, as_length: &bool) -> String {
    match (*as_length, expected.length(), found.length()) {
        (true, Some(e), Some(f)) => format!("length (expected {e} but found {f})"),
        _ => format!("shape (expected {expected} but found {found})"),
    }
}
