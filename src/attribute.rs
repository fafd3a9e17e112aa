//! The validating descriptor attached to one attribute.
//!
//! Every write runs the same pipeline, stopping at the first failure:
//! classification and densification, rank, shape, unit compatibility,
//! domain. Only a value that passes every stage is committed, so a failed
//! write leaves the previous value in place.
use crate::error::TraitError;
use crate::shape::Shape;
use crate::spec::{AttributeSpec, Domain, ShapeSpec};
use crate::store::{AttrId, InstanceId, Slots};
use crate::units::{check_compatible, identify_framework, Framework, UnitObject};
use crate::value::{densify, normalize, Value};
use ndarray::{CowArray, IxDyn};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, trace};

/// Arrays at least this large are scanned for domain violations in parallel.
const PARALLEL_SCAN_THRESHOLD: usize = 1 << 15;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShapeRule {
    Free,
    Fixed(Shape),
    Sibling(AttrId),
}

#[derive(Debug, Clone)]
struct TargetUnit {
    unit: Arc<dyn UnitObject>,
    framework: Framework,
}

/// A declared numeric attribute together with the values it holds for each
/// instance.
#[derive(Debug, Clone)]
pub struct NumericAttribute {
    name: String,
    rank: Option<usize>,
    shape: ShapeRule,
    domain: Option<Domain>,
    default: Option<Value>,
    target: Option<TargetUnit>,
    values: Slots,
}

impl NumericAttribute {
    /// Builds a standalone attribute. Sibling shape references need a
    /// [`Schema`](crate::Schema) to resolve against and fail here.
    pub fn new(spec: AttributeSpec) -> Result<Self, TraitError> {
        Self::declare(spec, |_| None)
    }

    /// Runs every construction-time check, resolving sibling names through
    /// `resolve`.
    pub(crate) fn declare(
        spec: AttributeSpec,
        resolve: impl Fn(&str) -> Option<AttrId>,
    ) -> Result<Self, TraitError> {
        let AttributeSpec { name, rank, shape, domain, default, target } = spec;

        let (rank, shape) = match shape {
            None => (rank, ShapeRule::Free),
            Some(ShapeSpec::Fixed(fixed)) => match rank {
                Some(r) if r != fixed.rank() => {
                    return Err(TraitError::InconsistentRankShape { name, shape: fixed, rank: r });
                }
                _ => (Some(fixed.rank()), ShapeRule::Fixed(fixed)),
            },
            Some(ShapeSpec::Sibling(sibling)) => match resolve(&sibling) {
                Some(id) => (rank, ShapeRule::Sibling(id)),
                None => return Err(TraitError::UnknownSibling { name, sibling }),
            },
        };

        let target = match target {
            Some(unit) => {
                let framework = identify_framework(&name, unit.as_ref())?;
                Some(TargetUnit { unit, framework })
            }
            None => None,
        };

        // Sequence defaults are stored dense so siblings can read their shape.
        let default = match default {
            Some(Value::List(items)) => match densify(&items) {
                Ok(dense) => Some(Value::Array(dense)),
                Err(reason) => return Err(TraitError::ConversionFailed { name, reason }),
            },
            other => other,
        };

        debug!(attribute = %name, ?rank, shape = ?shape, ?domain, framework = ?target.as_ref().map(|t| t.framework), "declared attribute");

        Ok(Self { name, rank, shape, domain, default, target, values: Slots::new() })
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn rank(&self) -> Option<usize> { self.rank }

    pub fn framework(&self) -> Option<Framework> { self.target.as_ref().map(|t| t.framework) }

    /// The attribute whose stored shape this one must match, if any.
    pub fn sibling(&self) -> Option<AttrId> {
        match self.shape {
            ShapeRule::Sibling(id) => Some(id),
            _ => None,
        }
    }

    /// The stored value for `instance`, falling back to the default.
    pub fn read(&self, instance: InstanceId) -> Option<&Value> {
        self.values.get(instance).or(self.default.as_ref())
    }

    /// Whether `instance` holds an assigned value (as opposed to the default).
    pub fn is_assigned(&self, instance: InstanceId) -> bool {
        self.values.get(instance).is_some()
    }

    /// Validates and stores `raw` for `instance`.
    pub fn write(&mut self, instance: InstanceId, raw: impl Into<Value>) -> Result<(), TraitError> {
        let value = self.validate(raw.into(), None)?;
        self.commit(instance, value);
        Ok(())
    }

    /// Runs the full pipeline without storing anything. `sibling` is the
    /// current value of the sibling this attribute takes its shape from.
    ///
    /// Returns the value that would be stored: sequences densified, scalars
    /// and quantities as given.
    pub fn validate(&self, raw: Value, sibling: Option<&Value>) -> Result<Value, TraitError> {
        let outcome = normalize(&self.name, raw).and_then(|value| {
            self.check(&value, sibling)?;
            Ok(value)
        });
        if let Err(err) = &outcome {
            debug!(attribute = %self.name, kind = ?err.kind(), "rejected write");
        }
        outcome
    }

    pub(crate) fn commit(&mut self, instance: InstanceId, value: Value) {
        debug!(attribute = %self.name, %instance, "stored value");
        self.values.insert(instance, value);
    }

    /// Drops the value held for `instance`.
    pub(crate) fn forget(&mut self, instance: InstanceId) -> Option<Value> {
        self.values.remove(instance)
    }

    fn check(&self, value: &Value, sibling: Option<&Value>) -> Result<(), TraitError> {
        let numbers = value
            .numbers()
            .ok_or_else(|| TraitError::NotNumeric { name: self.name.clone() })?;
        let ndim = numbers.ndim();
        trace!(attribute = %self.name, ndim, "checking value");

        match self.rank {
            Some(0) if ndim != 0 => {
                return Err(TraitError::NotScalar { name: self.name.clone() });
            }
            Some(rank) if rank > 0 && ndim != rank => {
                return Err(TraitError::WrongRank { name: self.name.clone(), rank });
            }
            _ => {}
        }

        let expected = match &self.shape {
            ShapeRule::Free => None,
            ShapeRule::Fixed(shape) => Some(shape.clone()),
            // An unset sibling imposes nothing.
            ShapeRule::Sibling(_) => sibling.and_then(Value::shape),
        };
        if let Some(expected) = expected {
            let found = Shape::from(numbers.shape());
            if found != expected {
                return Err(TraitError::WrongShape {
                    name: self.name.clone(),
                    expected,
                    found,
                    as_length: self.rank == Some(1),
                });
            }
        }

        if let Some(target) = &self.target {
            check_compatible(&self.name, value, target.unit.as_ref(), target.framework)?;
        }

        if let Some(domain) = self.domain {
            if any_violation(&numbers, domain) {
                return Err(TraitError::OutOfDomain {
                    name: self.name.clone(),
                    domain,
                    elementwise: ndim > 0,
                });
            }
        }
        Ok(())
    }
}

fn any_violation(numbers: &CowArray<'_, f64, IxDyn>, domain: Domain) -> bool {
    match numbers.as_slice_memory_order() {
        Some(slice) if slice.len() >= PARALLEL_SCAN_THRESHOLD => {
            slice.par_iter().any(|&x| domain.violated_by(x))
        }
        _ => numbers.iter().any(|&x| domain.violated_by(x)),
    }
}
