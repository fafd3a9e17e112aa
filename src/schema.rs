//! A set of declared attributes plus the instances that carry them.
//!
//! The schema plays the role of a host class: it issues [`InstanceId`]s,
//! routes reads and writes to the right [`NumericAttribute`], feeds sibling
//! values into shape checks and drops every stored value when an instance is
//! released. Released slots are recycled under a newer generation.
use crate::attribute::NumericAttribute;
use crate::error::TraitError;
use crate::spec::AttributeSpec;
use crate::store::{AttrId, InstanceId};
use crate::value::Value;
use std::collections::HashMap;
use tracing::debug;

/// Collects attribute declarations. Order doesn't matter; sibling names are
/// resolved in [`build`](SchemaBuilder::build).
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    specs: Vec<AttributeSpec>,
}

impl SchemaBuilder {
    pub fn attribute(mut self, spec: AttributeSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn build(self) -> Result<Schema, TraitError> {
        // Pass 1: assign handles so forward references resolve.
        let mut index = HashMap::with_capacity(self.specs.len());
        for (i, spec) in self.specs.iter().enumerate() {
            if index.insert(spec.name.clone(), AttrId::new(i)).is_some() {
                return Err(TraitError::DuplicateAttribute { name: spec.name.clone() });
            }
        }

        // Pass 2: construction checks, with siblings resolved to handles.
        let attributes = self
            .specs
            .into_iter()
            .map(|spec| NumericAttribute::declare(spec, |sibling| index.get(sibling).copied()))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(attributes = attributes.len(), "built schema");
        Ok(Schema { attributes, index, entries: Vec::new(), free: Vec::new() })
    }
}

/// Occupancy of one instance index.
#[derive(Debug, Clone, Copy)]
struct Entry {
    generation: u32,
    live: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    attributes: Vec<NumericAttribute>,
    index: HashMap<String, AttrId>,
    entries: Vec<Entry>,
    /// Released indices waiting to be handed out again, at a newer generation.
    free: Vec<u32>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder { SchemaBuilder::default() }

    /// Looks up an attribute handle by name.
    pub fn attr(&self, name: &str) -> Result<AttrId, TraitError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| TraitError::UnknownAttribute { name: name.to_string() })
    }

    pub fn attribute(&self, attr: AttrId) -> Result<&NumericAttribute, TraitError> {
        self.attributes
            .get(attr.index())
            .ok_or_else(|| TraitError::UnknownAttribute { name: format!("#{}", attr.0) })
    }

    /// Declared attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (AttrId, &NumericAttribute)> {
        self.attributes.iter().enumerate().map(|(i, a)| (AttrId::new(i), a))
    }

    pub fn len(&self) -> usize { self.attributes.len() }

    pub fn is_empty(&self) -> bool { self.attributes.is_empty() }

    /// Creates a new instance, recycling a released slot when one is free.
    /// The returned id is distinct from every id issued before it.
    pub fn spawn(&mut self) -> Result<InstanceId, TraitError> {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.live = true;
            return Ok(InstanceId { index, generation: entry.generation });
        }
        let index = u32::try_from(self.entries.len())
            .map_err(|_| TraitError::InstanceLimit { live: self.live_count() })?;
        self.entries.push(Entry { generation: 0, live: true });
        Ok(InstanceId::new(index))
    }

    /// Releases `instance`, dropping its value from every attribute. The id
    /// stays invalid even after its slot is reused.
    pub fn release(&mut self, instance: InstanceId) -> Result<(), TraitError> {
        self.ensure_live(instance)?;
        let dropped = self
            .attributes
            .iter_mut()
            .filter_map(|a| a.forget(instance))
            .count();

        let entry = &mut self.entries[instance.index()];
        entry.live = false;
        // A slot whose generations are used up is retired for good.
        if let Some(next) = entry.generation.checked_add(1) {
            entry.generation = next;
            self.free.push(instance.index);
        }
        debug!(%instance, dropped, "released instance");
        Ok(())
    }

    pub fn is_live(&self, instance: InstanceId) -> bool {
        self.entries
            .get(instance.index())
            .is_some_and(|e| e.live && e.generation == instance.generation)
    }

    /// Number of instances currently alive.
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.live).count()
    }

    /// Number of instance slots ever allocated, live or free.
    pub fn instance_capacity(&self) -> usize { self.entries.len() }

    /// The stored value, else the attribute's default.
    pub fn get(&self, instance: InstanceId, attr: AttrId) -> Result<Option<&Value>, TraitError> {
        self.ensure_live(instance)?;
        Ok(self.attribute(attr)?.read(instance))
    }

    /// Validates `value` and stores it. A rejected value leaves the previous
    /// one untouched.
    pub fn set(&mut self, instance: InstanceId, attr: AttrId, value: impl Into<Value>) -> Result<(), TraitError> {
        self.ensure_live(instance)?;
        let attribute = self.attribute(attr)?;
        let sibling = attribute
            .sibling()
            .and_then(|s| self.attributes.get(s.index()))
            .and_then(|s| s.read(instance));
        let value = attribute.validate(value.into(), sibling)?;

        if let Some(attribute) = self.attributes.get_mut(attr.index()) {
            attribute.commit(instance, value);
        }
        Ok(())
    }

    pub fn get_by_name(&self, instance: InstanceId, name: &str) -> Result<Option<&Value>, TraitError> {
        self.get(instance, self.attr(name)?)
    }

    pub fn set_by_name(&mut self, instance: InstanceId, name: &str, value: impl Into<Value>) -> Result<(), TraitError> {
        let attr = self.attr(name)?;
        self.set(instance, attr, value)
    }

    fn ensure_live(&self, instance: InstanceId) -> Result<(), TraitError> {
        if self.is_live(instance) {
            Ok(())
        } else {
            Err(TraitError::UnknownInstance { instance })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::spec::Domain;
    use ndarray::Array1;
    use proptest::prelude::*;

    fn arrays() -> Schema {
        Schema::builder()
            .attribute(AttributeSpec::new("w").shape_like("a").domain(Domain::Positive))
            .attribute(AttributeSpec::new("a").shape([3]))
            .attribute(AttributeSpec::new("f").rank(0).domain(Domain::Range(3.0, 4.0)).default(3.5))
            .build()
            .unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Schema::builder()
            .attribute(AttributeSpec::new("a"))
            .attribute(AttributeSpec::new("a").rank(0))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateAttribute);
    }

    #[test]
    fn test_unknown_sibling_rejected() {
        let err = Schema::builder()
            .attribute(AttributeSpec::new("w").shape_like("missing"))
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "w takes its shape from missing, which is not a declared attribute");
    }

    #[test]
    fn test_forward_sibling_reference_resolves() {
        let schema = arrays();
        let w = schema.attr("w").unwrap();
        assert_eq!(schema.attribute(w).unwrap().sibling(), Some(schema.attr("a").unwrap()));
    }

    #[test]
    fn test_sibling_shape_follows_stored_value() {
        let mut schema = arrays();
        let obj = schema.spawn().unwrap();

        // No sibling value yet: any shape goes.
        schema.set_by_name(obj, "w", [1, 2]).unwrap();

        schema.set_by_name(obj, "a", [1, 2, 3]).unwrap();
        let err = schema.set_by_name(obj, "w", [1, 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongShape);
        assert_eq!(err.to_string(), "w has incorrect shape (expected (3,) but found (2,))");
        schema.set_by_name(obj, "w", [4, 5, 6]).unwrap();
    }

    #[test]
    fn test_sibling_shape_follows_sequence_default() {
        let mut schema = Schema::from_json_str(
            r#"{"attributes": [{"name": "a", "default": [1, 2, 3]}, {"name": "w", "shape": "a"}]}"#,
        )
        .unwrap();
        let obj = schema.spawn().unwrap();
        let err = schema.set_by_name(obj, "w", [1, 2]).unwrap_err();
        assert_eq!(err.to_string(), "w has incorrect shape (expected (3,) but found (2,))");
        schema.set_by_name(obj, "w", [4, 5, 6]).unwrap();
    }

    #[test]
    fn test_ragged_default_fails_at_build() {
        let err = Schema::builder()
            .attribute(AttributeSpec::new("a").default(vec![vec![1.0], vec![1.0, 2.0]]))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionFailed);
    }

    #[test]
    fn test_instances_are_independent() {
        let mut schema = arrays();
        let one = schema.spawn().unwrap();
        let two = schema.spawn().unwrap();
        schema.set_by_name(one, "f", 3.0).unwrap();
        assert_eq!(schema.get_by_name(one, "f").unwrap(), Some(&Value::Float(3.0)));
        assert_eq!(schema.get_by_name(two, "f").unwrap(), Some(&Value::Float(3.5)));
    }

    #[test]
    fn test_failed_write_keeps_previous_value() {
        let mut schema = arrays();
        let obj = schema.spawn().unwrap();
        let f = schema.attr("f").unwrap();

        assert!(schema.set(obj, f, 7).is_err());
        assert_eq!(schema.get(obj, f).unwrap(), Some(&Value::Float(3.5)));

        schema.set(obj, f, 3.25).unwrap();
        let err = schema.set(obj, f, 7).unwrap_err();
        assert_eq!(err.to_string(), "f should be in the range [3:4]");
        assert_eq!(schema.get(obj, f).unwrap(), Some(&Value::Float(3.25)));
    }

    #[test]
    fn test_release_drops_values_and_id() {
        let mut schema = arrays();
        let obj = schema.spawn().unwrap();
        schema.set_by_name(obj, "a", [1, 2, 3]).unwrap();
        schema.release(obj).unwrap();

        assert!(!schema.is_live(obj));
        assert_eq!(schema.get_by_name(obj, "a").unwrap_err().kind(), ErrorKind::UnknownInstance);
        assert_eq!(schema.release(obj).unwrap_err().kind(), ErrorKind::UnknownInstance);
        let a = schema.attr("a").unwrap();
        assert!(!schema.attribute(a).unwrap().is_assigned(obj));

        let next = schema.spawn().unwrap();
        assert_ne!(next, obj);
        assert_eq!(next.index(), obj.index());
        assert_eq!(schema.get_by_name(next, "a").unwrap(), None);
        assert_eq!(schema.set_by_name(obj, "a", [1, 2, 3]).unwrap_err().kind(), ErrorKind::UnknownInstance);
    }

    #[test]
    fn test_released_slots_are_recycled() {
        let mut schema = arrays();
        let keep = schema.spawn().unwrap();
        let first = schema.spawn().unwrap();
        schema.release(first).unwrap();

        let mut last = first;
        for i in 0..10_000 {
            let obj = schema.spawn().unwrap();
            schema.set_by_name(obj, "f", 3.0 + (i % 2) as f64).unwrap();
            schema.release(obj).unwrap();
            last = obj;
        }

        assert_eq!(schema.instance_capacity(), 2);
        assert_eq!(schema.live_count(), 1);
        assert_eq!(last.generation, 10_000);
        for stale in [first, last] {
            assert_eq!(schema.get_by_name(stale, "f").unwrap_err().kind(), ErrorKind::UnknownInstance);
            assert_eq!(schema.release(stale).unwrap_err().kind(), ErrorKind::UnknownInstance);
        }
        assert_eq!(schema.get_by_name(keep, "f").unwrap(), Some(&Value::Float(3.5)));
    }

    #[test]
    fn test_unknown_names_and_handles() {
        let mut schema = arrays();
        let obj = schema.spawn().unwrap();
        assert_eq!(schema.attr("z").unwrap_err().to_string(), "no attribute named z");
        assert!(schema.set_by_name(obj, "z", 1.0).is_err());
        assert_eq!(schema.get(obj, AttrId::new(99)).unwrap_err().kind(), ErrorKind::UnknownAttribute);
        assert_eq!(
            schema.get(InstanceId::new(5), AttrId::new(0)).unwrap_err().to_string(),
            "instance #5 does not exist or has been released"
        );
    }

    proptest! {
        #[test]
        fn test_repeated_write_is_idempotent(values in proptest::collection::vec(0.0f64..1e6, 3)) {
            let mut schema = arrays();
            let obj = schema.spawn().unwrap();
            let a = schema.attr("a").unwrap();
            schema.set(obj, a, values.clone()).unwrap();
            let once = schema.get(obj, a).unwrap().cloned();
            schema.set(obj, a, values.clone()).unwrap();
            prop_assert_eq!(schema.get(obj, a).unwrap().cloned(), once.clone());
            prop_assert_eq!(once, Some(Value::Array(Array1::from(values).into_dyn())));
        }

        #[test]
        fn test_range_bounds_are_inclusive(low in -1e3f64..1e3, width in 1e-3f64..1e3) {
            let high = low + width;
            let mut schema = Schema::builder()
                .attribute(AttributeSpec::new("r").rank(0).domain(Domain::Range(low, high)))
                .build()
                .unwrap();
            let obj = schema.spawn().unwrap();
            let r = schema.attr("r").unwrap();
            prop_assert!(schema.set(obj, r, low).is_ok());
            prop_assert!(schema.set(obj, r, high).is_ok());
            let eps = width * 1e-3;
            prop_assert!(schema.set(obj, r, low - eps).is_err());
            prop_assert!(schema.set(obj, r, high + eps).is_err());
        }

        #[test]
        fn test_scalar_and_sequence_dispatch(x in -1e6f64..1e6, items in proptest::collection::vec(-1e6f64..1e6, 0..8)) {
            let mut schema = Schema::builder()
                .attribute(AttributeSpec::new("s").rank(0))
                .attribute(AttributeSpec::new("v").rank(1))
                .build()
                .unwrap();
            let obj = schema.spawn().unwrap();
            let err = schema.set_by_name(obj, "s", items.clone()).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::NotScalar);
            let err = schema.set_by_name(obj, "v", x).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::WrongRank);
            prop_assert!(schema.set_by_name(obj, "s", x).is_ok());
            prop_assert!(schema.set_by_name(obj, "v", items).is_ok());
        }

        #[test]
        fn test_rank_must_match_fixed_shape(rank in 0usize..5, dims in proptest::collection::vec(1usize..5, 0..5)) {
            let outcome = NumericAttribute::new(AttributeSpec::new("x").rank(rank).shape(dims.clone()));
            if rank == dims.len() {
                prop_assert!(outcome.is_ok());
            } else {
                prop_assert_eq!(outcome.unwrap_err().kind(), ErrorKind::InconsistentRankShape);
            }
        }
    }
}
