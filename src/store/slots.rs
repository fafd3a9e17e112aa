//! Per-attribute storage of validated values, indexed by instance.
use super::types::InstanceId;
use crate::value::Value;

/// Dense per-instance value column for a single attribute.
///
/// Slot `i` holds the last value accepted for the instance living at index
/// `i`. Generations are the schema's business: it clears a slot on release,
/// before the index can be handed out again.
#[derive(Debug, Clone, Default)]
pub struct Slots {
    values: Vec<Option<Value>>,
}

impl Slots {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, id: InstanceId) -> Option<&Value> {
        self.values.get(id.index())?.as_ref()
    }

    pub fn insert(&mut self, id: InstanceId, value: Value) {
        let idx = id.index();
        if idx >= self.values.len() {
            self.values.resize(idx + 1, None);
        }
        self.values[idx] = Some(value);
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<Value> {
        self.values.get_mut(id.index())?.take()
    }
}
