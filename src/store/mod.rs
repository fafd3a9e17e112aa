//! Arena identities and per-instance value storage.
pub mod slots;
pub mod types;

pub use slots::Slots;
pub use types::{AttrId, InstanceId};
