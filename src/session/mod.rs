//! Live session tracking
//!
//! [`SessionRegistry`] is the single shared store of who is currently
//! viewing. [`Janitor`] expires idle sessions in the background; the
//! [`expiry`] rules decide which sessions are stale or get evicted.

pub mod expiry;
pub mod janitor;
pub mod record;
pub mod registry;

pub use janitor::Janitor;
pub use record::SessionRecord;
pub use registry::{RegistryLimits, RemoveOutcome, SessionRegistry, TouchOutcome};
