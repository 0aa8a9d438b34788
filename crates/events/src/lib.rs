//! Stock ledger events and their distribution mechanics.
//!
//! Events are published **after** a ledger entry is stored. Consumers
//! (projections, notification workers) are fire-and-forget from the posting
//! side: nothing here can fail a posting.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::{CompanyScoped, EventEnvelope};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
