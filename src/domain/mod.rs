//! Domain events and the in-process bus that carries them.
//!
//! Producers publish concrete event types; consumers subscribe per type
//! during startup wiring. Cross-domain consumers couple to the integration
//! contracts in [`contracts`], never to another domain's internal events.

pub mod bus;
pub mod contracts;
pub mod events;

pub use bus::{EventBus, EventHandler};
pub use contracts::UserSavedIntegrationEvent;
pub use events::{DomainEvent, EventMetadata, UserSaved};
