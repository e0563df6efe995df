//! Discrete-event scheduler and virtual clock (component C1).
//!
//! The simulation clock only ever moves forward through [`EventQueue::advance_to`].
//! Everything else in the workspace treats time as a value read from the queue,
//! never as something it advances on its own.

mod event;
mod queue;

pub use event::{Event, EventId, EventTag};
pub use queue::{AdvanceOutcome, EventQueue};

/// Component identifier used to tag event source/destination.
///
/// The scheduler does not dispatch events to components itself (there is no
/// handler registry, unlike the actor-style engine this module is modeled
/// on): callers drain ready events with [`EventQueue::advance_to`] and route
/// them by `dest` themselves.
pub type ComponentId = u32;

/// Sentinel destination used for events that aren't addressed to a specific
/// component (the `None`-tag idle nudge, primarily).
pub const NO_COMPONENT: ComponentId = u32::MAX;
