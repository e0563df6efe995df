//! Hierarchical scheduling: per-DC local assignment (C6) and the multi-DC
//! global router (C7).

mod global;
mod local;

pub use global::GlobalRouter;
pub use local::{AssignOutcome, LocalScheduler, NO_ASSIGN};
