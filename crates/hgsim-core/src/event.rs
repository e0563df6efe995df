//! Event representation.

use std::cmp::Ordering;

use serde::Serialize;

use crate::ComponentId;

/// Unique, monotonically increasing event identifier.
pub type EventId = u64;

/// The closed set of event tags the core ever schedules.
///
/// Unlike the generic `dyn EventData` payloads of a full actor engine, this
/// simulation only ever needs these four shapes, so the tag carries its own
/// data directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum EventTag {
    /// No semantic payload; used purely to keep the clock moving when no
    /// other event is pending but unfinished work remains.
    None,
    /// A cloudlet finished running on a VM.
    CloudletFinished { cloudlet_id: u64, vm_id: u32 },
    /// A VM finished its startup delay and is now running.
    VmStartup { vm_id: u32 },
    /// An external agent nudged the simulation (reserved for the IPC bridge;
    /// the core never constructs this variant itself).
    ExternalNudge,
}

/// A scheduled event.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub time: f64,
    pub src: ComponentId,
    pub dest: ComponentId,
    pub tag: EventTag,
}

impl Eq for Event {}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

// `BinaryHeap` is a max-heap; events order by time ascending (then id
// ascending for ties) so we reverse the natural comparison, exactly as the
// teacher's own `Event::cmp` does it.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
