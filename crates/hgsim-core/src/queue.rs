//! Event queue driving the virtual clock.

use std::collections::BinaryHeap;

use log::warn;

use crate::event::{Event, EventId, EventTag};
use crate::ComponentId;

/// Default safety cap on the number of events drained within a single
/// [`EventQueue::advance_to`] call, guarding against degenerate inputs that
/// would otherwise spin forever (e.g. components re-scheduling themselves
/// with zero delay).
pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;

/// Outcome of an [`EventQueue::advance_to`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// All events with `time <= target` were drained and the clock now sits
    /// exactly at `target`.
    Reached,
    /// The iteration cap was hit before the queue was drained; the clock was
    /// clamped to `target` regardless (`EventLoopStall`, §7).
    Stalled,
}

/// Ordered event queue and virtual clock (C1).
pub struct EventQueue {
    heap: BinaryHeap<Event>,
    clock: f64,
    next_id: EventId,
    running: bool,
    max_iterations: u32,
}

impl EventQueue {
    /// Creates a new queue with the clock at `0.0`.
    pub fn new() -> Self {
        Self::with_max_iterations(DEFAULT_MAX_ITERATIONS)
    }

    /// Creates a new queue with a custom iteration cap for [`advance_to`](Self::advance_to).
    pub fn with_max_iterations(max_iterations: u32) -> Self {
        Self {
            heap: BinaryHeap::new(),
            clock: 0.0,
            next_id: 0,
            running: true,
            max_iterations,
        }
    }

    /// Current virtual clock value.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Whether the queue still accepts new events.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Schedules an event `delay` time units from now, returning its id.
    ///
    /// `delay` must be non-negative; the event fires at `clock() + delay`.
    pub fn send(&mut self, from: ComponentId, to: ComponentId, delay: f64, tag: EventTag) -> EventId {
        assert!(delay >= 0.0, "event delay must be non-negative, got {delay}");
        if !self.running {
            warn!("event queue is terminated, dropping event {:?} to {}", tag, to);
            return EventId::MAX;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Event {
            id,
            time: self.clock + delay,
            src: from,
            dest: to,
            tag,
        });
        id
    }

    /// Time of the next pending event, if any.
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.time)
    }

    /// Whether there are no pending events at all.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drains and dispatches every event with `time <= target` to `on_event`,
    /// repeatedly re-checking the heap minimum as the teacher's engine does,
    /// then clamps the clock to `target`.
    ///
    /// `on_event` may itself schedule further events (e.g. chained VM
    /// lifecycle transitions); each newly scheduled event is still subject to
    /// the same `target` cutoff and iteration cap.
    pub fn advance_to<F>(&mut self, target: f64, mut on_event: F) -> AdvanceOutcome
    where
        F: FnMut(&mut Self, Event),
    {
        assert!(target >= self.clock, "cannot advance clock backwards");
        let mut iterations = 0u32;
        loop {
            let Some(next_time) = self.peek_time() else {
                break;
            };
            if next_time > target {
                break;
            }
            if iterations >= self.max_iterations {
                warn!(
                    "event loop stalled after {} iterations advancing to {:.3}, clamping clock",
                    self.max_iterations, target
                );
                self.clock = target;
                return AdvanceOutcome::Stalled;
            }
            let event = self.heap.pop().unwrap();
            self.clock = event.time;
            iterations += 1;
            on_event(self, event);
        }
        self.clock = target;
        AdvanceOutcome::Reached
    }

    /// Terminates the queue: no further events are accepted. Idempotent (P1).
    pub fn terminate(&mut self) {
        self.running = false;
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
