//! Workload descriptor feeder: splitting, sorting, and optional CSV ingestion (component C3).
//!
//! The core's primary entry point is [`prepare_workload`], which takes
//! already-parsed descriptors (workload-trace file parsing proper is an
//! external collaborator, per the spec's non-goals). [`csv_reader`] is kept
//! as a convenience for the CSV wire format documented for this system, used
//! by tests and examples rather than by the simulation core itself.

mod csv_reader;
mod descriptor;
mod feeder;

pub use csv_reader::{read_csv, WorkloadError};
pub use descriptor::WorkloadDescriptor;
pub use feeder::prepare_workload;
