//! Parsed job descriptor, the feeder's input and output unit.

use serde::{Deserialize, Serialize};

/// A single already-parsed workload row (§4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkloadDescriptor {
    pub id: u64,
    pub arrival_time: f64,
    pub length_mi: f64,
    pub cores_required: u32,
    pub input_kb: f64,
    pub output_kb: f64,
}
