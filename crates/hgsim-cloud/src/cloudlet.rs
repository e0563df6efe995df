//! Compute job entity (§3 `Cloudlet`).

use serde::{Deserialize, Serialize};

use crate::ids::{CloudletId, VmId};

/// Cloudlet lifecycle state. Transitions are explicit guarded functions on
/// [`crate::fleet::ComputeFleet`], not virtual dispatch, per the design note
/// on scheduler state as tagged variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloudletState {
    Waiting,
    Assigned,
    Running,
    Finished,
    Cancelled,
}

/// A compute job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cloudlet {
    pub id: CloudletId,
    pub arrival_time: f64,
    pub length_mi: f64,
    pub cores_required: u32,
    pub input_kb: f64,
    pub output_kb: f64,
    pub state: CloudletState,
    pub vm_id: Option<VmId>,
    pub start_time: Option<f64>,
    pub finish_time: Option<f64>,
    /// Remaining length in MI; decremented as the cloudlet runs.
    pub remaining_mi: f64,
}

impl Cloudlet {
    pub fn new(
        id: CloudletId,
        arrival_time: f64,
        length_mi: f64,
        cores_required: u32,
        input_kb: f64,
        output_kb: f64,
    ) -> Self {
        Self {
            id,
            arrival_time,
            length_mi,
            cores_required,
            input_kb,
            output_kb,
            state: CloudletState::Waiting,
            vm_id: None,
            start_time: None,
            finish_time: None,
            remaining_mi: length_mi,
        }
    }

    pub fn wait_time(&self) -> Option<f64> {
        self.start_time.map(|s| s - self.arrival_time)
    }
}
