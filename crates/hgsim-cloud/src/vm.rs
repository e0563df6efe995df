//! Virtual machine entity (§3 `VM`).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ids::{CloudletId, HostId, VmId};

/// VM size class; default core counts per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VmSize {
    Small,
    Medium,
    Large,
}

impl VmSize {
    /// Default core count for this size class (2/4/8).
    pub fn default_cores(&self) -> u32 {
        match self {
            VmSize::Small => 2,
            VmSize::Medium => 4,
            VmSize::Large => 8,
        }
    }
}

/// VM lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmState {
    Pending,
    Running,
    Failed,
    Stopped,
}

/// A virtual machine instance, created up front from the fleet specification
/// and persisting for the episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vm {
    pub id: VmId,
    pub size: VmSize,
    pub cores: u32,
    pub ram_mb: u64,
    pub bw_mbps: u64,
    pub storage_mb: u64,
    /// `None` only while `state == Failed` and no host ever admitted it.
    pub host_id: Option<HostId>,
    pub state: VmState,
    /// Cores currently reserved by running cloudlets (`<= cores`).
    pub cores_in_use: u32,
    #[serde(skip)]
    pub(crate) running_cloudlets: HashSet<CloudletId>,
}

impl Vm {
    pub fn new(id: VmId, size: VmSize, cores: u32, ram_mb: u64, bw_mbps: u64, storage_mb: u64) -> Self {
        Self {
            id,
            size,
            cores,
            ram_mb,
            bw_mbps,
            storage_mb,
            host_id: None,
            state: VmState::Pending,
            cores_in_use: 0,
            running_cloudlets: HashSet::new(),
        }
    }

    /// Free cores available for a new cloudlet to start running.
    pub fn free_cores(&self) -> u32 {
        self.cores.saturating_sub(self.cores_in_use)
    }

    /// Instantaneous CPU utilization of the VM: fraction of its cores
    /// reserved by running cloudlets, clamped to `[0, 1]`.
    pub fn cpu_util(&self) -> f64 {
        if self.cores == 0 {
            return 0.0;
        }
        (self.cores_in_use as f64 / self.cores as f64).min(1.0)
    }

    pub fn is_running(&self) -> bool {
        self.state == VmState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_core_counts_match_size_classes() {
        assert_eq!(VmSize::Small.default_cores(), 2);
        assert_eq!(VmSize::Medium.default_cores(), 4);
        assert_eq!(VmSize::Large.default_cores(), 8);
    }

    #[test]
    fn free_cores_and_util_track_reservations() {
        let mut vm = Vm::new(0, VmSize::Medium, 4, 4096, 100, 10_000);
        vm.state = VmState::Running;
        assert_eq!(vm.free_cores(), 4);
        assert_eq!(vm.cpu_util(), 0.0);
        vm.cores_in_use = 2;
        assert_eq!(vm.free_cores(), 2);
        assert_eq!(vm.cpu_util(), 0.5);
    }
}
