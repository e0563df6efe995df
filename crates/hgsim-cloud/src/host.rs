//! Physical host entity (§3 `Host`).

use std::collections::HashSet;

use crate::host_profile::HostProfile;
use crate::ids::{HostId, VmId};
use crate::power_model::PowerModel;

/// A physical machine instantiated from a [`HostProfile`], owning a set of VMs.
pub struct Host {
    pub id: HostId,
    pub profile: HostProfile,
    pub vms: HashSet<VmId>,
    pub free_cores: u32,
    pub free_ram_mb: u64,
    pub free_bw_mbps: u64,
    pub free_storage_mb: u64,
    power_model: Box<dyn PowerModel>,
    /// `(t, utilization)` samples, used for final energy-integration reports.
    history: Vec<(f64, f64)>,
}

impl Host {
    pub fn new(id: HostId, profile: HostProfile, power_model: Box<dyn PowerModel>) -> Self {
        Self {
            id,
            free_cores: profile.cores,
            free_ram_mb: profile.ram_mb,
            free_bw_mbps: profile.bw_mbps,
            free_storage_mb: profile.storage_mb,
            profile,
            vms: HashSet::new(),
            power_model,
            history: Vec::new(),
        }
    }

    pub fn can_fit(&self, cores: u32, ram_mb: u64, bw_mbps: u64, storage_mb: u64) -> bool {
        self.free_cores >= cores
            && self.free_ram_mb >= ram_mb
            && self.free_bw_mbps >= bw_mbps
            && self.free_storage_mb >= storage_mb
    }

    pub fn reserve(&mut self, vm_id: VmId, cores: u32, ram_mb: u64, bw_mbps: u64, storage_mb: u64) {
        self.vms.insert(vm_id);
        self.free_cores -= cores;
        self.free_ram_mb -= ram_mb;
        self.free_bw_mbps -= bw_mbps;
        self.free_storage_mb -= storage_mb;
    }

    /// Weighted-average host utilization given each owned VM's `(cores, cpu_util)`.
    pub fn utilization(&self, vm_loads: impl Iterator<Item = (u32, f64)>) -> f64 {
        if self.profile.cores == 0 {
            return 0.0;
        }
        let weighted: f64 = vm_loads.map(|(cores, util)| cores as f64 * util).sum();
        (weighted / self.profile.cores as f64).min(1.0)
    }

    pub fn power_w(&self, utilization: f64) -> f64 {
        self.power_model.power_w(utilization)
    }

    pub fn record_sample(&mut self, time: f64, utilization: f64) {
        self.history.push((time, utilization));
    }

    pub fn history(&self) -> &[(f64, f64)] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power_model::LinearPowerModel;

    fn profile() -> HostProfile {
        HostProfile {
            name: "h".into(),
            cores: 4,
            mips_per_core: 50_000.0,
            ram_mb: 8192,
            bw_mbps: 1000,
            storage_mb: 100_000,
            peak_power_w: 200.0,
            idle_power_pct: 0.25,
        }
    }

    #[test]
    fn weighted_utilization_averages_over_capacity() {
        let host = Host::new(0, profile(), Box::new(LinearPowerModel::new(50.0, 200.0)));
        // two VMs: 2 cores @ 100%, 2 cores @ 0% -> host util = (2*1 + 2*0)/4 = 0.5
        let util = host.utilization(vec![(2, 1.0), (2, 0.0)].into_iter());
        assert_eq!(util, 0.5);
    }

    #[test]
    fn reserve_decrements_free_resources() {
        let mut host = Host::new(0, profile(), Box::new(LinearPowerModel::new(50.0, 200.0)));
        assert!(host.can_fit(2, 4096, 100, 1000));
        host.reserve(7, 2, 4096, 100, 1000);
        assert_eq!(host.free_cores, 2);
        assert!(host.vms.contains(&7));
    }
}
