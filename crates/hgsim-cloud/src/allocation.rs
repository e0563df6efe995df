//! VM-to-host allocation policy (§4.2, §9 "Polymorphism for algorithms").

use crate::host::Host;
use crate::ids::HostId;

/// Chooses a host for a newly created VM.
pub trait AllocationPolicy {
    /// Returns the id of the host to place the VM on, or `None` if no host
    /// has enough free capacity (the VM then fails, per §4.2).
    fn select_host(&self, hosts: &[Host], cores: u32, ram_mb: u64, bw_mbps: u64, storage_mb: u64) -> Option<HostId>;
}

/// Bin-packs by free cores, first-fit, ties broken by lowest host id.
///
/// `hosts` is iterated in ascending id order since [`crate::fleet::ComputeFleet`]
/// keeps them stored that way, so the first match already satisfies the
/// tie-break rule.
#[derive(Default)]
pub struct FirstFitAllocation;

impl AllocationPolicy for FirstFitAllocation {
    fn select_host(&self, hosts: &[Host], cores: u32, ram_mb: u64, bw_mbps: u64, storage_mb: u64) -> Option<HostId> {
        hosts
            .iter()
            .find(|h| h.can_fit(cores, ram_mb, bw_mbps, storage_mb))
            .map(|h| h.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_profile::HostProfile;
    use crate::power_model::LinearPowerModel;

    fn host(id: HostId, cores: u32) -> Host {
        let profile = HostProfile {
            name: format!("h{id}"),
            cores,
            mips_per_core: 1000.0,
            ram_mb: 1024,
            bw_mbps: 100,
            storage_mb: 10_000,
            peak_power_w: 100.0,
            idle_power_pct: 0.3,
        };
        Host::new(id, profile, Box::new(LinearPowerModel::new(30.0, 100.0)))
    }

    #[test]
    fn picks_lowest_id_among_fitting_hosts() {
        let hosts = vec![host(0, 2), host(1, 8), host(2, 8)];
        let policy = FirstFitAllocation;
        let chosen = policy.select_host(&hosts, 4, 512, 50, 1000);
        assert_eq!(chosen, Some(1));
    }

    #[test]
    fn no_host_fits_returns_none() {
        let hosts = vec![host(0, 2)];
        let policy = FirstFitAllocation;
        assert_eq!(policy.select_host(&hosts, 4, 512, 50, 1000), None);
    }
}
