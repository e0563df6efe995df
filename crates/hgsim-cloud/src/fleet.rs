//! Owns the hosts, VMs and cloudlets of a single datacenter (§3, §4.2).
//!
//! Mirrors the teacher's `ResourcePoolState` in spirit (a local arena with
//! pure allocation bookkeeping) but extended with the cloudlet progress
//! integration §4.2 calls for, since this workspace models cloudlets
//! directly rather than delegating execution to a separate actor.

use std::collections::HashMap;

use log::{debug, warn};

use crate::allocation::AllocationPolicy;
use crate::cloudlet::{Cloudlet, CloudletState};
use crate::host::Host;
use crate::ids::{CloudletId, HostId, VmId};
use crate::vm::{Vm, VmSize, VmState};

/// A numerically negligible amount of remaining work, below which a cloudlet
/// is considered finished (guards against floating-point residue).
const MI_EPSILON: f64 = 1e-6;

pub struct ComputeFleet {
    hosts: Vec<Host>,
    vms: HashMap<VmId, Vm>,
    vm_order: Vec<VmId>,
    cloudlets: HashMap<CloudletId, Cloudlet>,
    allocation_policy: Box<dyn AllocationPolicy>,
}

impl ComputeFleet {
    pub fn new(hosts: Vec<Host>, allocation_policy: Box<dyn AllocationPolicy>) -> Self {
        Self {
            hosts,
            vms: HashMap::new(),
            vm_order: Vec::new(),
            cloudlets: HashMap::new(),
            allocation_policy,
        }
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn hosts_mut(&mut self) -> &mut [Host] {
        &mut self.hosts
    }

    /// Deterministic VM creation order, for stable observation slots (I8).
    pub fn vm_order(&self) -> &[VmId] {
        &self.vm_order
    }

    pub fn vm(&self, id: VmId) -> Option<&Vm> {
        self.vms.get(&id)
    }

    pub fn cloudlet(&self, id: CloudletId) -> Option<&Cloudlet> {
        self.cloudlets.get(&id)
    }

    /// Creates a VM with the given `id` (assigned by the caller's global
    /// counter) and places it using the allocation policy. Returns `true` if
    /// placed, `false` if the VM failed for lack of capacity (§4.2).
    pub fn create_vm(&mut self, id: VmId, size: VmSize, cores: u32, ram_mb: u64, bw_mbps: u64, storage_mb: u64) -> bool {
        let mut vm = Vm::new(id, size, cores, ram_mb, bw_mbps, storage_mb);
        match self.allocation_policy.select_host(&self.hosts, cores, ram_mb, bw_mbps, storage_mb) {
            Some(host_id) => {
                let host = &mut self.hosts[host_id as usize];
                host.reserve(id, cores, ram_mb, bw_mbps, storage_mb);
                vm.host_id = Some(host_id);
                vm.state = VmState::Running;
                self.vms.insert(id, vm);
                self.vm_order.push(id);
                debug!("vm {id} placed on host {host_id}");
                true
            }
            None => {
                vm.state = VmState::Failed;
                warn!("vm {id} failed to allocate: no host has enough free capacity");
                self.vms.insert(id, vm);
                self.vm_order.push(id);
                false
            }
        }
    }

    /// Registers a cloudlet in the `Waiting` state.
    pub fn submit_cloudlet(&mut self, cloudlet: Cloudlet) {
        self.cloudlets.insert(cloudlet.id, cloudlet);
    }

    /// Starts a waiting/assigned cloudlet on `vm_id`, guarded exactly as §4.6
    /// requires. Returns `false` (no mutation) if the guard fails.
    pub fn start_cloudlet(&mut self, cloudlet_id: CloudletId, vm_id: VmId, now: f64) -> bool {
        let Some(vm) = self.vms.get(&vm_id) else {
            return false;
        };
        if !vm.is_running() {
            return false;
        }
        let Some(cloudlet) = self.cloudlets.get(&cloudlet_id) else {
            return false;
        };
        if vm.free_cores() < cloudlet.cores_required {
            return false;
        }
        let cores_required = cloudlet.cores_required;
        let vm = self.vms.get_mut(&vm_id).unwrap();
        vm.cores_in_use += cores_required;
        vm.running_cloudlets.insert(cloudlet_id);
        let cloudlet = self.cloudlets.get_mut(&cloudlet_id).unwrap();
        cloudlet.state = CloudletState::Running;
        cloudlet.vm_id = Some(vm_id);
        cloudlet.start_time = Some(now);
        true
    }

    /// Advances every running cloudlet by `dt` seconds, finishing any whose
    /// remaining work reaches zero, and records one utilization sample per
    /// host. Returns the ids of cloudlets that finished this tick.
    pub fn tick(&mut self, dt: f64, now: f64) -> Vec<CloudletId> {
        let mut finished = Vec::new();
        for cloudlet in self.cloudlets.values_mut() {
            if cloudlet.state != CloudletState::Running {
                continue;
            }
            let vm_id = cloudlet.vm_id.expect("running cloudlet must have a vm");
            let vm = &self.vms[&vm_id];
            let host_id = vm.host_id.expect("running vm must have a host");
            let mips_per_core = self.hosts[host_id as usize].profile.mips_per_core;
            let rate = cloudlet.cores_required as f64 * mips_per_core;
            let progress = (rate * dt).min(cloudlet.remaining_mi);
            cloudlet.remaining_mi -= progress;
            if cloudlet.remaining_mi <= MI_EPSILON {
                cloudlet.remaining_mi = 0.0;
                cloudlet.state = CloudletState::Finished;
                cloudlet.finish_time = Some(now);
                finished.push(cloudlet.id);
            }
        }
        for cloudlet_id in &finished {
            let vm_id = self.cloudlets[cloudlet_id].vm_id.unwrap();
            let cores_required = self.cloudlets[cloudlet_id].cores_required;
            if let Some(vm) = self.vms.get_mut(&vm_id) {
                vm.cores_in_use = vm.cores_in_use.saturating_sub(cores_required);
                vm.running_cloudlets.remove(cloudlet_id);
            }
        }
        for host in &mut self.hosts {
            let util = Self::host_utilization_static(&self.vms, host);
            host.record_sample(now, util);
        }
        finished
    }

    fn host_utilization_static(vms: &HashMap<VmId, Vm>, host: &Host) -> f64 {
        host.utilization(host.vms.iter().map(|id| {
            let vm = &vms[id];
            (vm.cores, vm.cpu_util())
        }))
    }

    pub fn host_utilization(&self, host_id: HostId) -> f64 {
        Self::host_utilization_static(&self.vms, &self.hosts[host_id as usize])
    }

    pub fn host_power_w(&self, host_id: HostId) -> f64 {
        let util = self.host_utilization(host_id);
        self.hosts[host_id as usize].power_w(util)
    }

    /// Total instantaneous power demand across all hosts in watts.
    pub fn total_demand_w(&self) -> f64 {
        (0..self.hosts.len() as HostId).map(|id| self.host_power_w(id)).sum()
    }

    pub fn cloudlets(&self) -> impl Iterator<Item = &Cloudlet> {
        self.cloudlets.values()
    }

    pub fn vms(&self) -> impl Iterator<Item = &Vm> {
        self.vms.values()
    }

    /// Transitions every non-terminal cloudlet (`Waiting`/`Assigned`/`Running`)
    /// to `Cancelled`, stamping `finish_time = now`. Used on shutdown (§3
    /// lifecycle: "... except for Cancelled on shutdown"). Returns the ids
    /// cancelled.
    pub fn cancel_outstanding(&mut self, now: f64) -> Vec<CloudletId> {
        let mut cancelled = Vec::new();
        for cloudlet in self.cloudlets.values_mut() {
            if matches!(cloudlet.state, CloudletState::Finished | CloudletState::Cancelled) {
                continue;
            }
            if let Some(vm_id) = cloudlet.vm_id {
                if let Some(vm) = self.vms.get_mut(&vm_id) {
                    vm.cores_in_use = vm.cores_in_use.saturating_sub(cloudlet.cores_required);
                    vm.running_cloudlets.remove(&cloudlet.id);
                }
            }
            cloudlet.state = CloudletState::Cancelled;
            cloudlet.finish_time = Some(now);
            cancelled.push(cloudlet.id);
        }
        cancelled
    }
}
