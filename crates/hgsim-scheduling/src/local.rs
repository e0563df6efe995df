//! Per-DC local scheduler (§4.6): FIFO queue, VM assignment state machine.

use std::collections::{HashMap, HashSet, VecDeque};

use hgsim_cloud::{CloudletId, ComputeFleet, VmId};
use log::warn;

/// Outcome of [`LocalScheduler::assign_cloudlet_to_vm`], used directly by the
/// reward engine's invalid-action penalty (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    Valid,
    Invalid,
}

/// Sentinel action meaning "assign nothing this step" (§4.6).
pub const NO_ASSIGN: i64 = -1;

/// Owns one datacenter's waiting queue and VM-assignment bookkeeping.
pub struct LocalScheduler {
    owned_vms: HashSet<VmId>,
    waiting_local: VecDeque<CloudletId>,
    arrival_at_broker: HashMap<CloudletId, f64>,
    recorded_wait: HashMap<CloudletId, f64>,
    cloudlets_received: u64,
    finished_this_step: Vec<CloudletId>,
}

impl LocalScheduler {
    pub fn new(owned_vms: HashSet<VmId>) -> Self {
        Self {
            owned_vms,
            waiting_local: VecDeque::new(),
            arrival_at_broker: HashMap::new(),
            recorded_wait: HashMap::new(),
            cloudlets_received: 0,
            finished_this_step: Vec::new(),
        }
    }

    /// Receives a cloudlet routed from the global router.
    pub fn receive(&mut self, cloudlet_id: CloudletId, now: f64) {
        self.waiting_local.push_back(cloudlet_id);
        self.arrival_at_broker.insert(cloudlet_id, now);
        self.cloudlets_received += 1;
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting_local.len()
    }

    pub fn cloudlets_received(&self) -> u64 {
        self.cloudlets_received
    }

    pub fn peek_head(&self) -> Option<CloudletId> {
        self.waiting_local.front().copied()
    }

    /// The exact `assignCloudletToVm` state machine of §4.6.
    pub fn assign_cloudlet_to_vm(&mut self, vm_id: i64, fleet: &mut ComputeFleet, now: f64) -> AssignOutcome {
        if vm_id == NO_ASSIGN {
            return if self.waiting_local.is_empty() {
                AssignOutcome::Valid
            } else {
                AssignOutcome::Invalid
            };
        }
        let vm_id = vm_id as VmId;
        if !self.owned_vms.contains(&vm_id) {
            return AssignOutcome::Invalid;
        }
        let Some(&job_id) = self.waiting_local.front() else {
            return AssignOutcome::Invalid;
        };
        let Some(cloudlet) = fleet.cloudlet(job_id) else {
            warn!("local scheduler head job {job_id} missing from fleet");
            return AssignOutcome::Invalid;
        };
        let Some(vm) = fleet.vm(vm_id) else {
            return AssignOutcome::Invalid;
        };
        if !vm.is_running() || vm.free_cores() < cloudlet.cores_required {
            return AssignOutcome::Invalid;
        }

        if !fleet.start_cloudlet(job_id, vm_id, now) {
            // guarded above, but the fleet is the source of truth
            return AssignOutcome::Invalid;
        }
        self.waiting_local.pop_front();
        if let Some(arrival) = self.arrival_at_broker.remove(&job_id) {
            self.recorded_wait.insert(job_id, now - arrival);
        }
        AssignOutcome::Valid
    }

    /// Filters `finished_ids` (from [`ComputeFleet::tick`]) down to cloudlets
    /// that belong to this DC, recording them for this step's reward.
    pub fn note_finished(&mut self, finished_ids: &[CloudletId], fleet: &ComputeFleet) {
        for &id in finished_ids {
            if let Some(cloudlet) = fleet.cloudlet(id) {
                if let Some(vm_id) = cloudlet.vm_id {
                    if self.owned_vms.contains(&vm_id) {
                        self.finished_this_step.push(id);
                    }
                }
            }
        }
    }

    pub fn finished_this_step(&self) -> &[CloudletId] {
        &self.finished_this_step
    }

    /// Mean of recorded broker wait times for cloudlets finished this step;
    /// `0.0` if none finished (§4.10 component 1).
    pub fn avg_wait_finished_this_step(&self) -> f64 {
        if self.finished_this_step.is_empty() {
            return 0.0;
        }
        let waits: Vec<f64> = self
            .finished_this_step
            .iter()
            .filter_map(|id| self.recorded_wait.get(id).copied())
            .collect();
        if waits.is_empty() {
            0.0
        } else {
            waits.iter().sum::<f64>() / waits.len() as f64
        }
    }

    /// Clears per-step tracking lists (§4.8 step 9). Must run after reward
    /// computation.
    pub fn clear_step(&mut self) {
        for id in self.finished_this_step.drain(..) {
            self.recorded_wait.remove(&id);
        }
    }

    pub fn owned_vms(&self) -> &HashSet<VmId> {
        &self.owned_vms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hgsim_cloud::{Cloudlet, FirstFitAllocation, Host, HostProfile, LinearPowerModel, VmSize};

    fn fleet_with_vm() -> ComputeFleet {
        let profile = HostProfile {
            name: "h0".into(),
            cores: 4,
            mips_per_core: 50_000.0,
            ram_mb: 8192,
            bw_mbps: 1000,
            storage_mb: 100_000,
            peak_power_w: 200.0,
            idle_power_pct: 0.25,
        };
        let host = Host::new(0, profile, Box::new(LinearPowerModel::new(50.0, 200.0)));
        let mut fleet = ComputeFleet::new(vec![host], Box::new(FirstFitAllocation));
        fleet.create_vm(0, VmSize::Small, 2, 1024, 100, 10_000);
        fleet
    }

    #[test]
    fn no_assign_on_empty_queue_is_valid() {
        let mut fleet = fleet_with_vm();
        let mut sched = LocalScheduler::new(HashSet::from([0]));
        assert_eq!(sched.assign_cloudlet_to_vm(NO_ASSIGN, &mut fleet, 0.0), AssignOutcome::Valid);
    }

    #[test]
    fn s6_no_assign_on_nonempty_queue_is_invalid() {
        let mut fleet = fleet_with_vm();
        fleet.submit_cloudlet(Cloudlet::new(0, 0.0, 1000.0, 2, 0.0, 0.0));
        let mut sched = LocalScheduler::new(HashSet::from([0]));
        sched.receive(0, 0.0);
        sched.receive(1, 0.0);
        sched.receive(2, 0.0);
        assert_eq!(sched.assign_cloudlet_to_vm(NO_ASSIGN, &mut fleet, 1.0), AssignOutcome::Invalid);
        assert_eq!(sched.waiting_len(), 3);
    }

    #[test]
    fn unowned_vm_is_invalid() {
        let mut fleet = fleet_with_vm();
        let mut sched = LocalScheduler::new(HashSet::from([0]));
        sched.receive(0, 0.0);
        assert_eq!(sched.assign_cloudlet_to_vm(99, &mut fleet, 1.0), AssignOutcome::Invalid);
    }

    #[test]
    fn successful_assign_records_wait_time() {
        let mut fleet = fleet_with_vm();
        fleet.submit_cloudlet(Cloudlet::new(0, 0.0, 100_000.0, 2, 0.0, 0.0));
        let mut sched = LocalScheduler::new(HashSet::from([0]));
        sched.receive(0, 0.0);
        let outcome = sched.assign_cloudlet_to_vm(0, &mut fleet, 2.0);
        assert_eq!(outcome, AssignOutcome::Valid);
        assert_eq!(sched.waiting_len(), 0);
        let finished = fleet.tick(1.0, 3.0);
        sched.note_finished(&finished, &fleet);
        assert_eq!(sched.finished_this_step(), &[0]);
        assert_eq!(sched.avg_wait_finished_this_step(), 2.0);
        sched.clear_step();
        assert!(sched.finished_this_step().is_empty());
    }

    #[test]
    fn insufficient_free_cores_is_invalid() {
        let mut fleet = fleet_with_vm();
        fleet.submit_cloudlet(Cloudlet::new(0, 0.0, 100.0, 4, 0.0, 0.0));
        let mut sched = LocalScheduler::new(HashSet::from([0]));
        sched.receive(0, 0.0);
        assert_eq!(sched.assign_cloudlet_to_vm(0, &mut fleet, 1.0), AssignOutcome::Invalid);
    }
}
