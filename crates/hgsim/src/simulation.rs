//! Hierarchical simulation core (C8): `configure`/`reset`/`step`/`close`,
//! driving the exact ten-phase tick order of §4.8.

use std::collections::HashMap;

use hgsim_cloud::{Cloudlet, CloudletState, VmId};
use hgsim_core::{EventQueue, EventTag, NO_COMPONENT};
use hgsim_scheduling::{AssignOutcome, GlobalRouter, LocalScheduler, NO_ASSIGN};
use hgsim_workload::{prepare_workload, WorkloadDescriptor};
use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::datacenter::Datacenter;
use crate::observation::{build_global_observation, build_local_observation, GlobalObservation, LocalObservation};
use crate::reward::{global_reward, local_reward};

/// Cross-cutting values the observation builder needs beyond a single DC.
pub struct GlobalContext {
    pub upcoming_count: usize,
    pub queue_pes_distribution: [usize; 3],
    pub recent_completed_total: u64,
    pub current_clock: f64,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DcInfo {
    pub datacenter_id: u32,
    pub cloudlets_received: u64,
    pub cloudlets_finished: u64,
    pub current_green_wh: f64,
    pub current_brown_wh: f64,
    pub current_carbon_kg: f64,
    pub cumulative_green_wh: f64,
    pub cumulative_brown_wh: f64,
    pub cumulative_wasted_green_wh: f64,
    pub cumulative_carbon_kg: f64,
    pub green_ratio: f64,
    pub carbon_intensity_kg_per_kwh: f64,
    /// `false` iff this DC's local action this step was invalid (§4.6/§4.7).
    pub local_result: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InfoDict {
    pub step: u64,
    pub clock: f64,
    pub cloudlets_received_total: u64,
    pub cloudlets_finished_total: u64,
    pub datacenters: Vec<DcInfo>,
    pub terminated_no_unrouted_jobs: bool,
    pub terminated_queues_empty: bool,
    pub truncated_max_steps: bool,
}

pub struct ResetResult {
    pub global_observation: GlobalObservation,
    pub local_observations: HashMap<u32, LocalObservation>,
    pub info: InfoDict,
}

pub struct StepResult {
    pub global_observation: GlobalObservation,
    pub local_observations: HashMap<u32, LocalObservation>,
    pub global_reward: f64,
    pub local_rewards: HashMap<u32, f64>,
    pub terminated: bool,
    pub truncated: bool,
    pub info: InfoDict,
}

/// The C8 environment. Owns everything created by `reset` and destroyed by
/// the next `reset` or by `close`.
pub struct HierarchicalSimulation {
    config: SimulationConfig,
    queue: Option<EventQueue>,
    router: Option<GlobalRouter>,
    datacenters: Vec<Datacenter>,
    rng: Option<StdRng>,
    next_vm_id: VmId,
    current_step: u64,
    episode_count: u32,
    terminated: bool,
    closed: bool,
}

impl HierarchicalSimulation {
    pub fn configure(config: SimulationConfig) -> Self {
        Self {
            config,
            queue: None,
            router: None,
            datacenters: Vec::new(),
            rng: None,
            next_vm_id: 0,
            current_step: 0,
            episode_count: 0,
            terminated: false,
            closed: false,
        }
    }

    /// Direct access to the seeded RNG, stored on the instance (never a
    /// thread-local) so `reset(seed)` reproduces bit-for-bit (I9).
    pub fn rng_mut(&mut self) -> &mut StdRng {
        self.rng.as_mut().expect("reset must be called before using the rng")
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Rebuilds all dynamic state. The first reset of an instance skips the
    /// end-of-episode summary (there is no prior episode to summarize); the
    /// caller is expected to check `episode_count() > 1` before dumping one.
    pub fn reset(&mut self, seed: u64, workload: Vec<WorkloadDescriptor>) -> ResetResult {
        self.closed = false;
        self.terminated = false;
        self.current_step = 0;
        self.next_vm_id = 0;
        self.rng = Some(StdRng::seed_from_u64(seed));
        self.episode_count += 1;

        let prepared = prepare_workload(workload, self.config.max_cloudlet_pes, self.config.split_large_cloudlets);
        self.router = Some(GlobalRouter::new(prepared));

        self.datacenters = self
            .config
            .datacenters
            .iter()
            .cloned()
            .map(|dc_cfg| Datacenter::build(dc_cfg, &mut self.next_vm_id))
            .collect();

        let mut queue = EventQueue::new();
        queue.advance_to(self.config.min_time_between_events, |_, _| {});
        self.queue = Some(queue);

        let batch = self.router.as_ref().unwrap().peek_batch(self.config.global_routing_batch_size);
        let clock = self.queue.as_ref().unwrap().clock();
        let ctx = self.global_context(clock);
        let global_observation = build_global_observation(&self.datacenters, &ctx, &batch);
        let local_observations = self.datacenters.iter().map(|dc| (dc.id, build_local_observation(dc))).collect();
        let no_unrouted = {
            let router = self.router.as_ref().unwrap();
            router.is_waiting_empty() && router.arrivals_exhausted()
        };
        let queues_and_running_empty = self.datacenters.iter().all(|dc| {
            dc.scheduler.waiting_len() == 0 && !dc.fleet.cloudlets().any(|c| c.state == CloudletState::Running)
        });
        let info = self.build_info(&HashMap::new(), no_unrouted, queues_and_running_empty, false);

        ResetResult {
            global_observation,
            local_observations,
            info,
        }
    }

    /// Drives exactly one tick through the ten phases of §4.8.
    pub fn step(&mut self, global_actions: &[i64], local_actions: &HashMap<u32, i64>) -> StepResult {
        assert!(!self.closed, "step called after close");
        let dt = self.config.simulation_timestep;
        let clock = self.queue.as_ref().expect("reset must precede step").clock();

        // 1. global intake, 2. global routing
        let routed = {
            let router = self.router.as_mut().expect("reset must precede step");
            router.intake(clock, dt);
            router.route_batch(self.config.global_routing_batch_size, global_actions)
        };
        for (job, dc_index) in routed {
            if dc_index >= 0 && (dc_index as usize) < self.datacenters.len() {
                let dc = &mut self.datacenters[dc_index as usize];
                dc.fleet.submit_cloudlet(Cloudlet::new(
                    job.id,
                    job.arrival_time,
                    job.length_mi,
                    job.cores_required,
                    job.input_kb,
                    job.output_kb,
                ));
                dc.scheduler.receive(job.id, clock);
            } else {
                warn!("routed job {} to out-of-range dc index {dc_index}, requeuing", job.id);
                self.router.as_mut().unwrap().requeue_front(job);
            }
        }

        // 3. local scheduling
        let mut invalid_flags: HashMap<u32, bool> = HashMap::new();
        for dc in &mut self.datacenters {
            let action = local_actions.get(&dc.id).copied().unwrap_or(NO_ASSIGN);
            let outcome = dc.scheduler.assign_cloudlet_to_vm(action, &mut dc.fleet, clock);
            invalid_flags.insert(dc.id, outcome == AssignOutcome::Invalid);
        }

        // 4. advance clock (injecting an idle nudge if needed, §4.1)
        let target = clock + dt;
        let nudge_needed = self.queue.as_ref().unwrap().is_empty() && self.has_unfinished_work();
        if nudge_needed {
            let delay = dt.max(self.config.min_time_between_events);
            self.queue.as_mut().unwrap().send(NO_COMPONENT, NO_COMPONENT, delay, EventTag::None);
        }
        self.queue.as_mut().unwrap().advance_to(target, |_, _| {});
        let now = self.queue.as_ref().unwrap().clock();

        // 5. energy update
        let mut carbon_delta_total = 0.0;
        for dc in &mut self.datacenters {
            let finished = dc.fleet.tick(dt, now);
            dc.scheduler.note_finished(&finished, &dc.fleet);
            dc.cloudlets_finished += finished.len() as u64; // 6. sync completion counters
            let demand_w = dc.fleet.total_demand_w();
            let green_w = dc.farm.current_power_w(now);
            let delta = dc.energy.tick(demand_w, green_w, dt);
            carbon_delta_total += delta.carbon_kg;
        }

        // 7. build observations
        let batch = self.router.as_ref().unwrap().peek_batch(self.config.global_routing_batch_size);
        let ctx = self.global_context(now);
        let global_observation = build_global_observation(&self.datacenters, &ctx, &batch);
        let local_observations: HashMap<u32, LocalObservation> =
            self.datacenters.iter().map(|dc| (dc.id, build_local_observation(dc))).collect();

        // 8. compute rewards before clearing per-step lists
        let coefs = self.config.reward;
        let local_rewards: HashMap<u32, f64> = self
            .datacenters
            .iter()
            .map(|dc| {
                let invalid = invalid_flags.get(&dc.id).copied().unwrap_or(false);
                (dc.id, local_reward(dc, invalid, &coefs))
            })
            .collect();
        let global_reward_value = global_reward(
            &local_rewards.values().copied().collect::<Vec<_>>(),
            carbon_delta_total,
            &coefs,
        );

        // 9. clear per-step tracking
        for dc in &mut self.datacenters {
            dc.scheduler.clear_step();
        }

        // 10. termination check
        self.current_step += 1;
        let no_unrouted = {
            let router = self.router.as_ref().unwrap();
            router.is_waiting_empty() && router.arrivals_exhausted()
        };
        let queues_and_running_empty = self.datacenters.iter().all(|dc| {
            dc.scheduler.waiting_len() == 0 && !dc.fleet.cloudlets().any(|c| c.state == CloudletState::Running)
        });
        let terminated_now = no_unrouted && queues_and_running_empty;
        if terminated_now && !self.terminated {
            self.queue.as_mut().unwrap().terminate();
        }
        self.terminated = terminated_now;
        let truncated = self.current_step >= self.config.max_episode_length;

        let info = self.build_info(&invalid_flags, no_unrouted, queues_and_running_empty, truncated);

        StepResult {
            global_observation,
            local_observations,
            global_reward: global_reward_value,
            local_rewards,
            terminated: terminated_now,
            truncated,
            info,
        }
    }

    /// Terminal; idempotent (P1). Any cloudlet still `Waiting`/`Assigned`/
    /// `Running` transitions to `Cancelled` (§3 lifecycle: "... except for
    /// Cancelled on shutdown") before the event queue stops accepting events.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        let clock = self.queue.as_ref().map(|q| q.clock()).unwrap_or(0.0);
        for dc in &mut self.datacenters {
            dc.fleet.cancel_outstanding(clock);
        }
        if let Some(queue) = self.queue.as_mut() {
            queue.terminate();
        }
        self.closed = true;
    }

    pub fn datacenters(&self) -> &[Datacenter] {
        &self.datacenters
    }

    fn has_unfinished_work(&self) -> bool {
        let router = self.router.as_ref().unwrap();
        let router_pending = !router.arrivals_exhausted() || !router.is_waiting_empty();
        let dc_pending = self.datacenters.iter().any(|dc| {
            dc.scheduler.waiting_len() > 0 || dc.fleet.cloudlets().any(|c| c.state == CloudletState::Running)
        });
        router_pending || dc_pending
    }

    fn global_context(&self, clock: f64) -> GlobalContext {
        let router = self.router.as_ref().unwrap();
        GlobalContext {
            upcoming_count: router.waiting_len(),
            queue_pes_distribution: router.pes_distribution(),
            recent_completed_total: self.datacenters.iter().map(|dc| dc.cloudlets_finished).sum(),
            current_clock: clock,
            batch_size: self.config.global_routing_batch_size,
        }
    }

    fn build_info(
        &self,
        invalid_flags: &HashMap<u32, bool>,
        terminated_no_unrouted_jobs: bool,
        terminated_queues_empty: bool,
        truncated_max_steps: bool,
    ) -> InfoDict {
        let clock = self.queue.as_ref().map(|q| q.clock()).unwrap_or(0.0);
        let datacenters: Vec<DcInfo> = self
            .datacenters
            .iter()
            .map(|dc| {
                let totals = dc.energy.totals();
                let delta = dc.energy.latest_delta();
                let total_kwh = (totals.green_wh + totals.brown_wh) / 1000.0;
                DcInfo {
                    datacenter_id: dc.id,
                    cloudlets_received: dc.scheduler.cloudlets_received(),
                    cloudlets_finished: dc.cloudlets_finished,
                    current_green_wh: delta.green_used_wh,
                    current_brown_wh: delta.brown_used_wh,
                    current_carbon_kg: delta.carbon_kg,
                    cumulative_green_wh: totals.green_wh,
                    cumulative_brown_wh: totals.brown_wh,
                    cumulative_wasted_green_wh: totals.wasted_green_wh,
                    cumulative_carbon_kg: totals.carbon_kg,
                    green_ratio: dc.energy.green_ratio(),
                    carbon_intensity_kg_per_kwh: if total_kwh > 0.0 { totals.carbon_kg / total_kwh } else { 0.0 },
                    local_result: !invalid_flags.get(&dc.id).copied().unwrap_or(false),
                }
            })
            .collect();

        InfoDict {
            step: self.current_step,
            clock,
            cloudlets_received_total: datacenters.iter().map(|d| d.cloudlets_received).sum(),
            cloudlets_finished_total: datacenters.iter().map(|d| d.cloudlets_finished).sum(),
            datacenters,
            terminated_no_unrouted_jobs,
            terminated_queues_empty,
            truncated_max_steps,
        }
    }
}

// Cross-module scenario tests for this type (reset/step/close end to end)
// live in `tests/scenarios.rs`, alongside the rest of the S1-S6 suite.
