//! Observation builder (§4.9): global (DC-level) and local (VM-level)
//! observations with deterministic, fixed slot shapes (I8).

use hgsim_workload::WorkloadDescriptor;
use serde::{Deserialize, Serialize};

use crate::datacenter::Datacenter;
use crate::simulation::GlobalContext;

/// DC-level observation. Every `Vec` has length `N = #DCs`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GlobalObservation {
    pub dc_green_power_w: Vec<f64>,
    pub dc_total_power_w: Vec<f64>,
    pub dc_green_ratio: Vec<f64>,
    pub dc_wasted_green_wh: Vec<f64>,
    pub dc_short_mean: Vec<f64>,
    pub dc_short_trend: Vec<f64>,
    pub dc_long_mean: Vec<f64>,
    pub dc_long_peak_timing: Vec<f64>,
    pub dc_queue_size: Vec<usize>,
    pub dc_avg_cpu_util: Vec<f64>,
    pub dc_available_pes: Vec<u32>,
    pub dc_avg_ram_util: Vec<f64>,
    pub upcoming_count: usize,
    /// Zero-padded to `batch_size`.
    pub batch_cloudlet_pes: Vec<u32>,
    /// Zero-padded to `batch_size`.
    pub batch_cloudlet_mi: Vec<f64>,
    pub queue_pes_distribution: [usize; 3],
    pub load_imbalance: f64,
    pub recent_completed_total: u64,
    pub current_clock: f64,
}

/// Per-DC VM/host-level observation. Every `Vec` is sized to that DC's VM (or
/// host) count and keeps its slot for the whole episode even if a VM fails.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocalObservation {
    pub vm_cpu_load: Vec<f64>,
    /// `0 = off/unknown, 1 = Small, 2 = Medium, 3 = Large`.
    pub vm_type: Vec<u8>,
    /// `-1` if the VM never got a host.
    pub vm_host_id: Vec<i64>,
    pub vm_free_pes: Vec<u32>,
    pub host_cpu_util: Vec<f64>,
    pub host_ram_util: Vec<f64>,
    pub host_free_pes: Vec<u32>,
    pub waiting_local: usize,
    pub next_cloudlet_pes: u32,
    pub actual_active_vm_count: usize,
    pub actual_host_count: usize,
}

fn vm_type_code(size: hgsim_cloud::VmSize) -> u8 {
    match size {
        hgsim_cloud::VmSize::Small => 1,
        hgsim_cloud::VmSize::Medium => 2,
        hgsim_cloud::VmSize::Large => 3,
    }
}

pub fn build_local_observation(dc: &Datacenter) -> LocalObservation {
    let mut vm_cpu_load = Vec::new();
    let mut vm_type = Vec::new();
    let mut vm_host_id = Vec::new();
    let mut vm_free_pes = Vec::new();
    let mut active = 0usize;

    for &id in dc.fleet.vm_order() {
        let vm = dc.fleet.vm(id).expect("vm_order entries always resolve");
        if vm.is_running() {
            active += 1;
            vm_cpu_load.push(vm.cpu_util());
            vm_type.push(vm_type_code(vm.size));
            vm_host_id.push(vm.host_id.map(|h| h as i64).unwrap_or(-1));
            vm_free_pes.push(vm.free_cores());
        } else {
            vm_cpu_load.push(0.0);
            vm_type.push(0);
            vm_host_id.push(-1);
            vm_free_pes.push(0);
        }
    }

    let mut host_cpu_util = Vec::new();
    let mut host_ram_util = Vec::new();
    let mut host_free_pes = Vec::new();
    for host in dc.fleet.hosts() {
        host_cpu_util.push(dc.fleet.host_utilization(host.id));
        host_ram_util.push(1.0 - host.free_ram_mb as f64 / host.profile.ram_mb.max(1) as f64);
        host_free_pes.push(host.free_cores);
    }

    let next_cloudlet_pes = dc
        .scheduler
        .peek_head()
        .and_then(|id| dc.fleet.cloudlet(id))
        .map(|c| c.cores_required)
        .unwrap_or(0);

    LocalObservation {
        vm_cpu_load,
        vm_type,
        vm_host_id,
        vm_free_pes,
        host_cpu_util,
        host_ram_util,
        host_free_pes,
        waiting_local: dc.scheduler.waiting_len(),
        next_cloudlet_pes,
        actual_active_vm_count: active,
        actual_host_count: dc.fleet.hosts().len(),
    }
}

pub fn build_global_observation(
    datacenters: &[Datacenter],
    ctx: &GlobalContext,
    batch: &[WorkloadDescriptor],
) -> GlobalObservation {
    let n = datacenters.len();
    let mut obs = GlobalObservation {
        upcoming_count: ctx.upcoming_count,
        queue_pes_distribution: ctx.queue_pes_distribution,
        recent_completed_total: ctx.recent_completed_total,
        current_clock: ctx.current_clock,
        ..Default::default()
    };
    obs.dc_green_power_w = Vec::with_capacity(n);
    obs.dc_total_power_w = Vec::with_capacity(n);
    obs.dc_green_ratio = Vec::with_capacity(n);
    obs.dc_wasted_green_wh = Vec::with_capacity(n);
    obs.dc_short_mean = Vec::with_capacity(n);
    obs.dc_short_trend = Vec::with_capacity(n);
    obs.dc_long_mean = Vec::with_capacity(n);
    obs.dc_long_peak_timing = Vec::with_capacity(n);
    obs.dc_queue_size = Vec::with_capacity(n);
    obs.dc_avg_cpu_util = Vec::with_capacity(n);
    obs.dc_available_pes = Vec::with_capacity(n);
    obs.dc_avg_ram_util = Vec::with_capacity(n);

    for dc in datacenters {
        let green_w = dc.farm.current_power_w(ctx.current_clock);
        let total_w = dc.fleet.total_demand_w();
        let trend = dc.farm.future_trend_features(ctx.current_clock, dc.config.short_term_rows, dc.config.long_term_rows);
        let delta = dc.energy.latest_delta();

        obs.dc_green_power_w.push(green_w);
        obs.dc_total_power_w.push(total_w);
        obs.dc_green_ratio.push(if delta.demand_wh > 0.0 {
            delta.green_used_wh / delta.demand_wh
        } else {
            0.0
        });
        obs.dc_wasted_green_wh.push(delta.wasted_green_wh);
        obs.dc_short_mean.push(trend.short_mean);
        obs.dc_short_trend.push(trend.short_trend);
        obs.dc_long_mean.push(trend.long_mean);
        obs.dc_long_peak_timing.push(trend.long_peak_timing);
        obs.dc_queue_size.push(dc.scheduler.waiting_len());
        obs.dc_avg_cpu_util.push(dc.avg_cpu_util());
        obs.dc_available_pes.push(dc.available_pes());
        obs.dc_avg_ram_util.push(dc.avg_ram_util());
    }

    let batch_size = ctx.batch_size;
    obs.batch_cloudlet_pes = vec![0u32; batch_size];
    obs.batch_cloudlet_mi = vec![0.0f64; batch_size];
    for (slot, job) in batch.iter().take(batch_size).enumerate() {
        obs.batch_cloudlet_pes[slot] = job.cores_required;
        obs.batch_cloudlet_mi[slot] = job.length_mi;
    }

    let mean = if n > 0 { obs.dc_avg_cpu_util.iter().sum::<f64>() / n as f64 } else { 0.0 };
    let variance = if n > 0 {
        obs.dc_avg_cpu_util.iter().map(|u| (u - mean).powi(2)).sum::<f64>() / n as f64
    } else {
        0.0
    };
    obs.load_imbalance = variance.sqrt();

    obs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_slots_are_zero_padded() {
        let ctx = GlobalContext {
            upcoming_count: 1,
            queue_pes_distribution: [1, 0, 0],
            recent_completed_total: 0,
            current_clock: 0.0,
            batch_size: 4,
        };
        let batch = vec![WorkloadDescriptor {
            id: 0,
            arrival_time: 0.0,
            length_mi: 100.0,
            cores_required: 2,
            input_kb: 0.0,
            output_kb: 0.0,
        }];
        let obs = build_global_observation(&[], &ctx, &batch);
        assert_eq!(obs.batch_cloudlet_pes, vec![2, 0, 0, 0]);
        assert_eq!(obs.batch_cloudlet_mi, vec![100.0, 0.0, 0.0, 0.0]);
    }
}
