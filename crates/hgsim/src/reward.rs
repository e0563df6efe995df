//! Reward engine (§4.10): per-DC local reward components and the global
//! carbon-penalized aggregate.

use crate::config::RewardCoefficients;
use crate::datacenter::Datacenter;

/// Computes the local reward for one DC, given whether its action this step
/// was invalid (§4.6/§4.7 validity rules).
pub fn local_reward(dc: &Datacenter, invalid_action: bool, coefs: &RewardCoefficients) -> f64 {
    let wait_penalty = {
        let avg_wait = dc.scheduler.avg_wait_finished_this_step();
        if dc.scheduler.finished_this_step().is_empty() {
            0.0
        } else {
            -coefs.wait_time_coef * (1.0 + avg_wait).ln()
        }
    };

    let util_penalty = {
        let utils: Vec<f64> = dc.fleet.vms().filter(|v| v.is_running()).map(|v| v.cpu_util()).collect();
        if utils.is_empty() {
            0.0
        } else {
            let mean = utils.iter().sum::<f64>() / utils.len() as f64;
            let variance = utils.iter().map(|u| (u - mean).powi(2)).sum::<f64>() / utils.len() as f64;
            -coefs.unutilization_coef * (variance.sqrt() + (mean - coefs.utilization_target).abs())
        }
    };

    let queue_penalty = {
        let received = dc.scheduler.cloudlets_received().max(1) as f64;
        -coefs.queue_penalty_coef * (dc.scheduler.waiting_len() as f64 / received)
    };

    let invalid_penalty = if invalid_action { -coefs.invalid_action_coef } else { 0.0 };

    wait_penalty + util_penalty + queue_penalty + invalid_penalty
}

/// `R_global = sum(R_local) - w_carbon * sum(carbon delta this tick)`.
pub fn global_reward(local_rewards: &[f64], carbon_delta_kg_this_tick: f64, coefs: &RewardCoefficients) -> f64 {
    local_rewards.iter().sum::<f64>() - coefs.carbon_penalty_coef * carbon_delta_kg_this_tick
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatacenterConfig;
    use hgsim_cloud::VmId;
    use hgsim_green_energy::TimeScalingMode;

    fn dc_config() -> DatacenterConfig {
        DatacenterConfig {
            datacenter_id: 0,
            name: "dc0".into(),
            hosts_count: 1,
            host_profiles: vec![hgsim_cloud::HostProfile {
                name: "h".into(),
                cores: 4,
                mips_per_core: 50_000.0,
                ram_mb: 8192,
                bw_mbps: 1000,
                storage_mb: 100_000,
                peak_power_w: 200.0,
                idle_power_pct: 0.25,
            }],
            initial_s_vm_count: 1,
            initial_m_vm_count: 0,
            initial_l_vm_count: 0,
            green_energy_enabled: false,
            turbine_ids: vec![],
            wind_data_file: None,
            time_scaling_mode: TimeScalingMode::Compressed,
            time_zone_offset_rows: 0.0,
            short_term_rows: 3,
            long_term_rows: 144,
            brown_carbon_factor: 0.5,
            green_carbon_factor: 0.0,
        }
    }

    #[test]
    fn p3_empty_queue_no_assign_is_zero_reward() {
        let mut next_vm_id: VmId = 0;
        let dc = Datacenter::build(dc_config(), &mut next_vm_id);
        let coefs = RewardCoefficients::default();
        let reward = local_reward(&dc, false, &coefs);
        // no jobs finished, no running vms, empty queue -> all components zero
        assert_eq!(reward, 0.0);
    }

    #[test]
    fn s6_invalid_action_contributes_exactly_its_coefficient() {
        let mut next_vm_id: VmId = 0;
        let mut dc = Datacenter::build(dc_config(), &mut next_vm_id);
        dc.scheduler.receive(0, 0.0);
        dc.scheduler.receive(1, 0.0);
        dc.scheduler.receive(2, 0.0);
        let coefs = RewardCoefficients::default();
        let with_invalid = local_reward(&dc, true, &coefs);
        let without_invalid = local_reward(&dc, false, &coefs);
        assert!((with_invalid - without_invalid - (-coefs.invalid_action_coef)).abs() < 1e-9);
    }
}
