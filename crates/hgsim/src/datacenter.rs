//! Runtime state for a single datacenter: hosts/VMs, local scheduler, green
//! providers and the energy/carbon accountant (§3 "Datacenter instance").

use std::collections::HashSet;

use hgsim_cloud::{ComputeFleet, FirstFitAllocation, Host, LinearPowerModel, VmId, VmSize};
use hgsim_energy::{CarbonFactors, EnergyAccountant};
use hgsim_green_energy::{read_wind_csv, GreenEnergyProvider, TurbineFarm};
use hgsim_scheduling::LocalScheduler;
use log::error;

use crate::config::DatacenterConfig;

/// Per-VM-size resource template. The source's exact per-VM RAM/bandwidth/
/// storage defaults weren't specified beyond core counts (§3), so these scale
/// linearly with cores; see DESIGN.md.
fn vm_resources(size: VmSize) -> (u64, u64, u64) {
    match size {
        VmSize::Small => (2048, 100, 10_000),
        VmSize::Medium => (4096, 200, 20_000),
        VmSize::Large => (8192, 400, 40_000),
    }
}

pub struct Datacenter {
    pub id: u32,
    pub config: DatacenterConfig,
    pub fleet: ComputeFleet,
    pub scheduler: LocalScheduler,
    pub farm: TurbineFarm,
    pub energy: EnergyAccountant,
    pub cloudlets_finished: u64,
}

impl Datacenter {
    /// Builds a datacenter's runtime state from its config, drawing VM ids
    /// from the simulation-wide `next_vm_id` counter (§9 "Global state").
    pub fn build(config: DatacenterConfig, next_vm_id: &mut VmId) -> Self {
        let hosts: Vec<Host> = (0..config.hosts_count)
            .map(|host_id| {
                let profile = config.host_profiles[host_id as usize % config.host_profiles.len()].clone();
                let power_model = LinearPowerModel::new(profile.idle_power_w(), profile.peak_power_w);
                Host::new(host_id, profile, Box::new(power_model))
            })
            .collect();

        let mut fleet = ComputeFleet::new(hosts, Box::new(FirstFitAllocation));
        let mut owned_vms = HashSet::new();

        let mut spawn = |fleet: &mut ComputeFleet, size: VmSize, count: u32, next_vm_id: &mut VmId, owned: &mut HashSet<VmId>| {
            let (ram_mb, bw_mbps, storage_mb) = vm_resources(size);
            for _ in 0..count {
                let id = *next_vm_id;
                *next_vm_id += 1;
                fleet.create_vm(id, size, size.default_cores(), ram_mb, bw_mbps, storage_mb);
                owned.insert(id);
            }
        };
        spawn(&mut fleet, VmSize::Small, config.initial_s_vm_count, next_vm_id, &mut owned_vms);
        spawn(&mut fleet, VmSize::Medium, config.initial_m_vm_count, next_vm_id, &mut owned_vms);
        spawn(&mut fleet, VmSize::Large, config.initial_l_vm_count, next_vm_id, &mut owned_vms);

        let scheduler = LocalScheduler::new(owned_vms);
        let farm = Self::build_farm(&config);
        let energy = EnergyAccountant::new(CarbonFactors {
            green_kg_per_kwh: config.green_carbon_factor,
            brown_kg_per_kwh: config.brown_carbon_factor,
        });

        Self {
            id: config.datacenter_id,
            config,
            fleet,
            scheduler,
            farm,
            energy,
            cloudlets_finished: 0,
        }
    }

    fn build_farm(config: &DatacenterConfig) -> TurbineFarm {
        if !config.green_energy_enabled {
            return TurbineFarm::new(Vec::new());
        }
        let Some(path) = &config.wind_data_file else {
            error!("datacenter {} has green energy enabled but no wind_data_file", config.datacenter_id);
            return TurbineFarm::new(
                config
                    .turbine_ids
                    .iter()
                    .map(|id| GreenEnergyProvider::always_zero(id.clone(), config.time_scaling_mode))
                    .collect(),
            );
        };
        let samples = match read_wind_csv(path) {
            Ok(samples) => samples,
            Err(err) => {
                error!("datacenter {} wind data unusable ({err}); falling back to brown-only", config.datacenter_id);
                Vec::new()
            }
        };
        let providers = config
            .turbine_ids
            .iter()
            .map(|turbine_id| {
                if samples.is_empty() {
                    GreenEnergyProvider::always_zero(turbine_id.clone(), config.time_scaling_mode)
                } else {
                    GreenEnergyProvider::from_samples(
                        turbine_id.clone(),
                        &samples,
                        config.time_scaling_mode,
                        config.time_zone_offset_rows,
                    )
                    .unwrap_or_else(|| GreenEnergyProvider::always_zero(turbine_id.clone(), config.time_scaling_mode))
                }
            })
            .collect();
        TurbineFarm::new(providers)
    }

    pub fn avg_cpu_util(&self) -> f64 {
        let running: Vec<f64> = self.fleet.vms().filter(|v| v.is_running()).map(|v| v.cpu_util()).collect();
        if running.is_empty() {
            0.0
        } else {
            running.iter().sum::<f64>() / running.len() as f64
        }
    }

    pub fn avg_ram_util(&self) -> f64 {
        let hosts = self.fleet.hosts();
        if hosts.is_empty() {
            return 0.0;
        }
        let total: f64 = hosts
            .iter()
            .map(|h| 1.0 - h.free_ram_mb as f64 / h.profile.ram_mb.max(1) as f64)
            .sum();
        total / hosts.len() as f64
    }

    pub fn available_pes(&self) -> u32 {
        self.fleet.vms().filter(|v| v.is_running()).map(|v| v.free_cores()).sum()
    }
}
