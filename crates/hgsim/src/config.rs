//! Configuration schema (§6): `*Raw` structs with optional fields resolved
//! into strict `SimulationConfig`/`DatacenterConfig`, mirroring the
//! `SimulationConfigRaw` -> `SimulationConfig` pattern this workspace's
//! dependency stack is built around.

use hgsim_cloud::HostProfile;
use hgsim_green_energy::TimeScalingMode;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Per-DC configuration, resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatacenterConfig {
    pub datacenter_id: u32,
    pub name: String,
    pub hosts_count: u32,
    pub host_profiles: Vec<HostProfile>,
    pub initial_s_vm_count: u32,
    pub initial_m_vm_count: u32,
    pub initial_l_vm_count: u32,
    pub green_energy_enabled: bool,
    pub turbine_ids: Vec<String>,
    pub wind_data_file: Option<String>,
    pub time_scaling_mode: TimeScalingMode,
    pub time_zone_offset_rows: f64,
    pub short_term_rows: usize,
    pub long_term_rows: usize,
    pub brown_carbon_factor: f64,
    pub green_carbon_factor: f64,
}

/// Raw, partially-specified per-DC configuration as loaded from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct DatacenterConfigRaw {
    pub datacenter_id: u32,
    pub name: String,
    pub hosts_count: u32,
    pub host_profiles: Vec<HostProfile>,
    pub initial_s_vm_count: Option<u32>,
    pub initial_m_vm_count: Option<u32>,
    pub initial_l_vm_count: Option<u32>,
    pub green_energy_enabled: Option<bool>,
    pub turbine_ids: Option<Vec<String>>,
    pub wind_data_file: Option<String>,
    pub time_scaling_mode: Option<TimeScalingMode>,
    pub time_zone_offset_rows: Option<f64>,
    pub short_term_rows: Option<usize>,
    pub long_term_rows: Option<usize>,
    pub brown_carbon_factor: Option<f64>,
    pub green_carbon_factor: Option<f64>,
}

impl DatacenterConfigRaw {
    pub fn resolve(self) -> Result<DatacenterConfig, ConfigurationError> {
        if self.host_profiles.is_empty() {
            return Err(ConfigurationError::UnknownHostProfile(self.datacenter_id));
        }
        let green_energy_enabled = self.green_energy_enabled.unwrap_or(false);
        let turbine_ids = self.turbine_ids.unwrap_or_default();
        if green_energy_enabled && turbine_ids.is_empty() {
            return Err(ConfigurationError::MissingTurbineIds(self.datacenter_id));
        }
        Ok(DatacenterConfig {
            datacenter_id: self.datacenter_id,
            name: self.name,
            hosts_count: self.hosts_count,
            host_profiles: self.host_profiles,
            initial_s_vm_count: self.initial_s_vm_count.unwrap_or(0),
            initial_m_vm_count: self.initial_m_vm_count.unwrap_or(0),
            initial_l_vm_count: self.initial_l_vm_count.unwrap_or(0),
            green_energy_enabled,
            turbine_ids,
            wind_data_file: self.wind_data_file,
            time_scaling_mode: self.time_scaling_mode.unwrap_or(TimeScalingMode::Compressed),
            time_zone_offset_rows: self.time_zone_offset_rows.unwrap_or(0.0),
            short_term_rows: self.short_term_rows.unwrap_or(3),
            long_term_rows: self.long_term_rows.unwrap_or(144),
            brown_carbon_factor: self.brown_carbon_factor.unwrap_or(0.5),
            green_carbon_factor: self.green_carbon_factor.unwrap_or(0.0),
        })
    }
}

/// Reward coefficients (§4.10), loaded from configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RewardCoefficients {
    pub wait_time_coef: f64,
    pub unutilization_coef: f64,
    pub queue_penalty_coef: f64,
    pub invalid_action_coef: f64,
    pub carbon_penalty_coef: f64,
    /// `u*` target utilization. The source keeps 0.95 (single-DC) and 0.75
    /// (multi-DC) as distinct constants without justifying the split; this
    /// stays configurable per the Open Question in §9.
    pub utilization_target: f64,
}

impl Default for RewardCoefficients {
    fn default() -> Self {
        Self {
            wait_time_coef: 0.75,
            unutilization_coef: 0.25,
            queue_penalty_coef: 0.55,
            invalid_action_coef: 1.0,
            carbon_penalty_coef: 100.0,
            utilization_target: 0.75,
        }
    }
}

/// Top-level, resolved simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub simulation_timestep: f64,
    pub min_time_between_events: f64,
    pub max_episode_length: u64,
    pub max_cloudlet_pes: u32,
    pub split_large_cloudlets: bool,
    pub global_routing_batch_size: usize,
    pub reward: RewardCoefficients,
    pub datacenters: Vec<DatacenterConfig>,
}

/// Raw top-level configuration as loaded from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfigRaw {
    pub simulation_timestep: Option<f64>,
    pub min_time_between_events: Option<f64>,
    pub max_episode_length: Option<u64>,
    pub max_cloudlet_pes: Option<u32>,
    pub split_large_cloudlets: Option<bool>,
    pub global_routing_batch_size: Option<usize>,
    pub carbon_emission_penalty_coef: Option<f64>,
    pub reward_wait_time_coef: Option<f64>,
    pub reward_unutilization_coef: Option<f64>,
    pub reward_queue_penalty_coef: Option<f64>,
    pub reward_invalid_action_coef: Option<f64>,
    pub utilization_target: Option<f64>,
    pub datacenters: Vec<DatacenterConfigRaw>,
}

impl SimulationConfig {
    /// Reads and resolves a simulation configuration from a YAML file,
    /// defaulting absent fields the way [`SimulationConfigRaw::resolve`] does.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path)?;
        let raw: SimulationConfigRaw = serde_yaml::from_str(&text)?;
        raw.resolve()
    }
}

impl SimulationConfigRaw {
    pub fn resolve(self) -> Result<SimulationConfig, ConfigurationError> {
        let batch_size = self.global_routing_batch_size.unwrap_or(8);
        if batch_size == 0 {
            return Err(ConfigurationError::InvalidBatchSize(batch_size));
        }
        if self.datacenters.is_empty() {
            return Err(ConfigurationError::MissingKey("datacenters"));
        }
        let datacenters = self
            .datacenters
            .into_iter()
            .map(DatacenterConfigRaw::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SimulationConfig {
            simulation_timestep: self.simulation_timestep.unwrap_or(1.0),
            min_time_between_events: self.min_time_between_events.unwrap_or(0.001),
            max_episode_length: self.max_episode_length.unwrap_or(10_000),
            max_cloudlet_pes: self.max_cloudlet_pes.unwrap_or(8),
            split_large_cloudlets: self.split_large_cloudlets.unwrap_or(false),
            global_routing_batch_size: batch_size,
            reward: RewardCoefficients {
                wait_time_coef: self.reward_wait_time_coef.unwrap_or(0.75),
                unutilization_coef: self.reward_unutilization_coef.unwrap_or(0.25),
                queue_penalty_coef: self.reward_queue_penalty_coef.unwrap_or(0.55),
                invalid_action_coef: self.reward_invalid_action_coef.unwrap_or(1.0),
                carbon_penalty_coef: self.carbon_emission_penalty_coef.unwrap_or(100.0),
                utilization_target: self
                    .utilization_target
                    .unwrap_or(if datacenters.len() <= 1 { 0.95 } else { 0.75 }),
            },
            datacenters,
        })
    }
}
