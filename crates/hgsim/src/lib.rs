//! Hierarchical multi-datacenter green-scheduling environment: configuration,
//! per-DC runtime state, observation/reward construction, post-episode
//! reporting, and the `reset`/`step`/`close` simulation core (C8-C10).

mod config;
mod datacenter;
mod error;
mod observation;
mod reporting;
mod reward;
mod simulation;

pub use config::{
    DatacenterConfig, DatacenterConfigRaw, RewardCoefficients, SimulationConfig, SimulationConfigRaw,
};
pub use datacenter::Datacenter;
pub use error::{ConfigurationError, PostEpisodeIoError};
pub use observation::{build_global_observation, build_local_observation, GlobalObservation, LocalObservation};
pub use reporting::{
    build_episode_report, write_csv_reports, CloudletRow, DatacenterEnergySummary, EpisodeReport, GreenEnergySummaryRow,
    HostUtilizationRow, VmRow,
};
pub use reward::{global_reward, local_reward};
pub use simulation::{DcInfo, GlobalContext, HierarchicalSimulation, InfoDict, ResetResult, StepResult};
