//! Typed error taxonomy (§7). Only `ConfigurationError` and
//! `PostEpisodeIoError` are values that ever leave the core; the other
//! categories in §7 (`WorkloadError`, `WindDataError`) are recovered inline by
//! their owning crates, and `SchedulerInvalidAction` is deliberately not an
//! error type at all (see [`hgsim_scheduling::AssignOutcome`]).

use thiserror::Error;

/// Fatal, startup-time configuration problems (§7).
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("missing required configuration key: {0}")]
    MissingKey(&'static str),
    #[error("datacenter {0} references unknown host profile")]
    UnknownHostProfile(u32),
    #[error("invalid global routing batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),
    #[error("datacenter {0} has green energy enabled but no turbine ids configured")]
    MissingTurbineIds(u32),
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Non-fatal failures writing post-episode CSV reports (§7); logged, never
/// allowed to affect the next episode.
#[derive(Debug, Error)]
pub enum PostEpisodeIoError {
    #[error("failed to write report {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report row: {0}")]
    Csv(#[from] csv::Error),
}
