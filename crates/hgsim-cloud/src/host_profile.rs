//! Immutable host hardware template (§3 `HostProfile`).

use serde::{Deserialize, Serialize};

/// Hardware template a [`crate::host::Host`] is instantiated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostProfile {
    pub name: String,
    pub cores: u32,
    pub mips_per_core: f64,
    pub ram_mb: u64,
    pub bw_mbps: u64,
    pub storage_mb: u64,
    pub peak_power_w: f64,
    /// Fraction of `peak_power_w` drawn at zero utilization.
    pub idle_power_pct: f64,
}

impl HostProfile {
    pub fn idle_power_w(&self) -> f64 {
        self.peak_power_w * self.idle_power_pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_power_derived_from_peak_and_pct() {
        let profile = HostProfile {
            name: "m1".into(),
            cores: 4,
            mips_per_core: 50_000.0,
            ram_mb: 16_384,
            bw_mbps: 1000,
            storage_mb: 1_000_000,
            peak_power_w: 200.0,
            idle_power_pct: 0.25,
        };
        assert_eq!(profile.idle_power_w(), 50.0);
    }
}
