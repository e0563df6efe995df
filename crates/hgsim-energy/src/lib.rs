//! Energy allocator & carbon accountant (§4.5): green-first Wh allocation
//! and cumulative carbon tracking for a single datacenter.

use serde::{Deserialize, Serialize};

/// Per-energy-type carbon intensity, in kg CO2 per kWh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonFactors {
    pub green_kg_per_kwh: f64,
    pub brown_kg_per_kwh: f64,
}

/// Result of a single tick's energy allocation, also used by the reward engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EnergyDelta {
    pub demand_wh: f64,
    pub green_avail_wh: f64,
    pub green_used_wh: f64,
    pub brown_used_wh: f64,
    pub wasted_green_wh: f64,
    pub carbon_kg: f64,
}

/// Cumulative energy/carbon counters for one datacenter across an episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EnergyTotals {
    pub green_wh: f64,
    pub brown_wh: f64,
    pub wasted_green_wh: f64,
    pub carbon_kg: f64,
}

/// Accumulates energy and carbon for one datacenter, tick by tick.
pub struct EnergyAccountant {
    factors: CarbonFactors,
    totals: EnergyTotals,
    latest_delta: EnergyDelta,
}

impl EnergyAccountant {
    pub fn new(factors: CarbonFactors) -> Self {
        Self {
            factors,
            totals: EnergyTotals::default(),
            latest_delta: EnergyDelta::default(),
        }
    }

    /// Allocates `demand_w` watts of demand against `green_supply_w` watts of
    /// instantaneous green supply over a `dt`-second tick, green-first.
    pub fn tick(&mut self, demand_w: f64, green_supply_w: f64, dt: f64) -> EnergyDelta {
        let dh = dt / 3600.0;
        let demand_wh = (demand_w * dh).max(0.0);
        let green_avail_wh = (green_supply_w * dh).max(0.0);
        let green_used_wh = demand_wh.min(green_avail_wh);
        let brown_used_wh = demand_wh - green_used_wh;
        let wasted_green_wh = green_avail_wh - green_used_wh;
        let carbon_kg =
            (green_used_wh / 1000.0) * self.factors.green_kg_per_kwh + (brown_used_wh / 1000.0) * self.factors.brown_kg_per_kwh;

        let delta = EnergyDelta {
            demand_wh,
            green_avail_wh,
            green_used_wh,
            brown_used_wh,
            wasted_green_wh,
            carbon_kg,
        };

        self.totals.green_wh += green_used_wh;
        self.totals.brown_wh += brown_used_wh;
        self.totals.wasted_green_wh += wasted_green_wh;
        self.totals.carbon_kg += carbon_kg;
        self.latest_delta = delta;
        delta
    }

    pub fn latest_delta(&self) -> EnergyDelta {
        self.latest_delta
    }

    pub fn totals(&self) -> EnergyTotals {
        self.totals
    }

    pub fn green_ratio(&self) -> f64 {
        let total = self.totals.green_wh + self.totals.brown_wh;
        if total <= 0.0 {
            0.0
        } else {
            self.totals.green_wh / total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn factors() -> CarbonFactors {
        CarbonFactors {
            green_kg_per_kwh: 0.0,
            brown_kg_per_kwh: 0.5,
        }
    }

    #[test]
    fn s1_brown_only_baseline() {
        let mut acc = EnergyAccountant::new(factors());
        let delta = acc.tick(200.0, 0.0, 1.0);
        assert_abs_diff_eq!(delta.brown_used_wh, 200.0 / 3600.0, epsilon = 1e-9);
        assert_eq!(delta.green_used_wh, 0.0);
        assert_eq!(delta.wasted_green_wh, 0.0);
    }

    #[test]
    fn s3_green_power_cap() {
        let mut acc = EnergyAccountant::new(factors());
        let delta = acc.tick(400.0, 250.0, 1.0);
        assert_abs_diff_eq!(delta.green_used_wh, 250.0 / 3600.0, epsilon = 1e-9);
        assert_abs_diff_eq!(delta.brown_used_wh, 150.0 / 3600.0, epsilon = 1e-9);
        assert_abs_diff_eq!(delta.wasted_green_wh, 0.0, epsilon = 1e-9);
        let ratio = delta.green_used_wh / delta.demand_wh;
        assert_abs_diff_eq!(ratio, 0.625, epsilon = 1e-9);
    }

    #[test]
    fn i2_i3_conservation_invariants() {
        let mut acc = EnergyAccountant::new(factors());
        let delta = acc.tick(100.0, 500.0, 2.0);
        assert_abs_diff_eq!(delta.green_used_wh + delta.brown_used_wh, delta.demand_wh, epsilon = 1e-9);
        assert!(delta.green_used_wh <= delta.green_avail_wh);
        assert_abs_diff_eq!(
            delta.wasted_green_wh,
            delta.green_avail_wh - delta.green_used_wh,
            epsilon = 1e-9
        );
        // all green supply, none wasted since it exceeds demand
        assert!(delta.wasted_green_wh > 0.0);
    }

    #[test]
    fn i4_carbon_accumulates_from_tick_components() {
        let mut acc = EnergyAccountant::new(factors());
        let d1 = acc.tick(400.0, 250.0, 1.0);
        let d2 = acc.tick(400.0, 250.0, 1.0);
        let expected = (d1.brown_used_wh / 1000.0) * 0.5 + (d2.brown_used_wh / 1000.0) * 0.5;
        assert_abs_diff_eq!(acc.totals().carbon_kg, expected, epsilon = 1e-9);
    }

    #[test]
    fn cumulative_counters_are_non_decreasing() {
        let mut acc = EnergyAccountant::new(factors());
        let mut prev = EnergyTotals::default();
        for _ in 0..5 {
            acc.tick(300.0, 100.0, 1.0);
            let now = acc.totals();
            assert!(now.green_wh >= prev.green_wh);
            assert!(now.brown_wh >= prev.brown_wh);
            assert!(now.carbon_kg >= prev.carbon_kg);
            prev = now;
        }
    }
}
