//! Multi-turbine aggregation for a single datacenter (§4.4 last paragraph).

use crate::provider::{GreenEnergyProvider, TrendFeatures};

/// Aggregates several turbine providers into one DC-level green-power source.
pub struct TurbineFarm {
    providers: Vec<GreenEnergyProvider>,
}

impl TurbineFarm {
    pub fn new(providers: Vec<GreenEnergyProvider>) -> Self {
        Self { providers }
    }

    pub fn turbine_count(&self) -> usize {
        self.providers.len()
    }

    /// Sum of instantaneous power across all turbines, in watts.
    pub fn current_power_w(&self, t: f64) -> f64 {
        self.providers.iter().map(|p| p.current_power_w(t)).sum()
    }

    /// Sum of instantaneous power at `t + h` for each horizon, in watts.
    pub fn future_power_w(&self, t: f64, horizons: &[f64]) -> Vec<f64> {
        let mut totals = vec![0.0; horizons.len()];
        for provider in &self.providers {
            for (slot, v) in provider.future_power_w(t, horizons).into_iter().enumerate() {
                totals[slot] += v;
            }
        }
        totals
    }

    /// Trend features weighted by each turbine's `max_power_kw`, with
    /// `long_peak_timing` taken as the earliest peak across turbines.
    pub fn future_trend_features(&self, t: f64, short_rows: usize, long_rows: usize) -> TrendFeatures {
        if self.providers.is_empty() {
            return TrendFeatures::default();
        }
        let weights: Vec<f64> = self.providers.iter().map(|p| p.max_power_kw().max(0.0)).collect();
        let total_weight: f64 = weights.iter().sum();
        if total_weight <= 0.0 {
            return TrendFeatures::default();
        }

        let per_turbine: Vec<TrendFeatures> = self
            .providers
            .iter()
            .map(|p| p.future_trend_features(t, short_rows, long_rows))
            .collect();

        let weighted = |f: fn(&TrendFeatures) -> f64| -> f64 {
            per_turbine
                .iter()
                .zip(&weights)
                .map(|(tf, w)| f(tf) * w)
                .sum::<f64>()
                / total_weight
        };

        let long_peak_timing = per_turbine
            .iter()
            .map(|tf| tf.long_peak_timing)
            .fold(f64::MAX, f64::min);

        TrendFeatures {
            short_mean: weighted(|tf| tf.short_mean),
            short_trend: weighted(|tf| tf.short_trend),
            long_mean: weighted(|tf| tf.long_mean),
            long_peak_timing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TimeScalingMode;

    #[test]
    fn aggregates_sum_across_turbines() {
        let a = GreenEnergyProvider::from_samples(
            "a",
            &[
                crate::csv_reader::WindSample {
                    timestamp: chrono::NaiveDateTime::parse_from_str("2021-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
                        .unwrap(),
                    power_kw: 100.0,
                },
                crate::csv_reader::WindSample {
                    timestamp: chrono::NaiveDateTime::parse_from_str("2021-01-01 00:10:00", "%Y-%m-%d %H:%M:%S")
                        .unwrap(),
                    power_kw: 100.0,
                },
            ],
            TimeScalingMode::RealTime,
            0.0,
        )
        .unwrap();
        let b = GreenEnergyProvider::from_samples(
            "b",
            &[
                crate::csv_reader::WindSample {
                    timestamp: chrono::NaiveDateTime::parse_from_str("2021-01-01 00:00:00", "%Y-%m-%d %H:%M:%S")
                        .unwrap(),
                    power_kw: 50.0,
                },
                crate::csv_reader::WindSample {
                    timestamp: chrono::NaiveDateTime::parse_from_str("2021-01-01 00:10:00", "%Y-%m-%d %H:%M:%S")
                        .unwrap(),
                    power_kw: 50.0,
                },
            ],
            TimeScalingMode::RealTime,
            0.0,
        )
        .unwrap();
        let farm = TurbineFarm::new(vec![a, b]);
        assert!((farm.current_power_w(0.0) - 150_000.0).abs() < 1.0);
    }

    #[test]
    fn empty_farm_supplies_nothing() {
        let farm = TurbineFarm::new(vec![]);
        assert_eq!(farm.current_power_w(0.0), 0.0);
        assert_eq!(farm.future_trend_features(0.0, 2, 4), TrendFeatures::default());
    }
}
