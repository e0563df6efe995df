//! Per-turbine green-energy provider: time mapping, timezone wrap and queries (§4.4).

use log::warn;
use serde::{Deserialize, Serialize};

use crate::csv_reader::WindSample;
use crate::spline::NaturalCubicSpline;

/// How CSV rows map onto the simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeScalingMode {
    /// Simulation clock is a real-time offset from the first CSV timestamp.
    RealTime,
    /// First 12 rows are lookback history; row `i >= 12` maps to simulation
    /// second `i - 12`; power is scaled down by 600 at query time.
    Compressed,
}

/// Rows reserved as lookback history in [`TimeScalingMode::Compressed`].
const COMPRESSED_LOOKBACK_ROWS: usize = 12;
/// A compressed-mode row represents 600 s (10 min) of real-world time.
const COMPRESSED_TIME_FACTOR: f64 = 600.0;

/// Four future-trend scalars derived from a provider's upcoming power curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TrendFeatures {
    /// Mean of the next `short_rows` samples, normalized by `max_power_kw`, in `[0, 1]`.
    pub short_mean: f64,
    /// `(P[end] - P[start]) / max_power_kw`, clipped to `[-1, 1]`.
    pub short_trend: f64,
    /// Mean of the next `long_rows` samples, normalized, in `[0, 1]`.
    pub long_mean: f64,
    /// `(argmax_index - current_index) / long_rows`, in `[0, 1]`.
    pub long_peak_timing: f64,
}

/// Wind-turbine green-energy provider, interpolated from a cleaned sample series.
pub struct GreenEnergyProvider {
    pub turbine_id: String,
    spline: NaturalCubicSpline,
    min_t: f64,
    max_t: f64,
    max_power_kw: f64,
    row_spacing_seconds: f64,
    timezone_offset_rows: f64,
    mode: TimeScalingMode,
}

impl GreenEnergyProvider {
    /// Builds a provider from cleaned CSV samples (see [`crate::csv_reader::read_wind_csv`]).
    ///
    /// Returns `None` if fewer than two usable rows remain after applying
    /// the mode's lookback reservation — per §7, callers should then fall
    /// back to an always-zero provider rather than treat this as fatal.
    pub fn from_samples(
        turbine_id: impl Into<String>,
        samples: &[WindSample],
        mode: TimeScalingMode,
        timezone_offset_rows: f64,
    ) -> Option<Self> {
        let usable: &[WindSample] = match mode {
            TimeScalingMode::RealTime => samples,
            TimeScalingMode::Compressed => {
                if samples.len() <= COMPRESSED_LOOKBACK_ROWS {
                    &[]
                } else {
                    &samples[COMPRESSED_LOOKBACK_ROWS..]
                }
            }
        };
        if usable.len() < 2 {
            warn!("wind provider {} has fewer than 2 usable rows", turbine_id.into());
            return None;
        }

        let t0 = usable[0].timestamp;
        let (xs, ys): (Vec<f64>, Vec<f64>) = match mode {
            TimeScalingMode::RealTime => usable
                .iter()
                .map(|s| ((s.timestamp - t0).num_milliseconds() as f64 / 1000.0, s.power_kw))
                .unzip(),
            TimeScalingMode::Compressed => usable
                .iter()
                .enumerate()
                .map(|(i, s)| (i as f64, s.power_kw))
                .unzip(),
        };

        let row_spacing_seconds = match mode {
            TimeScalingMode::RealTime => {
                let span = xs[xs.len() - 1] - xs[0];
                if xs.len() > 1 {
                    span / (xs.len() - 1) as f64
                } else {
                    600.0
                }
            }
            TimeScalingMode::Compressed => 1.0,
        };

        let max_power_kw = ys.iter().cloned().fold(f64::MIN, f64::max).max(0.0);
        let min_t = xs[0];
        let max_t = xs[xs.len() - 1];
        let spline = NaturalCubicSpline::new(xs, ys);

        Some(Self {
            turbine_id: turbine_id.into(),
            spline,
            min_t,
            max_t,
            max_power_kw,
            row_spacing_seconds,
            timezone_offset_rows,
            mode,
        })
    }

    /// An always-zero provider, used when a DC has no usable wind data but
    /// the simulation should continue with brown-only energy (§7).
    pub fn always_zero(turbine_id: impl Into<String>, mode: TimeScalingMode) -> Self {
        Self {
            turbine_id: turbine_id.into(),
            spline: NaturalCubicSpline::new(vec![0.0, 1.0], vec![0.0, 0.0]),
            min_t: 0.0,
            max_t: 1.0,
            max_power_kw: 0.0,
            row_spacing_seconds: if mode == TimeScalingMode::Compressed { 1.0 } else { 600.0 },
            timezone_offset_rows: 0.0,
            mode,
        }
    }

    pub fn max_power_kw(&self) -> f64 {
        self.max_power_kw
    }

    fn offset_seconds(&self) -> f64 {
        self.timezone_offset_rows * self.row_spacing_seconds
    }

    /// Wraps `t` cyclically into `[min_t, max_t)` (I11).
    fn wrap(&self, t: f64) -> f64 {
        let span = self.max_t - self.min_t;
        if span <= 0.0 {
            return self.min_t;
        }
        let mut x = (t - self.min_t) % span;
        if x < 0.0 {
            x += span;
        }
        self.min_t + x
    }

    fn raw_kw_at(&self, t: f64) -> f64 {
        self.spline.eval(self.wrap(t + self.offset_seconds())).max(0.0)
    }

    fn kw_to_w(&self, kw: f64) -> f64 {
        let w = kw * 1000.0;
        match self.mode {
            TimeScalingMode::Compressed => w / COMPRESSED_TIME_FACTOR,
            TimeScalingMode::RealTime => w,
        }
    }

    /// Instantaneous power in watts at simulation time `t`.
    pub fn current_power_w(&self, t: f64) -> f64 {
        self.kw_to_w(self.raw_kw_at(t))
    }

    /// Instantaneous power in watts at `t + h` for each horizon `h`.
    pub fn future_power_w(&self, t: f64, horizons: &[f64]) -> Vec<f64> {
        horizons.iter().map(|h| self.current_power_w(t + h)).collect()
    }

    /// Four future-trend scalars, sampled at this provider's row spacing.
    pub fn future_trend_features(&self, t: f64, short_rows: usize, long_rows: usize) -> TrendFeatures {
        if self.max_power_kw <= 0.0 || long_rows == 0 {
            return TrendFeatures::default();
        }
        let long_rows = long_rows.max(short_rows).max(1);
        let samples: Vec<f64> = (0..long_rows)
            .map(|k| self.raw_kw_at(t + k as f64 * self.row_spacing_seconds))
            .collect();

        let short_n = short_rows.min(samples.len()).max(1);
        let short_slice = &samples[..short_n];
        let short_mean = short_slice.iter().sum::<f64>() / short_n as f64 / self.max_power_kw;
        let short_trend = ((short_slice[short_n - 1] - short_slice[0]) / self.max_power_kw).clamp(-1.0, 1.0);

        let long_mean = samples.iter().sum::<f64>() / samples.len() as f64 / self.max_power_kw;
        let (argmax_idx, _) = samples
            .iter()
            .enumerate()
            .fold((0usize, f64::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
        let long_peak_timing = argmax_idx as f64 / long_rows as f64;

        TrendFeatures {
            short_mean,
            short_trend,
            long_mean,
            long_peak_timing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn sample(minute: i64, power_kw: f64) -> WindSample {
        WindSample {
            timestamp: NaiveDateTime::parse_from_str("2021-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
                + chrono::Duration::minutes(minute),
            power_kw,
        }
    }

    #[test]
    fn s4_cyclic_wrap() {
        let samples: Vec<WindSample> = (0..100).map(|i| sample(i, (i as f64).sin().abs() * 100.0)).collect();
        let provider = GreenEnergyProvider::from_samples("t1", &samples, TimeScalingMode::Compressed, 95.0).unwrap();
        let with_offset = provider.current_power_w(10.0);
        let zero_offset = GreenEnergyProvider::from_samples("t1", &samples, TimeScalingMode::Compressed, 0.0).unwrap();
        // query time 10 + 95 = 105, wraps into a domain of 88 rows (100-12) -> 105 % 88 = 17
        let expected = zero_offset.current_power_w((10.0 + 95.0) % (zero_offset.max_t - zero_offset.min_t));
        assert!((with_offset - expected).abs() < 1e-6);
    }

    #[test]
    fn s3_constant_power_caps_at_constant() {
        let samples: Vec<WindSample> = (0..20).map(|i| sample(i, 250.0)).collect();
        let provider = GreenEnergyProvider::from_samples("t1", &samples, TimeScalingMode::Compressed, 0.0).unwrap();
        let w = provider.current_power_w(3.0);
        // compressed: 250 kW -> 250_000 W / 600
        assert!((w - 250_000.0 / 600.0).abs() < 1.0);
    }

    #[test]
    fn always_zero_provider_never_supplies_power() {
        let provider = GreenEnergyProvider::always_zero("none", TimeScalingMode::RealTime);
        assert_eq!(provider.current_power_w(1234.0), 0.0);
    }
}
