//! Green-energy (wind-power) provider: CSV ingestion, spline interpolation,
//! timezone wrapping and per-DC turbine aggregation.

mod aggregate;
mod csv_reader;
mod provider;
mod spline;

pub use aggregate::TurbineFarm;
pub use csv_reader::{read_wind_csv, WindDataError, WindSample};
pub use provider::{GreenEnergyProvider, TimeScalingMode, TrendFeatures};
pub use spline::NaturalCubicSpline;
