//! Detection of spikes and trend turning points in a univariate time series.
//!
//! Both detectors are pure functions of a [`TimeSeries`]: missing values are
//! dropped, thresholds are derived from quantiles of the remaining values, and
//! the timestamps of the flagged points are returned in chronological order.

pub mod analysis;
pub mod config;
pub mod data;
pub mod series;
pub mod spike;
pub mod stats;
pub mod turn;

pub use series::TimeSeries;
pub use spike::{SpikeDetector, Spikes, detect_spikes};
pub use turn::{Thresholds, Trend, TurnDetector, TurnPattern, TurnPatterns, Turns, detect_turns};
