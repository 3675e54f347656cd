use crate::config::check_num;
use crate::series::TimeSeries;
use crate::stats::compute_quantile;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Minimum number of valid points needed to estimate the spike threshold.
pub const MIN_SPIKE_POINTS: usize = 5;

/// Detector of isolated upward spikes.
///
/// A spike is a point whose value is strictly greater than the `quantile`-th
/// quantile of all the valid values of the series.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpikeDetector {
    /// Upper quantile defining the spike threshold.
    pub quantile: f64,
}

impl Default for SpikeDetector {
    fn default() -> Self {
        Self { quantile: 0.99 }
    }
}

/// Spikes found in a series.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Spikes<T> {
    pub quantile: f64,
    /// Threshold the spikes exceed, `None` if there were too few valid points.
    pub threshold: Option<f64>,
    /// Timestamps of the spikes in chronological order.
    pub timestamps: Vec<T>,
}

impl SpikeDetector {
    pub fn new(quantile: f64) -> Result<Self> {
        let detector = Self { quantile };
        detector.validate()?;
        Ok(detector)
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.quantile, 0.0..=1.0).context("invalid spike quantile")
    }

    pub fn detect<T: Clone>(&self, series: &TimeSeries<T>) -> Result<Spikes<T>> {
        self.validate()?;

        let valid = series.drop_missing();
        let n_valid = valid.len();
        if n_valid < MIN_SPIKE_POINTS {
            log::debug!("only {n_valid} valid points, skipping spike detection");
            return Ok(Spikes {
                quantile: self.quantile,
                threshold: None,
                timestamps: Vec::new(),
            });
        }

        let threshold =
            compute_quantile(valid.vals(), self.quantile).context("no values to threshold")?;
        let timestamps: Vec<_> = valid
            .vals()
            .iter()
            .enumerate()
            .filter(|&(_, &val)| val > threshold)
            .map(|(idx, _)| valid.stamp(idx).clone())
            .collect();
        log::debug!(
            "found {} spikes above {threshold} in {n_valid} valid points",
            timestamps.len()
        );

        Ok(Spikes {
            quantile: self.quantile,
            threshold: Some(threshold),
            timestamps,
        })
    }
}

/// Detect the timestamps of the values above the `quantile`-th quantile of the series.
pub fn detect_spikes<T: Clone>(series: &TimeSeries<T>, quantile: f64) -> Result<Vec<T>> {
    let spikes = SpikeDetector::new(quantile)?.detect(series)?;
    Ok(spikes.timestamps)
}
