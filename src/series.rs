//! Timestamped series data types.

use anyhow::{Result, bail};
use std::fmt::Debug;

/// Ordered sequence of timestamped values.
///
/// Timestamps are strictly increasing. A value is missing when it is `None`
/// or `NaN`; missing values are dropped before any analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<T> {
    stamps: Vec<T>,
    vals: Vec<Option<f64>>,
}

impl<T: Ord + Debug> TimeSeries<T> {
    /// Create a new series from parallel timestamp and value vectors.
    ///
    /// # Errors
    /// Returns an error if the vectors differ in length or if the timestamps
    /// are not strictly increasing.
    pub fn new(stamps: Vec<T>, vals: Vec<Option<f64>>) -> Result<Self> {
        let n_stamps = stamps.len();
        let n_vals = vals.len();
        if n_stamps != n_vals {
            bail!("got {n_stamps} timestamps but {n_vals} values");
        }

        for (i_pt, pair) in stamps.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                bail!(
                    "timestamps must be strictly increasing, but {:?} at position {} is followed by {:?}",
                    pair[0],
                    i_pt,
                    pair[1]
                );
            }
        }

        Ok(Self { stamps, vals })
    }

    /// Create a new series from `(timestamp, value)` points.
    pub fn from_points<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, Option<f64>)>,
    {
        let (stamps, vals) = points.into_iter().unzip();
        Self::new(stamps, vals)
    }
}

impl TimeSeries<usize> {
    /// Create a series indexed by position, `0..vals.len()`.
    pub fn from_vals(vals: &[f64]) -> Self {
        Self {
            stamps: (0..vals.len()).collect(),
            vals: vals.iter().map(|&val| Some(val)).collect(),
        }
    }
}

impl<T> TimeSeries<T> {
    /// Number of points, missing ones included.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn stamps(&self) -> &[T] {
        &self.stamps
    }

    pub fn vals(&self) -> &[Option<f64>] {
        &self.vals
    }

    /// Drop the missing values.
    ///
    /// The remaining points are reindexed so that neighbours across a removed
    /// point become adjacent.
    pub fn drop_missing(&self) -> Valid<'_, T> {
        let (stamps, vals) = self
            .stamps
            .iter()
            .zip(&self.vals)
            .filter_map(|(stamp, val)| match val {
                Some(val) if !val.is_nan() => Some((stamp, *val)),
                _ => None,
            })
            .unzip();
        Valid { stamps, vals }
    }
}

/// Valid points of a [`TimeSeries`], borrowed from it.
#[derive(Debug)]
pub struct Valid<'a, T> {
    stamps: Vec<&'a T>,
    vals: Vec<f64>,
}

impl<T> Valid<'_, T> {
    pub fn len(&self) -> usize {
        self.vals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }

    pub fn vals(&self) -> &[f64] {
        &self.vals
    }

    pub fn stamp(&self, idx: usize) -> &T {
        self.stamps[idx]
    }
}
