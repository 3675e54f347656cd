use crate::config::check_num;
use crate::series::TimeSeries;
use crate::stats::{compute_diff, compute_mean, compute_quantile};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Factor by which the trend threshold must exceed the flat threshold.
const TREND_OVER_FLAT: f64 = 1.1;

/// Trend of a window of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Flat,
    Up,
    Down,
}

/// Kind of turning point, named after the trends before and after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPattern {
    DownTurnFlat,
    FlatTurnDown,
    FlatTurnUp,
    UpTurnFlat,
}

impl TurnPattern {
    pub const ALL: [TurnPattern; 4] = [
        TurnPattern::DownTurnFlat,
        TurnPattern::FlatTurnDown,
        TurnPattern::FlatTurnUp,
        TurnPattern::UpTurnFlat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TurnPattern::DownTurnFlat => "down_turn_flat",
            TurnPattern::FlatTurnDown => "flat_turn_down",
            TurnPattern::FlatTurnUp => "flat_turn_up",
            TurnPattern::UpTurnFlat => "up_turn_flat",
        }
    }

    /// Pattern for the trends before and after a turn, if any.
    pub fn classify(pre: Trend, post: Trend) -> Option<Self> {
        match (pre, post) {
            (Trend::Down, Trend::Flat) => Some(TurnPattern::DownTurnFlat),
            (Trend::Flat, Trend::Down) => Some(TurnPattern::FlatTurnDown),
            (Trend::Flat, Trend::Up) => Some(TurnPattern::FlatTurnUp),
            (Trend::Up, Trend::Flat) => Some(TurnPattern::UpTurnFlat),
            _ => None,
        }
    }
}

/// Thresholds derived once from the whole valid series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    /// Minimum absolute step of a turn.
    pub step: f64,
    /// Maximum absolute mean of a flat window.
    pub flat: f64,
    /// Minimum absolute mean of a trending window.
    pub trend: f64,
}

impl Thresholds {
    /// Derive the thresholds from the valid values of a series.
    pub fn derive(vals: &[f64], q_h: f64, q_flat: f64, q_trend: f64) -> Self {
        let abs_diff: Vec<_> = compute_diff(vals).iter().map(|diff| diff.abs()).collect();
        let abs_vals: Vec<_> = vals.iter().map(|val| val.abs()).collect();

        let step = compute_quantile(&abs_diff, q_h).unwrap_or(f64::INFINITY);
        let flat = compute_quantile(&abs_vals, q_flat).unwrap_or(0.0);
        let trend = compute_quantile(&abs_vals, q_trend)
            .unwrap_or(0.0)
            .max(flat * TREND_OVER_FLAT);

        Self { step, flat, trend }
    }

    /// Label the trend of a window from its mean.
    ///
    /// Means between the flat and trend thresholds in magnitude, and undefined
    /// means of empty windows, are flat.
    pub fn label(&self, mu: f64) -> Trend {
        if mu.abs() <= self.flat {
            Trend::Flat
        } else if mu >= self.trend {
            Trend::Up
        } else if mu <= -self.trend {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    /// Check whether the series crosses or touches zero with a large step.
    pub fn is_turn(&self, prev: f64, curr: f64) -> bool {
        prev * curr <= 0.0 && (curr - prev).abs() >= self.step
    }
}

/// Turn timestamps grouped by pattern.
///
/// All four patterns are always present, possibly with no timestamps.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(transparent)]
pub struct TurnPatterns<T> {
    buckets: BTreeMap<TurnPattern, Vec<T>>,
}

impl<T> TurnPatterns<T> {
    fn new() -> Self {
        let buckets = TurnPattern::ALL
            .into_iter()
            .map(|pattern| (pattern, Vec::new()))
            .collect();
        Self { buckets }
    }

    fn push(&mut self, pattern: TurnPattern, stamp: T) {
        self.buckets.entry(pattern).or_default().push(stamp);
    }

    /// Timestamps of a pattern in chronological order.
    pub fn get(&self, pattern: TurnPattern) -> &[T] {
        self.buckets.get(&pattern).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (TurnPattern, &[T])> {
        self.buckets
            .iter()
            .map(|(&pattern, stamps)| (pattern, stamps.as_slice()))
    }

    /// Total number of turns over all patterns.
    pub fn count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Turning points found in a series.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Turns<T> {
    /// Derived thresholds, `None` if there were too few valid points.
    pub thresholds: Option<Thresholds>,
    pub patterns: TurnPatterns<T>,
}

/// Detector of local turning points.
///
/// A turn is an interior point where the series crosses or touches zero with
/// a step at least as large as the `q_h` quantile of all absolute steps. Turns
/// are classified by the trends of the `w_pre` values before and the `w_post`
/// values after them.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TurnDetector {
    /// Window size before a point.
    pub w_pre: usize,
    /// Window size after a point.
    pub w_post: usize,
    /// Quantile of the absolute steps defining a large step.
    pub q_h: f64,
    /// Quantile of the absolute values defining flat behavior.
    pub q_flat: f64,
    /// Quantile of the absolute values defining trend strength.
    pub q_trend: f64,
}

impl Default for TurnDetector {
    fn default() -> Self {
        Self {
            w_pre: 3,
            w_post: 3,
            q_h: 0.9,
            q_flat: 0.2,
            q_trend: 0.7,
        }
    }
}

impl TurnDetector {
    pub fn validate(&self) -> Result<()> {
        check_num(self.w_pre, 0..10_000).context("invalid pre-turn window size")?;
        check_num(self.w_post, 0..10_000).context("invalid post-turn window size")?;
        check_num(self.q_h, 0.0..=1.0).context("invalid step quantile")?;
        check_num(self.q_flat, 0.0..=1.0).context("invalid flat quantile")?;
        check_num(self.q_trend, 0.0..=1.0).context("invalid trend quantile")?;
        Ok(())
    }

    /// Minimum number of valid points needed to look for turns.
    pub fn min_points(&self) -> usize {
        self.w_pre + self.w_post + 4
    }

    pub fn detect<T: Clone>(&self, series: &TimeSeries<T>) -> Result<Turns<T>> {
        self.validate()?;

        let mut patterns = TurnPatterns::new();

        let valid = series.drop_missing();
        let n_valid = valid.len();
        if n_valid < self.min_points() {
            log::debug!("only {n_valid} valid points, skipping turn detection");
            return Ok(Turns {
                thresholds: None,
                patterns,
            });
        }

        let g = valid.vals();
        let th = Thresholds::derive(g, self.q_h, self.q_flat, self.q_trend);
        log::debug!("derived {th:?} from {n_valid} valid points");

        for t in 1..n_valid - 1 {
            if !th.is_turn(g[t - 1], g[t]) {
                continue;
            }

            let pre_mu = compute_mean(&g[t.saturating_sub(self.w_pre)..t]);
            let post_mu = compute_mean(&g[t + 1..n_valid.min(t + 1 + self.w_post)]);
            let pre = th.label(pre_mu);
            let post = th.label(post_mu);

            if let Some(pattern) = TurnPattern::classify(pre, post) {
                patterns.push(pattern, valid.stamp(t).clone());
            }
        }
        log::debug!("found {} turns", patterns.count());

        Ok(Turns {
            thresholds: Some(th),
            patterns,
        })
    }
}

/// Detect the turning points of a series grouped by pattern.
pub fn detect_turns<T: Clone>(
    series: &TimeSeries<T>,
    w_pre: usize,
    w_post: usize,
    q_h: f64,
    q_flat: f64,
    q_trend: f64,
) -> Result<TurnPatterns<T>> {
    let detector = TurnDetector {
        w_pre,
        w_post,
        q_h,
        q_flat,
        q_trend,
    };
    let turns = detector.detect(series)?;
    Ok(turns.patterns)
}
