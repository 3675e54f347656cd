use crate::config::Config;
use crate::series::TimeSeries;
use crate::spike::Spikes;
use crate::turn::Turns;
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

/// Detectors to run on a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Spikes,
    Turns,
    Both,
}

impl Selection {
    fn spikes(self) -> bool {
        matches!(self, Selection::Spikes | Selection::Both)
    }

    fn turns(self) -> bool {
        matches!(self, Selection::Turns | Selection::Both)
    }
}

/// Findings of the selected detectors on one series.
#[derive(Debug, Serialize)]
pub struct Report<T> {
    pub n_points: usize,
    pub n_valid: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spikes: Option<Spikes<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turns: Option<Turns<T>>,
}

pub struct Analyzer {
    cfg: Config,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn analyze<T: Clone>(
        &self,
        series: &TimeSeries<T>,
        selection: Selection,
    ) -> Result<Report<T>> {
        let spikes = if selection.spikes() {
            let spikes = self
                .cfg
                .spike
                .detect(series)
                .context("failed to detect spikes")?;
            log::info!("found {} spikes", spikes.timestamps.len());
            Some(spikes)
        } else {
            None
        };

        let turns = if selection.turns() {
            let turns = self
                .cfg
                .turn
                .detect(series)
                .context("failed to detect turns")?;
            for (pattern, stamps) in turns.patterns.iter() {
                log::info!("found {} {} turns", stamps.len(), pattern.name());
            }
            Some(turns)
        } else {
            None
        };

        Ok(Report {
            n_points: series.len(),
            n_valid: series.drop_missing().len(),
            spikes,
            turns,
        })
    }

    /// Write a report as pretty JSON to a file, or to stdout if no file is given.
    pub fn save_results<T: Serialize, P: AsRef<Path>>(
        &self,
        report: &Report<T>,
        file: Option<P>,
    ) -> Result<()> {
        match file {
            Some(file) => {
                let file = file.as_ref();
                let file =
                    File::create(file).with_context(|| format!("failed to create {file:?}"))?;
                write_report(BufWriter::new(file), report)?;
            }
            None => write_report(io::stdout().lock(), report)?,
        }
        Ok(())
    }
}

fn write_report<W: Write, T: Serialize>(mut writer: W, report: &Report<T>) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report).context("failed to serialize report")?;
    writeln!(writer).context("failed to write report")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::TurnPattern;

    fn series() -> TimeSeries<usize> {
        TimeSeries::from_vals(&[0.0, 0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 5.0, 5.0, 6.0])
    }

    #[test]
    fn runs_selected_detectors() {
        let analyzer = Analyzer::new(Config::default());

        let report = analyzer.analyze(&series(), Selection::Spikes).unwrap();
        assert_eq!(report.n_points, 11);
        assert_eq!(report.spikes.unwrap().timestamps, vec![10]);
        assert!(report.turns.is_none());

        let report = analyzer.analyze(&series(), Selection::Turns).unwrap();
        assert!(report.spikes.is_none());
        let turns = report.turns.unwrap();
        assert_eq!(turns.patterns.get(TurnPattern::FlatTurnUp), &[5]);
    }

    #[test]
    fn report_json_layout() {
        let analyzer = Analyzer::new(Config::default());
        let report = analyzer.analyze(&series(), Selection::Both).unwrap();

        let mut buf = Vec::new();
        write_report(&mut buf, &report).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["n_valid"], 11);
        assert_eq!(json["spikes"]["timestamps"], serde_json::json!([10]));
        assert_eq!(json["turns"]["patterns"]["flat_turn_up"], serde_json::json!([5]));
        assert_eq!(json["turns"]["patterns"]["up_turn_flat"], serde_json::json!([]));
    }
}
