use crate::spike::SpikeDetector;
use crate::turn::TurnDetector;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Analysis configuration parameters.
///
/// Loaded from a TOML file and validated before use. Every section and field
/// is optional and falls back to its default.
/// See [`Config::from_file`] for loading.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Input file layout.
    pub input: InputConfig,
    /// Spike detection parameters.
    pub spike: SpikeDetector,
    /// Turn detection parameters.
    pub turn: TurnDetector,
}

/// Layout of the input CSV file.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Name of the timestamp column.
    pub timestamp_column: String,
    /// Name of the value column.
    pub value_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            timestamp_column: "timestamp".to_string(),
            value_column: "value".to_string(),
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded.
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config = Self::from_toml(&contents)?;

        Ok(config)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_name(&self.input.timestamp_column).context("invalid timestamp column")?;
        check_name(&self.input.value_column).context("invalid value column")?;
        if self.input.timestamp_column == self.input.value_column {
            bail!("timestamp and value columns must differ");
        }

        self.spike.validate().context("invalid spike parameters")?;
        self.turn.validate().context("invalid turn parameters")?;

        Ok(())
    }
}

pub fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("name must not be empty");
    }
    Ok(())
}
