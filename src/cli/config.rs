//! TOML configuration file support.
//!
//! Instead of passing every flag, a run can be described in a config file:
//!
//! ```toml
//! # snapsub.toml
//! [region]
//! lower = [0.0, 0.0, 0.0]
//! upper = [50.0, 50.0, 50.0]
//! mode = "fine"
//!
//! [subset]
//! parallel = true
//! threads = 4
//! partition_rows = 65536
//!
//! [output]
//! compression_level = 9
//! row_group_size = 65536
//! ```
//!
//! Command-line flags take precedence over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use snapsub::spatial::FilterMode;
use snapsub::subset::SubsetConfig;

/// Root configuration structure for snapsub.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Region to cut out; absent means every particle.
    #[serde(default)]
    pub region: RegionConfig,

    /// Execution settings of the subsetting pass.
    #[serde(default)]
    pub subset: SubsetConfig,

    /// Storage settings of the output bundle.
    #[serde(default)]
    pub output: OutputConfig,
}

/// The `[region]` table.
#[derive(Debug, Default, Deserialize)]
pub struct RegionConfig {
    pub lower: Option<[f64; 3]>,
    pub upper: Option<[f64; 3]>,
    pub mode: Option<FilterMode>,
}

/// The `[output]` table.
#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// ZSTD compression level (1-22).
    pub compression_level: Option<i32>,

    /// Rows per Parquet row group.
    pub row_group_size: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [region]
            lower = [0.0, 0.0, 0.0]
            upper = [50.0, 50.0, 50.0]
            mode = "fine"

            [subset]
            parallel = true
            threads = 4
            partition_rows = 1024

            [output]
            compression_level = 9
            row_group_size = 65536
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.region.lower, Some([0.0; 3]));
        assert_eq!(config.region.upper, Some([50.0; 3]));
        assert_eq!(config.region.mode, Some(FilterMode::Fine));
        assert_eq!(config.subset.threads, Some(4));
        assert_eq!(config.subset.partition_rows, 1024);
        assert_eq!(config.output.compression_level, Some(9));
        assert_eq!(config.output.row_group_size, Some(65_536));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [subset]
            parallel = false
        "#;

        let config = Config::from_str(toml).unwrap();
        assert!(!config.subset.parallel);
        assert_eq!(config.subset.partition_rows, SubsetConfig::default().partition_rows);
        assert_eq!(config.region.lower, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.output.compression_level, None);
        assert_eq!(config.subset, SubsetConfig::default());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let toml = r#"
            [region]
            mode = "exact"
        "#;
        assert!(Config::from_str(toml).is_err());
    }
}
