use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

// Constants
const DEFAULT_DATA_PATH: &str =
    "data/processed/final_indepth_sentiment_analysis_w_processed_category.csv";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_STATIC_DIR: &str = "static";

/// Dashboard settings
///
/// Every field has a default, so a config file only needs the keys it wants
/// to change. Thresholds here feed the aggregation engine; the rest is for
/// the web server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Location of the review CSV
    pub data_path: PathBuf,

    /// Address the web server listens on
    pub bind_addr: String,

    /// Directory served under `/static`
    pub static_dir: PathBuf,

    /// Number of categories in the category view
    pub category_top_n: usize,

    /// Brands with fewer rows than this are left out of the brand view
    pub brand_min_reviews: usize,

    /// Number of brands in the brand view
    pub brand_top_n: usize,

    /// Products with fewer rows than this are not ranked
    pub product_min_reviews: usize,

    /// Number of products in each top-product view
    pub product_top_n: usize,

    /// Longest product title shown on a chart axis, in characters
    pub title_max_len: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            category_top_n: 5,
            brand_min_reviews: 10,
            brand_top_n: 10,
            product_min_reviews: 5,
            product_top_n: 5,
            title_max_len: 40,
        }
    }
}

impl DashboardConfig {
    /// Read settings from a JSON file
    ///
    /// # Errors
    /// * Returns an error if the file cannot be read or contains unknown keys
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(serde_json::from_str(&contents)?)
    }

    /// Pick settings from command line arguments
    ///
    /// `--config <path>` loads a file; without it the defaults are used.
    /// Arguments other than `--config` are ignored here so binaries can
    /// parse their own positional values.
    pub fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        match args.iter().position(|a| a == "--config") {
            Some(i) => match args.get(i + 1) {
                Some(path) => Self::load(path),
                None => Err(ConfigError::Usage("--config needs a file path".to_string())),
            },
            None => Ok(Self::default()),
        }
    }
}
