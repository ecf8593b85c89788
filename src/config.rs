//! Run configuration: dataset location, output directories, per-city
//! station lists, column naming conventions and severity thresholds.
//!
//! Built once at startup and shared read-only by every pipeline stage.
//! Can be overridden from a JSON file; omitted fields keep their defaults:
//! ```json
//! {
//!   "dataset_path": "./data",
//!   "cities": [
//!     { "name": "beijing", "filename": "BeijingPM20100101_20151231.csv",
//!       "regions": ["Dongsi", "Dongsihuan", "Nongzhanguan"] }
//!   ]
//! }
//! ```

use crate::analyzers::severity::SeverityThresholds;
use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One city's source file and the stations whose columns are averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    pub name: String,
    pub filename: String,
    pub regions: Vec<String>,
}

impl CityConfig {
    pub fn new(name: &str, filename: &str, regions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            filename: filename.to_string(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset_path: PathBuf,
    /// Monthly statistics and pollution shares.
    pub output_path: PathBuf,
    /// Daily cross-source comparison results.
    pub comparison_output_path: PathBuf,
    pub region_prefix: String,
    pub reference_column: String,
    pub missing_token: String,
    pub thresholds: SeverityThresholds,
    pub max_concurrent_cities: usize,
    pub cities: Vec<CityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("./data"),
            output_path: PathBuf::from("./output"),
            comparison_output_path: PathBuf::from("./output2"),
            region_prefix: "PM_".to_string(),
            reference_column: "PM_US Post".to_string(),
            missing_token: "NA".to_string(),
            thresholds: SeverityThresholds::default(),
            max_concurrent_cities: 5,
            cities: vec![
                CityConfig::new(
                    "beijing",
                    "BeijingPM20100101_20151231.csv",
                    &["Dongsi", "Dongsihuan", "Nongzhanguan"],
                ),
                CityConfig::new(
                    "chengdu",
                    "ChengduPM20100101_20151231.csv",
                    &["Caotangsi", "Shahepu"],
                ),
                CityConfig::new(
                    "guangzhou",
                    "GuangzhouPM20100101_20151231.csv",
                    &["City Station", "5th Middle School"],
                ),
                CityConfig::new(
                    "shanghai",
                    "ShanghaiPM20100101_20151231.csv",
                    &["Jingan", "Xuhui"],
                ),
                CityConfig::new(
                    "shenyang",
                    "ShenyangPM20100101_20151231.csv",
                    &["Taiyuanjie", "Xiaoheyan"],
                ),
            ],
        }
    }
}

impl AppConfig {
    /// Loads the config from a JSON file at `path` and validates it.
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.cities.is_empty() {
            return Err(PipelineError::Config("no cities configured".into()));
        }
        if let Some(city) = self.cities.iter().find(|c| c.regions.is_empty()) {
            return Err(PipelineError::Config(format!(
                "city '{}' has no regions",
                city.name
            )));
        }
        if self.max_concurrent_cities == 0 {
            return Err(PipelineError::Config(
                "max_concurrent_cities must be at least 1".into(),
            ));
        }
        self.thresholds.validate()
    }

    /// Column name of a station under the configured naming convention.
    pub fn region_column(&self, region: &str) -> String {
        format!("{}{}", self.region_prefix, region)
    }

    pub fn city_file(&self, city: &CityConfig) -> PathBuf {
        self.dataset_path.join(&city.filename)
    }
}

/// Creates `path` and any missing parents.
pub fn ensure_dir(path: &Path) -> PipelineResult<()> {
    std::fs::create_dir_all(path).map_err(|e| PipelineError::io(path, e))
}
