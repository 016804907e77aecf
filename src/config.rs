//! Estimator Configuration
//!
//! Defines [`WdrlConfig`], the knobs of the estimation engine, and the
//! [`ConfigIO`] trait used to persist it as JSON.
use crate::constants::PROPENSITY_CLIP;
use crate::errors::WdrlError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_propensity_clip() -> f64 {
    PROPENSITY_CLIP
}
fn default_skip_unobserved() -> bool {
    true
}
fn default_parallel() -> bool {
    true
}
fn default_num_threads() -> Option<usize> {
    None
}

/// Configuration for the `WdrlEstimator`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WdrlConfig {
    /// Propensity scores are clipped into `[propensity_clip, 1 - propensity_clip]`.
    #[serde(default = "default_propensity_clip")]
    pub propensity_clip: f64,
    /// Skip matched pairs whose "with" combination never occurs in the
    /// training data. When false such pairs are fitted and fail with
    /// `InsufficientData`.
    #[serde(default = "default_skip_unobserved")]
    pub skip_unobserved: bool,
    /// Fan treatments and pairs out over a thread pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Number of threads for parallel estimation, all available cores if `None`.
    #[serde(default = "default_num_threads")]
    pub num_threads: Option<usize>,
}

impl Default for WdrlConfig {
    fn default() -> Self {
        WdrlConfig {
            propensity_clip: PROPENSITY_CLIP,
            skip_unobserved: true,
            parallel: true,
            num_threads: None,
        }
    }
}

impl WdrlConfig {
    /// Check every field is within its allowed range.
    pub fn validate(&self) -> Result<(), WdrlError> {
        if !(self.propensity_clip > 0.0 && self.propensity_clip < 0.5) {
            return Err(WdrlError::InvalidParameter(
                "propensity_clip".to_string(),
                "a value in (0, 0.5)".to_string(),
                self.propensity_clip.to_string(),
            ));
        }
        if self.num_threads == Some(0) {
            return Err(WdrlError::InvalidParameter(
                "num_threads".to_string(),
                "a positive thread count or None".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }
}

/// IO
pub trait ConfigIO: Serialize + DeserializeOwned + Sized {
    /// Save as a json object to a file.
    ///
    /// * `path` - Path to save the configuration.
    fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), WdrlError> {
        fs::write(path, self.json_dump()?).map_err(|e| WdrlError::UnableToWrite(e.to_string()))
    }

    /// Dump as a json object
    fn json_dump(&self) -> Result<String, WdrlError> {
        serde_json::to_string(self).map_err(|e| WdrlError::UnableToWrite(e.to_string()))
    }

    /// Load from Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, WdrlError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| WdrlError::UnableToRead(e.to_string()))
    }

    /// Load from a path to a json object.
    ///
    /// * `path` - Path to load from.
    fn load_config<P: AsRef<Path>>(path: P) -> Result<Self, WdrlError> {
        let json_str = fs::read_to_string(path).map_err(|e| WdrlError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl ConfigIO for WdrlConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = WdrlConfig::default();
        assert_eq!(config.propensity_clip, 1e-3);
        assert!(config.skip_unobserved);
        assert!(config.parallel);
        assert_eq!(config.num_threads, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_io_json() {
        let config = WdrlConfig {
            propensity_clip: 0.01,
            skip_unobserved: false,
            parallel: false,
            num_threads: Some(2),
        };
        let json = config.json_dump().unwrap();
        let config2 = WdrlConfig::from_json(&json).unwrap();
        assert_eq!(config, config2);
    }

    #[test]
    fn test_config_io_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("wdrl.json");
        let config = WdrlConfig::default();
        config.save_config(&file_path).unwrap();
        let config2 = WdrlConfig::load_config(&file_path).unwrap();
        assert_eq!(config, config2);
        assert!(matches!(
            WdrlConfig::load_config(dir.path().join("missing.json")),
            Err(WdrlError::UnableToRead(_))
        ));
    }

    #[test]
    fn test_config_missing_fields() {
        let config = WdrlConfig::from_json(r#"{"parallel": false}"#).unwrap();
        assert!(!config.parallel);
        assert_eq!(config.propensity_clip, 1e-3);
        assert!(config.skip_unobserved);
    }

    #[test]
    fn test_config_validate() {
        let mut config = WdrlConfig {
            propensity_clip: 0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.propensity_clip = 0.0;
        assert!(config.validate().is_err());
        config.propensity_clip = 0.05;
        config.num_threads = Some(0);
        assert!(config.validate().is_err());
    }
}
