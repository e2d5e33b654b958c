//! Configuration for the detection pipeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SsdecError;

/// Main configuration for ssdec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SsdecConfig {
    /// Detection configuration.
    pub detect: DetectConfig,
}

/// Detection pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Score threshold (0.0 - 1.0) below which detections are dropped.
    pub score_threshold: f32,

    /// Default label file, used when the CLI does not pass one.
    pub labels: Option<PathBuf>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.4,
            labels: None,
        }
    }
}

impl SsdecConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SsdecError> {
        if !path.exists() {
            return Err(SsdecError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| SsdecError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_tool() {
        let config = SsdecConfig::default();
        assert_eq!(config.detect.score_threshold, 0.4);
        assert_eq!(config.detect.labels, None);
    }

    #[test]
    fn loads_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"detect": {{"score_threshold": 0.25}}}}"#).unwrap();
        let config = SsdecConfig::from_file(file.path()).unwrap();
        assert_eq!(config.detect.score_threshold, 0.25);
        assert_eq!(config.detect.labels, None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = SsdecConfig::from_file(Path::new("/nonexistent/ssdec.json")).unwrap_err();
        assert!(matches!(err, SsdecError::NotFound(_)));
    }
}
