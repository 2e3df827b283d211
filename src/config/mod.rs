//! Analysis configuration
//!
//! Loaded from YAML; every key is optional and unknown keys are rejected so a
//! typo never silently falls back to a default.
//!
//! ```yaml
//! capture_time: 10.0
//! root: /tmp/franka_timing
//! output: /tmp/franka_timing/timing_matrix.png
//! network_paths: [loopback, soft_realtime, hard_realtime]
//! robot_modes: [simulated, physical]
//! classifier:
//!   kind: largest_payload
//! ```

use crate::extract::{ClassifierStrategy, DEFAULT_CAPTURE_TIME};
use crate::matrix::{NetworkPath, RobotMode, DEFAULT_EXTENSION};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;
use std::path::{Path, PathBuf};

/// Default figure size in pixels
pub const DEFAULT_FIGURE_SIZE: (u32, u32) = (1600, 1200);

/// Full configuration of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JitterConfig {
    /// Observation window upper bound (seconds)
    pub capture_time: f64,
    /// Grid rows, in order
    pub network_paths: Vec<NetworkPath>,
    /// Grid columns, in order
    pub robot_modes: Vec<RobotMode>,
    /// Directory holding `<path>/<mode>.<ext>` capture exports
    pub root: PathBuf,
    /// Combined figure location
    pub output: PathBuf,
    /// Capture export extension
    pub capture_extension: String,
    /// Status message classifier
    pub classifier: ClassifierStrategy,
    /// Figure width in pixels
    pub width: u32,
    /// Figure height in pixels
    pub height: u32,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            capture_time: DEFAULT_CAPTURE_TIME,
            network_paths: NetworkPath::ALL.to_vec(),
            robot_modes: RobotMode::ALL.to_vec(),
            root: PathBuf::from("captures"),
            output: PathBuf::from("timing_matrix.png"),
            capture_extension: DEFAULT_EXTENSION.to_string(),
            classifier: ClassifierStrategy::default(),
            width: DEFAULT_FIGURE_SIZE.0,
            height: DEFAULT_FIGURE_SIZE.1,
        }
    }
}

impl JitterConfig {
    /// Read and validate a YAML configuration file
    ///
    /// # Errors
    /// - `Io` if the file cannot be read
    /// - `InvalidConfig` if it does not parse or fails validation
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            Error::InvalidConfig(detail) => {
                Error::InvalidConfig(format!("{}: {detail}", path.display()))
            }
            other => other,
        })
    }

    /// Parse and validate YAML text
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the text does not parse or fails validation
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse yaml: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the pipeline relies on
    ///
    /// # Errors
    /// Returns `InvalidConfig` describing the first violated rule
    pub fn validate(&self) -> Result<()> {
        if !self.capture_time.is_finite() || self.capture_time <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "capture_time must be a positive number of seconds, got {}",
                self.capture_time
            )));
        }
        check_axis("network_paths", &self.network_paths)?;
        check_axis("robot_modes", &self.robot_modes)?;
        if self.capture_extension.is_empty() {
            return Err(Error::InvalidConfig(
                "capture_extension must not be empty".to_string(),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "figure size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

fn check_axis<T: Copy + Eq + Hash + std::fmt::Display>(name: &str, values: &[T]) -> Result<()> {
    if values.is_empty() {
        return Err(Error::InvalidConfig(format!("{name} must not be empty")));
    }
    let mut seen = HashSet::new();
    for &value in values {
        if !seen.insert(value) {
            return Err(Error::InvalidConfig(format!("{name} lists '{value}' twice")));
        }
    }
    Ok(())
}
