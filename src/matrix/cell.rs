//! Experiment cell identifiers
//!
//! Network paths and robot modes are closed sets, so grid placement follows
//! declaration order rather than string conventions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Physical network configuration between controller and robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkPath {
    /// Controller and robot on one host
    #[serde(alias = "localhost")]
    Loopback,
    /// Dedicated link, non-realtime kernel
    #[serde(alias = "soft")]
    SoftRealtime,
    /// Dedicated link, `PREEMPT_RT` kernel
    #[serde(alias = "realtime")]
    HardRealtime,
}

impl NetworkPath {
    /// Every path, in grid row order
    pub const ALL: [Self; 3] = [Self::Loopback, Self::SoftRealtime, Self::HardRealtime];

    /// Identifier used in directory names and configuration
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loopback => "loopback",
            Self::SoftRealtime => "soft_realtime",
            Self::HardRealtime => "hard_realtime",
        }
    }
}

impl fmt::Display for NetworkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which robot endpoint produced the traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotMode {
    /// Mock server standing in for the robot
    #[serde(alias = "robot_fake")]
    Simulated,
    /// Real robot hardware
    #[serde(alias = "robot_real")]
    Physical,
}

impl RobotMode {
    /// Every mode, in grid column order
    pub const ALL: [Self; 2] = [Self::Simulated, Self::Physical];

    /// Identifier used in file names and configuration
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Physical => "physical",
        }
    }
}

impl fmt::Display for RobotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (network path, robot mode) configuration under comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExperimentCell {
    /// Grid row
    pub path: NetworkPath,
    /// Grid column
    pub mode: RobotMode,
}

impl ExperimentCell {
    /// Create a cell
    #[must_use]
    pub const fn new(path: NetworkPath, mode: RobotMode) -> Self {
        Self { path, mode }
    }

    /// Capture file location: `<root>/<path>/<mode>.<extension>`
    #[must_use]
    pub fn capture_file(&self, root: &Path, extension: &str) -> PathBuf {
        root.join(self.path.as_str())
            .join(self.mode.as_str())
            .with_extension(extension)
    }

    /// Cells in grid order: paths outer, modes inner
    pub fn grid<'a>(
        paths: &'a [NetworkPath],
        modes: &'a [RobotMode],
    ) -> impl Iterator<Item = Self> + 'a {
        paths
            .iter()
            .flat_map(move |&path| modes.iter().map(move |&mode| Self::new(path, mode)))
    }
}

impl fmt::Display for ExperimentCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.path, self.mode)
    }
}
