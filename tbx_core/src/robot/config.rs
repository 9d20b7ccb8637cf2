//! Robot description: name and ordered controlled-joint list.
//!
//! The joint list fixes the DoFs count for every per-joint collection a
//! block carries; it is loaded once and immutable afterwards.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Robot description loading/validation error.
#[derive(Debug, Error)]
pub enum RobotConfigError {
    /// File I/O error.
    #[error("robot config I/O error: {0}")]
    Io(String),

    /// TOML parse error.
    #[error("robot config parse error: {0}")]
    Parse(String),

    /// Semantic validation error.
    #[error("robot config validation: {0}")]
    Validation(String),
}

/// Immutable robot description.
///
/// `controlled_joints` is the ordered joint axis set; its length is the
/// DoFs count used to size every per-joint collection.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RobotConfiguration {
    /// Robot name, used in diagnostics only.
    pub name: String,
    /// Ordered list of controlled joint names.
    pub controlled_joints: Vec<String>,
}

impl RobotConfiguration {
    /// Build a configuration from a joint list, validating it.
    pub fn new(
        name: impl Into<String>,
        controlled_joints: Vec<String>,
    ) -> Result<Self, RobotConfigError> {
        let config = Self {
            name: name.into(),
            controlled_joints,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RobotConfigError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| RobotConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, RobotConfigError> {
        let toml_str = std::fs::read_to_string(path).map_err(|e| {
            RobotConfigError::Io(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&toml_str)?;
        tracing::info!(
            "loaded robot '{}' with {} controlled joints from {}",
            config.name,
            config.dofs(),
            path.display()
        );
        Ok(config)
    }

    /// Degrees of freedom: the number of controlled joints.
    #[inline]
    pub fn dofs(&self) -> usize {
        self.controlled_joints.len()
    }

    /// The ordered controlled-joint names.
    #[inline]
    pub fn controlled_joints(&self) -> &[String] {
        &self.controlled_joints
    }

    fn validate(&self) -> Result<(), RobotConfigError> {
        if self.controlled_joints.is_empty() {
            return Err(RobotConfigError::Validation(
                "controlled_joints must not be empty".to_string(),
            ));
        }
        for (i, joint) in self.controlled_joints.iter().enumerate() {
            if joint.is_empty() {
                return Err(RobotConfigError::Validation(format!(
                    "controlled_joints[{i}] is empty"
                )));
            }
            if self.controlled_joints[..i].contains(joint) {
                return Err(RobotConfigError::Validation(format!(
                    "duplicate joint name '{joint}'"
                )));
            }
        }
        Ok(())
    }
}
