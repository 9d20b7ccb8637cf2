//! Block lifecycle trait and the aggregate block error.
//!
//! The host runtime drives every block through the same synchronous,
//! single-threaded lifecycle:
//!
//! 1. `parse_parameters` / `configure_size_and_ports` — model compile time
//! 2. `initialize` — once, before the first step
//! 3. `output` — once per control cycle
//! 4. `terminate` — exactly once at teardown
//!
//! A phase returning `Err` aborts the run; the host still calls
//! `terminate`, so implementations must keep it safe to run after a
//! failed or partial `initialize`.

use thiserror::Error;

use crate::host::BlockInformation;
use crate::params::ParameterError;
use crate::robot::config::RobotConfigError;
use crate::robot::device::{DeviceError, UnknownControlType};
use crate::signal::PortError;

/// Error returned by a block lifecycle phase.
#[derive(Debug, Error)]
pub enum BlockError {
    /// Parameter registration, parsing, or lookup failed.
    #[error("parameter error: {0}")]
    Parameter(#[from] ParameterError),

    /// Port allocation or signal access failed.
    #[error("port error: {0}")]
    Port(#[from] PortError),

    /// Device interface acquisition or I/O failed.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Robot description missing or invalid.
    #[error("robot configuration error: {0}")]
    Config(#[from] RobotConfigError),

    /// The ControlType parameter holds an unrecognized string.
    #[error(transparent)]
    ControlType(#[from] UnknownControlType),

    /// A per-joint collection does not match the DoFs count.
    #[error("{what} must have length {expected}, got {actual}")]
    SizeMismatch {
        /// What was checked (parameter or port name).
        what: &'static str,
        /// Required length (the DoFs count).
        expected: usize,
        /// Observed length.
        actual: usize,
    },
}

/// A block in the block-diagram toolbox.
pub trait Block {
    /// Number of parameters this block declares.
    fn parameter_count(&self) -> usize;

    /// Register parameter metadata with the host and parse the raw
    /// parameter set. Called standalone and from the other compile-time
    /// phases; must be idempotent.
    fn parse_parameters(&mut self, host: &mut dyn BlockInformation) -> Result<(), BlockError>;

    /// Declare input/output ports from the parsed parameters.
    ///
    /// Port installation is all-or-nothing: on failure the host keeps no
    /// partial port set.
    fn configure_size_and_ports(
        &mut self,
        host: &mut dyn BlockInformation,
    ) -> Result<(), BlockError>;

    /// Acquire collaborator interfaces and capture initial state.
    ///
    /// Runs once before the first `output` call. Must not leave device
    /// state mutated when it fails.
    fn initialize(&mut self, host: &mut dyn BlockInformation) -> Result<(), BlockError>;

    /// One execution step.
    fn output(&mut self, host: &dyn BlockInformation) -> Result<(), BlockError>;

    /// Release resources and restore device state.
    ///
    /// Called exactly once at teardown, regardless of how many steps ran
    /// or whether `initialize` succeeded.
    fn terminate(&mut self, host: &dyn BlockInformation) -> Result<(), BlockError>;
}
