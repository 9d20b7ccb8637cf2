//! Device-capability traits and the data they exchange.
//!
//! These traits are the boundary to the externally-owned hardware
//! abstraction: real backends talk to drive electronics, the simulated
//! backend ([`crate::robot::sim::SimActuators`]) keeps everything in
//! memory. Blocks only ever see the traits, so the full lifecycle can be
//! exercised with test doubles and no hardware.
//!
//! # Call contracts
//!
//! | Operation | Granularity | Blocking |
//! |-----------|-------------|----------|
//! | `get_pids` / `set_pids` | one batched call for all DoFs | yes |
//! | `motor_torque_params` / `set_motor_torque_params` | per joint | yes |
//!
//! No call retries internally; a failure surfaces immediately as a
//! [`DeviceError`] for the calling phase to report.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Device I/O and capability errors.
#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    /// The robot interface has no device attached for the capability.
    #[error("{0} interface is not available")]
    InterfaceUnavailable(&'static str),

    /// Joint index outside the controlled joint set.
    #[error("joint index {index} out of range (DoFs = {dofs})")]
    InvalidJoint {
        /// Offending index.
        index: usize,
        /// Number of controlled joints.
        dofs: usize,
    },

    /// A get/set call to the device failed.
    #[error("device I/O failed: {0}")]
    Io(String),
}

/// Control loop a set of PID gains applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidControlType {
    /// Position control loop.
    Position,
    /// Torque control loop.
    Torque,
}

impl fmt::Display for PidControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => write!(f, "Position"),
            Self::Torque => write!(f, "Torque"),
        }
    }
}

/// Error for an unrecognized control-type string.
#[derive(Debug, Clone, Error)]
#[error("control type '{0}' not recognized (expected \"Position\" or \"Torque\")")]
pub struct UnknownControlType(pub String);

impl FromStr for PidControlType {
    type Err = UnknownControlType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Position" => Ok(Self::Position),
            "Torque" => Ok(Self::Torque),
            other => Err(UnknownControlType(other.to_string())),
        }
    }
}

/// Per-joint PID gains.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pid {
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
}

impl Pid {
    /// Gains from (kp, ki, kd).
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// Per-joint motor torque-model coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorTorqueParams {
    /// Torque constant.
    pub ktau: f64,
    /// Back-EMF constant.
    pub bemf: f64,
}

/// PID-gain capability of the device interface.
///
/// Gains are keyed by [`PidControlType`]; reads and writes cover all
/// controlled joints in one batched call.
pub trait PidControl {
    /// Read the current gains for every controlled joint into `pids`.
    ///
    /// `pids.len()` must equal the DoFs count.
    fn get_pids(&self, control_type: PidControlType, pids: &mut [Pid]) -> Result<(), DeviceError>;

    /// Write gains for every controlled joint in one call.
    fn set_pids(&mut self, control_type: PidControlType, pids: &[Pid]) -> Result<(), DeviceError>;
}

/// Torque-model capability of the device interface, per joint.
pub trait TorqueControl {
    /// Read the torque-model coefficients of one joint.
    fn motor_torque_params(&self, joint: usize) -> Result<MotorTorqueParams, DeviceError>;

    /// Write the torque-model coefficients of one joint.
    fn set_motor_torque_params(
        &mut self,
        joint: usize,
        params: MotorTorqueParams,
    ) -> Result<(), DeviceError>;
}
