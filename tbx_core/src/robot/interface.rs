//! Robot-interface provider: configuration plus device capabilities.
//!
//! Device capabilities are injected once when the interface is built and
//! handed out as shared handles. A capability that was never attached
//! surfaces as [`DeviceError::InterfaceUnavailable`] at acquisition time,
//! which blocks treat as a fatal phase error.
//!
//! The host model is single-threaded and synchronous, so handles are
//! `Rc<RefCell<_>>` rather than `Arc<Mutex<_>>`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::robot::config::RobotConfiguration;
use crate::robot::device::{DeviceError, PidControl, TorqueControl};

/// Shared handle to a PID-control capability.
pub type PidControlHandle = Rc<RefCell<dyn PidControl>>;
/// Shared handle to a torque-control capability.
pub type TorqueControlHandle = Rc<RefCell<dyn TorqueControl>>;

/// Provider of the robot description and device capabilities.
pub struct RobotInterface {
    configuration: RobotConfiguration,
    pid_control: Option<PidControlHandle>,
    torque_control: Option<TorqueControlHandle>,
}

impl RobotInterface {
    /// Interface with no device capabilities attached.
    pub fn new(configuration: RobotConfiguration) -> Self {
        Self {
            configuration,
            pid_control: None,
            torque_control: None,
        }
    }

    /// Attach a PID-control capability.
    pub fn with_pid_control(mut self, handle: PidControlHandle) -> Self {
        self.pid_control = Some(handle);
        self
    }

    /// Attach a torque-control capability.
    pub fn with_torque_control(mut self, handle: TorqueControlHandle) -> Self {
        self.torque_control = Some(handle);
        self
    }

    /// The robot description.
    #[inline]
    pub fn configuration(&self) -> &RobotConfiguration {
        &self.configuration
    }

    /// The PID-control capability, if attached.
    pub fn pid_control(&self) -> Result<PidControlHandle, DeviceError> {
        self.pid_control
            .clone()
            .ok_or(DeviceError::InterfaceUnavailable("PID control"))
    }

    /// The torque-control capability, if attached.
    pub fn torque_control(&self) -> Result<TorqueControlHandle, DeviceError> {
        self.torque_control
            .clone()
            .ok_or(DeviceError::InterfaceUnavailable("torque control"))
    }
}
