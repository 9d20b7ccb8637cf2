//! Simulated actuator backend.
//!
//! Implements both device capabilities fully in memory. Used by the demo
//! runner as its backend and by block tests as the capability double:
//! write counters record how often and where the device was touched, and
//! the fault-injection switches let tests exercise the partial-failure
//! paths without hardware.

use crate::robot::device::{
    DeviceError, MotorTorqueParams, Pid, PidControl, PidControlType, TorqueControl,
};

/// In-memory actuator set for a fixed number of joints.
#[derive(Debug, Clone)]
pub struct SimActuators {
    position_pids: Vec<Pid>,
    torque_pids: Vec<Pid>,
    motor_params: Vec<MotorTorqueParams>,

    /// Number of batched `set_pids` calls accepted.
    pub pid_writes: usize,
    /// Accepted `set_motor_torque_params` calls, per joint.
    pub torque_writes: Vec<usize>,

    /// When true, every PID get/set fails.
    pub fail_pid_io: bool,
    /// When set, torque-parameter writes fail from this joint index on.
    pub fail_torque_writes_from: Option<usize>,
}

impl SimActuators {
    /// Actuators for `dofs` joints with all-zero gains and coefficients.
    pub fn new(dofs: usize) -> Self {
        Self {
            position_pids: vec![Pid::default(); dofs],
            torque_pids: vec![Pid::default(); dofs],
            motor_params: vec![MotorTorqueParams::default(); dofs],
            pid_writes: 0,
            torque_writes: vec![0; dofs],
            fail_pid_io: false,
            fail_torque_writes_from: None,
        }
    }

    /// Number of joints.
    #[inline]
    pub fn dofs(&self) -> usize {
        self.position_pids.len()
    }

    /// Seed the gains of every joint for one control type.
    pub fn seed_pids(&mut self, control_type: PidControlType, pids: &[Pid]) {
        self.store_mut(control_type).copy_from_slice(pids);
    }

    /// Seed the torque-model coefficients of every joint.
    pub fn seed_motor_params(&mut self, params: &[MotorTorqueParams]) {
        self.motor_params.copy_from_slice(params);
    }

    /// Current gains for one control type.
    pub fn pids(&self, control_type: PidControlType) -> &[Pid] {
        self.store(control_type)
    }

    /// Current torque-model coefficients, per joint.
    pub fn motor_params(&self) -> &[MotorTorqueParams] {
        &self.motor_params
    }

    fn store(&self, control_type: PidControlType) -> &[Pid] {
        match control_type {
            PidControlType::Position => &self.position_pids,
            PidControlType::Torque => &self.torque_pids,
        }
    }

    fn store_mut(&mut self, control_type: PidControlType) -> &mut [Pid] {
        match control_type {
            PidControlType::Position => &mut self.position_pids,
            PidControlType::Torque => &mut self.torque_pids,
        }
    }

    fn check_joint(&self, joint: usize) -> Result<(), DeviceError> {
        if joint >= self.dofs() {
            return Err(DeviceError::InvalidJoint {
                index: joint,
                dofs: self.dofs(),
            });
        }
        Ok(())
    }
}

impl PidControl for SimActuators {
    fn get_pids(&self, control_type: PidControlType, pids: &mut [Pid]) -> Result<(), DeviceError> {
        if self.fail_pid_io {
            return Err(DeviceError::Io("simulated PID read fault".to_string()));
        }
        let store = self.store(control_type);
        if pids.len() != store.len() {
            return Err(DeviceError::Io(format!(
                "get_pids buffer has length {}, device has {} joints",
                pids.len(),
                store.len()
            )));
        }
        pids.copy_from_slice(store);
        Ok(())
    }

    fn set_pids(&mut self, control_type: PidControlType, pids: &[Pid]) -> Result<(), DeviceError> {
        if self.fail_pid_io {
            return Err(DeviceError::Io("simulated PID write fault".to_string()));
        }
        let store = self.store_mut(control_type);
        if pids.len() != store.len() {
            return Err(DeviceError::Io(format!(
                "set_pids record has length {}, device has {} joints",
                pids.len(),
                store.len()
            )));
        }
        store.copy_from_slice(pids);
        self.pid_writes += 1;
        Ok(())
    }
}

impl TorqueControl for SimActuators {
    fn motor_torque_params(&self, joint: usize) -> Result<MotorTorqueParams, DeviceError> {
        self.check_joint(joint)?;
        Ok(self.motor_params[joint])
    }

    fn set_motor_torque_params(
        &mut self,
        joint: usize,
        params: MotorTorqueParams,
    ) -> Result<(), DeviceError> {
        self.check_joint(joint)?;
        if let Some(from) = self.fail_torque_writes_from {
            if joint >= from {
                return Err(DeviceError::Io(format!(
                    "simulated torque-parameter write fault on joint {joint}"
                )));
            }
        }
        self.motor_params[joint] = params;
        self.torque_writes[joint] += 1;
        Ok(())
    }
}
