//! Motor-parameter block: drives PID gains and torque-model coefficients
//! on the robot's actuators.
//!
//! At configure time the block derives its input ports from the SetP /
//! SetI / SetD flags (one dynamic-width gain port per enabled channel, in
//! fixed P, I, D order). At initialize time it captures the device's
//! default PID gains and motor torque parameters, then builds the applied
//! variants with the KTau/Bemf overrides. Each step reads the enabled
//! gain inputs, and only when some gain actually changed pushes the full
//! applied PID record to the device in one batched write. Terminate
//! restores the captured defaults.
//!
//! Known limitation: the per-joint torque-parameter loops (first-run
//! apply and terminate restore) stop at the first failing joint without
//! rolling back joints already written, so a device fault mid-loop leaves
//! a partially-applied state. The partial state is logged, not repaired.

use std::rc::Rc;

use tracing::{debug, error};

use tbx_core::block::{Block, BlockError};
use tbx_core::host::BlockInformation;
use tbx_core::params::{ParameterMetadata, ParameterType, Parameters};
use tbx_core::robot::device::{MotorTorqueParams, Pid, PidControlType};
use tbx_core::robot::interface::RobotInterface;
use tbx_core::signal::{PortError, PortSpec};

// Host-side parameter indices.
const IDX_SET_P: usize = 0;
const IDX_SET_I: usize = 1;
const IDX_SET_D: usize = 2;
const IDX_CONTROL_TYPE: usize = 3;
const IDX_SET_KTAU: usize = 4;
const IDX_SET_BEMF: usize = 5;
const IDX_KTAU: usize = 6;
const IDX_BEMF: usize = 7;

const PARAMETER_COUNT: usize = 8;

type GainField = fn(&mut Pid) -> &mut f64;

/// The motor-parameter block.
///
/// Built around an injected [`RobotInterface`]; all device access goes
/// through its PID-control and torque-control capabilities.
pub struct SetMotorParameters {
    robot: Rc<RobotInterface>,
    parameters: Parameters,

    set_p: bool,
    set_i: bool,
    set_d: bool,
    set_ktau: bool,
    set_bemf: bool,
    control_type: PidControlType,

    // Gain-channel port indices, assigned at configure time. Instance
    // fields so coexisting block instances cannot interfere.
    port_p: Option<usize>,
    port_i: Option<usize>,
    port_d: Option<usize>,

    pids_default: Vec<Pid>,
    pids_applied: Vec<Pid>,
    motor_params_default: Vec<MotorTorqueParams>,
    motor_params_applied: Vec<MotorTorqueParams>,

    first_run: bool,
}

impl SetMotorParameters {
    /// Block bound to a robot interface.
    pub fn new(robot: Rc<RobotInterface>) -> Self {
        Self {
            robot,
            parameters: Parameters::new(),
            set_p: false,
            set_i: false,
            set_d: false,
            set_ktau: false,
            set_bemf: false,
            control_type: PidControlType::Position,
            port_p: None,
            port_i: None,
            port_d: None,
            pids_default: Vec::new(),
            pids_applied: Vec::new(),
            motor_params_default: Vec::new(),
            motor_params_applied: Vec::new(),
            first_run: false,
        }
    }

    /// PID gains captured from the device at initialization.
    pub fn pids_default(&self) -> &[Pid] {
        &self.pids_default
    }

    /// PID gains currently applied (or pending application).
    pub fn pids_applied(&self) -> &[Pid] {
        &self.pids_applied
    }

    /// Torque-model coefficients captured from the device.
    pub fn motor_params_default(&self) -> &[MotorTorqueParams] {
        &self.motor_params_default
    }

    /// Torque-model coefficients with the KTau/Bemf overrides applied.
    pub fn motor_params_applied(&self) -> &[MotorTorqueParams] {
        &self.motor_params_applied
    }

    fn bound(port: Option<usize>, channel: &'static str) -> Result<usize, PortError> {
        port.ok_or(PortError::Unbound(channel))
    }

    /// Write `gains` into one field of the applied record, returning
    /// whether any joint's value changed.
    fn diff_apply(applied: &mut [Pid], gains: &[f64], field: GainField) -> bool {
        let mut changed = false;
        for (pid, gain) in applied.iter_mut().zip(gains) {
            let slot = field(pid);
            if *slot != *gain {
                *slot = *gain;
                changed = true;
            }
        }
        changed
    }

    fn gain_channels(&self) -> [(bool, Option<usize>, &'static str, GainField); 3] {
        [
            (self.set_p, self.port_p, "proportional gains", |p| &mut p.kp),
            (self.set_i, self.port_i, "integral gains", |p| &mut p.ki),
            (self.set_d, self.port_d, "derivative gains", |p| &mut p.kd),
        ]
    }
}

impl Block for SetMotorParameters {
    fn parameter_count(&self) -> usize {
        PARAMETER_COUNT
    }

    fn parse_parameters(&mut self, host: &mut dyn BlockInformation) -> Result<(), BlockError> {
        let metadata = [
            ParameterMetadata::scalar(ParameterType::Bool, IDX_SET_P, "SetP"),
            ParameterMetadata::scalar(ParameterType::Bool, IDX_SET_I, "SetI"),
            ParameterMetadata::scalar(ParameterType::Bool, IDX_SET_D, "SetD"),
            ParameterMetadata::scalar(ParameterType::String, IDX_CONTROL_TYPE, "ControlType"),
            ParameterMetadata::scalar(ParameterType::Bool, IDX_SET_KTAU, "SetKTau"),
            ParameterMetadata::scalar(ParameterType::Bool, IDX_SET_BEMF, "SetBemf"),
            ParameterMetadata::dynamic_vector(ParameterType::Double, IDX_KTAU, "KTau"),
            ParameterMetadata::dynamic_vector(ParameterType::Double, IDX_BEMF, "Bemf"),
        ];

        for md in metadata {
            host.declare_parameter(md)?;
        }

        self.parameters = host.parse_parameters()?;
        Ok(())
    }

    fn configure_size_and_ports(
        &mut self,
        host: &mut dyn BlockInformation,
    ) -> Result<(), BlockError> {
        self.parse_parameters(host)?;

        let set_p = self.parameters.get_bool("SetP")?;
        let set_i = self.parameters.get_bool("SetI")?;
        let set_d = self.parameters.get_bool("SetD")?;

        // One dynamic-width gain input per enabled channel, fixed P, I, D
        // order, indices contiguous from 0.
        let mut ports = Vec::with_capacity(3);
        let mut next = 0usize;
        let mut port_p = None;
        let mut port_i = None;
        let mut port_d = None;

        if set_p {
            port_p = Some(next);
            ports.push(PortSpec::dynamic(next));
            next += 1;
        }
        if set_i {
            port_i = Some(next);
            ports.push(PortSpec::dynamic(next));
            next += 1;
        }
        if set_d {
            port_d = Some(next);
            ports.push(PortSpec::dynamic(next));
        }

        // Atomic: the indices are committed only after the host accepted
        // the whole table.
        host.set_input_ports(&ports)?;
        self.port_p = port_p;
        self.port_i = port_i;
        self.port_d = port_d;

        Ok(())
    }

    fn initialize(&mut self, host: &mut dyn BlockInformation) -> Result<(), BlockError> {
        // Idempotent with the configure phase.
        self.parse_parameters(host)?;

        self.set_p = self.parameters.get_bool("SetP")?;
        self.set_i = self.parameters.get_bool("SetI")?;
        self.set_d = self.parameters.get_bool("SetD")?;
        self.set_ktau = self.parameters.get_bool("SetKTau")?;
        self.set_bemf = self.parameters.get_bool("SetBemf")?;
        let ktau = self.parameters.get_f64_vec("KTau")?;
        let bemf = self.parameters.get_f64_vec("Bemf")?;

        // Resolve the control type before touching any device interface.
        self.control_type = self.parameters.get_string("ControlType")?.parse()?;

        let dofs = self.robot.configuration().dofs();

        if ktau.len() != dofs {
            return Err(BlockError::SizeMismatch {
                what: "KTau",
                expected: dofs,
                actual: ktau.len(),
            });
        }
        if bemf.len() != dofs {
            return Err(BlockError::SizeMismatch {
                what: "Bemf",
                expected: dofs,
                actual: bemf.len(),
            });
        }

        // Capture the default PID gains in one batched read.
        let pid_control = self.robot.pid_control()?;
        let mut defaults = vec![Pid::default(); dofs];
        pid_control
            .borrow()
            .get_pids(self.control_type, &mut defaults)?;
        self.pids_default = defaults;
        self.pids_applied = self.pids_default.clone();

        // Capture the default motor torque parameters, per joint.
        let torque_control = self.robot.torque_control()?;
        let mut motor_defaults = Vec::with_capacity(dofs);
        {
            let torque_control = torque_control.borrow();
            for joint in 0..dofs {
                motor_defaults.push(torque_control.motor_torque_params(joint)?);
            }
        }
        self.motor_params_default = motor_defaults;
        self.motor_params_applied = self.motor_params_default.clone();

        // Masked overrides replace the captured defaults field by field.
        for (joint, params) in self.motor_params_applied.iter_mut().enumerate() {
            if self.set_ktau {
                params.ktau = ktau[joint];
            }
            if self.set_bemf {
                params.bemf = bemf[joint];
            }
        }

        // Every enabled gain port must carry exactly DoFs samples.
        for (enabled, port, channel, _) in self.gain_channels() {
            if !enabled {
                continue;
            }
            let port = Self::bound(port, channel)?;
            let width = host.input_port_width(port)?;
            if width != dofs {
                return Err(BlockError::SizeMismatch {
                    what: channel,
                    expected: dofs,
                    actual: width,
                });
            }
        }

        self.first_run = true;
        Ok(())
    }

    fn output(&mut self, host: &dyn BlockInformation) -> Result<(), BlockError> {
        // First step only: push the applied torque parameters.
        if self.first_run {
            self.first_run = false;

            let joints = self.robot.configuration().controlled_joints();
            let torque_control = self.robot.torque_control()?;
            let mut torque_control = torque_control.borrow_mut();

            for (joint, params) in self.motor_params_applied.iter().enumerate() {
                if let Err(e) = torque_control.set_motor_torque_params(joint, *params) {
                    // Remaining joints keep their device-side defaults.
                    error!(
                        "failed to set motor torque parameters for joint {}: {e}",
                        joints[joint]
                    );
                    break;
                }
            }
        }

        let mut send_pids = false;

        for (enabled, port, channel, field) in self.gain_channels() {
            if !enabled {
                continue;
            }
            let port = Self::bound(port, channel)?;
            match host.input_signal(port) {
                // A signal narrower than DoFs would silently drive only
                // the leading joints; treat it like an unreadable signal.
                Ok(signal) if signal.len() < self.pids_applied.len() => error!(
                    "signal carrying {channel} has width {}, expected {}",
                    signal.len(),
                    self.pids_applied.len()
                ),
                Ok(signal) => {
                    if Self::diff_apply(&mut self.pids_applied, signal.as_slice(), field) {
                        send_pids = true;
                    }
                }
                // Flagged, not fatal: the step carries on with the
                // channels that could be read.
                Err(e) => error!("failed to read signal carrying {channel}: {e}"),
            }
        }

        if send_pids {
            debug!(control_type = %self.control_type, "gains changed, sending full PID record");
            let pid_control = self.robot.pid_control()?;
            pid_control
                .borrow_mut()
                .set_pids(self.control_type, &self.pids_applied)?;
        }

        Ok(())
    }

    fn terminate(&mut self, _host: &dyn BlockInformation) -> Result<(), BlockError> {
        // Initialization never captured anything: nothing to restore, and
        // teardown must still succeed.
        if self.pids_default.is_empty() {
            debug!("no captured defaults, skipping device restore");
            return Ok(());
        }

        let pid_control = self.robot.pid_control()?;
        pid_control
            .borrow_mut()
            .set_pids(self.control_type, &self.pids_default)?;

        let torque_control = self.robot.torque_control()?;
        let mut torque_control = torque_control.borrow_mut();
        for (joint, params) in self.motor_params_default.iter().enumerate() {
            if let Err(e) = torque_control.set_motor_torque_params(joint, *params) {
                // Partial restore: earlier joints are already back at
                // their defaults, later ones keep the applied values.
                error!("failed to restore default motor torque parameters for joint {joint}: {e}");
                break;
            }
        }

        Ok(())
    }
}
