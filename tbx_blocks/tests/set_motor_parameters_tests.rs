//! End-to-end lifecycle tests for the motor-parameter block, driven
//! through the in-memory host against the simulated actuators.

use std::cell::RefCell;
use std::rc::Rc;

use tbx_blocks::SetMotorParameters;
use tbx_core::block::{Block, BlockError};
use tbx_core::host::{BlockInformation, BufferedHost};
use tbx_core::params::ParameterValue;
use tbx_core::robot::config::RobotConfiguration;
use tbx_core::robot::device::{MotorTorqueParams, Pid, PidControlType};
use tbx_core::robot::interface::RobotInterface;
use tbx_core::robot::sim::SimActuators;

// ─── Fixtures ───────────────────────────────────────────────────────

struct Rig {
    host: BufferedHost,
    block: SetMotorParameters,
    sim: Rc<RefCell<SimActuators>>,
}

struct RigSpec {
    dofs: usize,
    set_p: bool,
    set_i: bool,
    set_d: bool,
    control_type: &'static str,
    set_ktau: bool,
    set_bemf: bool,
    ktau: Vec<f64>,
    bemf: Vec<f64>,
}

impl RigSpec {
    fn basic(dofs: usize) -> Self {
        Self {
            dofs,
            set_p: true,
            set_i: false,
            set_d: false,
            control_type: "Position",
            set_ktau: false,
            set_bemf: false,
            ktau: vec![0.0; dofs],
            bemf: vec![0.0; dofs],
        }
    }
}

fn default_pids(dofs: usize) -> Vec<Pid> {
    (0..dofs)
        .map(|i| Pid::new(10.0 + i as f64, 1.0 + i as f64, 0.1 * i as f64))
        .collect()
}

fn default_motor_params(dofs: usize) -> Vec<MotorTorqueParams> {
    (0..dofs)
        .map(|i| MotorTorqueParams {
            ktau: 0.5 + i as f64,
            bemf: 0.05 + i as f64,
        })
        .collect()
}

fn build_rig(spec: RigSpec) -> Rig {
    let config = RobotConfiguration::new(
        "sim",
        (0..spec.dofs).map(|i| format!("joint_{i}")).collect(),
    )
    .unwrap();

    let mut sim = SimActuators::new(spec.dofs);
    sim.seed_pids(PidControlType::Position, &default_pids(spec.dofs));
    sim.seed_pids(PidControlType::Torque, &default_pids(spec.dofs));
    sim.seed_motor_params(&default_motor_params(spec.dofs));
    let sim = Rc::new(RefCell::new(sim));

    let robot = RobotInterface::new(config)
        .with_pid_control(sim.clone())
        .with_torque_control(sim.clone());
    let block = SetMotorParameters::new(Rc::new(robot));

    let mut host = BufferedHost::new();
    host.set_parameter("SetP", ParameterValue::Bool(spec.set_p));
    host.set_parameter("SetI", ParameterValue::Bool(spec.set_i));
    host.set_parameter("SetD", ParameterValue::Bool(spec.set_d));
    host.set_parameter(
        "ControlType",
        ParameterValue::String(spec.control_type.into()),
    );
    host.set_parameter("SetKTau", ParameterValue::Bool(spec.set_ktau));
    host.set_parameter("SetBemf", ParameterValue::Bool(spec.set_bemf));
    host.set_parameter("KTau", ParameterValue::DoubleVec(spec.ktau));
    host.set_parameter("Bemf", ParameterValue::DoubleVec(spec.bemf));

    Rig { host, block, sim }
}

/// Configure, bind a default buffer to every allocated port, initialize.
fn configure_and_initialize(rig: &mut Rig, dofs: usize) {
    rig.block.configure_size_and_ports(&mut rig.host).unwrap();
    for port in 0..rig.host.input_port_count() {
        rig.host.set_input_buffer(port, vec![0.0; dofs]);
    }
    rig.block.initialize(&mut rig.host).unwrap();
}

// ─── Initialize: default capture and overrides ──────────────────────

#[test]
fn applied_equals_default_after_initialize() {
    for dofs in [1, 2, 5] {
        let mut rig = build_rig(RigSpec::basic(dofs));
        configure_and_initialize(&mut rig, dofs);

        assert_eq!(rig.block.pids_default(), default_pids(dofs).as_slice());
        assert_eq!(rig.block.pids_applied(), rig.block.pids_default());
        assert_eq!(
            rig.block.motor_params_applied(),
            rig.block.motor_params_default()
        );
    }
}

#[test]
fn ktau_override_replaces_only_flagged_field() {
    let mut rig = build_rig(RigSpec {
        set_ktau: true,
        ktau: vec![9.0, 8.0],
        ..RigSpec::basic(2)
    });
    configure_and_initialize(&mut rig, 2);

    let applied = rig.block.motor_params_applied();
    let defaults = rig.block.motor_params_default();
    assert_eq!(applied[0].ktau, 9.0);
    assert_eq!(applied[1].ktau, 8.0);
    // Bemf keeps the captured default.
    assert_eq!(applied[0].bemf, defaults[0].bemf);
    assert_eq!(applied[1].bemf, defaults[1].bemf);
}

#[test]
fn bemf_override_replaces_only_flagged_field() {
    let mut rig = build_rig(RigSpec {
        set_bemf: true,
        bemf: vec![0.7, 0.6],
        ..RigSpec::basic(2)
    });
    configure_and_initialize(&mut rig, 2);

    let applied = rig.block.motor_params_applied();
    let defaults = rig.block.motor_params_default();
    assert_eq!(applied[0].bemf, 0.7);
    assert_eq!(applied[1].bemf, 0.6);
    assert_eq!(applied[0].ktau, defaults[0].ktau);
    assert_eq!(applied[1].ktau, defaults[1].ktau);
}

#[test]
fn torque_control_type_uses_torque_gain_set() {
    let mut rig = build_rig(RigSpec {
        control_type: "Torque",
        ..RigSpec::basic(2)
    });
    configure_and_initialize(&mut rig, 2);
    assert_eq!(rig.block.pids_default(), default_pids(2).as_slice());
}

// ─── Initialize: failures ───────────────────────────────────────────

#[test]
fn ktau_length_mismatch_fails_without_device_mutation() {
    let mut rig = build_rig(RigSpec {
        ktau: vec![1.0, 2.0, 3.0],
        ..RigSpec::basic(2)
    });
    rig.block.configure_size_and_ports(&mut rig.host).unwrap();
    rig.host.set_input_buffer(0, vec![0.0, 0.0]);

    let err = rig.block.initialize(&mut rig.host).unwrap_err();
    assert!(matches!(err, BlockError::SizeMismatch { what: "KTau", .. }));

    let sim = rig.sim.borrow();
    assert_eq!(sim.pid_writes, 0);
    assert_eq!(sim.torque_writes, vec![0, 0]);
}

#[test]
fn bemf_length_mismatch_fails() {
    let mut rig = build_rig(RigSpec {
        bemf: vec![1.0],
        ..RigSpec::basic(2)
    });
    rig.block.configure_size_and_ports(&mut rig.host).unwrap();
    rig.host.set_input_buffer(0, vec![0.0, 0.0]);

    let err = rig.block.initialize(&mut rig.host).unwrap_err();
    assert!(matches!(err, BlockError::SizeMismatch { what: "Bemf", .. }));
}

#[test]
fn unknown_control_type_fails_before_any_device_access() {
    let mut rig = build_rig(RigSpec {
        control_type: "Velocity",
        ..RigSpec::basic(2)
    });
    rig.block.configure_size_and_ports(&mut rig.host).unwrap();
    rig.host.set_input_buffer(0, vec![0.0, 0.0]);

    // Make every device call fail: initialize must error on the control
    // type before it would ever notice.
    rig.sim.borrow_mut().fail_pid_io = true;
    let err = rig.block.initialize(&mut rig.host).unwrap_err();
    assert!(matches!(err, BlockError::ControlType(_)), "got: {err}");
}

#[test]
fn missing_device_interface_fails_initialize() {
    let config = RobotConfiguration::new("sim", vec!["j0".into()]).unwrap();
    let robot = RobotInterface::new(config); // no capabilities attached
    let mut block = SetMotorParameters::new(Rc::new(robot));

    let mut rig = build_rig(RigSpec::basic(1));
    block.configure_size_and_ports(&mut rig.host).unwrap();
    rig.host.set_input_buffer(0, vec![0.0]);

    let err = block.initialize(&mut rig.host).unwrap_err();
    assert!(matches!(err, BlockError::Device(_)), "got: {err}");
}

#[test]
fn gain_port_width_mismatch_fails_initialize() {
    let mut rig = build_rig(RigSpec::basic(2));
    rig.block.configure_size_and_ports(&mut rig.host).unwrap();
    rig.host.set_input_buffer(0, vec![0.0, 0.0, 0.0]); // width 3, DoFs 2

    let err = rig.block.initialize(&mut rig.host).unwrap_err();
    assert!(matches!(err, BlockError::SizeMismatch { .. }), "got: {err}");
}

// ─── Output: first-run torque push ──────────────────────────────────

#[test]
fn torque_params_written_once_per_joint_on_first_step_only() {
    let mut rig = build_rig(RigSpec {
        set_ktau: true,
        ktau: vec![2.0, 3.0],
        ..RigSpec::basic(2)
    });
    configure_and_initialize(&mut rig, 2);

    // Keep gain inputs at the captured defaults so no PID write happens.
    let kp: Vec<f64> = rig.block.pids_default().iter().map(|p| p.kp).collect();
    rig.host.set_input_buffer(0, kp);

    for _ in 0..3 {
        rig.block.output(&rig.host).unwrap();
    }

    let sim = rig.sim.borrow();
    assert_eq!(sim.torque_writes, vec![1, 1]);
    assert_eq!(sim.motor_params()[0].ktau, 2.0);
    assert_eq!(sim.motor_params()[1].ktau, 3.0);
    assert_eq!(sim.pid_writes, 0);
}

#[test]
fn torque_push_stops_at_first_failing_joint_but_step_continues() {
    let mut rig = build_rig(RigSpec {
        set_ktau: true,
        ktau: vec![2.0, 3.0, 4.0],
        bemf: vec![0.0, 0.0, 0.0],
        ..RigSpec::basic(3)
    });
    configure_and_initialize(&mut rig, 3);
    rig.sim.borrow_mut().fail_torque_writes_from = Some(1);

    let kp: Vec<f64> = rig.block.pids_default().iter().map(|p| p.kp).collect();
    rig.host.set_input_buffer(0, kp);

    // The step itself succeeds despite the partial torque apply.
    rig.block.output(&rig.host).unwrap();

    let sim = rig.sim.borrow();
    // Joint 0 written, joint 1 failed, joint 2 never attempted.
    assert_eq!(sim.torque_writes, vec![1, 0, 0]);
    assert_eq!(sim.motor_params()[0].ktau, 2.0);
    assert_eq!(sim.motor_params()[1].ktau, default_motor_params(3)[1].ktau);
}

// ─── Output: change detection ───────────────────────────────────────

#[test]
fn unchanged_gains_cause_no_pid_write() {
    let mut rig = build_rig(RigSpec::basic(2));
    configure_and_initialize(&mut rig, 2);

    let kp: Vec<f64> = rig.block.pids_default().iter().map(|p| p.kp).collect();
    rig.host.set_input_buffer(0, kp);

    rig.block.output(&rig.host).unwrap();
    rig.block.output(&rig.host).unwrap();
    assert_eq!(rig.sim.borrow().pid_writes, 0);
}

#[test]
fn single_joint_change_sends_full_record() {
    let mut rig = build_rig(RigSpec {
        set_i: true,
        ..RigSpec::basic(2)
    });
    configure_and_initialize(&mut rig, 2);

    let defaults = rig.block.pids_default().to_vec();
    let kp: Vec<f64> = defaults.iter().map(|p| p.kp).collect();
    let mut ki: Vec<f64> = defaults.iter().map(|p| p.ki).collect();
    rig.host.set_input_buffer(0, kp);
    ki[1] += 0.5; // only one joint of one channel changes
    rig.host.set_input_buffer(1, ki);

    rig.block.output(&rig.host).unwrap();

    let sim = rig.sim.borrow();
    assert_eq!(sim.pid_writes, 1);
    let device = sim.pids(PidControlType::Position);
    // The whole record went out: untouched channels kept their values.
    assert_eq!(device[0], defaults[0]);
    assert_eq!(device[1].ki, defaults[1].ki + 0.5);
    assert_eq!(device[1].kp, defaults[1].kp);
    assert_eq!(device[1].kd, defaults[1].kd);
}

#[test]
fn failed_batched_pid_write_fails_the_step() {
    let mut rig = build_rig(RigSpec::basic(2));
    configure_and_initialize(&mut rig, 2);

    // Gains differ from the captured defaults, so the step must attempt
    // the batched write — and surface its failure.
    rig.host.set_input_buffer(0, vec![1.0, 2.0]);
    rig.sim.borrow_mut().fail_pid_io = true;

    let err = rig.block.output(&rig.host).unwrap_err();
    assert!(matches!(err, BlockError::Device(_)), "got: {err}");
}

#[test]
fn short_gain_signal_updates_no_joint() {
    let mut rig = build_rig(RigSpec::basic(2));
    configure_and_initialize(&mut rig, 2);

    let defaults = rig.block.pids_default().to_vec();

    // The host rebound the buffer with fewer samples than DoFs after the
    // initialize-time width check passed.
    rig.host.set_input_buffer(0, vec![99.0]);
    rig.block.output(&rig.host).unwrap();

    assert_eq!(rig.block.pids_applied(), defaults.as_slice());
    assert_eq!(rig.sim.borrow().pid_writes, 0);
}

#[test]
fn missing_gain_signal_is_not_fatal() {
    let mut rig = build_rig(RigSpec::basic(2));
    configure_and_initialize(&mut rig, 2);

    // A host whose port exists but carries no signal this step.
    let mut fresh = BufferedHost::new();
    fresh
        .set_input_ports(&[tbx_core::signal::PortSpec::dynamic(0)])
        .unwrap();

    rig.block.output(&fresh).unwrap();
    assert_eq!(rig.sim.borrow().pid_writes, 0);
}

// ─── Scenario from the acceptance suite ─────────────────────────────

#[test]
fn two_joint_position_scenario() {
    let dofs = 2;
    let mut rig = build_rig(RigSpec::basic(dofs));

    rig.block.configure_size_and_ports(&mut rig.host).unwrap();
    assert_eq!(rig.host.input_port_count(), 1);

    rig.host.set_input_buffer(0, vec![1.0, 2.0]);
    rig.block.initialize(&mut rig.host).unwrap();

    // Step 1: gains move from the captured defaults to [1.0, 2.0].
    rig.block.output(&rig.host).unwrap();
    {
        let sim = rig.sim.borrow();
        assert_eq!(sim.pid_writes, 1);
        let pids = sim.pids(PidControlType::Position);
        assert_eq!(pids[0].kp, 1.0);
        assert_eq!(pids[1].kp, 2.0);
        // Non-driven channels ride along unchanged.
        assert_eq!(pids[0].ki, default_pids(dofs)[0].ki);
    }

    // Step 2: same input, no write.
    rig.host.set_input_buffer(0, vec![1.0, 2.0]);
    rig.block.output(&rig.host).unwrap();
    assert_eq!(rig.sim.borrow().pid_writes, 1);

    // Step 3: joint 0 changes, full two-joint record goes out.
    rig.host.set_input_buffer(0, vec![5.0, 2.0]);
    rig.block.output(&rig.host).unwrap();
    {
        let sim = rig.sim.borrow();
        assert_eq!(sim.pid_writes, 2);
        let pids = sim.pids(PidControlType::Position);
        assert_eq!(pids[0].kp, 5.0);
        assert_eq!(pids[1].kp, 2.0);
    }
}

// ─── Terminate ──────────────────────────────────────────────────────

#[test]
fn terminate_restores_captured_defaults() {
    let mut rig = build_rig(RigSpec {
        set_ktau: true,
        set_bemf: true,
        ktau: vec![7.0, 7.5],
        bemf: vec![0.9, 0.95],
        ..RigSpec::basic(2)
    });
    configure_and_initialize(&mut rig, 2);

    rig.host.set_input_buffer(0, vec![100.0, 200.0]);
    rig.block.output(&rig.host).unwrap();

    // Device now carries the applied values.
    assert_eq!(rig.sim.borrow().motor_params()[0].ktau, 7.0);
    assert_eq!(
        rig.sim.borrow().pids(PidControlType::Position)[0].kp,
        100.0
    );

    rig.block.terminate(&rig.host).unwrap();

    let sim = rig.sim.borrow();
    assert_eq!(
        sim.pids(PidControlType::Position),
        default_pids(2).as_slice()
    );
    assert_eq!(sim.motor_params(), default_motor_params(2).as_slice());
}

#[test]
fn terminate_is_safe_after_failed_initialize() {
    let mut rig = build_rig(RigSpec {
        ktau: vec![1.0], // wrong length for DoFs=2
        ..RigSpec::basic(2)
    });
    rig.block.configure_size_and_ports(&mut rig.host).unwrap();
    rig.host.set_input_buffer(0, vec![0.0, 0.0]);
    assert!(rig.block.initialize(&mut rig.host).is_err());

    // Nothing was captured, so terminate restores nothing and succeeds.
    rig.block.terminate(&rig.host).unwrap();
    assert_eq!(rig.sim.borrow().pid_writes, 0);
}

#[test]
fn terminate_partial_torque_restore_still_succeeds() {
    let mut rig = build_rig(RigSpec {
        set_ktau: true,
        ktau: vec![5.0, 6.0],
        ..RigSpec::basic(2)
    });
    configure_and_initialize(&mut rig, 2);

    rig.host.set_input_buffer(0, vec![0.0, 0.0]);
    rig.block.output(&rig.host).unwrap();

    rig.sim.borrow_mut().fail_torque_writes_from = Some(1);
    rig.block.terminate(&rig.host).unwrap();

    let sim = rig.sim.borrow();
    // Joint 0 restored, joint 1 kept the applied override.
    assert_eq!(sim.motor_params()[0], default_motor_params(2)[0]);
    assert_eq!(sim.motor_params()[1].ktau, 6.0);
}

#[test]
fn terminate_fails_when_pid_restore_fails() {
    let mut rig = build_rig(RigSpec::basic(2));
    configure_and_initialize(&mut rig, 2);

    rig.sim.borrow_mut().fail_pid_io = true;
    assert!(rig.block.terminate(&rig.host).is_err());
}
