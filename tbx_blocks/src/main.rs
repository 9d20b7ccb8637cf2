//! # Toolbox Demo Runner
//!
//! Drives the motor-parameter block through its full lifecycle against
//! the simulated actuators, standing in for the block-diagram host.
//!
//! # Usage
//!
//! ```bash
//! # Two simulated joints, three steps
//! tbx_demo
//!
//! # Robot description from a TOML file, verbose logging
//! tbx_demo --config robot.toml --steps 5 -v
//! ```

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use tbx_blocks::SetMotorParameters;
use tbx_core::block::Block;
use tbx_core::host::BufferedHost;
use tbx_core::params::ParameterValue;
use tbx_core::robot::config::RobotConfiguration;
use tbx_core::robot::device::PidControlType;
use tbx_core::robot::interface::RobotInterface;
use tbx_core::robot::sim::SimActuators;

/// Motor-parameter block demo against simulated actuators
#[derive(Parser, Debug)]
#[command(name = "tbx_demo")]
#[command(version)]
#[command(about = "Runs the SetMotorParameters block lifecycle on a simulated robot")]
struct Args {
    /// Path to a robot description TOML (name + controlled_joints).
    /// Defaults to a built-in two-joint robot.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of execution steps to run
    #[arg(long, default_value_t = 3)]
    steps: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("demo run failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args);

    info!("toolbox demo v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => RobotConfiguration::from_toml_file(path)?,
        None => RobotConfiguration::new("sim", vec!["joint_0".into(), "joint_1".into()])?,
    };
    let dofs = config.dofs();
    info!("robot '{}' with {dofs} controlled joints", config.name);

    let sim = Rc::new(RefCell::new(SimActuators::new(dofs)));
    let robot = RobotInterface::new(config)
        .with_pid_control(sim.clone())
        .with_torque_control(sim.clone());
    let mut block = SetMotorParameters::new(Rc::new(robot));

    // Host-side parameter set: drive P gains from the input port, leave
    // the torque-model coefficients at their device defaults.
    let mut host = BufferedHost::new();
    host.set_parameter("SetP", ParameterValue::Bool(true));
    host.set_parameter("SetI", ParameterValue::Bool(false));
    host.set_parameter("SetD", ParameterValue::Bool(false));
    host.set_parameter("ControlType", ParameterValue::String("Position".into()));
    host.set_parameter("SetKTau", ParameterValue::Bool(false));
    host.set_parameter("SetBemf", ParameterValue::Bool(false));
    host.set_parameter("KTau", ParameterValue::DoubleVec(vec![0.0; dofs]));
    host.set_parameter("Bemf", ParameterValue::DoubleVec(vec![0.0; dofs]));

    block.configure_size_and_ports(&mut host)?;
    info!("configured {} input port(s)", host.input_port_count());

    host.set_input_buffer(0, vec![0.0; dofs]);
    block.initialize(&mut host)?;
    info!("captured default gains: {:?}", block.pids_default());

    for step in 0..args.steps {
        // Gain ramp: every step raises each joint's proportional gain.
        let gains: Vec<f64> = (0..dofs).map(|j| (step * (j + 1)) as f64).collect();
        host.set_input_buffer(0, gains);
        block.output(&host)?;
        info!(
            step,
            pid_writes = sim.borrow().pid_writes,
            "step complete, applied gains: {:?}",
            block.pids_applied()
        );
    }

    block.terminate(&host)?;
    info!(
        "terminated, device gains restored: {:?}",
        sim.borrow().pids(PidControlType::Position)
    );

    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
