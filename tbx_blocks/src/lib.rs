//! # Toolbox Blocks
//!
//! Control blocks built on [`tbx_core`]. Currently a single block:
//! [`set_motor_parameters::SetMotorParameters`], which adjusts PID gains
//! and motor torque-model coefficients on the robot's actuators.

pub mod set_motor_parameters;

pub use set_motor_parameters::SetMotorParameters;
