//! Robot interface layer: description, device capabilities, simulation.

pub mod config;
pub mod device;
pub mod interface;
pub mod sim;
