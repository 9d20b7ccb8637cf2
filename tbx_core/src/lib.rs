//! # Toolbox Core
//!
//! Core library for block-diagram robot control blocks. A block declares
//! parameters and input ports, is driven by a host runtime through a
//! synchronous lifecycle (configure → initialize → output×N → terminate),
//! and talks to actuators only through narrow device-capability traits.
//!
//! ## Modules
//!
//! - [`block`] — lifecycle trait and aggregate error
//! - [`params`] — parameter metadata and typed store
//! - [`signal`] — input signals and port specs
//! - [`host`] — host boundary + in-memory implementation
//! - [`robot`] — robot description, device capabilities, simulation

pub mod block;
pub mod host;
pub mod params;
pub mod robot;
pub mod signal;
