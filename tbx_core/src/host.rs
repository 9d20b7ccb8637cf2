//! Host-context boundary and an in-memory implementation.
//!
//! [`BlockInformation`] is what a block sees of the host runtime:
//! parameter registration and parsing, port installation, and per-step
//! signal access. [`BufferedHost`] backs the boundary with plain maps and
//! buffers; it serves as the demo runtime and as the host double for the
//! block test suites.

use std::collections::HashMap;

use crate::params::{ParameterError, ParameterMetadata, ParameterValue, Parameters};
use crate::signal::{validate_port_table, PortError, PortSpec, Signal};

/// The host runtime as seen from a block.
pub trait BlockInformation {
    /// Register metadata for one parameter. Re-registering the same name
    /// with identical metadata is a no-op (parsing phases re-run).
    fn declare_parameter(&mut self, metadata: ParameterMetadata) -> Result<(), ParameterError>;

    /// Parse the raw parameter set against the declared metadata.
    fn parse_parameters(&self) -> Result<Parameters, ParameterError>;

    /// Install the block's input-port table atomically. On error no port
    /// from `ports` is left bound.
    fn set_input_ports(&mut self, ports: &[PortSpec]) -> Result<(), PortError>;

    /// Resolved width of one input port.
    fn input_port_width(&self, index: usize) -> Result<usize, PortError>;

    /// The signal bound to one input port for the current step.
    fn input_signal(&self, index: usize) -> Result<Signal<'_>, PortError>;
}

/// In-memory host context.
///
/// Raw parameter values are set with [`BufferedHost::set_parameter`]
/// before the compile phases run; input buffers are set per step with
/// [`BufferedHost::set_input_buffer`]. Dynamic port widths resolve to the
/// bound buffer's length.
#[derive(Debug, Default)]
pub struct BufferedHost {
    metadata: Vec<ParameterMetadata>,
    values: HashMap<String, ParameterValue>,
    ports: Vec<PortSpec>,
    buffers: HashMap<usize, Vec<f64>>,
}

impl BufferedHost {
    /// Empty host context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the raw value of one parameter.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: ParameterValue) {
        self.values.insert(name.into(), value);
    }

    /// Bind (or replace) the input buffer of one port.
    pub fn set_input_buffer(&mut self, index: usize, samples: Vec<f64>) {
        self.buffers.insert(index, samples);
    }

    /// Number of installed input ports.
    pub fn input_port_count(&self) -> usize {
        self.ports.len()
    }

    /// The installed port table.
    pub fn input_ports(&self) -> &[PortSpec] {
        &self.ports
    }
}

impl BlockInformation for BufferedHost {
    fn declare_parameter(&mut self, metadata: ParameterMetadata) -> Result<(), ParameterError> {
        if let Some(existing) = self.metadata.iter().find(|md| md.name == metadata.name) {
            if *existing == metadata {
                return Ok(());
            }
            return Err(ParameterError::Metadata(format!(
                "parameter '{}' re-declared with different metadata",
                metadata.name
            )));
        }
        if self.metadata.iter().any(|md| md.index == metadata.index) {
            return Err(ParameterError::Metadata(format!(
                "parameter index {} declared twice",
                metadata.index
            )));
        }
        self.metadata.push(metadata);
        Ok(())
    }

    fn parse_parameters(&self) -> Result<Parameters, ParameterError> {
        let mut parameters = Parameters::new();
        for md in &self.metadata {
            let value = self
                .values
                .get(md.name)
                .ok_or_else(|| ParameterError::Missing(md.name.to_string()))?;
            value.matches(md)?;
            parameters.insert(md.name, value.clone());
        }
        Ok(parameters)
    }

    fn set_input_ports(&mut self, ports: &[PortSpec]) -> Result<(), PortError> {
        validate_port_table(ports)?;
        // Whole-table replacement keeps installation atomic.
        self.ports = ports.to_vec();
        Ok(())
    }

    fn input_port_width(&self, index: usize) -> Result<usize, PortError> {
        let spec = self.ports.get(index).ok_or(PortError::UnknownPort(index))?;
        match self.buffers.get(&index) {
            Some(buf) => Ok(buf.len()),
            None => match spec.width {
                crate::params::Dim::Fixed(n) => Ok(n),
                crate::params::Dim::Dynamic => Err(PortError::NoSignal(index)),
            },
        }
    }

    fn input_signal(&self, index: usize) -> Result<Signal<'_>, PortError> {
        if index >= self.ports.len() {
            return Err(PortError::UnknownPort(index));
        }
        self.buffers
            .get(&index)
            .map(|buf| Signal::new(buf))
            .ok_or(PortError::NoSignal(index))
    }
}
