//! Input-port signals and port specifications.
//!
//! A [`Signal`] is a borrowed view over one real-valued input port for the
//! current execution step. Port widths may be declared [`Dim::Dynamic`];
//! the host resolves them at model-compile time and the block validates
//! the resolved width against the robot's DoFs during initialization.

use crate::params::Dim;
use thiserror::Error;

/// Port allocation and access errors.
#[derive(Debug, Clone, Error)]
pub enum PortError {
    /// No port exists at the given index.
    #[error("no input port at index {0}")]
    UnknownPort(usize),

    /// A channel was enabled but never bound to a port.
    #[error("{0} channel has no bound input port")]
    Unbound(&'static str),

    /// The port table handed to the host was rejected.
    #[error("port allocation rejected: {0}")]
    Allocation(String),

    /// No signal is available on a bound port for this step.
    #[error("no signal available on input port {0}")]
    NoSignal(usize),
}

/// Specification of one input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    /// Port index, contiguous from 0.
    pub index: usize,
    /// Declared width.
    pub width: Dim,
}

impl PortSpec {
    /// Dynamic-width real-vector port.
    pub const fn dynamic(index: usize) -> Self {
        Self {
            index,
            width: Dim::Dynamic,
        }
    }
}

/// Validate that a port table is contiguous from index 0.
///
/// Hosts install the whole table atomically; a rejected table must leave
/// no port bound.
pub fn validate_port_table(ports: &[PortSpec]) -> Result<(), PortError> {
    for (i, spec) in ports.iter().enumerate() {
        if spec.index != i {
            return Err(PortError::Allocation(format!(
                "port indices must be contiguous from 0 (slot {i} declares index {})",
                spec.index
            )));
        }
    }
    Ok(())
}

/// Borrowed real-valued input signal for one step.
#[derive(Debug, Clone, Copy)]
pub struct Signal<'a> {
    data: &'a [f64],
}

impl<'a> Signal<'a> {
    /// Wrap a slice of samples.
    pub const fn new(data: &'a [f64]) -> Self {
        Self { data }
    }

    /// Number of samples (the resolved port width).
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the signal carries no samples.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The samples as a slice.
    #[inline]
    pub const fn as_slice(&self) -> &'a [f64] {
        self.data
    }
}
