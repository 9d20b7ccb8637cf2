//! Block parameter metadata and typed parameter store.
//!
//! A block declares the parameters it expects through [`ParameterMetadata`]
//! (type, host-side index, shape, name). The host parses the raw parameter
//! set against the declared metadata and hands back a [`Parameters`] store
//! with typed getters. Shape checks happen at parse time; getter failures
//! only occur when a block asks for a name or type it never declared.

use thiserror::Error;

/// Scalar type of a block parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    /// Boolean flag.
    Bool,
    /// Real scalar or real vector.
    Double,
    /// String.
    String,
}

/// One dimension of a parameter or port shape.
///
/// `Dynamic` dimensions are resolved by the host when the enclosing model
/// is compiled; validation against the robot's DoFs happens in the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    /// Fixed length.
    Fixed(usize),
    /// Length decided by the host at model-compile time.
    Dynamic,
}

impl Dim {
    /// Whether `len` satisfies this dimension.
    #[inline]
    pub fn accepts(&self, len: usize) -> bool {
        match self {
            Dim::Fixed(n) => *n == len,
            Dim::Dynamic => true,
        }
    }
}

/// Declared metadata for one block parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMetadata {
    /// Scalar type.
    pub ptype: ParameterType,
    /// Position in the host's ordered parameter list.
    pub index: usize,
    /// Row count (1 for everything this toolbox declares).
    pub rows: usize,
    /// Column count, possibly dynamic.
    pub cols: Dim,
    /// Parameter name, the key used for lookup after parsing.
    pub name: &'static str,
}

impl ParameterMetadata {
    /// Scalar (1x1) parameter metadata.
    pub const fn scalar(ptype: ParameterType, index: usize, name: &'static str) -> Self {
        Self {
            ptype,
            index,
            rows: 1,
            cols: Dim::Fixed(1),
            name,
        }
    }

    /// Dynamic-width row-vector parameter metadata.
    pub const fn dynamic_vector(ptype: ParameterType, index: usize, name: &'static str) -> Self {
        Self {
            ptype,
            index,
            rows: 1,
            cols: Dim::Dynamic,
            name,
        }
    }
}

/// Parameter parsing and lookup errors.
#[derive(Debug, Clone, Error)]
pub enum ParameterError {
    /// No value supplied for a declared parameter.
    #[error("parameter '{0}' is missing")]
    Missing(String),

    /// Supplied value has the wrong type.
    #[error("parameter '{name}' has the wrong type (expected {expected})")]
    TypeMismatch {
        /// Parameter name.
        name: String,
        /// Human-readable expected type.
        expected: &'static str,
    },

    /// Supplied value has the wrong shape.
    #[error("parameter '{name}' has length {actual}, expected {expected}")]
    ShapeMismatch {
        /// Parameter name.
        name: String,
        /// Declared length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// Metadata registration failed (duplicate name or index).
    #[error("parameter metadata rejected: {0}")]
    Metadata(String),
}

/// A parsed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Boolean flag.
    Bool(bool),
    /// Real scalar.
    Double(f64),
    /// String.
    String(String),
    /// Real vector.
    DoubleVec(Vec<f64>),
}

impl ParameterValue {
    /// Whether this value is acceptable for the given metadata.
    pub fn matches(&self, md: &ParameterMetadata) -> Result<(), ParameterError> {
        let type_err = || ParameterError::TypeMismatch {
            name: md.name.to_string(),
            expected: match md.ptype {
                ParameterType::Bool => "bool",
                ParameterType::Double => "double",
                ParameterType::String => "string",
            },
        };

        match (md.ptype, self) {
            (ParameterType::Bool, ParameterValue::Bool(_)) => Ok(()),
            (ParameterType::String, ParameterValue::String(_)) => Ok(()),
            (ParameterType::Double, ParameterValue::Double(_)) => {
                if md.cols.accepts(1) {
                    Ok(())
                } else {
                    Err(ParameterError::ShapeMismatch {
                        name: md.name.to_string(),
                        expected: match md.cols {
                            Dim::Fixed(n) => n,
                            Dim::Dynamic => 1,
                        },
                        actual: 1,
                    })
                }
            }
            (ParameterType::Double, ParameterValue::DoubleVec(v)) => {
                if md.cols.accepts(v.len()) {
                    Ok(())
                } else {
                    Err(ParameterError::ShapeMismatch {
                        name: md.name.to_string(),
                        expected: match md.cols {
                            Dim::Fixed(n) => n,
                            Dim::Dynamic => v.len(),
                        },
                        actual: v.len(),
                    })
                }
            }
            _ => Err(type_err()),
        }
    }
}

/// Parsed parameter store with typed getters.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    entries: Vec<(String, ParameterValue)>,
}

impl Parameters {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a parsed value.
    pub fn insert(&mut self, name: impl Into<String>, value: ParameterValue) {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    fn get(&self, name: &str) -> Result<&ParameterValue, ParameterError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| ParameterError::Missing(name.to_string()))
    }

    /// Boolean parameter by name.
    pub fn get_bool(&self, name: &str) -> Result<bool, ParameterError> {
        match self.get(name)? {
            ParameterValue::Bool(b) => Ok(*b),
            _ => Err(ParameterError::TypeMismatch {
                name: name.to_string(),
                expected: "bool",
            }),
        }
    }

    /// String parameter by name.
    pub fn get_string(&self, name: &str) -> Result<&str, ParameterError> {
        match self.get(name)? {
            ParameterValue::String(s) => Ok(s),
            _ => Err(ParameterError::TypeMismatch {
                name: name.to_string(),
                expected: "string",
            }),
        }
    }

    /// Real-vector parameter by name. A scalar double is returned as a
    /// one-element vector, matching how hosts pass 1x1 numeric parameters.
    pub fn get_f64_vec(&self, name: &str) -> Result<Vec<f64>, ParameterError> {
        match self.get(name)? {
            ParameterValue::DoubleVec(v) => Ok(v.clone()),
            ParameterValue::Double(d) => Ok(vec![*d]),
            _ => Err(ParameterError::TypeMismatch {
                name: name.to_string(),
                expected: "double",
            }),
        }
    }
}
