//! Core algorithm trait definitions
//!
//! Every solver exposes the same small surface: a name, a category, a
//! description and string-keyed parameters validated on assignment.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;
use std::fmt::Debug;

use crate::algorithm::graph::flow::error::FlowError;

/// Errors of the algorithm framework
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlgorithmError {
    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(transparent)]
    Flow(#[from] FlowError),
}

/// Common interface of configurable solvers
///
/// # Invariants
/// - `set_parameter` either applies a value completely or leaves the solver
///   unchanged
/// - `get_parameters` reflects every successfully applied parameter
pub trait Algorithm: Debug + Send + Sync {
    /// Descriptive name of the active configuration
    fn name(&self) -> &str;

    /// Problem family (e.g. `max_flow`, `min_cut`)
    fn category(&self) -> &str;

    /// Short description of the method
    fn description(&self) -> &str;

    /// Set a parameter, validating its value
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError>;

    /// Current value of a parameter
    fn get_parameter(&self, name: &str) -> Option<&str>;

    /// All parameters
    fn get_parameters(&self) -> HashMap<String, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_error_converts() {
        let error: AlgorithmError = FlowError::SourceSinkSame(3).into();
        assert_eq!(error, AlgorithmError::Flow(FlowError::SourceSinkSame(3)));
        assert_eq!(error.to_string(), "Source and sink are the same vertex 3");
    }

    #[test]
    fn test_invalid_parameter_message() {
        let error = AlgorithmError::InvalidParameter {
            name: "algorithm".to_string(),
            reason: "unknown".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid parameter: algorithm - unknown");
    }
}
