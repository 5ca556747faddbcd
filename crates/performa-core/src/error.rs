//! Error types for the Performa modeling engine.

use thiserror::Error;

/// Main error type for deal analysis operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerformaError {
    /// Invalid `Deal`/`Settings` input: negative amounts, impossible dates,
    /// partnership shares that don't sum to 1.0 within tolerance.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A model attempted to post a transaction dated outside the active
    /// timeline. Indicates a model bug.
    #[error("posting at {date} falls outside the active timeline")]
    OutOfTimelineError { date: String },

    /// Topological sort detected a cycle among `CashFlowModel` dependencies.
    #[error("dependency cycle detected among models: {cycle:?}")]
    DependencyCycleError { cycle: Vec<String> },

    /// IRR or an iterative interest calculation failed to converge within
    /// the iteration/tolerance budget.
    #[error("{computation} failed to converge after {iterations} iterations")]
    ConvergenceError {
        computation: String,
        iterations: u32,
    },

    /// An append was attempted after the ledger's owning run finished.
    #[error("ledger is sealed; no further appends are permitted")]
    LedgerSealedError,

    /// A query expression referenced an unknown category/subcategory or was
    /// otherwise malformed.
    #[error("Query error: {0}")]
    QueryError(String),
}

impl PerformaError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create an out-of-timeline error for the given date.
    pub fn out_of_timeline(date: impl Into<String>) -> Self {
        Self::OutOfTimelineError { date: date.into() }
    }

    /// Create a dependency-cycle error.
    pub fn dependency_cycle(cycle: Vec<String>) -> Self {
        Self::DependencyCycleError { cycle }
    }

    /// Create a convergence error.
    pub fn convergence(computation: impl Into<String>, iterations: u32) -> Self {
        Self::ConvergenceError {
            computation: computation.into(),
            iterations,
        }
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// The model identifier implicated by this error, if any.
    pub fn offending_model_id(&self) -> Option<&str> {
        match self {
            Self::DependencyCycleError { cycle } => cycle.first().map(String::as_str),
            _ => None,
        }
    }

    /// Whether a caller could plausibly retry with adjusted input rather
    /// than treat this as an engine bug.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::ConfigurationError(_) | Self::QueryError(_))
    }
}

/// Result type alias used throughout the Performa workspace.
pub type PerformaResult<T> = Result<T, PerformaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_cycle_reports_first_offender() {
        let err = PerformaError::dependency_cycle(vec!["rent_roll".into(), "opex".into()]);
        assert_eq!(err.offending_model_id(), Some("rent_roll"));
    }

    #[test]
    fn configuration_errors_are_input_errors() {
        assert!(PerformaError::config("bad input").is_input_error());
        assert!(!PerformaError::LedgerSealedError.is_input_error());
    }
}
