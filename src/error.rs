use thiserror::Error;

/// Failure of a hydrogen ledger operation. The ledger enforces its mass
/// invariants independently of the dispatch engine's pre-computed bounds.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("cannot deposit a negative hydrogen mass ({mass} tH2)")]
    NegativeDeposit { mass: f64 },

    #[error("cannot withdraw a negative hydrogen mass ({requested} tH2)")]
    NegativeWithdrawal { requested: f64 },

    #[error("withdrawal of {requested} tH2 exceeds the stored {available} tH2")]
    Overdraw { requested: f64, available: f64 },
}

#[derive(Debug, Error)]
pub enum SimulationError {
    /// The configuration or the renewable series is incomplete or inconsistent.
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },

    /// An allocation would violate a physical invariant. Always fatal: this
    /// indicates a defect in the gate logic, not an operating condition.
    #[error("domain invariant violated at step {step}: {reason}")]
    DomainInvariant { step: usize, reason: String },

    #[error("hydrogen ledger failure at step {step}")]
    Ledger {
        step: usize,
        #[source]
        source: LedgerError,
    },
}

impl SimulationError {
    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration { reason: reason.into() }
    }

    pub(crate) fn invariant(step: usize, reason: impl Into<String>) -> Self {
        Self::DomainInvariant { step, reason: reason.into() }
    }
}

pub type Result<T, E = SimulationError> = std::result::Result<T, E>;
