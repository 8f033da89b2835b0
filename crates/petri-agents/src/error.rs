//! Error types for the petri-agents crate.
//!
//! Rule construction fails fast with a [`RuleError`] when configuration is
//! loaded. Per-tick operations fail with an [`AgentError`]; in practice the
//! only runtime failure is running out of cell ids.

use petri_types::{ActionKind, IdExhausted, UnknownVariant};

/// A behavior rule or species profile could not be built.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    /// The action kind string did not name a known action.
    #[error("invalid action kind: {source}")]
    UnknownAction {
        /// The underlying parse error.
        #[from]
        source: UnknownVariant,
    },

    /// The action needs a target but no target species was given.
    #[error("action `{action}` requires a target species")]
    MissingTarget {
        /// The action that was configured.
        action: ActionKind,
    },

    /// A `min`/`max` pair is inverted.
    #[error("inverted bounds on {field}: min {min} > max {max}")]
    InvertedBounds {
        /// Which constraint the bounds belong to.
        field: &'static str,
        /// Configured lower bound.
        min: f64,
        /// Configured upper bound.
        max: f64,
    },

    /// A numeric parameter is NaN, infinite, or negative where that is not
    /// allowed.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// Which parameter was rejected.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Errors that can occur while updating cells.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Spawning a cell needed an id and none were left.
    #[error("cannot spawn cell: {source}")]
    IdExhausted {
        /// The underlying id generator error.
        #[from]
        source: IdExhausted,
    },

    /// An arithmetic overflow occurred in integer bookkeeping.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}
