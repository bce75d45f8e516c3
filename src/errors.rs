use thiserror::Error;

use crate::core::state::StateId;
use crate::core::transition::TransitionId;

/// Error emitted when a transition label cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct LabelError {
    /// Human-readable error message.
    pub message: String,
}

impl LabelError {
    /// Creates a new [`LabelError`].
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error raised while loading or saving a machine.
///
/// Loading is all-or-nothing: when any variant of this error is returned,
/// the caller's existing model has not been touched.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed xml: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("unknown machine type `{0}`")]
    UnknownMachineType(String),
    #[error("duplicate state id {0}")]
    DuplicateStateId(StateId),
    #[error("duplicate transition id {0}")]
    DuplicateTransitionId(TransitionId),
    #[error("transition {transition} references missing state {state}")]
    DanglingEndpoint {
        transition: TransitionId,
        state: StateId,
    },
    #[error("missing `{0}`")]
    MissingField(&'static str),
    #[error("invalid {what}: `{value}`")]
    InvalidValue { what: &'static str, value: String },
    #[error(transparent)]
    Label(#[from] LabelError),
}
