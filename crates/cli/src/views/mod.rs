//! View controllers
//!
//! Each view owns an explicit state record, one busy flag, and a backend
//! client. Operations follow one policy: a client-side guard may skip the
//! request, otherwise the request runs under the busy guard and either
//! updates state or is logged and dropped.

pub mod catalog;
pub mod generator;

#[cfg(test)]
mod fakes;

pub use catalog::{CatalogManager, CatalogState};
pub use generator::{GeneratorState, InstructionGenerator};

use std::fmt;

use crate::client::ApiError;

/// Result of a view operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The request succeeded and state was updated
    Applied,
    /// A client-side guard refused the operation; nothing was sent
    Skipped(SkipReason),
    /// The request failed and was logged
    Failed(String),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }

    fn failed(action: &str, err: ApiError) -> Self {
        tracing::error!(error = %err, "Error {}", action);
        Outcome::Failed(format!("{}: {}", action, err))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Applied => write!(f, "done"),
            Outcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            Outcome::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Why an operation was not sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Another request of the same view is running
    Busy,
    MissingInput(&'static str),
    NothingSelected(&'static str),
    /// The ID is not in the last-fetched list
    UnknownSelection(String),
    Unchanged,
    NoInstructions,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Busy => write!(f, "another request is in progress"),
            SkipReason::MissingInput(what) => write!(f, "{} is required", what),
            SkipReason::NothingSelected(what) => write!(f, "no {} selected", what),
            SkipReason::UnknownSelection(what) => write!(f, "{} is not in the current list", what),
            SkipReason::Unchanged => write!(f, "selection unchanged"),
            SkipReason::NoInstructions => write!(f, "no instructions to improve"),
        }
    }
}
