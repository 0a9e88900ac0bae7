use thiserror::Error;

use crate::class::DataClass;

/// Outcome of a refresh that did not fail.
///
/// A class listed in `discarded` was fetched but not applied: the session
/// changed while it was in flight, or a newer result was already in place.
/// That is expected and never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub applied: Vec<DataClass>,
    pub discarded: Vec<DataClass>,
    /// Classes satisfied by a fetch another caller ran after this one asked.
    pub joined: Vec<DataClass>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("refresh failed: {}", describe(.failures))]
    Failed { failures: Vec<(DataClass, String)> },
}

impl RefreshError {
    pub fn failures(&self) -> &[(DataClass, String)] {
        match self {
            RefreshError::Failed { failures } => failures,
        }
    }
}

fn describe(failures: &[(DataClass, String)]) -> String {
    failures
        .iter()
        .map(|(class, cause)| format!("{class}: {cause}"))
        .collect::<Vec<_>>()
        .join("; ")
}
