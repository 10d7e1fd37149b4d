use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{Id, RecordKind};

/// Validation messages keyed by wire field name.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

/// Failure while walking an inheritance chain.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("broken inheritance chain: {kind} {id} referenced by `{attribute}` does not exist")]
    BrokenChain {
        attribute: &'static str,
        kind: RecordKind,
        id: Id,
    },
    #[error("stored {kind} has a malformed `{attribute}`: {source}")]
    Malformed {
        kind: RecordKind,
        attribute: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("{} {id} not found", .kind.label())]
    NotFound { kind: RecordKind, id: Id },
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl Error {
    /// Validation error carrying a single message.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Error::Validation(errors)
    }

    pub fn not_found(kind: RecordKind, id: Id) -> Self {
        Error::NotFound { kind, id }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
