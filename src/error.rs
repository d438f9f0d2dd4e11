//! Typed errors: schema/config problems and runtime synchronization failures.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate field name '{name}' in module {module}")]
    DuplicateField { module: String, name: String },
    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
    /// A module was left out of a generation batch. Recoverable: the rest of the batch proceeds.
    #[error("generation skipped for module {module}: {reason}")]
    GenerationSkipped { module: String, reason: String },
}

/// Failure at the transport boundary (connectivity, authentication). Always fatal for the call.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection: {0}")]
    Connection(String),
    #[error("authentication: {0}")]
    Auth(String),
    #[error("http status {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Error, Debug)]
pub enum CrmError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("remote error {code}: {message}")]
    Remote { code: String, message: String },
    #[error("unknown response shape for {operation} on module {module}")]
    UnknownResponseShape { module: String, operation: String },
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("batch count mismatch while {action} {module}: {sent} sent, {received} returned")]
    BatchCountMismatch {
        action: &'static str,
        module: String,
        sent: usize,
        received: usize,
    },
    #[error(transparent)]
    PartialBatchFailure(#[from] BatchFailure),
    #[error("cannot parse {value:?} as a date for field {field} of record '{record_id}'")]
    TemporalParse {
        field: String,
        value: String,
        record_id: String,
    },
    #[error("field {field}: expected {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CrmError {
    fn from(e: serde_json::Error) -> Self {
        CrmError::Malformed(e.to_string())
    }
}

/// Why one object of a bulk call was not synchronized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureCause {
    /// The remote rejected the row with its own error code.
    Rejected { code: String, message: String },
    /// The row succeeded but echoed a different record id than the one submitted.
    IdMismatch { expected: String, returned: String },
    /// The row succeeded without echoing any record id.
    MissingId,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Rejected { code, message } => write!(f, "rejected ({}): {}", code, message),
            FailureCause::IdMismatch { expected, returned } => {
                write!(f, "id mismatch: sent '{}', remote returned '{}'", expected, returned)
            }
            FailureCause::MissingId => write!(f, "remote returned no record id"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedItem {
    /// Position of the object in the slice handed to the bulk operation.
    pub index: usize,
    /// Record id of the object at submission time (empty for inserts).
    pub id: String,
    pub cause: FailureCause,
}

/// Aggregate of per-object failures in a bulk insert/update. Objects not listed here were
/// synchronized and are not rolled back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchFailure {
    pub action: &'static str,
    pub module: String,
    pub succeeded: usize,
    pub failures: Vec<FailedItem>,
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} objects could not be {} in {}",
            self.failures.len(),
            self.failures.len() + self.succeeded,
            self.action,
            self.module
        )?;
        if let Some(first) = self.failures.first() {
            write!(f, " (first: #{} {})", first.index, first.cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchFailure {}

impl BatchFailure {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }
}
