use failure::Fail;

use std::fmt;

/// Broad classification of an error, used by callers (CLI, HTTP handlers,
/// and so on) to map typed errors onto user-facing responses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The actor is not authorized to perform the attempted operation.
    Forbidden,
    /// The operation is not legal in the subject's current state.
    InvalidState,
    /// The payload was rejected by its validator.
    ValidationFailed,
    /// The referenced record does not exist.
    NotFound,
    /// An error the caller should not report in detail, such as a lost
    /// database connection.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match *self {
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidState => "invalid-state",
            ErrorKind::ValidationFailed => "validation-failed",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Internal => "internal",
        })
    }
}

/// An error that occurred while executing a workflow operation.
pub trait WorkflowError: Fail {
    /// Classification of this error.
    fn kind(&self) -> ErrorKind;

    /// Internal code describing this error.
    ///
    /// This code is used to identify this error outside the system, and thus
    /// should only be present for errors which are intended to be reported
    /// to the user in detail.
    fn code(&self) -> Option<&str>;
}
