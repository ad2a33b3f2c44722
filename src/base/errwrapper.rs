//! Classified errors with operation provenance.
//!
//! A [`WrappedError`] is created once, where an error is first observed,
//! and then travels up through the decorator layers. Re-wrapping never
//! reclassifies: the failure stays the same and only the operation may
//! change, following [`WrappedError::new`]'s provenance rule.
//!
//! # Example
//!
//! ```rust,ignore
//! use probenet::base::classify::classify_generic_error;
//! use probenet::base::errwrapper::WrappedError;
//! use probenet::base::operation::Operation;
//!
//! let err = WrappedError::new(classify_generic_error, Operation::Connect, io_err);
//! assert_eq!(err.to_string(), "connection_refused");
//! ```

use crate::base::classify::{classify_generic_error, Classifier};
use crate::base::failure::Failure;
use crate::base::neterror::NetError;
use crate::base::operation::Operation;
use serde::{Serialize, Serializer};
use std::{error::Error, fmt, io, sync::Arc};

/// An error with its failure classification and the operation that failed.
#[derive(Debug, Clone)]
pub struct WrappedError {
    failure: Failure,
    operation: Operation,
    cause: Arc<NetError>,
}

impl WrappedError {
    /// Wraps `cause`.
    ///
    /// If `cause` is already wrapped, its failure is kept. Its operation is
    /// kept as well when it is a major operation, and the internal QUIC
    /// handshake markers become [`Operation::QuicHandshake`]; in every other
    /// case the new error is attributed to `operation`.
    pub fn new(classifier: Classifier, operation: Operation, cause: impl Into<NetError>) -> Self {
        let cause = cause.into();
        match cause.as_wrapped() {
            Some(child) => Self {
                failure: child.failure.clone(),
                operation: child.attributed_operation(operation),
                cause: child.cause.clone(),
            },
            None => Self {
                failure: classifier(&cause),
                operation,
                cause: Arc::new(cause),
            },
        }
    }

    /// Like [`WrappedError::new`], but tolerates a missing cause.
    pub fn maybe_new(
        classifier: Classifier,
        operation: Operation,
        cause: Option<NetError>,
    ) -> Option<Self> {
        cause.map(|cause| Self::new(classifier, operation, cause))
    }

    /// Wraps `cause` with the generic classifier and [`Operation::TopLevel`].
    pub fn top_level(cause: impl Into<NetError>) -> Self {
        Self::new(classify_generic_error, Operation::TopLevel, cause)
    }

    fn attributed_operation(&self, requested: Operation) -> Operation {
        if self.operation.is_major() {
            self.operation
        } else if self.operation.is_quic_handshake_marker() {
            Operation::QuicHandshake
        } else {
            requested
        }
    }

    pub fn failure(&self) -> &Failure {
        &self.failure
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The underlying, unclassified error.
    pub fn cause(&self) -> &NetError {
        &self.cause
    }

    /// Best-effort `io::ErrorKind` for this failure, used when the error has
    /// to travel through `AsyncRead`/`AsyncWrite`.
    pub fn io_kind(&self) -> io::ErrorKind {
        match self.failure {
            Failure::EofError => io::ErrorKind::UnexpectedEof,
            Failure::GenericTimeout | Failure::TimedOut => io::ErrorKind::TimedOut,
            Failure::ConnectionReset => io::ErrorKind::ConnectionReset,
            Failure::ConnectionRefused => io::ErrorKind::ConnectionRefused,
            Failure::ConnectionAborted => io::ErrorKind::ConnectionAborted,
            Failure::NotConnected => io::ErrorKind::NotConnected,
            Failure::Interrupted => io::ErrorKind::Interrupted,
            _ => io::ErrorKind::Other,
        }
    }
}

impl fmt::Display for WrappedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure.as_str())
    }
}

impl Error for WrappedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

impl Serialize for WrappedError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.failure.serialize(serializer)
    }
}

/// Extension trait for wrapping errors at call sites.
pub trait ResultExt<T> {
    /// Wraps the error, if any, with `classifier` and `operation`.
    fn wrap_err(self, classifier: Classifier, operation: Operation) -> Result<T, NetError>;
}

impl<T, E: Into<NetError>> ResultExt<T> for Result<T, E> {
    fn wrap_err(self, classifier: Classifier, operation: Operation) -> Result<T, NetError> {
        self.map_err(|e| NetError::Wrapped(WrappedError::new(classifier, operation, e)))
    }
}
