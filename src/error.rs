//! Error types for EtherNet/IP and CIP communication.
//!
//! Every fallible operation in this crate returns [`Result<T>`]. Errors fall
//! into three broad classes:
//!
//! - **Transport** ([`EipError::Io`], [`EipError::Timeout`],
//!   [`EipError::Truncated`]): the TCP connection is gone or desynchronized;
//!   the session drops to the closed state and the caller must reconnect.
//! - **Encapsulation** ([`EipError::EncapStatus`],
//!   [`EipError::CommandMismatch`]): the EIP header of a reply was not what
//!   the sent command called for. Fatal for the current call only.
//! - **CIP and caller-side** ([`EipError::CipStatus`], [`EipError::Parse`],
//!   [`EipError::TypeMismatch`], [`EipError::Precondition`]): reported as
//!   values and never tear the session down.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EipError>;

/// Errors that can occur while talking to an EtherNet/IP controller.
#[derive(Debug, Error)]
pub enum EipError {
    /// TCP-level connect, read, or write failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read or write did not complete within the configured deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The peer closed the connection before a full frame arrived.
    #[error("truncated frame: expected {expected} bytes, received {received}")]
    Truncated {
        /// Bytes the frame required.
        expected: usize,
        /// Bytes actually read before EOF.
        received: usize,
    },

    /// The encapsulation header of a reply carried a non-zero status.
    #[error("encapsulation status 0x{code:08X}")]
    EncapStatus {
        /// Status word from the reply header.
        code: u32,
    },

    /// The reply echoed a different command than the one sent.
    #[error("unexpected reply command: expected 0x{expected:04X}, got 0x{actual:04X}")]
    CommandMismatch {
        /// Command code that was sent.
        expected: u16,
        /// Command code the reply carried.
        actual: u16,
    },

    /// The controller rejected a CIP service with a non-zero general status.
    #[error("CIP error 0x{code:02X}: {description}")]
    CipStatus {
        /// CIP general status byte.
        code: u8,
        /// Human-readable description from the status table.
        description: &'static str,
    },

    /// Response bytes were malformed or too short to parse.
    #[error("parse error: {0}")]
    Parse(String),

    /// A typed read returned a different CIP data type than declared.
    #[error("data type mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    TypeMismatch {
        /// Declared CIP data type code.
        expected: u8,
        /// Data type code found in the response.
        actual: u8,
    },

    /// An operation was attempted in the wrong state, or a write value did
    /// not match its declared type. Raised before any I/O happens.
    #[error("{0}")]
    Precondition(String),
}

impl EipError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        EipError::Parse(msg.into())
    }

    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        EipError::Precondition(msg.into())
    }

    /// True for errors that indicate the TCP connection itself failed.
    ///
    /// After a transport error the session is closed and only a reconnect
    /// can recover it.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            EipError::Io(_) | EipError::Timeout(_) | EipError::Truncated { .. }
        )
    }

    /// True for transport failures worth retrying: deadline expiry and
    /// connection-reset-class errors.
    ///
    /// CIP statuses, type mismatches, and precondition failures are
    /// deterministic and never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            EipError::Timeout(_) => true,
            EipError::Truncated { .. } => true,
            EipError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cip_status_display() {
        let err = EipError::CipStatus {
            code: 0x01,
            description: "Connection failure",
        };
        assert_eq!(err.to_string(), "CIP error 0x01: Connection failure");
    }

    #[test]
    fn type_mismatch_display() {
        let err = EipError::TypeMismatch {
            expected: 0xC4,
            actual: 0xCA,
        };
        assert_eq!(
            err.to_string(),
            "data type mismatch: expected 0xC4, got 0xCA"
        );
    }

    #[test]
    fn transport_classification() {
        assert!(EipError::Timeout(Duration::from_secs(1)).is_transport());
        assert!(EipError::Truncated {
            expected: 24,
            received: 3
        }
        .is_transport());
        assert!(EipError::Io(io::Error::new(io::ErrorKind::Other, "boom")).is_transport());
        assert!(!EipError::EncapStatus { code: 0x69 }.is_transport());
        assert!(!EipError::Precondition("nope".into()).is_transport());
    }

    #[test]
    fn retryable_classification() {
        assert!(EipError::Timeout(Duration::from_millis(50)).is_retryable());
        assert!(EipError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "rst")).is_retryable());
        assert!(EipError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe")).is_retryable());
        // A refused connect is not transient in the retry sense.
        assert!(
            !EipError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
                .is_retryable()
        );
        assert!(!EipError::CipStatus {
            code: 0x05,
            description: "Path destination unknown"
        }
        .is_retryable());
        assert!(!EipError::TypeMismatch {
            expected: 0xC4,
            actual: 0xCA
        }
        .is_retryable());
    }
}
