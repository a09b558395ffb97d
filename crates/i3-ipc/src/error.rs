//! Error types for i3 IPC operations

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Broad category of an [`I3Error`]
///
/// Callers that only care about how to react to a failure (retry the
/// connection, report a bug, show the user a message) can match on this
/// instead of on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No running i3 instance could be located
    Discovery,
    /// OS-level failure of the socket (connect, read, write)
    Transport,
    /// i3 sent something that does not fit the protocol
    BadMessage,
    /// Well-formed message carrying a value this library does not know yet
    Unsupported,
    /// i3 understood the request but declined it
    InvalidArgument,
}

/// Errors that can occur when communicating with the i3 window manager
#[derive(Debug, Error, Diagnostic)]
pub enum I3Error {
    /// Neither `I3SOCK` nor `i3 --get-socketpath` produced a socket path
    #[error("Unable to find i3 socket path: {reason} - is i3 running?")]
    #[diagnostic(code(i3_ipc::discovery))]
    SocketPathUnavailable { reason: String },

    /// The socket path does not exist
    #[error("i3 socket not found at {path}")]
    #[diagnostic(code(i3_ipc::discovery))]
    SocketNotFound { path: PathBuf },

    /// Failed to connect to the i3 socket
    #[error("Failed to connect to i3 socket at {path}: {source}")]
    #[diagnostic(code(i3_ipc::transport))]
    ConnectionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a message to i3
    #[error("Failed to send message to i3: {0}")]
    #[diagnostic(code(i3_ipc::transport))]
    SendFailed(#[source] std::io::Error),

    /// Failed to read a message from i3, including the peer closing mid-frame
    #[error("Failed to receive message from i3: {0}")]
    #[diagnostic(code(i3_ipc::transport))]
    ReceiveFailed(#[source] std::io::Error),

    /// i3 sent a message that is inconsistent with the protocol
    #[error("Bad message from i3: {message}")]
    #[diagnostic(
        code(i3_ipc::bad_message),
        help("This is an inconsistency between i3 and this library; please report it.")
    )]
    BadMessage { message: String },

    /// A message payload was not valid JSON
    #[error("Bad message from i3: payload is not valid JSON: {0}")]
    #[diagnostic(
        code(i3_ipc::bad_message),
        help("This is an inconsistency between i3 and this library; please report it.")
    )]
    MalformedPayload(#[source] serde_json::Error),

    /// A field holds a value outside the set this library understands
    #[error("Unsupported value for \"{field}\": \"{value}\"")]
    #[diagnostic(
        code(i3_ipc::unsupported),
        help("i3 is probably newer than this library.")
    )]
    Unsupported { field: String, value: String },

    /// i3 declined the request
    #[error("{message}")]
    #[diagnostic(code(i3_ipc::invalid_argument))]
    InvalidArgument { message: String },
}

impl I3Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            I3Error::SocketPathUnavailable { .. } | I3Error::SocketNotFound { .. } => {
                ErrorKind::Discovery
            }
            I3Error::ConnectionFailed { .. }
            | I3Error::SendFailed(_)
            | I3Error::ReceiveFailed(_) => ErrorKind::Transport,
            I3Error::BadMessage { .. } | I3Error::MalformedPayload(_) => ErrorKind::BadMessage,
            I3Error::Unsupported { .. } => ErrorKind::Unsupported,
            I3Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }

    pub(crate) fn bad_message(message: impl Into<String>) -> Self {
        I3Error::BadMessage {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(field: impl Into<String>, value: impl Into<String>) -> Self {
        I3Error::Unsupported {
            field: field.into(),
            value: value.into(),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        I3Error::InvalidArgument {
            message: message.into(),
        }
    }
}
