use std::io;
use thiserror::Error;

use crate::session::SessionState;

/// Errors returned by `Session` operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Opening the transport failed
    #[error("io error: {0}")]
    Io(#[source] io::Error),
    /// Writing a frame to the stream failed
    #[error("transmit error: {0}")]
    Transmit(#[source] io::Error),
    /// The frame violates the wire format and was not written
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    /// Reading a reply from the stream failed
    #[error("receive error: {0}")]
    Receive(#[source] io::Error),
    /// The stream ended before any reply line arrived
    #[error("empty reply: stream closed before any reply line arrived")]
    EmptyReply,
    /// The broker answered with an ERROR reply; carries the full reply text
    #[error("protocol error: {0}")]
    Protocol(String),
    /// CONNECT did not produce a successful reply
    #[error("connect failed: {0}")]
    ConnectFailure(#[source] Box<SessionError>),
    /// SUBSCRIBE could not be sent
    #[error("subscribe failed: {0}")]
    SubscribeFailure(#[source] Box<SessionError>),
    /// An operation was attempted in a state that does not allow it
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
}

impl SessionError {
    /// True for failures that end the session before its main phase.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Io(_)
                | SessionError::ConnectFailure(_)
                | SessionError::SubscribeFailure(_)
                | SessionError::InvalidState { .. }
        )
    }

    /// The broker's ERROR text, looking through connect/subscribe wrappers.
    pub fn protocol_text(&self) -> Option<&str> {
        match self {
            SessionError::Protocol(text) => Some(text),
            SessionError::ConnectFailure(inner) | SessionError::SubscribeFailure(inner) => {
                inner.protocol_text()
            }
            _ => None,
        }
    }
}
