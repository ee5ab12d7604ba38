use std::io;
use std::io::ErrorKind::Other;

use thiserror::Error;
use url::ParseError;

use crate::ws::protocol::close;

#[derive(Error, Debug)]
pub enum Error {
    /// The peer initiated the closing handshake. The echo frame has already
    /// been sent (best effort) and the connection is closed.
    #[error("the peer has sent a close frame: status code {0}, reason: {1}")]
    ReceivedCloseFrame(u16, String),
    #[error("websocket protocol violation: {0}")]
    Protocol(&'static str),
    #[error("frame payload of {0} bytes exceeds the accepted maximum")]
    PayloadTooBig(usize),
    #[error("text frame payload is not valid UTF-8: {0}")]
    BadUtf8(#[from] std::string::FromUtf8Error),
    /// The connection has already transitioned to closed; the websocket can
    /// only be dropped.
    #[error("the websocket is closed")]
    Closed,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("url parse error: {0}")]
    InvalidUrl(#[from] ParseError),
}

impl Error {
    /// Most specific close code to send to the peer when this error forces
    /// the connection shut. `None` when no close frame should be attempted.
    pub(crate) const fn close_code(&self) -> Option<u16> {
        match self {
            Error::Protocol(_) => Some(close::PROTOCOL_ERROR),
            Error::PayloadTooBig(_) => Some(close::TOO_BIG),
            Error::BadUtf8(_) => Some(close::BAD_DATA),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        io::Error::new(Other, value)
    }
}
