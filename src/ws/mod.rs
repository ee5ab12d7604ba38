//! Websocket wire protocol engine.
//!
//! Operates directly on an already handshaken, non-blocking byte stream:
//! the HTTP upgrade is assumed complete by the time the engine owns the
//! socket. One engine instance owns exactly one connection and must be
//! driven from a single task.
//!
//! ## Examples
//!
//! Create a client engine over a freshly connected stream.
//! ```no_run
//! use framewire::stream::ConnectionInfo;
//! use framewire::ws::Websocket;
//!
//! let stream = ConnectionInfo::new("192.168.4.1", 8266).into_tcp_stream().unwrap();
//! let mut ws = Websocket::client(stream);
//! ```
//!
//! Poll for messages without ever blocking. Control frames are serviced on
//! every call, so occasional polling is enough to keep the connection alive.
//! ```no_run
//! use std::io::{Read, Write};
//! use framewire::ws::{Message, Websocket};
//!
//! fn poll<S: Read + Write>(ws: &mut Websocket<S>) {
//!     match ws.receive().unwrap() {
//!         Some(Message::Text(text)) => println!("{text}"),
//!         Some(Message::Binary(body)) => println!("{} bytes", body.len()),
//!         None => {} // no data ready right now
//!     }
//! }
//! ```
//!
//! Wait cooperatively for the next message, yielding between attempts.
//! ```no_run
//! use std::io::{Read, Write};
//! use std::time::Duration;
//! use framewire::idle::IdleStrategy;
//! use framewire::ws::{Message, Websocket};
//!
//! fn next_message<S: Read + Write>(ws: &mut Websocket<S>) -> Message {
//!     ws.receive_next(IdleStrategy::Sleep(Duration::from_millis(10))).unwrap()
//! }
//! ```

use std::io::{Read, Write};

use log::{debug, trace, warn};

use crate::buffer;
use crate::idle::IdleStrategy;
use crate::ws::decoder::Decoder;
use crate::ws::protocol::{close, OpCode};

// re-export
pub use crate::ws::error::Error;
pub use crate::ws::url::parse_url;

mod decoder;
mod encoder;
mod error;
pub mod mask;
pub mod protocol;
mod url;

type ReadBuffer = buffer::ReadBuffer<4096>;

/// Largest payload the engine accepts on receive before force closing the
/// connection with status code 1009.
pub const DEFAULT_MAX_PAYLOAD: usize = 1 << 20;

/// Upper bound on frames processed by a single `receive` call. Any fixed
/// bound keeps the keepalive guarantee while ruling out unbounded looping
/// on adversarial input; leftover frames are picked up by the next call.
const MAX_FRAMES_PER_CALL: usize = 64;

/// Which side of the connection this engine is. Determines the masking
/// policy in both directions: a client masks every outbound frame and
/// rejects masked inbound frames, a server does the opposite.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Client,
    Server,
}

/// Data message surfaced to the application. Control frames never appear
/// here, they are consumed by the receive loop.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Message {
    Text(String),
    Binary(Vec<u8>),
}

/// Single decoded frame, internal to the receive path.
#[derive(Debug)]
pub(crate) struct Frame {
    pub(crate) fin: bool,
    pub(crate) op_code: OpCode,
    pub(crate) payload: Vec<u8>,
}

/// Websocket engine that owns the underlying stream.
///
/// The stream must already be in non-blocking mode; `receive` never waits
/// for data and reports its absence as `Ok(None)`. Once the connection has
/// transitioned to closed (peer close handshake, local `close`, or a fatal
/// protocol/transport error) every further operation fails with
/// [`Error::Closed`] and the socket is released when the engine is dropped.
#[derive(Debug)]
pub struct Websocket<S> {
    stream: S,
    role: Role,
    closed: bool,
    decoder: Decoder,
}

impl<S> Websocket<S> {
    /// Creates a client side engine over a handshaken stream.
    pub fn client(stream: S) -> Self {
        Self::new(stream, Role::Client)
    }

    /// Creates a server side engine over a handshaken stream.
    pub fn server(stream: S) -> Self {
        Self::new(stream, Role::Server)
    }

    fn new(stream: S, role: Role) -> Self {
        Self {
            stream,
            role,
            closed: false,
            decoder: Decoder::new(DEFAULT_MAX_PAYLOAD),
        }
    }

    /// Overrides the maximum accepted receive payload.
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.decoder = Decoder::new(max_payload);
        self
    }

    /// Checks if the connection has transitioned to closed. This can be the
    /// result of an IO error, a fatal protocol violation, or either side
    /// initiating the close handshake.
    pub const fn closed(&self) -> bool {
        self.closed
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    #[inline]
    const fn ensure_not_closed(&self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::Closed);
        }
        Ok(())
    }
}

impl<S: Read + Write> Websocket<S> {
    #[inline]
    pub fn send_text(&mut self, body: &str) -> Result<(), Error> {
        self.send(OpCode::Text, body.as_bytes())
    }

    #[inline]
    pub fn send_binary(&mut self, body: &[u8]) -> Result<(), Error> {
        self.send(OpCode::Binary, body)
    }

    #[inline]
    pub fn send_ping(&mut self, body: &[u8]) -> Result<(), Error> {
        self.send(OpCode::Ping, body)
    }

    #[inline]
    pub fn send_pong(&mut self, body: &[u8]) -> Result<(), Error> {
        self.send(OpCode::Pong, body)
    }

    /// Polling receive. Drains whatever bytes the socket has ready, services
    /// any control frames found (auto-pong, close handshake) and returns the
    /// first data frame, or `Ok(None)` when no complete data frame is
    /// available. Never blocks.
    pub fn receive(&mut self) -> Result<Option<Message>, Error> {
        self.ensure_not_closed()?;

        if let Err(err) = self.decoder.read_from(&mut self.stream) {
            return Err(self.fail(err.into()));
        }

        for _ in 0..MAX_FRAMES_PER_CALL {
            let frame = match self.decoder.decode_next(self.role) {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(None),
                Err(err) => return Err(self.fail(err)),
            };
            trace!("received {:?} frame ({} bytes)", frame.op_code, frame.payload.len());

            match frame.op_code {
                OpCode::Ping => {
                    // answered before any data frame is surfaced so the
                    // keepalive holds even under infrequent polling
                    debug!("answering ping with pong ({} bytes)", frame.payload.len());
                    if let Err(err) = encoder::send(&mut self.stream, OpCode::Pong, &frame.payload, self.role) {
                        return Err(self.fail(err.into()));
                    }
                }
                OpCode::Pong => {
                    // no liveness bookkeeping here, higher layers may track it
                }
                OpCode::Close => return Err(self.on_close_frame(frame.payload)),
                OpCode::Continuation => {
                    return Err(self.fail(Error::Protocol("continuation frames are not supported")));
                }
                OpCode::Text | OpCode::Binary if !frame.fin => {
                    return Err(self.fail(Error::Protocol("fragmented messages are not supported")));
                }
                OpCode::Text => match String::from_utf8(frame.payload) {
                    Ok(text) => return Ok(Some(Message::Text(text))),
                    Err(err) => return Err(self.fail(err.into())),
                },
                OpCode::Binary => return Ok(Some(Message::Binary(frame.payload))),
            }
        }

        debug!("frame cap reached within a single receive call");
        Ok(None)
    }

    /// Cooperative receive. Retries until a data frame arrives, invoking the
    /// idle strategy at every empty attempt. With [`IdleStrategy::Sleep`]
    /// this is a true suspension point suitable for a single threaded
    /// cooperative scheduler. No partial frame state is held across
    /// suspensions, so the surrounding scheduler may abandon the call at any
    /// point.
    pub fn receive_next(&mut self, idle: IdleStrategy) -> Result<Message, Error> {
        loop {
            match self.receive()? {
                Some(message) => return Ok(message),
                None => idle.idle(0),
            }
        }
    }

    /// Initiates the closing handshake with the given status code and
    /// reason, then transitions to closed. Calling `close` on an already
    /// closed connection is a no-op. The close frame write is best effort,
    /// the peer may already be gone.
    pub fn close(&mut self, code: u16, reason: &str) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        let mut payload = code.to_be_bytes().to_vec();
        payload.extend_from_slice(reason.as_bytes());
        let _ = encoder::send(&mut self.stream, OpCode::Close, &payload, self.role);
        self.closed = true;
        debug!("connection closed locally with code {code}");
        Ok(())
    }

    #[inline]
    fn send(&mut self, op_code: OpCode, body: &[u8]) -> Result<(), Error> {
        self.ensure_not_closed()?;
        match encoder::send(&mut self.stream, op_code, body, self.role) {
            Ok(()) => {
                trace!("sent {op_code:?} frame ({} bytes)", body.len());
                Ok(())
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Completes the close handshake after the peer sent a close frame: the
    /// received code (1000 when absent or malformed) is echoed back, then
    /// the connection transitions to closed.
    fn on_close_frame(&mut self, payload: Vec<u8>) -> Error {
        let code = payload
            .get(..2)
            .and_then(|bytes| bytes.try_into().ok())
            .map(u16::from_be_bytes)
            .unwrap_or(close::NORMAL);
        let reason = String::from_utf8_lossy(payload.get(2..).unwrap_or_default()).into_owned();
        let _ = encoder::send(&mut self.stream, OpCode::Close, &code.to_be_bytes(), self.role);
        self.closed = true;
        debug!("peer closed the connection with code {code}");
        Error::ReceivedCloseFrame(code, reason)
    }

    /// Fatal error path: force a close frame with the most specific status
    /// code when one applies, then transition to closed. The socket itself
    /// is released when the engine is dropped, so the transition happens
    /// exactly once regardless of whether this is a failure or a handshake
    /// path.
    fn fail(&mut self, err: Error) -> Error {
        if let Some(code) = err.close_code() {
            let _ = encoder::send(&mut self.stream, OpCode::Close, &code.to_be_bytes(), self.role);
        }
        self.closed = true;
        warn!("connection force closed: {err}");
        err
    }
}

pub trait IntoWebsocket {
    fn into_client_websocket(self) -> Websocket<Self>
    where
        Self: Sized;

    fn into_server_websocket(self) -> Websocket<Self>
    where
        Self: Sized;
}

impl<T> IntoWebsocket for T
where
    T: Read + Write,
{
    fn into_client_websocket(self) -> Websocket<Self> {
        Websocket::client(self)
    }

    fn into_server_websocket(self) -> Websocket<Self> {
        Websocket::server(self)
    }
}
