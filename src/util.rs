use std::io;
use std::io::ErrorKind::{UnexpectedEof, WouldBlock};

/// Adapts read results from a non-blocking stream: `WouldBlock` means
/// "no bytes available right now" and a zero length read means the peer
/// has gone away.
pub trait NoBlock {
    type Value;

    fn no_block(self) -> io::Result<Self::Value>;
}

impl NoBlock for io::Result<usize> {
    type Value = usize;

    fn no_block(self) -> io::Result<Self::Value> {
        match self {
            Ok(0) => Err(io::Error::from(UnexpectedEof)),
            Ok(n) => Ok(n),
            Err(err) if err.kind() == WouldBlock => Ok(0),
            Err(err) => Err(err),
        }
    }
}
