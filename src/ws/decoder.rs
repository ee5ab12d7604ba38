use std::io;
use std::io::Read;

use crate::ws::{mask, protocol, Error, Frame, ReadBuffer, Role};

/// Frame decoder over a buffered non-blocking stream.
///
/// A decode attempt inspects the buffered bytes without consuming them and
/// only commits once the entire frame (header, extended length, mask key and
/// payload) is present. An incomplete frame therefore leaves no partial
/// state behind: every attempt starts from the frame header again, which
/// makes it safe for a caller to abandon a receive between attempts.
#[derive(Debug)]
pub struct Decoder {
    buffer: ReadBuffer,
    max_payload: usize,
}

impl Decoder {
    pub fn new(max_payload: usize) -> Self {
        Self {
            buffer: ReadBuffer::new(),
            max_payload,
        }
    }

    /// Pulls all immediately available bytes from the stream into the
    /// buffer, returning the number of bytes read.
    #[inline]
    pub fn read_from<S: Read>(&mut self, stream: &mut S) -> io::Result<usize> {
        self.buffer.read_all_from(stream)
    }

    /// Decodes the next frame, or returns `None` when the buffered bytes do
    /// not yet form a complete frame.
    pub fn decode_next(&mut self, role: Role) -> Result<Option<Frame>, Error> {
        let view = self.buffer.view();
        if view.len() < 2 {
            return Ok(None);
        }

        let (b1, b2) = (view[0], view[1]);

        if b1 & protocol::RSV_MASK != 0 {
            return Err(Error::Protocol("non zero RSV value received"));
        }
        let fin = b1 & protocol::FIN_MASK != 0;
        // validated before any length or payload byte is interpreted
        let op_code = protocol::OpCode::try_from(b1 & protocol::OP_CODE_MASK)?;

        let masked = b2 & protocol::MASK_MASK != 0;
        match role {
            Role::Client if masked => return Err(Error::Protocol("masking bit set on a server frame")),
            Role::Server if !masked => return Err(Error::Protocol("masking bit not set on a client frame")),
            _ => {}
        }

        let mut offset = 2;
        let payload_length = match b2 & protocol::PAYLOAD_LENGTH_MASK {
            protocol::PAYLOAD_LENGTH_U16 => {
                let Some(bytes) = view.get(offset..offset + 2) else {
                    return Ok(None);
                };
                offset += 2;
                u16::from_be_bytes(bytes.try_into().map_err(io::Error::other)?) as usize
            }
            protocol::PAYLOAD_LENGTH_U64 => {
                let Some(bytes) = view.get(offset..offset + 8) else {
                    return Ok(None);
                };
                offset += 8;
                let length = u64::from_be_bytes(bytes.try_into().map_err(io::Error::other)?);
                usize::try_from(length).map_err(|_| Error::PayloadTooBig(usize::MAX))?
            }
            length => length as usize,
        };

        if payload_length > self.max_payload {
            return Err(Error::PayloadTooBig(payload_length));
        }

        let mask_key = if masked {
            let Some(bytes) = view.get(offset..offset + 4) else {
                return Ok(None);
            };
            offset += 4;
            Some(bytes.try_into().map_err(io::Error::other)?)
        } else {
            None
        };

        let Some(payload) = view.get(offset..offset + payload_length) else {
            return Ok(None);
        };
        let mut payload = payload.to_vec();
        if let Some(key) = mask_key {
            mask::apply(&mut payload, key);
        }

        self.buffer.consume(offset + payload_length);
        Ok(Some(Frame {
            fin,
            op_code,
            payload,
        }))
    }
}
