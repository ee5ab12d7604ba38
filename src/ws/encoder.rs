use std::io;
use std::io::Write;

use rand::Rng;

use crate::ws::protocol::OpCode;
use crate::ws::{mask, protocol, Role};

/// Writes a single `fin=true` frame to the stream as one logical unit and
/// flushes it. The flush matters: a PONG answering a PING must hit the wire
/// before control returns to the caller, or the keepalive exchange times
/// out on a peer that is not otherwise receiving traffic.
///
/// Client frames are masked with a fresh random 4 byte key. Reusing or
/// predicting mask keys defeats the proxy cache poisoning protection the
/// masking exists for, hence one key per frame from the thread local CSPRNG.
pub(crate) fn send<S: Write>(stream: &mut S, op_code: OpCode, body: &[u8], role: Role) -> io::Result<()> {
    let header = protocol::FIN_MASK | op_code as u8;
    stream.write_all(&[header])?;

    let mask_bit = match role {
        Role::Client => protocol::MASK_MASK,
        Role::Server => 0,
    };

    match body.len() {
        length @ 0..=125 => {
            stream.write_all(&[mask_bit | length as u8])?;
        }
        length if length <= u16::MAX as usize => {
            stream.write_all(&[mask_bit | protocol::PAYLOAD_LENGTH_U16])?;
            stream.write_all(&(length as u16).to_be_bytes())?;
        }
        length => {
            stream.write_all(&[mask_bit | protocol::PAYLOAD_LENGTH_U64])?;
            stream.write_all(&(length as u64).to_be_bytes())?;
        }
    }

    match role {
        Role::Client => {
            let key: [u8; 4] = rand::rng().random();
            stream.write_all(&key)?;
            let mut masked = body.to_vec();
            mask::apply(&mut masked, key);
            stream.write_all(&masked)?;
        }
        Role::Server => {
            stream.write_all(body)?;
        }
    }

    stream.flush()
}
