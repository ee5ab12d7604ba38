//! RFC 6455 wire constants.

use crate::ws::Error;

pub const FIN_MASK: u8 = 0b1000_0000;
pub const RSV_MASK: u8 = 0b0111_0000;
pub const OP_CODE_MASK: u8 = 0b0000_1111;
pub const MASK_MASK: u8 = 0b1000_0000;
pub const PAYLOAD_LENGTH_MASK: u8 = 0b0111_1111;

/// Payload length values that select an extended length field.
pub const PAYLOAD_LENGTH_U16: u8 = 126;
pub const PAYLOAD_LENGTH_U64: u8 = 127;

/// Frame opcode. Reserved values are rejected at the conversion boundary,
/// before any payload byte is read.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum OpCode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl OpCode {
    pub const fn is_control(self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }
}

impl TryFrom<u8> for OpCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            _ => Err(Error::Protocol("unknown op code")),
        }
    }
}

/// Close status codes defined by RFC 6455 section 7.4.1.
pub mod close {
    pub const NORMAL: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const PROTOCOL_ERROR: u16 = 1002;
    pub const DATA_NOT_SUPPORTED: u16 = 1003;
    pub const BAD_DATA: u16 = 1007;
    pub const POLICY_VIOLATION: u16 = 1008;
    pub const TOO_BIG: u16 = 1009;
    pub const MISSING_EXTENSION: u16 = 1010;
    pub const BAD_CONDITION: u16 = 1011;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_known_op_codes() {
        assert_eq!(OpCode::Continuation, 0x0u8.try_into().unwrap());
        assert_eq!(OpCode::Text, 0x1u8.try_into().unwrap());
        assert_eq!(OpCode::Binary, 0x2u8.try_into().unwrap());
        assert_eq!(OpCode::Close, 0x8u8.try_into().unwrap());
        assert_eq!(OpCode::Ping, 0x9u8.try_into().unwrap());
        assert_eq!(OpCode::Pong, 0xAu8.try_into().unwrap());
    }

    #[test]
    fn should_reject_reserved_op_codes() {
        for value in [0x3u8, 0x4, 0x5, 0x6, 0x7, 0xB, 0xC, 0xD, 0xE, 0xF] {
            assert!(OpCode::try_from(value).is_err(), "op code {value:#x} must be rejected");
        }
    }

    #[test]
    fn should_classify_control_op_codes() {
        assert!(OpCode::Close.is_control());
        assert!(OpCode::Ping.is_control());
        assert!(OpCode::Pong.is_control());
        assert!(!OpCode::Text.is_control());
        assert!(!OpCode::Binary.is_control());
        assert!(!OpCode::Continuation.is_control());
    }
}
