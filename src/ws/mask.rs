//! Payload masking.
//!
//! RFC 6455 requires every client originated frame to be XORed with a
//! 4 byte key. The transformation is an involution, so the same routine
//! masks on send and unmasks on receive.

#[inline]
pub fn apply(data: &mut [u8], key: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i & 3];
    }
}
