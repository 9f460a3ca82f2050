//! OSC 1.0 wire encoding for single-float parameter messages.
//!
//! Only the encode side is needed: this service fires messages at a consumer
//! and never listens. An OSC message carrying one float is laid out as
//!
//! ```text
//! | address (NUL-terminated, padded to 4) | ",f" tag string (padded to 4) | f32 big-endian |
//! ```
//!
//! Every field is zero-padded to a 4-byte boundary per the OSC spec; the
//! type tag string `,f` therefore always occupies exactly 4 bytes.

use crate::error::{AppResult, BatteryOscError};
use bytes::{BufMut, BytesMut};

/// Pad `buf` with NUL bytes to the next 4-byte boundary.
///
/// OSC strings require at least one NUL terminator, so a string whose length
/// is already a multiple of 4 gets 4 more bytes of padding.
fn put_padded_str(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    let pad = 4 - (s.len() % 4);
    buf.put_bytes(0, pad);
}

/// Encode an OSC message with address `address` and a single f32 argument.
pub fn encode_float_message(address: &str, value: f32) -> AppResult<Vec<u8>> {
    if !address.starts_with('/') {
        return Err(BatteryOscError::Encode(format!(
            "OSC address must start with '/', got '{}'",
            address
        )));
    }
    if address.bytes().any(|b| b == 0) {
        return Err(BatteryOscError::Encode(
            "OSC address must not contain NUL bytes".into(),
        ));
    }

    let mut buf = BytesMut::with_capacity(address.len() + 12);
    put_padded_str(&mut buf, address);
    put_padded_str(&mut buf, ",f");
    buf.put_f32(value);
    Ok(buf.to_vec())
}
