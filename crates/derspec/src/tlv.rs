//! TLV header reading: one tag octet plus a DER length.

use crate::cursor::Cursor;
use crate::error::{DecodeError, ErrorKind};

/// Reads a tag octet and a definite DER length (X.690 §8.1.3).
///
/// Short form lengths are a single octet below 0x80. Long form lengths carry
/// the octet count in the low seven bits; 0x80 (indefinite form) and 0xFF
/// (reserved) are rejected.
pub(crate) fn read_header<'a>(cur: &mut Cursor<'a>) -> Result<(u8, usize), DecodeError> {
    if cur.remaining() < 2 {
        return Err(cur.error(ErrorKind::Truncated, "no tag and length"));
    }

    let tag = cur.take()?;
    let first = cur.take()?;

    let length = if first < 0x80 {
        first as usize
    } else if first == 0x80 {
        return Err(cur.error(
            ErrorKind::InvalidLength,
            "indefinite length is not valid in DER",
        ));
    } else if first == 0xFF {
        return Err(cur.error(ErrorKind::InvalidLength, "reserved length octet"));
    } else {
        let count = (first & 0x7F) as usize;
        if count > std::mem::size_of::<usize>() {
            return Err(cur.error(ErrorKind::InvalidLength, "length octet count too large"));
        }
        let octets = cur.take_slice(count)?;
        let mut length: usize = 0;
        for &b in octets {
            length = (length << 8) | b as usize;
        }
        length
    };

    Ok((tag, length))
}
