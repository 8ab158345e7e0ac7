//! XDR (RFC 1832) encodings.
//!
//! These represent XDR values inside a fuzzed message; they do not fuzz the
//! XDR encoding itself.

use crate::{Block, Encode, Node, Result};

/// Encodes a payload as an XDR string: a 4-byte big-endian length, the
/// payload, and zero padding up to the next multiple of 4.
///
/// An empty payload encodes as four zero bytes.
///
/// # Example
///
/// ```
/// use protomut::{legos::xdr::XdrString, Encode};
///
/// assert_eq!(XdrString.encode(b"AB".to_vec()), b"\x00\x00\x00\x02AB\x00\x00");
/// assert_eq!(XdrString.encode(Vec::new()), b"\x00\x00\x00\x00");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct XdrString;

impl Encode for XdrString {
    fn encode(&self, payload: Vec<u8>) -> Vec<u8> {
        if payload.is_empty() {
            return vec![0; 4];
        }

        // Lengths past `u32::MAX` cannot be represented; saturate rather than
        // wrap so the prefix never understates the payload.
        let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        let mut encoded = Vec::with_capacity(4 + payload.len() + 3);
        encoded.extend_from_slice(&len.to_be_bytes());
        encoded.extend_from_slice(&payload);
        encoded.resize(encoded.len() + padding(payload.len()), 0);
        encoded
    }
}

/// The number of zero bytes that align `len` to a multiple of 4.
pub fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Create a block named `name` that renders `field` as an XDR string.
///
/// # Example
///
/// ```
/// # fn foo() -> protomut::Result<()> {
/// use protomut::{legos::xdr, primitives as p, Fuzz};
///
/// let mut path = xdr::string("path", p::group("/tmp", ["/etc/passwd"]))?;
/// assert_eq!(path.render(), b"\x00\x00\x00\x04/tmp");
///
/// path.advance();
/// assert_eq!(path.render(), b"\x00\x00\x00\x0b/etc/passwd\x00");
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
pub fn string(name: &str, field: impl Into<Node>) -> Result<Block> {
    Ok(Block::new().named(name)?.child(field).encoder(XdrString))
}
