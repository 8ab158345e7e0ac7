//! Constructors for the provided kinds of fuzzable fields.
//!
//! Every primitive is a [`Mutant`]; the constructors differ only in how its
//! mutation library is populated.
//!
//! ```
//! use protomut::primitives as p;
//! ```

use crate::Mutant;

mod random_data;

pub use random_data::*;

/// Create a static field: it is not fuzzable and never mutates.
///
/// Use this for fixed protocol framing.
///
/// # Example
///
/// ```
/// use protomut::{primitives as p, Fuzz};
///
/// let mut crlf = p::fixed("\r\n");
/// assert_eq!(crlf.num_mutations(), 0);
/// assert!(!crlf.advance());
/// assert_eq!(crlf.render(), b"\r\n");
/// ```
pub fn fixed(value: impl Into<Vec<u8>>) -> Mutant {
    Mutant::new(value, Vec::<Vec<u8>>::new()).fuzzable(false)
}

/// Create a group field: its mutation library is exactly the given list of
/// values, enumerated in the given order, without reordering or
/// deduplication.
///
/// A group is useful, for example, to represent a list of valid opcodes.
///
/// # Example
///
/// ```
/// use protomut::{primitives as p, Fuzz};
///
/// # fn foo() -> protomut::Result<()> {
/// let mut opcode = p::group(b"\x01", [b"\x02", b"\x02", b"\xff"]);
///
/// let values: Vec<Vec<u8>> = opcode.mutations(0)?.collect();
/// assert_eq!(values, [b"\x02", b"\x02", b"\xff"]);
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
pub fn group<V>(value: impl Into<Vec<u8>>, values: impl IntoIterator<Item = V>) -> Mutant
where
    V: Into<Vec<u8>>,
{
    Mutant::new(value, values)
}
