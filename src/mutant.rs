//! The atomic fuzzable unit.

use crate::{Error, Fuzz, RenderOptions, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// The grammar of a single element or request name.
pub(crate) const NAME_PATTERN: &str = "[A-Za-z0-9_]+";

static NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{NAME_PATTERN}$")).expect("valid name pattern"));

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if NAME.is_match(name) {
        Ok(())
    } else {
        Err(Error::invalid_name(name))
    }
}

/// An atomic fuzzable field: an original value plus an ordered library of
/// candidate values to step through.
///
/// A `Mutant` is a small state machine. Its cursor starts at `0`, where the
/// current value is the original value. Every successful
/// [`advance`][Fuzz::advance] moves the cursor forward by one and makes the
/// next library entry the current value. Once the library is exhausted, the
/// next `advance` restores the original value and reports that no mutation was
/// produced.
///
/// Mutants are usually created through the constructors in
/// [`primitives`][crate::primitives].
///
/// # Example
///
/// ```
/// use protomut::{Fuzz, Mutant};
///
/// let mut opcode = Mutant::new("GET", ["PUT", "POST"]);
/// assert_eq!(opcode.num_mutations(), 2);
///
/// assert!(opcode.advance());
/// assert_eq!(opcode.render(), b"PUT");
/// assert!(opcode.advance());
/// assert_eq!(opcode.render(), b"POST");
///
/// // Exhausted: back to the original value.
/// assert!(!opcode.advance());
/// assert_eq!(opcode.render(), b"GET");
/// ```
#[derive(Clone, Debug)]
pub struct Mutant {
    name: Option<String>,
    original: Vec<u8>,
    library: Vec<Vec<u8>>,
    fuzzable: bool,
    disabled: bool,
    cursor: usize,
}

impl Mutant {
    /// Create a new, unnamed, fuzzable mutant with the given original value
    /// and mutation library.
    ///
    /// Text values are stored as their UTF-8 encoding.
    pub fn new<V>(value: impl Into<Vec<u8>>, library: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Vec<u8>>,
    {
        Self {
            name: None,
            original: value.into(),
            library: library.into_iter().map(Into::into).collect(),
            fuzzable: true,
            disabled: false,
            cursor: 0,
        }
    }

    /// Give this mutant a name, making it addressable within its request.
    ///
    /// Fails with [`InvalidName`][crate::ErrorKind::InvalidName] if `name`
    /// does not match `[A-Za-z0-9_]+`.
    pub fn named(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        self.name = Some(name);
        Ok(self)
    }

    /// Set whether this mutant takes part in the enumeration.
    ///
    /// A mutant that is not fuzzable reports zero mutations, whatever its
    /// library holds.
    pub fn fuzzable(mut self, fuzzable: bool) -> Self {
        self.fuzzable = fuzzable;
        self.reset();
        self
    }

    /// This mutant's name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The original value.
    pub fn original_value(&self) -> &[u8] {
        &self.original
    }

    /// The current value: the original value at cursor `0`, otherwise the
    /// library entry the cursor last stepped over.
    pub fn value(&self) -> &[u8] {
        match self.cursor.checked_sub(1) {
            Some(i) => &self.library[i],
            None => &self.original,
        }
    }

    /// The mutation library, in enumeration order.
    pub fn library(&self) -> &[Vec<u8>] {
        &self.library
    }

    /// Whether this mutant takes part in the enumeration.
    pub fn is_fuzzable(&self) -> bool {
        self.fuzzable
    }

    /// Whether the cursor has stepped over every library entry.
    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.num_mutations()
    }

    /// Whether this mutant was disabled.
    ///
    /// Disabled mutants are still enumerated; the flag is exposed for the
    /// layers that decide to drop their test cases.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Enable or disable this mutant.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// The length of the current value.
    pub fn len(&self) -> usize {
        self.value().len()
    }

    /// Whether the current value is empty.
    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }
}

impl Fuzz for Mutant {
    fn num_mutations(&self) -> usize {
        if self.fuzzable {
            self.library.len()
        } else {
            0
        }
    }

    fn mutant_index(&self) -> usize {
        self.cursor
    }

    fn advance(&mut self) -> bool {
        if !self.fuzzable || self.is_exhausted() {
            self.reset();
            return false;
        }
        self.cursor += 1;
        true
    }

    fn goto(&mut self, index: usize) -> Result<()> {
        let num_mutations = self.num_mutations();
        if index > num_mutations {
            return Err(Error::out_of_range(index, num_mutations));
        }
        if index == 0 {
            self.reset();
        } else {
            self.cursor = index - 1;
            self.advance();
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn render_with(&self, options: &RenderOptions<'_>) -> Vec<u8> {
        if let Some(value) = options.replacement_for(self.name()) {
            value.to_vec()
        } else if options.is_original() {
            self.original.clone()
        } else {
            self.value().to_vec()
        }
    }
}
