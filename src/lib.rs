#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod _guide;
mod block;
pub mod error;
pub mod legos;
mod log;
mod mutant;
pub mod primitives;
pub mod registry;
mod request;
pub mod response;
mod rng;

pub use block::{Block, Compare, Dependency, Encode, Node};
pub use error::{Error, ErrorKind, Result};
pub use mutant::Mutant;
pub use registry::Element;
pub use request::{Mutation, Mutations, Request};
pub use response::{ParsedResponse, Response};
pub use rng::Rng;

#[cfg(feature = "check")]
pub mod check;

/// The default number of candidates a random data primitive precomputes.
pub const DEFAULT_MAX_MUTATIONS: usize = 25;

/// A fuzzing session and its configuration.
///
/// A session holds the seeded random number generator that random data
/// primitives draw their mutation libraries from, so the same seed always
/// yields the same enumeration, and acts as the entry point for beginning new
/// requests.
///
/// # Example
///
/// ```
/// # fn foo() -> protomut::Result<()> {
/// use protomut::{primitives, Session};
///
/// let mut session = Session::new().seed(0x5eed).max_mutations(4);
///
/// let request = session.begin_request("session_example")?;
/// let payload = session.random_data("AAAA", 1, 16).build()?;
/// request.push(payload)?;
///
/// assert_eq!(request.num_mutations(), 4);
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Debug)]
pub struct Session {
    rng: Rng,
    max_mutations: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a new, default `Session`.
    pub fn new() -> Self {
        Self {
            rng: Rng::default(),
            max_mutations: DEFAULT_MAX_MUTATIONS,
        }
    }

    /// Set the seed for the random number generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = Rng::new(seed);
        self
    }

    /// Set how many candidates random data primitives precompute by default.
    ///
    /// Defaults to [`DEFAULT_MAX_MUTATIONS`].
    pub fn max_mutations(mut self, max_mutations: usize) -> Self {
        self.max_mutations = max_mutations;
        self
    }

    /// Get this session's random number generator.
    #[inline]
    #[must_use]
    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    /// Create a new request named `name` and register it in the process-wide
    /// [`registry`].
    pub fn begin_request(&self, name: &str) -> Result<Request> {
        Request::new(name)
    }

    /// Start building a random data primitive that draws from this session's
    /// random number generator and defaults to this session's
    /// `max_mutations`.
    pub fn random_data(
        &mut self,
        value: impl Into<Vec<u8>>,
        min_length: usize,
        max_length: usize,
    ) -> primitives::RandomData<'_> {
        let max_mutations = self.max_mutations;
        primitives::random_data(value, min_length, max_length)
            .max_mutations(max_mutations)
            .rng(&mut self.rng)
    }
}

/// How to render a node.
///
/// By default a node renders its current value. A render can instead use
/// every field's original value, and can substitute the render of one named
/// element regardless of its mutation state.
///
/// # Example
///
/// ```
/// use protomut::{primitives, Block, Fuzz, RenderOptions};
///
/// # fn foo() -> protomut::Result<()> {
/// let mut block = Block::new()
///     .child(primitives::group("user", ["root"]).named("login")?)
///     .child(primitives::fixed("\r\n"));
/// block.advance();
///
/// assert_eq!(block.render(), b"root\r\n");
/// assert_eq!(block.render_with(&RenderOptions::new().original(true)), b"user\r\n");
/// assert_eq!(
///     block.render_with(&RenderOptions::new().replace("login", b"admin")),
///     b"admin\r\n",
/// );
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions<'a> {
    replace: Option<(&'a str, &'a [u8])>,
    original: bool,
}

impl<'a> RenderOptions<'a> {
    /// Render current values, without substitutions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to render original values instead of current ones.
    ///
    /// Defaults to `false`.
    pub fn original(mut self, original: bool) -> Self {
        self.original = original;
        self
    }

    /// Render `value` verbatim in place of the element named `name`.
    pub fn replace(mut self, name: &'a str, value: &'a [u8]) -> Self {
        self.replace = Some((name, value));
        self
    }

    /// Whether original values are rendered.
    pub fn is_original(&self) -> bool {
        self.original
    }

    pub(crate) fn replacement_for(&self, name: Option<&str>) -> Option<&'a [u8]> {
        match (self.replace, name) {
            (Some((target, value)), Some(name)) if target == name => Some(value),
            _ => None,
        }
    }
}

/// A trait for mutation state machines: atomic [`Mutant`]s, composite
/// [`Block`]s, and tree [`Node`]s.
///
/// A `Fuzz` implementation has a finite, ordered enumeration of
/// `num_mutations()` mutated states plus its original state at index `0`.
/// [`advance`][Fuzz::advance] is the only way to move forward through it.
/// Everything else, including seeking and the lazy [`Sequence`] of renders, is
/// built on top of it.
pub trait Fuzz {
    // Required methods.

    /// The number of mutated states this element can take.
    fn num_mutations(&self) -> usize;

    /// The index of the current mutation: `0` is the original state, `n` is the
    /// state after `n` advances.
    fn mutant_index(&self) -> usize;

    /// Move to the next mutated state.
    ///
    /// Returns `true` if a mutation was produced. Once the enumeration is
    /// exhausted this restores the original state and returns `false`.
    fn advance(&mut self) -> bool;

    /// Move to mutation `index`, as if reset and then advanced `index` times.
    ///
    /// Fails with [`OutOfRange`][ErrorKind::OutOfRange] if `index` is greater
    /// than [`num_mutations`][Fuzz::num_mutations].
    fn goto(&mut self, index: usize) -> Result<()>;

    /// Return to the original state.
    fn reset(&mut self);

    /// Render the current state with the given options.
    fn render_with(&self, options: &RenderOptions<'_>) -> Vec<u8>;

    // Provided methods.

    /// Render the current state.
    fn render(&self) -> Vec<u8> {
        self.render_with(&RenderOptions::new())
    }

    /// Render the original state, whatever the current one is.
    fn render_original(&self) -> Vec<u8> {
        self.render_with(&RenderOptions::new().original(true))
    }

    /// Reset, seek to mutation `start`, and return a lazy sequence yielding
    /// the render after every subsequent successful advance.
    ///
    /// # Example
    ///
    /// ```
    /// # fn foo() -> protomut::Result<()> {
    /// use protomut::{primitives, Fuzz};
    ///
    /// let mut verb = primitives::group("GET", ["PUT", "POST", "HEAD"]);
    ///
    /// let rest: Vec<Vec<u8>> = verb.mutations(1)?.collect();
    /// assert_eq!(rest, [&b"POST"[..], b"HEAD"]);
    /// # Ok(())
    /// # }
    /// # foo().unwrap();
    /// ```
    fn mutations(&mut self, start: usize) -> Result<Sequence<'_, Self>>
    where
        Self: Sized,
    {
        self.reset();
        self.goto(start)?;
        Ok(Sequence {
            fuzz: self,
            done: false,
        })
    }
}

impl<F> Fuzz for &mut F
where
    F: Fuzz,
{
    fn num_mutations(&self) -> usize {
        (**self).num_mutations()
    }

    fn mutant_index(&self) -> usize {
        (**self).mutant_index()
    }

    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn goto(&mut self, index: usize) -> Result<()> {
        (**self).goto(index)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn render_with(&self, options: &RenderOptions<'_>) -> Vec<u8> {
        (**self).render_with(options)
    }
}

/// A lazy sequence of renders, one per mutation.
///
/// See [`Fuzz::mutations`]. The sequence borrows its element mutably, so only
/// one can be in flight at a time. Once it has returned `None` it stays
/// finished; create a new one to enumerate again.
pub struct Sequence<'a, F> {
    fuzz: &'a mut F,
    done: bool,
}

impl<F> Sequence<'_, F>
where
    F: Fuzz,
{
    /// Render the current state without advancing.
    pub fn peek(&self) -> Vec<u8> {
        self.fuzz.render()
    }

    /// The index of the current mutation.
    pub fn mutant_index(&self) -> usize {
        self.fuzz.mutant_index()
    }

    /// Return the element to its original state and restart the sequence from
    /// the first mutation.
    pub fn reset(&mut self) {
        self.fuzz.reset();
        self.done = false;
    }
}

impl<F> Iterator for Sequence<'_, F>
where
    F: Fuzz,
{
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        if self.done {
            return None;
        }
        if self.fuzz.advance() {
            Some(self.fuzz.render())
        } else {
            self.done = true;
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.done {
            0
        } else {
            self.fuzz
                .num_mutations()
                .saturating_sub(self.fuzz.mutant_index())
        };
        (left, Some(left))
    }
}
