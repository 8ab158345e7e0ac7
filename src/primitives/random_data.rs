use crate::log;
use crate::{Error, Mutant, Result, Rng, DEFAULT_MAX_MUTATIONS};

/// A builder for random data fields.
///
/// See the [`random_data`] function to create new `RandomData` builders and for
/// example usage.
#[derive(Debug)]
pub struct RandomData<'a> {
    value: Vec<u8>,
    min_length: usize,
    max_length: usize,
    max_mutations: usize,
    step: Option<usize>,
    fuzzable: bool,
    name: Option<String>,
    rng: Option<&'a mut Rng>,
}

/// Start building a random data field with original `value` whose candidates
/// are between `min_length` and `max_length` bytes long.
///
/// The candidates are generated once, when the field is built, so replaying
/// the enumeration always produces the same values. Each candidate's bytes are
/// uniformly random. Its length is uniformly random in
/// `min_length..=max_length`, unless a [`step`][RandomData::step] is set, in
/// which case candidate `k` is `min_length + k * step` bytes long.
///
/// For a fixed length, use the same `min_length` and `max_length`.
///
/// Unless a generator is supplied with [`rng`][RandomData::rng], every build
/// draws from a fresh generator with the same default seed, so two fields with
/// the same parameters get identical libraries. To build independent fields,
/// draw them all from one generator, most easily through
/// [`Session::random_data`][crate::Session::random_data].
///
/// # Example
///
/// ```
/// use protomut::{primitives as p, Fuzz};
///
/// # fn foo() -> protomut::Result<()> {
/// let field = p::random_data("seed", 4, 4).max_mutations(10).build()?;
///
/// assert_eq!(field.num_mutations(), 10);
/// assert!(field.library().iter().all(|candidate| candidate.len() == 4));
///
/// let stepped = p::random_data("", 0, 10).step(4).build()?;
/// let lengths: Vec<usize> = stepped.library().iter().map(Vec::len).collect();
/// assert_eq!(lengths, [0, 4, 8, 10]);
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
pub fn random_data(
    value: impl Into<Vec<u8>>,
    min_length: usize,
    max_length: usize,
) -> RandomData<'static> {
    RandomData {
        value: value.into(),
        min_length,
        max_length,
        max_mutations: DEFAULT_MAX_MUTATIONS,
        step: None,
        fuzzable: true,
        name: None,
        rng: None,
    }
}

impl<'a> RandomData<'a> {
    /// Set how many candidates to generate.
    ///
    /// Ignored when a step is set, since the step determines the count.
    /// Defaults to [`DEFAULT_MAX_MUTATIONS`].
    pub fn max_mutations(mut self, max_mutations: usize) -> Self {
        self.max_mutations = max_mutations;
        self
    }

    /// Generate candidates of deterministic, increasing lengths
    /// `min_length + k * step`, clipped at `max_length`.
    ///
    /// This generates `⌈(max_length - min_length) / step⌉ + 1` candidates.
    pub fn step(mut self, step: usize) -> Self {
        self.step = Some(step);
        self
    }

    /// Set whether the field is fuzzable. Defaults to `true`.
    pub fn fuzzable(mut self, fuzzable: bool) -> Self {
        self.fuzzable = fuzzable;
        self
    }

    /// Name the field. The name is validated when the field is built.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Draw the candidates from `rng` instead of a fresh default-seeded
    /// generator.
    pub fn rng<'b>(self, rng: &'b mut Rng) -> RandomData<'b> {
        RandomData {
            value: self.value,
            min_length: self.min_length,
            max_length: self.max_length,
            max_mutations: self.max_mutations,
            step: self.step,
            fuzzable: self.fuzzable,
            name: self.name,
            rng: Some(rng),
        }
    }

    /// Generate the candidates and build the field.
    ///
    /// Fails with [`InvalidRange`][crate::ErrorKind::InvalidRange] if
    /// `min_length > max_length` or the step is zero, and with
    /// [`InvalidName`][crate::ErrorKind::InvalidName] if the name is invalid.
    pub fn build(self) -> Result<Mutant> {
        if self.min_length > self.max_length || self.step == Some(0) {
            return Err(Error::invalid_range());
        }

        let count = match self.step {
            Some(step) => (self.max_length - self.min_length).div_ceil(step) + 1,
            None => self.max_mutations,
        };

        let mut fallback = Rng::default();
        let rng = match self.rng {
            Some(rng) => rng,
            None => &mut fallback,
        };

        let mut library = Vec::with_capacity(count);
        for k in 0..count {
            let length = match self.step {
                Some(step) => k
                    .checked_mul(step)
                    .and_then(|offset| self.min_length.checked_add(offset))
                    .map_or(self.max_length, |length| length.min(self.max_length)),
                None => rng
                    .gen_length(self.min_length, self.max_length)
                    .ok_or_else(Error::invalid_range)?,
            };
            library.push(rng.gen_bytes(length));
        }
        log::debug!(
            "generated {count} random candidates of {}..={} bytes",
            self.min_length,
            self.max_length
        );

        let mutant = Mutant::new(self.value, library).fuzzable(self.fuzzable);
        match self.name {
            Some(name) => mutant.named(name),
            None => Ok(mutant),
        }
    }
}
