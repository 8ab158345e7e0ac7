//! A thin-but-stable wrapper over `rand::rngs::SmallRng` that provides the few
//! conveniences random data primitives need.

use rand::{rngs::SmallRng, Rng as _, SeedableRng};

const DEFAULT_SEED: u64 = 0x12345678_12345678;

/// A pseudorandom number generator.
///
/// Not cryptographically secure. Seeded deterministically, so that the mutation
/// libraries built from it are reproducible.
///
/// You can attain a reference to an `Rng` via the
/// [`Session::rng`][crate::Session::rng] method.
#[derive(Clone, Debug)]
pub struct Rng {
    inner: SmallRng,
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl Rng {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Generate a random length in the inclusive range `min..=max`.
    ///
    /// Returns `None` if `min > max`.
    #[inline]
    pub fn gen_length(&mut self, min: usize, max: usize) -> Option<usize> {
        if min > max {
            return None;
        }
        Some(self.inner.gen_range(min..=max))
    }

    /// Generate `len` uniformly random bytes.
    #[inline]
    pub fn gen_bytes(&mut self, len: usize) -> Vec<u8> {
        let mut buf = vec![0; len];
        self.inner.fill(&mut buf[..]);
        buf
    }
}
