// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding,
// hand-rolled so that the output stream is identical on every platform.
//
// This crate is the only source of randomness in the exercise generator:
// chord voicings, harmony successors and everything downstream of them draw
// from one `ExerciseRng`. Given the same seed, the same configuration and the
// same progression state, a regenerated score is byte-identical.
//
// **Critical constraint: determinism.** No floating point, no stdlib hashing,
// no OS entropy in this module. Callers that want a fresh score each time pick
// a new seed themselves.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG used for all exercise generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseRng {
    s: [u64; 4],
}

impl ExerciseRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// SplitMix64 expands the seed into the 256-bit state, so nearby seeds
    /// still give unrelated streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let [a, b, c, d] = self.s;
        let out = a.wrapping_add(d).rotate_left(23).wrapping_add(a);

        let c = c ^ a;
        let d = d ^ b;
        self.s = [a ^ d, b ^ c, c ^ (b << 17), d.rotate_left(45)];
        out
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Scales a 64-bit draw by the span with a widening multiply and takes
    /// the high word; draws whose low word lands in the biased zone are
    /// rejected (Lemire's method). Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let span = high - low;
        let scale = |x: u64| u128::from(x) * u128::from(span);

        let mut wide = scale(self.next_u64());
        if (wide as u64) < span {
            let zone = span.wrapping_neg() % span;
            while (wide as u64) < zone {
                wide = scale(self.next_u64());
            }
        }
        low + (wide >> 64) as u64
    }

    /// Generate a uniform random `usize` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Pick one element of `items` uniformly, or `None` if it is empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        Some(&items[self.range_usize(0, items.len())])
    }
}

/// SplitMix64, used only to expand a single `u64` seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
