//! The seeded pseudo-random generator.
//!
//! This is the Park–Miller "minimal standard" Lehmer generator:
//!
//! ```text
//! state = (state * 16807) mod (2^31 - 1)
//! value = (state - 1) / (2^31 - 2)        ∈ [0, 1)
//! ```
//!
//! The constants, the normalization of the initial seed, and the exact
//! float arithmetic used to turn the state into numbers are all part of
//! the cross-client contract. A client that used a different multiplier,
//! or computed `next_int` with integer math instead of `floor(f64 * n)`,
//! would agree with its opponent on most draws and silently disagree on
//! a few.

use serde::{Deserialize, Serialize};

use crate::RandomError;

/// The Lehmer multiplier (7^5).
pub const MULTIPLIER: i64 = 16_807;

/// The modulus, the Mersenne prime 2^31 - 1.
pub const MODULUS: i64 = 2_147_483_647;

/// Largest valid state, also the divisor that maps states to `[0, 1)`.
const MAX_STATE: i64 = MODULUS - 1;

/// Largest magnitude an `f64` can hold with every integer below it exact.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_991.0;

/// A point in a generator's stream: how many values were drawn and the
/// state right after the last one.
///
/// Two generators built from the same seed always hold the same `state`
/// at the same `draws` count, whatever the values were used for. Battle
/// clients exchange checkpoints to catch desynchronization early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    pub draws: u64,
    pub state: i64,
}

/// A reproducible random stream.
///
/// Created once per session with an externally supplied seed and
/// mutated by every draw. It is deliberately not `Copy`: handing a copy
/// to a second consumer would fork the stream, and each session must own
/// exactly one.
///
/// # Example
///
/// ```rust
/// use playfield_random::SeededRandom;
///
/// let mut a = SeededRandom::new(42);
/// let mut b = SeededRandom::new(42);
/// assert_eq!(a.next(), b.next());
/// assert_eq!(a.next_int(0, 10).unwrap(), b.next_int(0, 10).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawState", into = "RawState")]
pub struct SeededRandom {
    state: i64,
    draws: u64,
}

impl SeededRandom {
    /// Creates a generator from any integer seed.
    ///
    /// The seed is reduced with a truncating remainder (sign follows the
    /// dividend, like C and JavaScript `%`) and lifted into
    /// `[1, 2147483646]` by adding `2147483646` while it is not positive.
    /// A zero state would make a multiplicative generator emit zero forever.
    pub fn new(seed: i64) -> Self {
        let mut state = seed % MODULUS;
        while state <= 0 {
            state += MAX_STATE;
        }
        tracing::trace!(seed, state, "seeded generator");
        Self { state, draws: 0 }
    }

    /// Creates a generator from a seed that arrived as a float, e.g. a
    /// JSON number.
    ///
    /// # Errors
    /// Returns [`RandomError::InvalidSeed`] for NaN, infinities, values
    /// with a fractional part, and values too large to be exact integers.
    /// Both battle clients must apply this same rejection; coercing on one
    /// side and rejecting on the other is a desync waiting to happen.
    pub fn from_f64(seed: f64) -> Result<Self, RandomError> {
        if !seed.is_finite() {
            return Err(RandomError::InvalidSeed(format!("{seed} is not finite")));
        }
        if seed.fract() != 0.0 {
            return Err(RandomError::InvalidSeed(format!("{seed} is not an integer")));
        }
        if seed.abs() > MAX_EXACT_F64 {
            return Err(RandomError::InvalidSeed(format!(
                "{seed} is outside the exact integer range"
            )));
        }
        Ok(Self::new(seed as i64))
    }

    /// Advances the stream and returns a value in `[0, 1)`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f64 {
        // state < 2^31 and MULTIPLIER < 2^15, so the product fits in 46 bits.
        self.state = self.state * MULTIPLIER % MODULUS;
        self.draws += 1;
        (self.state - 1) as f64 / MAX_STATE as f64
    }

    /// Returns an integer in `[min, max)`, computed as
    /// `floor(next() * (max - min)) + min`.
    ///
    /// # Errors
    /// Returns [`RandomError::InvalidArgument`] if `max <= min` or if the
    /// range is wider than an `i64` can hold. The checks happen before
    /// drawing, so a rejected call leaves the stream as it was.
    pub fn next_int(&mut self, min: i64, max: i64) -> Result<i64, RandomError> {
        if max <= min {
            return Err(RandomError::InvalidArgument(format!(
                "next_int requires max > min, got [{min}, {max})"
            )));
        }
        let span = max.checked_sub(min).ok_or_else(|| {
            RandomError::InvalidArgument(format!("next_int range [{min}, {max}) is too wide"))
        })? as f64;
        Ok((self.next() * span).floor() as i64 + min)
    }

    /// Returns an index in `[0, bound)`. Same arithmetic as
    /// [`next_int(0, bound)`](Self::next_int).
    ///
    /// # Errors
    /// Returns [`RandomError::InvalidArgument`] if `bound` is zero.
    pub fn next_index(&mut self, bound: usize) -> Result<usize, RandomError> {
        if bound == 0 {
            return Err(RandomError::InvalidArgument(
                "next_index requires a non-zero bound".into(),
            ));
        }
        Ok((self.next() * bound as f64).floor() as usize)
    }

    /// Returns a uniformly chosen element of `items`.
    ///
    /// # Errors
    /// Returns [`RandomError::InvalidArgument`] if `items` is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, RandomError> {
        if items.is_empty() {
            return Err(RandomError::InvalidArgument(
                "cannot pick from an empty slice".into(),
            ));
        }
        let index = self.next_index(items.len())?;
        Ok(&items[index])
    }

    /// Returns a shuffled copy of `items`, leaving `items` untouched.
    ///
    /// Fisher–Yates from the last index down to 1: position `i` swaps with
    /// `next_int(0, i + 1)`. Exactly `len - 1` values are drawn (none for
    /// slices shorter than two).
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        for i in (1..out.len()).rev() {
            // Same arithmetic as `next_index(i + 1)`; the bound is never zero.
            let j = (self.next() * (i + 1) as f64).floor() as usize;
            out.swap(i, j);
        }
        out
    }

    /// The current internal state. For logging and checkpoints only;
    /// gameplay code should never branch on it.
    pub fn seed(&self) -> i64 {
        self.state
    }

    /// How many values have been drawn since construction.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// The current position in the stream.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            draws: self.draws,
            state: self.state,
        }
    }

    /// Where a generator built from `seed` will be after `draws` values,
    /// without drawing them: `state * 16807^draws mod (2^31 - 1)`, by
    /// square-and-multiply.
    pub fn checkpoint_at(seed: i64, draws: u64) -> Checkpoint {
        let mut factor = 1_i64;
        let mut base = MULTIPLIER;
        let mut n = draws;
        while n > 0 {
            if n & 1 == 1 {
                factor = factor * base % MODULUS;
            }
            // Both operands are below 2^31, so products fit in 62 bits.
            base = base * base % MODULUS;
            n >>= 1;
        }
        Checkpoint {
            draws,
            state: Self::new(seed).state * factor % MODULUS,
        }
    }
}

/// Serialized form of a generator.
#[derive(Serialize, Deserialize)]
struct RawState {
    state: i64,
    #[serde(default)]
    draws: u64,
}

impl TryFrom<RawState> for SeededRandom {
    type Error = RandomError;

    fn try_from(raw: RawState) -> Result<Self, Self::Error> {
        if !(1..=MAX_STATE).contains(&raw.state) {
            return Err(RandomError::InvalidSeed(format!(
                "state {} outside [1, {MAX_STATE}]",
                raw.state
            )));
        }
        Ok(Self {
            state: raw.state,
            draws: raw.draws,
        })
    }
}

impl From<SeededRandom> for RawState {
    fn from(rng: SeededRandom) -> Self {
        Self {
            state: rng.state,
            draws: rng.draws,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_42_first_three_values() {
        let mut rng = SeededRandom::new(42);

        assert_eq!(rng.next(), 0.0003287070433876543);
        assert_eq!(rng.seed(), 705_894);
        assert_eq!(rng.next(), 0.5245871017916008);
        assert_eq!(rng.seed(), 1_126_542_223);
        assert_eq!(rng.next(), 0.7354235320681926);
        assert_eq!(rng.seed(), 1_579_310_009);
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn test_minimal_standard_ten_thousandth_state() {
        // Park & Miller's published check value.
        let mut rng = SeededRandom::new(1);
        for _ in 0..10_000 {
            rng.next();
        }
        assert_eq!(rng.seed(), 1_043_618_065);
    }

    #[test]
    fn test_normalization_of_edge_seeds() {
        assert_eq!(SeededRandom::new(0).seed(), 2_147_483_646);
        assert_eq!(SeededRandom::new(-5).seed(), 2_147_483_641);
        assert_eq!(SeededRandom::new(MODULUS).seed(), 2_147_483_646);
        assert_eq!(SeededRandom::new(MODULUS + 5).seed(), 5);
        assert_eq!(SeededRandom::new(1).seed(), 1);
    }

    #[test]
    fn test_normalization_never_yields_zero_state() {
        // -2147483646 % MODULUS == -2147483646; one correction lands on 0.
        assert_eq!(SeededRandom::new(-2_147_483_646).seed(), 2_147_483_646);
        assert!(SeededRandom::new(i64::MIN).seed() > 0);
        assert!(SeededRandom::new(i64::MAX).seed() > 0);
    }

    #[test]
    fn test_from_f64_rejects_non_integers() {
        assert!(matches!(
            SeededRandom::from_f64(f64::NAN),
            Err(RandomError::InvalidSeed(_))
        ));
        assert!(SeededRandom::from_f64(f64::INFINITY).is_err());
        assert!(SeededRandom::from_f64(1.5).is_err());
        assert!(SeededRandom::from_f64(1e300).is_err());
    }

    #[test]
    fn test_from_f64_matches_integer_constructor() {
        assert_eq!(SeededRandom::from_f64(42.0).unwrap(), SeededRandom::new(42));
        assert_eq!(SeededRandom::from_f64(-7.0).unwrap(), SeededRandom::new(-7));
    }

    #[test]
    fn test_next_int_rejects_empty_range_without_drawing() {
        let mut rng = SeededRandom::new(9);
        assert!(rng.next_int(5, 5).is_err());
        assert!(rng.next_int(6, 5).is_err());
        assert_eq!(rng.draws(), 0);
        assert_eq!(rng.seed(), 9);
    }

    #[test]
    fn test_next_int_handles_negative_ranges() {
        let mut rng = SeededRandom::new(123);
        for _ in 0..500 {
            let v = rng.next_int(-10, -3).unwrap();
            assert!((-10..-3).contains(&v));
        }
    }

    #[test]
    fn test_next_int_rejects_overflowing_range_without_drawing() {
        let mut rng = SeededRandom::new(5);
        assert!(matches!(
            rng.next_int(i64::MIN, i64::MAX),
            Err(RandomError::InvalidArgument(_))
        ));
        assert!(matches!(
            rng.next_int(-1, i64::MAX),
            Err(RandomError::InvalidArgument(_))
        ));
        assert_eq!(rng.draws(), 0);
        assert!(rng.next_int(0, i64::MAX).is_ok());
    }

    #[test]
    fn test_next_index_matches_next_int() {
        let mut a = SeededRandom::new(77);
        let mut b = SeededRandom::new(77);
        for bound in 1..50usize {
            assert_eq!(
                a.next_index(bound).unwrap() as i64,
                b.next_int(0, bound as i64).unwrap()
            );
        }
    }

    #[test]
    fn test_pick_empty_is_invalid_argument() {
        let mut rng = SeededRandom::new(3);
        let empty: [u8; 0] = [];
        assert!(matches!(rng.pick(&empty), Err(RandomError::InvalidArgument(_))));
    }

    #[test]
    fn test_pick_single_element_still_draws() {
        let mut rng = SeededRandom::new(3);
        assert_eq!(*rng.pick(&['x']).unwrap(), 'x');
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn test_shuffle_seed_1000_permutation() {
        let mut rng = SeededRandom::new(1000);
        let input = [0, 1, 2, 3, 4, 5, 6];
        let out = rng.shuffle(&input);
        assert_eq!(out, vec![6, 1, 4, 2, 5, 3, 0]);
        assert_eq!(input, [0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(rng.draws(), 6);
    }

    #[test]
    fn test_shuffle_short_slices_draw_nothing() {
        let mut rng = SeededRandom::new(3);
        assert!(rng.shuffle::<u8>(&[]).is_empty());
        assert_eq!(rng.shuffle(&[1]), vec![1]);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_seed_is_idempotent_between_draws() {
        let mut rng = SeededRandom::new(31);
        rng.next();
        assert_eq!(rng.seed(), rng.seed());
        assert_eq!(rng.checkpoint(), rng.checkpoint());
    }

    #[test]
    fn test_checkpoint_at_matches_drawing() {
        let mut rng = SeededRandom::new(555);
        assert_eq!(SeededRandom::checkpoint_at(555, 0), rng.checkpoint());
        for _ in 0..1_000 {
            rng.next();
            assert_eq!(SeededRandom::checkpoint_at(555, rng.draws()), rng.checkpoint());
        }
        assert_eq!(SeededRandom::checkpoint_at(1, 10_000).state, 1_043_618_065);
    }

    #[test]
    fn test_serde_round_trip_preserves_stream() {
        let mut rng = SeededRandom::new(2024);
        rng.next();
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SeededRandom = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.next(), rng.next());
    }

    #[test]
    fn test_deserialize_rejects_zero_state() {
        let result: Result<SeededRandom, _> = serde_json::from_str(r#"{"state":0}"#);
        assert!(result.is_err());
    }
}
