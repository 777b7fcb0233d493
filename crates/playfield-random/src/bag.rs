//! Bag randomizer: balanced draws from a fixed set.
//!
//! Instead of drawing each item independently (which allows long
//! droughts), the whole set is shuffled into a "bag" and handed out one
//! by one. When the bag is empty it is refilled with a fresh shuffle.
//! With the seven tetrominoes as the set this is the standard 7-bag.

use std::collections::VecDeque;

use crate::SeededRandom;

/// Hands out every item of `set` exactly once per bag, in shuffled order.
///
/// The randomizer does not own a generator; the caller passes its
/// session's generator to [`next`](Self::next). Each refill costs exactly
/// one [`SeededRandom::shuffle`] call (`set.len() - 1` draws).
#[derive(Debug, Clone)]
pub struct BagRandomizer<T> {
    set: Vec<T>,
    bag: VecDeque<T>,
    bags_drawn: u64,
}

impl<T: Clone> BagRandomizer<T> {
    /// Creates a randomizer over `set`. The first bag is shuffled lazily,
    /// on the first call to [`next`](Self::next).
    ///
    /// # Panics
    /// Panics if `set` is empty; an empty bag can never be refilled.
    pub fn new(set: Vec<T>) -> Self {
        assert!(!set.is_empty(), "bag randomizer needs at least one item");
        Self {
            bag: VecDeque::with_capacity(set.len()),
            set,
            bags_drawn: 0,
        }
    }

    /// Takes the next item, refilling the bag first if it is empty.
    pub fn next(&mut self, rng: &mut SeededRandom) -> T {
        if self.bag.is_empty() {
            self.bag.extend(rng.shuffle(&self.set));
            self.bags_drawn += 1;
            tracing::trace!(bag = self.bags_drawn, draws = rng.draws(), "bag refilled");
        }
        self.bag
            .pop_front()
            .expect("bag refilled from a non-empty set")
    }

    /// Items still waiting in the current bag, in draw order.
    pub fn pending(&self) -> impl Iterator<Item = &T> {
        self.bag.iter()
    }

    /// Number of bags shuffled so far.
    pub fn bags_drawn(&self) -> u64 {
        self.bags_drawn
    }

    /// Size of one full bag.
    pub fn bag_size(&self) -> usize {
        self.set.len()
    }
}
