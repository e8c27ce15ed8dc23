use std::{collections::VecDeque, fmt};

use rand::{SeedableRng as _, seq::SliceRandom};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::PieceKind;

const REFILL_THRESHOLD: usize = 2;

/// Seed for deterministic piece generation.
///
/// A seed is derived from an arbitrary label with 64-bit FNV-1a, which is
/// stable across platforms and compiler versions. The same label always
/// produces the same piece sequence.
///
/// # Example
///
/// ```
/// use evotris_engine::{PieceBag, PieceSeed};
///
/// let mut a = PieceBag::new(PieceSeed::from_label("gen-3"));
/// let mut b = PieceBag::new(PieceSeed::from_label("gen-3"));
/// for _ in 0..20 {
///     assert_eq!(a.pop_next(), b.pop_next());
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PieceSeed(u64);

impl PieceSeed {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let hash = label.bytes().fold(Self::FNV_OFFSET, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(Self::FNV_PRIME)
        });
        Self(hash)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Supplies pieces using the 7-bag system.
///
/// The bag starts with one shuffled set of the seven kinds. Whenever fewer than
/// two pieces remain after a draw, a freshly shuffled set is appended, so the
/// upcoming piece is always known.
#[derive(Debug, Clone)]
pub struct PieceBag {
    rng: Pcg32,
    bag: VecDeque<PieceKind>,
}

impl PieceBag {
    #[must_use]
    pub fn new(seed: PieceSeed) -> Self {
        let mut this = Self {
            rng: Pcg32::seed_from_u64(seed.value()),
            bag: VecDeque::with_capacity(PieceKind::LEN * 2),
        };
        this.push_shuffled_set();
        this
    }

    fn push_shuffled_set(&mut self) {
        let mut set = PieceKind::ALL;
        set.shuffle(&mut self.rng);
        self.bag.extend(set);
    }

    /// Pops the next piece, refilling the bag when it runs low.
    ///
    /// # Panics
    ///
    /// Panics if the bag is empty (should never happen).
    pub fn pop_next(&mut self) -> PieceKind {
        let kind = self
            .bag
            .pop_front()
            .expect("piece bag should never be empty");
        if self.bag.len() < REFILL_THRESHOLD {
            self.push_shuffled_set();
        }
        kind
    }

    /// Returns the piece that the next [`pop_next`](Self::pop_next) will yield.
    ///
    /// # Panics
    ///
    /// Panics if the bag is empty (should never happen).
    #[must_use]
    pub fn peek_next(&self) -> PieceKind {
        *self.bag.front().expect("piece bag should never be empty")
    }

    /// Iterates the upcoming pieces currently in the bag.
    pub fn upcoming(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.bag.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_fnv_known_values() {
        assert_eq!(PieceSeed::from_label("").value(), 0xcbf2_9ce4_8422_2325);
        assert_eq!(PieceSeed::from_label("a").value(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_each_set_of_seven_is_a_permutation() {
        let mut bag = PieceBag::new(PieceSeed::from_label("0"));
        for _ in 0..10 {
            let set = (0..PieceKind::LEN)
                .map(|_| bag.pop_next())
                .collect::<HashSet<_>>();
            assert_eq!(set.len(), PieceKind::LEN);
        }
    }

    #[test]
    fn test_peek_matches_pop() {
        let mut bag = PieceBag::new(PieceSeed::new(42));
        for _ in 0..30 {
            let peeked = bag.peek_next();
            assert_eq!(bag.pop_next(), peeked);
            assert!(bag.upcoming().count() >= REFILL_THRESHOLD);
        }
    }

    #[test]
    fn test_different_labels_differ() {
        let mut a = PieceBag::new(PieceSeed::from_label("1"));
        let mut b = PieceBag::new(PieceSeed::from_label("2"));
        let a = (0..70).map(|_| a.pop_next()).collect::<Vec<_>>();
        let b = (0..70).map(|_| b.pop_next()).collect::<Vec<_>>();
        assert_ne!(a, b);
    }
}
