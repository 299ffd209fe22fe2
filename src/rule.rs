use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::RANDOM_MARK_THRESHOLD;
use crate::primality::{is_probably_prime, REFERENCE_ROUNDS};
use crate::stepper::CellRule;

/// Colours a marked tile can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileColor {
    White,
    Red,
    Transparent,
}

impl TileColor {
    /// Packed RGBA, red in the lowest byte.
    pub fn rgba(self) -> u32 {
        match self {
            TileColor::White => 0xFFFF_FFFF,
            TileColor::Red => 0xFF00_00FF,
            TileColor::Transparent => 0x0000_0000,
        }
    }
}

/// How marked tiles are chosen and coloured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleOptions {
    /// Miller-Rabin rounds for the mark decision
    pub iterations: u32,
    /// Mark odd cells at random instead of testing primality
    pub show_random: bool,
    /// Re-check marked cells with the reference round count
    pub highlight_false_primes: bool,
    /// With highlighting on, paint only the cells the cheap test got wrong
    pub false_primes_only: bool,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            iterations: crate::config::DEFAULT_ITERATIONS,
            show_random: false,
            highlight_false_primes: crate::config::DEFAULT_HIGHLIGHT_FALSE_PRIMES,
            false_primes_only: false,
        }
    }
}

/// Marks probable primes and flags the ones a stronger test disagrees with.
///
/// Every colour decision records its index as the largest marked so far, so
/// the host can show how far into the primes the pass has reached.
pub struct PrimeRule<R = StdRng> {
    options: RuleOptions,
    rng: R,
    largest_marked: Option<u64>,
}

impl PrimeRule<StdRng> {
    /// Rule with witnesses drawn from OS entropy.
    pub fn from_entropy(options: RuleOptions) -> Self {
        Self::with_rng(options, StdRng::from_entropy())
    }

    pub fn seeded(options: RuleOptions, seed: u64) -> Self {
        Self::with_rng(options, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PrimeRule<R> {
    pub fn with_rng(options: RuleOptions, rng: R) -> Self {
        Self {
            options,
            rng,
            largest_marked: None,
        }
    }

    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    /// Largest index whose colour was asked for, if any.
    pub fn largest_marked(&self) -> Option<u64> {
        self.largest_marked
    }
}

impl<R: Rng> CellRule for PrimeRule<R> {
    type Value = TileColor;

    fn should_mark(&mut self, index: u64) -> bool {
        if self.options.show_random {
            return index % 2 == 1 && self.rng.gen::<f64>() > RANDOM_MARK_THRESHOLD;
        }
        is_probably_prime(index, self.options.iterations, &mut self.rng)
    }

    fn value_for(&mut self, index: u64) -> TileColor {
        if self.options.show_random {
            return TileColor::White;
        }
        self.largest_marked = Some(index);

        if !self.options.highlight_false_primes {
            return TileColor::White;
        }
        let confirmed = is_probably_prime(index, REFERENCE_ROUNDS, &mut self.rng);
        match (self.options.false_primes_only, confirmed) {
            (true, true) => TileColor::Transparent,
            (true, false) => TileColor::White,
            (false, true) => TileColor::White,
            (false, false) => TileColor::Red,
        }
    }
}
