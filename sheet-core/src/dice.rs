//! Attribute rolling.
//!
//! Randomness is injected through [`DiceSource`] so tests can script draws;
//! [`RandomDice`] is the production source, either thread-local or seeded.

use std::fmt;

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::attributes::AttributeVector;

/// A source of six-sided die results.
pub trait DiceSource {
    /// One draw, uniform over 1..=6.
    fn roll_d6(&mut self) -> u8;
}

/// Dice backed by a [`rand`] generator.
pub struct RandomDice<R: Rng = ThreadRng> {
    rng: R,
}

impl RandomDice<ThreadRng> {
    /// Fresh thread-local randomness, not reproducible.
    pub fn thread() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl RandomDice<StdRng> {
    /// Reproducible dice for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> DiceSource for RandomDice<R> {
    fn roll_d6(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }
}

/// One 4d6-drop-lowest roll, keeping the individual dice for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRoll {
    /// Dice sorted from highest to lowest; the last one is dropped.
    pub dice: [u8; 4],
    pub total: u8,
}

impl AttributeRoll {
    pub fn dropped(&self) -> u8 {
        self.dice[3]
    }
}

impl fmt::Display for AttributeRoll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, ({})] = {}",
            self.dice[0], self.dice[1], self.dice[2], self.dice[3], self.total
        )
    }
}

/// Roll four dice, drop the lowest and sum the rest. Always within 3..=18.
pub fn roll_attribute(dice: &mut dyn DiceSource) -> AttributeRoll {
    let mut rolls = [0u8; 4];
    for roll in rolls.iter_mut() {
        *roll = dice.roll_d6().clamp(1, 6);
    }
    rolls.sort_unstable_by(|a, b| b.cmp(a));
    AttributeRoll {
        dice: rolls,
        total: rolls[..3].iter().sum(),
    }
}

/// Six rolls, sorted from highest to lowest.
pub fn roll_attribute_set(dice: &mut dyn DiceSource) -> [AttributeRoll; 6] {
    let mut rolls = [(); 6].map(|_| roll_attribute(dice));
    rolls.sort_by(|a, b| b.total.cmp(&a.total));
    rolls
}

/// A rolled vector: the sorted set assigned in attribute order.
pub fn roll_attributes(dice: &mut dyn DiceSource) -> AttributeVector {
    AttributeVector::from_ordered(roll_attribute_set(dice).map(|roll| roll.total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedDice;

    #[test]
    fn test_drop_lowest() {
        let mut dice = FixedDice::new(vec![1, 6, 4, 5]);
        let roll = roll_attribute(&mut dice);
        assert_eq!(roll.total, 15);
        assert_eq!(roll.dropped(), 1);
        assert_eq!(roll.to_string(), "[6, 5, 4, (1)] = 15");
    }

    #[test]
    fn test_roll_bounds() {
        let mut dice = RandomDice::thread();
        for _ in 0..200 {
            let roll = roll_attribute(&mut dice);
            assert!((3..=18).contains(&roll.total));
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let first = roll_attributes(&mut RandomDice::seeded(42));
        let second = roll_attributes(&mut RandomDice::seeded(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_set_is_sorted_descending() {
        // Totals in draw order: 3, 18, 10, 12, 7, 15
        let mut dice = FixedDice::new(vec![
            1, 1, 1, 1, //
            6, 6, 6, 6, //
            4, 3, 3, 1, //
            4, 4, 4, 4, //
            2, 2, 3, 1, //
            5, 5, 5, 1,
        ]);
        let scores = roll_attributes(&mut dice);
        assert_eq!(scores.values(), [18, 15, 12, 10, 7, 3]);
    }
}
