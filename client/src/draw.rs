use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{MAX_NUMBER, MIN_NUMBER, PICK_COUNT};

/// Where drawn numbers come from. Injected so a draw can be replayed.
pub trait RandomSource {
    /// A number in `low..=high`.
    fn next_in(&mut self, low: u8, high: u8) -> u8;
}

/// Ordinary pseudo-random draws. Not suitable where fairness must be
/// provable.
pub struct EntropySource(StdRng);

impl EntropySource {
    pub fn new() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for EntropySource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropySource {
    fn next_in(&mut self, low: u8, high: u8) -> u8 {
        self.0.gen_range(low..=high)
    }
}

/// Replays a fixed sequence, wrapping around at the end. Values outside the
/// requested range are folded into it.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<u8>,
    next: usize,
}

impl SequenceSource {
    pub fn new(values: impl IntoIterator<Item = u8>) -> Self {
        Self {
            values: values.into_iter().collect(),
            next: 0,
        }
    }
}

impl RandomSource for SequenceSource {
    fn next_in(&mut self, low: u8, high: u8) -> u8 {
        if self.values.is_empty() {
            return low;
        }
        let value = self.values[self.next % self.values.len()];
        self.next = self.next.wrapping_add(1);

        if (low..=high).contains(&value) {
            value
        } else {
            let span = u16::from(high - low) + 1;
            low + (u16::from(value) % span) as u8
        }
    }
}

/// Samples six numbers with replacement and keeps the first occurrence of
/// each, so the draw holds between one and six numbers.
pub fn draw_numbers(source: &mut dyn RandomSource) -> Vec<u8> {
    let mut drawn = Vec::with_capacity(PICK_COUNT);
    for _ in 0..PICK_COUNT {
        let number = source.next_in(MIN_NUMBER, MAX_NUMBER);
        if !drawn.contains(&number) {
            drawn.push(number);
        }
    }
    drawn
}
