use std::fmt;

/// Fewest matches that pay anything.
pub const MIN_WINNING_MATCHES: usize = 3;

/// Paid per matched number once the round is a winner.
pub const PRIZE_PER_MATCH: u64 = 20;

/// What a settled round produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub matches: usize,
    pub winnings: u64,
}

impl Outcome {
    pub fn message(&self) -> String {
        format!(
            "You matched {} number(s) and won ${}",
            self.matches, self.winnings
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

pub fn count_matches(selected: &[u8], drawn: &[u8]) -> usize {
    selected.iter().filter(|n| drawn.contains(n)).count()
}

pub fn winnings_for(matches: usize) -> u64 {
    if matches >= MIN_WINNING_MATCHES {
        matches as u64 * PRIZE_PER_MATCH
    } else {
        0
    }
}

/// Compares the picks against the draw. `drawn` may hold fewer than six
/// numbers when the draw collided with itself.
pub fn settle(selected: &[u8], drawn: &[u8]) -> Outcome {
    let matches = count_matches(selected, drawn);
    Outcome {
        matches,
        winnings: winnings_for(matches),
    }
}
