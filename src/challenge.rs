use std::fmt;

use rand::Rng;

const MIN_OPERAND: u32 = 5;
const MAX_OPERAND: u32 = 24;

/// Sum the user must solve before a challenge-mode alarm can be stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathChallenge {
    left: u32,
    right: u32,
}

impl MathChallenge {
    pub fn generate(rng: &mut impl Rng) -> Self {
        Self {
            left: rng.gen_range(MIN_OPERAND..=MAX_OPERAND),
            right: rng.gen_range(MIN_OPERAND..=MAX_OPERAND),
        }
    }

    pub fn answer(&self) -> u32 {
        self.left + self.right
    }

    pub fn check(&self, answer: u32) -> bool {
        answer == self.answer()
    }
}

impl fmt::Display for MathChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "What is {} + {}?", self.left, self.right)
    }
}
