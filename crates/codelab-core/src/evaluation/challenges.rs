//! Static catalog of the site's coding challenges.
//!
//! Expected outputs are stored in canonical form, without leading or trailing
//! whitespace, because the comparator trims only the submitted output.

use serde::Serialize;

use super::comparator::evaluate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub xp_reward: u32,
    pub max_blocks: u32,
    pub expected_output: String,
}

impl Challenge {
    fn new(
        id: &str,
        title: &str,
        description: &str,
        difficulty: Difficulty,
        xp_reward: u32,
        max_blocks: u32,
        expected_output: String,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            difficulty,
            xp_reward,
            max_blocks,
            expected_output: expected_output.trim().to_string(),
        }
    }

    /// Whether `output` solves this challenge.
    pub fn evaluate(&self, output: &str) -> bool {
        evaluate(output, &self.expected_output)
    }

    /// XP for a given progress percentage: full reward once completed,
    /// otherwise the floored share of it.
    pub fn xp_for(&self, progress: u32, completed: bool) -> u32 {
        if completed {
            self.xp_reward
        } else {
            self.xp_reward * progress.min(100) / 100
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChallengeCatalog {
    challenges: Vec<Challenge>,
}

impl Default for ChallengeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ChallengeCatalog {
    pub fn new(challenges: Vec<Challenge>) -> Self {
        Self { challenges }
    }

    /// The challenges served by the site.
    pub fn builtin() -> Self {
        let primes: Vec<String> = (2u32..=100)
            .filter(|n| (2..*n).take_while(|d| d * d <= *n).all(|d| n % d != 0))
            .map(|n| n.to_string())
            .collect();

        let fizzbuzz: Vec<String> = (1u32..=100)
            .map(|n| match (n % 3, n % 5) {
                (0, 0) => "fizzbuzz".to_string(),
                (0, _) => "fizz".to_string(),
                (_, 0) => "buzz".to_string(),
                _ => n.to_string(),
            })
            .collect();

        Self::new(vec![
            Challenge::new(
                "print",
                "Intro to Printing",
                "Print 'hello' five times",
                Difficulty::Beginner,
                100,
                3,
                vec!["hello"; 5].join("\n"),
            ),
            Challenge::new(
                "print2",
                "Intro to Printing - 2",
                "Print 1 - 10 using a loop",
                Difficulty::Intermediate,
                150,
                6,
                (1..=10).map(|n| n.to_string()).collect::<Vec<_>>().join("\n"),
            ),
            Challenge::new(
                "prime100",
                "Intro to Printing - 3",
                "Print the prime numbers from 2 - 100",
                Difficulty::Advanced,
                200,
                20,
                primes.join("\n"),
            ),
            Challenge::new(
                "fizzbuzz",
                "Fizzbuzz Challenge",
                "Print the numbers 1 - 100. If the number is divisible by 3, replace it with 'fizz'. \
                 If the number is divisible by 5, replace it with 'buzz'. If the number is divisible \
                 by 3 and 5, replace it with 'fizzbuzz'. Do this in 35 or fewer blocks",
                Difficulty::Advanced,
                200,
                35,
                fizzbuzz.join("\n"),
            ),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.id == id)
    }

    pub fn all(&self) -> &[Challenge] {
        &self.challenges
    }
}
