//! Exam variant generation.
//!
//! A variant is a full copy of the bank with the question order shuffled and,
//! independently, the answer order of every question shuffled. Randomness comes
//! from an injected ChaCha8 generator so that a fixed seed reproduces a run.

use crate::bank::{Question, QuestionBank};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Creates the run's random number generator, seeded when a seed is given.
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

/// One fully ordered instance of the exam.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// 1-based sequence number, stringified.
    pub id: String,
    pub questions: Vec<Question>,
}

impl Variant {
    /// Category ids in this variant's question order.
    pub fn categories(&self) -> Vec<&str> {
        self.questions.iter().map(|q| q.category.as_str()).collect()
    }
}

/// Produces candidate variants from a question bank.
pub struct VariantGenerator<'a> {
    bank: &'a QuestionBank,
    rng: ChaCha8Rng,
}

impl<'a> VariantGenerator<'a> {
    /// Creates a generator that draws from the given random source.
    pub fn new(bank: &'a QuestionBank, rng: ChaCha8Rng) -> Self {
        Self { bank, rng }
    }

    /// Creates a generator with a fixed seed.
    pub fn seeded(bank: &'a QuestionBank, seed: u64) -> Self {
        Self::new(bank, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Generates `count` independent candidates with ids `"1"..="count"`.
    pub fn generate(&mut self, count: usize) -> Vec<Variant> {
        (1..=count)
            .map(|n| self.generate_one(n.to_string()))
            .collect()
    }

    fn generate_one(&mut self, id: String) -> Variant {
        let mut questions = self.bank.questions().to_vec();
        questions.shuffle(&mut self.rng);
        for question in &mut questions {
            question.answers.shuffle(&mut self.rng);
        }
        Variant { id, questions }
    }
}
