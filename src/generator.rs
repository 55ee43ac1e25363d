//! Fake value generation.
//!
//! Synthesis, default status selection and functional replacements draw all
//! randomness from a [`Generator`], so a seeded generator makes a whole
//! mock deterministic.

use chrono::{Days, Duration, NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// Source of fake values.
pub trait Generator: Send + Sync {
    fn boolean(&self) -> bool;

    /// An integer from the generator's default range.
    fn integer(&self) -> i64;

    /// An integer in `min..=max`.
    fn integer_between(&self, min: i64, max: i64) -> i64;

    fn double(&self) -> f64;

    fn string(&self) -> String;

    /// A calendar date formatted `YYYY-MM-DD`.
    fn date(&self) -> String;

    /// A wall-clock time formatted `HH:MM:SS`.
    fn time(&self) -> String;

    /// A uniformly chosen index below `len`; `len` must be non-zero.
    fn index(&self, len: usize) -> usize;
}

const INTEGER_RANGE: i64 = 1000;
const DATE_SPAN_DAYS: u64 = 365 * 60;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi", "aliquip",
    "commodo", "consequat", "duis", "aute", "irure", "reprehenderit", "voluptate", "velit",
];

/// [`Generator`] backed by a [`StdRng`].
#[derive(Debug)]
pub struct RandomGenerator {
    rng: Mutex<StdRng>,
}

impl RandomGenerator {
    /// A generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// A reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for RandomGenerator {
    fn boolean(&self) -> bool {
        self.with_rng(|rng| rng.gen_bool(0.5))
    }

    fn integer(&self) -> i64 {
        self.integer_between(-INTEGER_RANGE, INTEGER_RANGE)
    }

    fn integer_between(&self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.with_rng(|rng| rng.gen_range(min..=max))
    }

    fn double(&self) -> f64 {
        let range = INTEGER_RANGE as f64;
        self.with_rng(|rng| rng.gen_range(-range..range))
    }

    fn string(&self) -> String {
        self.with_rng(|rng| {
            let count = rng.gen_range(3..=8);
            (0..count)
                .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    fn date(&self) -> String {
        let offset = self.with_rng(|rng| rng.gen_range(0..DATE_SPAN_DAYS));
        (NaiveDate::default() + Days::new(offset))
            .format("%Y-%m-%d")
            .to_string()
    }

    fn time(&self) -> String {
        let seconds = self.with_rng(|rng| rng.gen_range(0..SECONDS_PER_DAY));
        (NaiveTime::default() + Duration::seconds(seconds))
            .format("%H:%M:%S")
            .to_string()
    }

    fn index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.with_rng(|rng| rng.gen_range(0..len))
    }
}
