//! Card abstraction for information state bucketing.
//!
//! - Preflop: Chen starting-hand score, normalized into bucket space
//! - Postflop: Monte-Carlo equity vs a random hand, split into equal-width buckets
//!
//! Postflop sampling is seeded from the card set itself, so a given hand and
//! board always land in the same bucket.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;

use super::card::{Card, RANK_A, RANK_J, RANK_K, RANK_Q};
use super::hand_eval::HandEvaluator;
use crate::cfr::config::ConfigError;
use crate::cfr::game::BucketOracle;

/// Lowest and highest scores the Chen formula can produce (72o and AA).
const CHEN_MIN: f64 = -1.0;
const CHEN_MAX: f64 = 20.0;

/// Configuration for card abstraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbstractionConfig {
    /// Number of buckets on every street (default: 5)
    pub bucket_count: usize,
    /// Number of samples for postflop equity estimation (default: 200)
    pub equity_samples: usize,
}

impl Default for AbstractionConfig {
    fn default() -> Self {
        Self {
            bucket_count: 5,
            equity_samples: 200,
        }
    }
}

impl AbstractionConfig {
    /// Default sampling with `bucket_count` buckets.
    pub fn new(bucket_count: usize) -> Self {
        Self {
            bucket_count,
            ..Default::default()
        }
    }

    /// Builder method: set equity samples.
    pub fn with_equity_samples(mut self, samples: usize) -> Self {
        self.equity_samples = samples;
        self
    }

    /// Reject zero buckets or zero samples.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_count == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bucket_count",
                message: "at least 1 bucket is required".to_string(),
            });
        }
        if self.equity_samples == 0 {
            return Err(ConfigError::InvalidValue {
                field: "equity_samples",
                message: "postflop bucketing needs at least 1 sample".to_string(),
            });
        }
        Ok(())
    }
}

/// Hand-strength abstraction for hold'em cards.
#[derive(Debug, Clone)]
pub struct CardAbstraction {
    config: AbstractionConfig,
    evaluator: HandEvaluator,
}

impl CardAbstraction {
    /// Abstraction with default sampling.
    pub fn new(bucket_count: usize) -> Self {
        Self::with_config(AbstractionConfig::new(bucket_count))
    }

    /// Abstraction with explicit settings.
    pub fn with_config(config: AbstractionConfig) -> Self {
        Self {
            config,
            evaluator: HandEvaluator::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &AbstractionConfig {
        &self.config
    }

    /// Preflop bucket from the Chen score.
    pub fn preflop_bucket(&self, hole_cards: &[Card]) -> usize {
        let normalized = (chen_score(hole_cards) - CHEN_MIN) / (CHEN_MAX - CHEN_MIN);
        self.to_bucket(normalized)
    }

    /// Postflop bucket from equity vs a random hand.
    pub fn postflop_bucket(&self, hole_cards: &[Card], board: &[Card]) -> usize {
        let mut rng = StdRng::seed_from_u64(card_set_seed(hole_cards, board));
        let equity =
            self.evaluator
                .equity_vs_random(hole_cards, board, self.config.equity_samples, &mut rng);
        self.to_bucket(equity)
    }

    /// Map a strength in [0, 1] to a bucket in [0, bucket_count).
    fn to_bucket(&self, strength: f64) -> usize {
        let count = self.config.bucket_count.max(1);
        let bucket = (strength.clamp(0.0, 1.0) * count as f64).floor() as usize;
        bucket.min(count - 1)
    }
}

impl BucketOracle for CardAbstraction {
    fn bucket_count(&self) -> usize {
        self.config.bucket_count
    }

    fn bucket(&self, hole_cards: &[Card], board: &[Card]) -> usize {
        if board.is_empty() {
            self.preflop_bucket(hole_cards)
        } else {
            self.postflop_bucket(hole_cards, board)
        }
    }
}

/// Chen formula score of the two highest hole cards, rounded up.
pub fn chen_score(hole_cards: &[Card]) -> f64 {
    let mut cards = hole_cards.to_vec();
    cards.sort_by(|a, b| b.rank().cmp(&a.rank()));

    let Some(&high) = cards.first() else {
        return CHEN_MIN;
    };
    let Some(&low) = cards.get(1) else {
        return card_points(high.rank()).ceil();
    };

    if high.rank() == low.rank() {
        return (card_points(high.rank()) * 2.0).max(5.0).ceil();
    }

    let mut score = card_points(high.rank());
    if high.suit() == low.suit() {
        score += 2.0;
    }

    let gap = high.rank() - low.rank() - 1;
    score -= match gap {
        0 => 0.0,
        1 => 1.0,
        2 => 2.0,
        3 => 4.0,
        _ => 5.0,
    };

    if gap <= 1 && high.rank() < RANK_Q {
        score += 1.0;
    }

    score.ceil()
}

fn card_points(rank: u8) -> f64 {
    match rank {
        RANK_A => 10.0,
        RANK_K => 8.0,
        RANK_Q => 7.0,
        RANK_J => 6.0,
        r => (r as f64 + 2.0) / 2.0,
    }
}

/// Order-independent seed for a (hole cards, board) pair.
fn card_set_seed(hole_cards: &[Card], board: &[Card]) -> u64 {
    let mut hole: Vec<u8> = hole_cards.iter().map(Card::id).collect();
    let mut shared: Vec<u8> = board.iter().map(Card::id).collect();
    hole.sort_unstable();
    shared.sort_unstable();

    let mut hasher = FxHasher::default();
    hasher.write(&hole);
    hasher.write_u8(0xff);
    hasher.write(&shared);
    hasher.finish()
}
