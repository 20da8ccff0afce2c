//! Collaborator traits consumed by the CFR trainer.
//!
//! The trainer never looks at real cards itself. It asks a `BucketOracle`
//! which abstraction bucket a hand falls into, and a `ShowdownEvaluator` who
//! wins a contested pot. Any implementation of these traits can be plugged
//! into `CfrTrainer`; the hold'em implementations live in
//! [`crate::games::holdem`].

use crate::games::holdem::Card;

/// Maps a player's real cards to a strength bucket.
///
/// # Contract
/// - Total: every card set of a legal deal maps to a bucket.
/// - Deterministic: the same card set always maps to the same bucket.
/// - Bounded: the result is always in `[0, bucket_count())`.
pub trait BucketOracle: Send + Sync {
    /// Number of distinct buckets this oracle produces.
    fn bucket_count(&self) -> usize;

    /// Bucket for `hole_cards`, optionally combined with the board cards
    /// revealed so far. An empty `board` means no community cards.
    fn bucket(&self, hole_cards: &[Card], board: &[Card]) -> usize;
}

/// Decides who takes the pot at showdown.
pub trait ShowdownEvaluator: Send + Sync {
    /// Indices of the players that split the pot.
    ///
    /// # Arguments
    /// * `hole_cards` - real hole cards, indexed by player
    /// * `folded` - fold flags, indexed by player; folded players never win
    /// * `board` - community cards revealed so far
    ///
    /// # Returns
    /// Every player holding the best non-folded hand. Ties return all of them.
    fn winners(&self, hole_cards: &[Vec<Card>], folded: &[bool], board: &[Card]) -> Vec<usize>;
}

impl<T: BucketOracle + ?Sized> BucketOracle for &T {
    fn bucket_count(&self) -> usize {
        (**self).bucket_count()
    }

    fn bucket(&self, hole_cards: &[Card], board: &[Card]) -> usize {
        (**self).bucket(hole_cards, board)
    }
}

impl<T: ShowdownEvaluator + ?Sized> ShowdownEvaluator for &T {
    fn winners(&self, hole_cards: &[Vec<Card>], folded: &[bool], board: &[Card]) -> Vec<usize> {
        (**self).winners(hole_cards, folded, board)
    }
}
