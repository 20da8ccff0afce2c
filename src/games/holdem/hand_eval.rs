//! Poker hand evaluation.
//!
//! Ranks hands of two to seven cards. Five or more cards are scored as the
//! best five-card combination; shorter hands (single-street games dealt
//! without a board) are scored on rank groups and kickers only, since
//! straights and flushes need five cards.

use rand::Rng;
use std::cmp::Ordering;

use super::card::{Card, Deck};
use crate::cfr::game::ShowdownEvaluator;

/// Number of community cards on a complete board.
pub const FULL_BOARD: usize = 5;

/// Hand rank categories, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandCategory {
    /// No made hand.
    HighCard = 0,
    /// Two cards of one rank.
    OnePair = 1,
    /// Two different pairs.
    TwoPair = 2,
    /// Three cards of one rank.
    ThreeOfAKind = 3,
    /// Five consecutive ranks.
    Straight = 4,
    /// Five cards of one suit.
    Flush = 5,
    /// Three of a kind plus a pair.
    FullHouse = 6,
    /// Four cards of one rank.
    FourOfAKind = 7,
    /// A straight in one suit.
    StraightFlush = 8,
}

/// A comparable hand rank. Higher values are better hands.
/// Format: category (4 bits) | kicker1 (4 bits) | kicker2 (4 bits) | ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandRank(u32);

impl HandRank {
    fn new(category: HandCategory, kickers: &[u8]) -> Self {
        let mut value = (category as u32) << 20;
        for (i, &k) in kickers.iter().take(5).enumerate() {
            value |= (k as u32) << (16 - i * 4);
        }
        Self(value)
    }

    /// Get the raw rank value for comparison.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Get the hand category.
    pub fn category(&self) -> HandCategory {
        match self.0 >> 20 {
            1 => HandCategory::OnePair,
            2 => HandCategory::TwoPair,
            3 => HandCategory::ThreeOfAKind,
            4 => HandCategory::Straight,
            5 => HandCategory::Flush,
            6 => HandCategory::FullHouse,
            7 => HandCategory::FourOfAKind,
            8 => HandCategory::StraightFlush,
            _ => HandCategory::HighCard,
        }
    }
}

impl PartialOrd for HandRank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandRank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// Hand evaluator for poker hands.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandEvaluator;

impl HandEvaluator {
    /// Stateless evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Evaluate hole cards together with the board.
    pub fn evaluate(&self, hole_cards: &[Card], board: &[Card]) -> HandRank {
        let cards: Vec<Card> = hole_cards.iter().chain(board.iter()).copied().collect();
        self.evaluate_cards(&cards)
    }

    /// Evaluate any set of cards, picking the best five when more are given.
    pub fn evaluate_cards(&self, cards: &[Card]) -> HandRank {
        if cards.len() <= 5 {
            return self.rank_cards(cards);
        }

        // Every 5-card subset in lexicographic index order.
        let n = cards.len();
        let mut best = HandRank(0);
        let mut picks = [0, 1, 2, 3, 4];
        let mut hand = [cards[0]; 5];
        loop {
            for (slot, &i) in hand.iter_mut().zip(&picks) {
                *slot = cards[i];
            }
            best = best.max(self.rank_cards(&hand));

            let Some(k) = (0..5).rev().find(|&k| picks[k] < n - 5 + k) else {
                break;
            };
            picks[k] += 1;
            for j in k + 1..5 {
                picks[j] = picks[j - 1] + 1;
            }
        }
        best
    }

    /// Rank at most five cards.
    fn rank_cards(&self, cards: &[Card]) -> HandRank {
        let mut rank_counts = [0u8; 13];
        let mut suit_counts = [0u8; 4];
        let mut rank_bits = 0u16;

        for card in cards {
            rank_counts[card.rank() as usize] += 1;
            suit_counts[card.suit() as usize] += 1;
            rank_bits |= 1 << card.rank();
        }

        let complete = cards.len() == 5;
        let is_flush = complete && suit_counts.iter().any(|&c| c == 5);
        let straight_high = if complete { self.find_straight(rank_bits) } else { None };

        if let (true, Some(high)) = (is_flush, straight_high) {
            return HandRank::new(HandCategory::StraightFlush, &[high]);
        }

        let mut quads = Vec::new();
        let mut trips = Vec::new();
        let mut pairs = Vec::new();
        let mut singles = Vec::new();

        for rank in (0..13u8).rev() {
            match rank_counts[rank as usize] {
                4 => quads.push(rank),
                3 => trips.push(rank),
                2 => pairs.push(rank),
                1 => singles.push(rank),
                _ => {}
            }
        }

        if let Some(&quad) = quads.first() {
            let kicker = singles.first().copied().unwrap_or(0);
            return HandRank::new(HandCategory::FourOfAKind, &[quad, kicker]);
        }

        if let (Some(&trip), Some(&pair)) = (trips.first(), pairs.first()) {
            return HandRank::new(HandCategory::FullHouse, &[trip, pair]);
        }

        if is_flush {
            return HandRank::new(HandCategory::Flush, &singles);
        }

        if let Some(high) = straight_high {
            return HandRank::new(HandCategory::Straight, &[high]);
        }

        if let Some(&trip) = trips.first() {
            let mut kickers = vec![trip];
            kickers.extend(singles.iter().take(2));
            return HandRank::new(HandCategory::ThreeOfAKind, &kickers);
        }

        if pairs.len() >= 2 {
            let mut kickers = vec![pairs[0], pairs[1]];
            kickers.extend(singles.first());
            return HandRank::new(HandCategory::TwoPair, &kickers);
        }

        if let Some(&pair) = pairs.first() {
            let mut kickers = vec![pair];
            kickers.extend(singles.iter().take(3));
            return HandRank::new(HandCategory::OnePair, &kickers);
        }

        HandRank::new(HandCategory::HighCard, &singles)
    }

    /// Find the highest straight from a rank bitmask.
    /// Returns the rank of the straight's top card, or None if no straight.
    fn find_straight(&self, rank_bits: u16) -> Option<u8> {
        for high in (4..13u8).rev() {
            let mask = 0b11111u16 << (high - 4);
            if rank_bits & mask == mask {
                return Some(high);
            }
        }

        // Wheel: A-2-3-4-5, topped by the five
        let wheel = 0b1_0000_0000_1111u16;
        if rank_bits & wheel == wheel {
            return Some(3);
        }

        None
    }

    /// Estimate the equity of `hole_cards` against one random hand of the same
    /// size, completing the board to five cards.
    /// Returns equity as a fraction (0.0 to 1.0).
    pub fn equity_vs_random<R: Rng>(
        &self,
        hole_cards: &[Card],
        board: &[Card],
        samples: usize,
        rng: &mut R,
    ) -> f64 {
        let dead: Vec<Card> = hole_cards.iter().chain(board.iter()).copied().collect();
        let runout = FULL_BOARD.saturating_sub(board.len());
        let mut wins = 0.0;
        let mut total = 0.0;

        for _ in 0..samples {
            let mut deck = Deck::without(&dead);
            deck.shuffle(rng);

            let (Some(opponent), Some(rest)) = (deck.deal_n(hole_cards.len()), deck.deal_n(runout))
            else {
                break;
            };

            let mut full_board = board.to_vec();
            full_board.extend(rest);

            match self.evaluate(hole_cards, &full_board).cmp(&self.evaluate(&opponent, &full_board)) {
                Ordering::Greater => wins += 1.0,
                Ordering::Equal => wins += 0.5,
                Ordering::Less => {}
            }
            total += 1.0;
        }

        if total > 0.0 {
            wins / total
        } else {
            0.5
        }
    }
}

impl ShowdownEvaluator for HandEvaluator {
    fn winners(&self, hole_cards: &[Vec<Card>], folded: &[bool], board: &[Card]) -> Vec<usize> {
        let ranks: Vec<Option<HandRank>> = hole_cards
            .iter()
            .zip(folded)
            .map(|(hand, &out)| (!out).then(|| self.evaluate(hand, board)))
            .collect();

        let Some(best) = ranks.iter().flatten().max().copied() else {
            return Vec::new();
        };

        ranks
            .iter()
            .enumerate()
            .filter(|(_, rank)| **rank == Some(best))
            .map(|(player, _)| player)
            .collect()
    }
}
