//! Card representation for the abstracted hold'em game.
//!
//! - `Card`: a single playing card with rank and suit
//! - `Deck`: a 52-card deck that deals without replacement
//!
//! Hands and boards are plain card slices so that games with any number of
//! hole cards or board cards share the same types.

use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

/// Rank of a deuce. Ranks run 0-12 from 2 to A.
pub const RANK_2: u8 = 0;
/// Rank of a ten.
pub const RANK_T: u8 = 8;
/// Rank of a jack.
pub const RANK_J: u8 = 9;
/// Rank of a queen.
pub const RANK_Q: u8 = 10;
/// Rank of a king.
pub const RANK_K: u8 = 11;
/// Rank of an ace.
pub const RANK_A: u8 = 12;

/// Number of cards in a full deck.
pub const DECK_SIZE: usize = 52;

const RANK_CHARS: [char; 13] = ['2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A'];
const SUIT_CHARS: [char; 4] = ['c', 'd', 'h', 's'];

/// A single playing card.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Card {
    /// Card index 0-51: rank * 4 + suit
    id: u8,
}

impl Card {
    /// Create a new card from rank (0-12) and suit (0-3).
    #[inline]
    pub fn new(rank: u8, suit: u8) -> Self {
        debug_assert!(rank < 13, "rank must be 0-12");
        debug_assert!(suit < 4, "suit must be 0-3");
        Self { id: rank * 4 + suit }
    }

    /// Create a card from its ID (0-51).
    #[inline]
    pub fn from_id(id: u8) -> Self {
        debug_assert!((id as usize) < DECK_SIZE, "card id must be 0-51");
        Self { id }
    }

    /// Parse a card from string like "As", "Kh", "2c".
    pub fn parse(s: &str) -> Option<Self> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 2 {
            return None;
        }

        let rank = RANK_CHARS.iter().position(|&c| c == chars[0].to_ascii_uppercase())?;
        let suit = SUIT_CHARS.iter().position(|&c| c == chars[1].to_ascii_lowercase())?;

        Some(Self::new(rank as u8, suit as u8))
    }

    /// Card ID (0-51).
    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Get the card's rank (0-12: 2-A).
    #[inline]
    pub fn rank(&self) -> u8 {
        self.id / 4
    }

    /// Get the card's suit (0-3).
    #[inline]
    pub fn suit(&self) -> u8 {
        self.id % 4
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", RANK_CHARS[self.rank() as usize], SUIT_CHARS[self.suit() as usize])
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Parse a run of cards like "AhKs" or "Ah Ks Qd".
pub fn parse_cards(s: &str) -> Option<Vec<Card>> {
    let s = s.replace(' ', "");
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| s.get(i..i + 2).and_then(Card::parse))
        .collect()
}

/// A deck of 52 playing cards.
///
/// The deck is a plain value: cloning it hands the copy its own dealing
/// position, so independent branches never observe each other's draws.
#[derive(Clone)]
pub struct Deck {
    cards: [Card; DECK_SIZE],
    /// Index of next card to deal.
    index: usize,
    /// Number of usable cards in the deck (52 minus dead cards).
    size: usize,
}

impl Deck {
    /// Create a new deck in standard order.
    pub fn new() -> Self {
        let mut cards = [Card::from_id(0); DECK_SIZE];
        for (i, card) in cards.iter_mut().enumerate() {
            *card = Card::from_id(i as u8);
        }
        Self {
            cards,
            index: 0,
            size: DECK_SIZE,
        }
    }

    /// Create a deck with specific cards removed.
    pub fn without(dead_cards: &[Card]) -> Self {
        let mut deck = Self::new();
        let mut write_idx = 0;
        for id in 0..DECK_SIZE as u8 {
            let card = Card::from_id(id);
            if !dead_cards.contains(&card) {
                deck.cards[write_idx] = card;
                write_idx += 1;
            }
        }
        deck.size = write_idx;
        deck
    }

    /// Shuffle the undealt cards.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.cards[self.index..self.size].shuffle(rng);
    }

    /// Deal the next card from the deck.
    pub fn deal(&mut self) -> Option<Card> {
        if self.index >= self.size {
            return None;
        }
        let card = self.cards[self.index];
        self.index += 1;
        Some(card)
    }

    /// Deal exactly `n` cards, or `None` if fewer remain.
    pub fn deal_n(&mut self, n: usize) -> Option<Vec<Card>> {
        if self.remaining() < n {
            return None;
        }
        let cards = self.cards[self.index..self.index + n].to_vec();
        self.index += n;
        Some(cards)
    }

    /// Get the number of remaining cards.
    pub fn remaining(&self) -> usize {
        self.size - self.index
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deck({} remaining)", self.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_card_creation() {
        let ace_spades = Card::new(RANK_A, 3);
        assert_eq!(ace_spades.rank(), RANK_A);
        assert_eq!(ace_spades.suit(), 3);
        assert_eq!(ace_spades.to_string(), "As");

        let two_clubs = Card::new(RANK_2, 0);
        assert_eq!(two_clubs.to_string(), "2c");
    }

    #[test]
    fn test_card_parsing() {
        assert_eq!(Card::parse("As").unwrap().to_string(), "As");
        assert_eq!(Card::parse("td").unwrap().to_string(), "Td");
        assert!(Card::parse("XX").is_none());
        assert!(Card::parse("A").is_none());

        let cards = parse_cards("Ah Ks Qd").unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[2].rank(), RANK_Q);
        assert!(parse_cards("AhK").is_none());
    }

    #[test]
    fn test_deck_deals_without_replacement() {
        let mut deck = Deck::new();
        let mut rng = StdRng::seed_from_u64(7);
        deck.shuffle(&mut rng);

        let first = deck.deal_n(50).unwrap();
        assert_eq!(deck.remaining(), 2);
        assert!(deck.deal_n(3).is_none());
        assert_eq!(deck.remaining(), 2);

        let mut all = first;
        all.extend(deck.deal_n(2).unwrap());
        all.sort();
        all.dedup();
        assert_eq!(all.len(), DECK_SIZE);
        assert!(deck.deal().is_none());
    }

    #[test]
    fn test_cloned_deck_deals_independently() {
        let mut deck = Deck::new();
        deck.shuffle(&mut StdRng::seed_from_u64(11));
        let mut copy = deck.clone();

        let a = deck.deal_n(3).unwrap();
        let b = copy.deal_n(3).unwrap();
        assert_eq!(a, b);
        assert_eq!(deck.remaining(), copy.remaining());
    }

    #[test]
    fn test_deck_without() {
        let dead = parse_cards("AsAh").unwrap();
        let mut deck = Deck::without(&dead);
        assert_eq!(deck.remaining(), 50);
        let rest = deck.deal_n(50).unwrap();
        assert!(!rest.contains(&dead[0]));
        assert!(!rest.contains(&dead[1]));
    }
}
