//! Ruleset of a limit betting card game.
//!
//! A `GameDefinition` is plain data. Every per-round and per-player lookup
//! goes through a validated accessor that rejects out-of-range indices
//! instead of clamping them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::cfr::config::ConfigError;
use crate::games::holdem::card::DECK_SIZE;

/// Errors raised by `GameDefinition` validation and accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// A round index past the last round.
    #[error("round index {round} out of range (game has {num_rounds} rounds)")]
    RoundOutOfRange {
        /// Requested round.
        round: usize,
        /// Rounds in the game.
        num_rounds: usize,
    },

    /// A player index past the last seat.
    #[error("player index {player} out of range (game has {num_players} players)")]
    PlayerOutOfRange {
        /// Requested player.
        player: usize,
        /// Players in the game.
        num_players: usize,
    },

    /// A parameter that no game can have.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Immutable ruleset of a limit betting game.
///
/// Per-round tables are indexed by round, per-player tables by player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDefinition {
    /// Number of players (at least 2).
    pub num_players: usize,
    /// Number of betting rounds (at least 1).
    pub num_rounds: usize,
    /// Hole cards dealt to each player.
    pub num_hole_cards: usize,
    /// Number of abstraction buckets at every card node.
    pub bucket_count: usize,
    /// Board cards revealed at the start of each round.
    pub board_cards: Vec<usize>,
    /// Fixed raise size of each round.
    pub raise_sizes: Vec<u32>,
    /// Raise cap of each street.
    pub max_raises: Vec<u32>,
    /// Lifetime raise cap of each player, across all rounds.
    pub max_raises_per_player: Vec<u32>,
    /// Forced commitment of each player before any action.
    pub blinds: Vec<u32>,
    /// First player to act in each round.
    pub first_to_act: Vec<usize>,
}

impl GameDefinition {
    /// Four-round heads-up limit hold'em with 5 buckets.
    pub fn limit_holdem() -> Self {
        Self {
            num_players: 2,
            num_rounds: 4,
            num_hole_cards: 2,
            bucket_count: 5,
            board_cards: vec![0, 3, 1, 1],
            raise_sizes: vec![20, 20, 40, 40],
            max_raises: vec![3, 4, 4, 4],
            max_raises_per_player: vec![4, 4],
            blinds: vec![20, 20],
            first_to_act: vec![0, 0, 0, 0],
        }
    }

    /// Heads-up game with a single betting round and no board cards.
    ///
    /// Small enough to train in tests and benchmarks.
    pub fn heads_up_single_street(bucket_count: usize, raise_cap: u32) -> Self {
        Self {
            num_players: 2,
            num_rounds: 1,
            num_hole_cards: 2,
            bucket_count,
            board_cards: vec![0],
            raise_sizes: vec![20],
            max_raises: vec![raise_cap],
            max_raises_per_player: vec![raise_cap, raise_cap],
            blinds: vec![20, 20],
            first_to_act: vec![0],
        }
    }

    /// Load and validate a definition from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a definition from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Check counts and table lengths.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.num_players < 2 {
            return Err(invalid("num_players", "at least 2 players are required"));
        }
        if self.num_rounds < 1 {
            return Err(invalid("num_rounds", "at least 1 round is required"));
        }
        if self.num_hole_cards < 1 {
            return Err(invalid("num_hole_cards", "at least 1 hole card is required"));
        }
        if self.bucket_count < 1 {
            return Err(invalid("bucket_count", "at least 1 bucket is required"));
        }

        check_len("board_cards", self.board_cards.len(), self.num_rounds)?;
        check_len("raise_sizes", self.raise_sizes.len(), self.num_rounds)?;
        check_len("max_raises", self.max_raises.len(), self.num_rounds)?;
        check_len("first_to_act", self.first_to_act.len(), self.num_rounds)?;
        check_len("max_raises_per_player", self.max_raises_per_player.len(), self.num_players)?;
        check_len("blinds", self.blinds.len(), self.num_players)?;

        if let Some(&player) = self.first_to_act.iter().find(|&&p| p >= self.num_players) {
            return Err(DefinitionError::PlayerOutOfRange {
                player,
                num_players: self.num_players,
            });
        }

        let cards_needed = self.num_players * self.num_hole_cards + self.total_board_cards();
        if cards_needed > DECK_SIZE {
            return Err(invalid(
                "board_cards",
                format!("a deal needs {} cards but the deck holds {}", cards_needed, DECK_SIZE),
            ));
        }

        Ok(())
    }

    /// Number of players.
    #[inline]
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// Number of betting rounds.
    #[inline]
    pub fn num_rounds(&self) -> usize {
        self.num_rounds
    }

    /// Hole cards per player.
    #[inline]
    pub fn num_hole_cards(&self) -> usize {
        self.num_hole_cards
    }

    /// Buckets at every card node.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Board cards revealed over the whole hand.
    pub fn total_board_cards(&self) -> usize {
        self.board_cards.iter().sum()
    }

    /// Board cards revealed at the start of `round`.
    pub fn board_card_count(&self, round: usize) -> Result<usize, DefinitionError> {
        self.per_round(&self.board_cards, round)
    }

    /// Fixed raise size of `round`.
    pub fn raise_size(&self, round: usize) -> Result<u32, DefinitionError> {
        self.per_round(&self.raise_sizes, round)
    }

    /// Raise cap of `round`.
    pub fn street_raise_cap(&self, round: usize) -> Result<u32, DefinitionError> {
        self.per_round(&self.max_raises, round)
    }

    /// First player to act in `round`.
    pub fn first_player(&self, round: usize) -> Result<usize, DefinitionError> {
        self.per_round(&self.first_to_act, round)
    }

    /// Raises `player` may make over the whole hand.
    pub fn lifetime_raise_cap(&self, player: usize) -> Result<u32, DefinitionError> {
        self.per_player(&self.max_raises_per_player, player)
    }

    /// Forced commitment of `player`.
    pub fn blind(&self, player: usize) -> Result<u32, DefinitionError> {
        self.per_player(&self.blinds, player)
    }

    fn per_round<T: Copy>(&self, table: &[T], round: usize) -> Result<T, DefinitionError> {
        if round >= self.num_rounds {
            return Err(DefinitionError::RoundOutOfRange {
                round,
                num_rounds: self.num_rounds,
            });
        }
        table.get(round).copied().ok_or_else(|| {
            invalid("per-round table", format!("no entry for round {}", round))
        })
    }

    fn per_player<T: Copy>(&self, table: &[T], player: usize) -> Result<T, DefinitionError> {
        if player >= self.num_players {
            return Err(DefinitionError::PlayerOutOfRange {
                player,
                num_players: self.num_players,
            });
        }
        table.get(player).copied().ok_or_else(|| {
            invalid("per-player table", format!("no entry for player {}", player))
        })
    }
}

impl Default for GameDefinition {
    fn default() -> Self {
        Self::limit_holdem()
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> DefinitionError {
    DefinitionError::InvalidValue {
        field,
        message: message.into(),
    }
}

fn check_len(field: &'static str, actual: usize, expected: usize) -> Result<(), DefinitionError> {
    if actual != expected {
        return Err(invalid(
            field,
            format!("expected {} entries, found {}", expected, actual),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_holdem_preset() {
        let game = GameDefinition::limit_holdem();
        assert!(game.validate().is_ok());
        assert_eq!(game.total_board_cards(), 5);
        assert_eq!(game.board_card_count(1), Ok(3));
        assert_eq!(game.raise_size(3), Ok(40));
        assert_eq!(game.street_raise_cap(0), Ok(3));
        assert_eq!(game.lifetime_raise_cap(1), Ok(4));
        assert_eq!(game.blind(0), Ok(20));
        assert_eq!(game.first_player(2), Ok(0));
    }

    #[test]
    fn test_accessors_reject_out_of_range() {
        let game = GameDefinition::limit_holdem();
        assert_eq!(
            game.raise_size(4),
            Err(DefinitionError::RoundOutOfRange { round: 4, num_rounds: 4 })
        );
        assert_eq!(
            game.board_card_count(9),
            Err(DefinitionError::RoundOutOfRange { round: 9, num_rounds: 4 })
        );
        assert_eq!(
            game.blind(2),
            Err(DefinitionError::PlayerOutOfRange { player: 2, num_players: 2 })
        );
        assert!(game.lifetime_raise_cap(5).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        let mut game = GameDefinition::limit_holdem();
        game.raise_sizes.pop();
        assert!(matches!(
            game.validate(),
            Err(DefinitionError::InvalidValue { field: "raise_sizes", .. })
        ));

        let mut game = GameDefinition::limit_holdem();
        game.num_players = 1;
        assert!(game.validate().is_err());

        let mut game = GameDefinition::limit_holdem();
        game.first_to_act[1] = 2;
        assert_eq!(
            game.validate(),
            Err(DefinitionError::PlayerOutOfRange { player: 2, num_players: 2 })
        );

        let mut game = GameDefinition::limit_holdem();
        game.num_hole_cards = 30;
        assert!(game.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let game = GameDefinition::heads_up_single_street(3, 2);
        let json = serde_json::to_string(&game).unwrap();
        let parsed = GameDefinition::from_json_str(&json).unwrap();
        assert_eq!(parsed, game);

        let broken = json.replace("\"num_players\":2", "\"num_players\":0");
        assert!(matches!(
            GameDefinition::from_json_str(&broken),
            Err(ConfigError::Definition(_))
        ));
        assert!(matches!(
            GameDefinition::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
