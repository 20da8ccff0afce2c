//! Texas Hold'em card collaborators for the limit CFR trainer.
//!
//! The trainer only sees buckets and winner sets. This module supplies the
//! real-card side of that contract:
//!
//! - [`card`]: cards and a dealing deck
//! - [`hand_eval`]: hand ranking and the showdown evaluator
//! - [`abstraction`]: preflop and postflop strength bucketing

pub mod abstraction;
pub mod card;
pub mod hand_eval;

pub use abstraction::{AbstractionConfig, CardAbstraction};
pub use card::{parse_cards, Card, Deck};
pub use hand_eval::{HandCategory, HandEvaluator, HandRank};
