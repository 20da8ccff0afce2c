//! Concrete card games plugged into the CFR trainer.
//!
//! The engine in [`crate::cfr`] only deals in buckets and winner sets; a
//! game module supplies the real-card collaborators behind those traits.
//!
//! ## Available Games
//!
//! - [`holdem`]: Texas Hold'em cards, hand ranking and strength bucketing

pub mod holdem;
