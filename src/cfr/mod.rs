//! CFR (Counterfactual Regret Minimization) trainer for limit betting games.
//!
//! The pipeline runs leaves first:
//!
//! 1. A [`GameDefinition`] describes the ruleset
//! 2. [`GameTreeBuilder`] turns it into an abstracted [`GameTree`]
//! 3. [`CfrTrainer`] runs self-play iterations over the tree, asking a
//!    [`BucketOracle`] for card buckets and a [`ShowdownEvaluator`] for winners
//! 4. [`output`] writes the average strategy as a sorted text table
//! 5. [`StrategyTable`] loads that table back for decision-time sampling
//!
//! # Theory
//!
//! **Regret Matching**: Set strategy proportional to positive regrets.
//! ```text
//! Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
//! ```
//!
//! **Counterfactual regret** of action `a` for the acting player `p`,
//! weighted by the probability that everyone else plays to this node:
//! ```text
//! Regret(a) += prod(reach[q] for q != p) * (Value(a) - Value(strategy))
//! ```
//!
//! The average strategy, weighted by the player's own reach, converges to
//! equilibrium; the per-iteration strategy does not.
//!
//! # References
//!
//! - Zinkevich, M., et al. "Regret Minimization in Games with Incomplete Information" (2007)

pub mod action;
pub mod builder;
pub mod config;
pub mod definition;
pub mod game;
pub mod info_key;
pub mod output;
pub mod solver;
pub mod table;
pub mod tree;

pub use action::{Action, NUM_ACTIONS};
pub use builder::GameTreeBuilder;
pub use config::{ConfigError, TrainerConfig, TrainingStats};
pub use definition::{DefinitionError, GameDefinition};
pub use game::{BucketOracle, ShowdownEvaluator};
pub use info_key::InfoSetKey;
pub use output::{save_strategy, strategy_lines, write_strategy, StrategyLine};
pub use solver::{regret_matching, CfrTrainer, Deal, TrainError};
pub use table::{choose_action, StrategyError, StrategyTable};
pub use tree::{ActionNode, GameTree, Node, NodeCounts, NodeId, NodeKind};
