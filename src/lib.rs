//! # Limit CFR
//!
//! Counterfactual Regret Minimization for abstracted limit poker.
//!
//! ## Features
//!
//! - **Abstracted Game Tree**: Built once from a declarative ruleset, with
//!   card deals collapsed into strength buckets
//! - **Parallel Training**: Legal actions near the root are explored on rayon,
//!   with updates committed only after a full iteration succeeds
//! - **Incremental Training**: Accumulators keep growing across `train` calls
//! - **Strategy Files**: Sorted text tables that load back into a lookup table
//!
//! ## Quick Start
//!
//! ```ignore
//! use limit_cfr::cfr::{save_strategy, CfrTrainer, GameDefinition, TrainerConfig};
//! use limit_cfr::games::holdem::{CardAbstraction, HandEvaluator};
//!
//! let definition = GameDefinition::limit_holdem();
//! let oracle = CardAbstraction::new(definition.bucket_count());
//! let mut trainer = CfrTrainer::new(definition, oracle, HandEvaluator::new(), TrainerConfig::default())?;
//!
//! trainer.train(10_000)?;
//! save_strategy(trainer.tree(), trainer.iteration(), "strategy.txt")?;
//! ```
//!
//! ## Modules
//!
//! - [`cfr`]: Game definition, tree builder, trainer and strategy files
//! - [`games`]: Real-card collaborators (hold'em cards, ranking, bucketing)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐    ┌─────────────────┐    ┌──────────────┐
//! │  GameDefinition  │───▶│ GameTreeBuilder │───▶│   GameTree   │
//! └──────────────────┘    └─────────────────┘    └──────┬───────┘
//!                                                       │
//!          ┌──────────────┐    ┌──────────────┐         ▼
//!          │ BucketOracle │───▶│  CfrTrainer  │◀── one deal per iteration
//!          └──────────────┘    └──────┬───────┘
//!       ┌───────────────────┐         │
//!       │ ShowdownEvaluator │─────────┘
//!       └───────────────────┘         ▼
//!                              strategy file ───▶ StrategyTable
//! ```

#![warn(missing_docs)]

use thiserror::Error;

/// CFR engine: definition, tree, trainer and strategy files.
pub mod cfr;

/// Real-card collaborators for the trainer.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use cfr::{
    Action, CfrTrainer, GameDefinition, GameTree, GameTreeBuilder, StrategyTable, TrainerConfig,
    TrainingStats,
};

/// Any error the crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] cfr::ConfigError),

    /// Invalid game definition.
    #[error(transparent)]
    Definition(#[from] cfr::DefinitionError),

    /// Training aborted.
    #[error(transparent)]
    Train(#[from] cfr::TrainError),

    /// Strategy file or lookup failure.
    #[error(transparent)]
    Strategy(#[from] cfr::StrategyError),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
