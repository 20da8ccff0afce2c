//! Counterfactual Regret Minimization over the abstracted game tree.
//!
//! Every iteration deals one real hand from a freshly shuffled deck and walks
//! the tree with one pointer per player. Each player follows the bucket path
//! of their own cards through a structurally identical subtree, while the
//! action taken at a decision moves every pointer along the same edge.
//!
//! At an action node all legal actions are explored. Near the root the
//! branches run in parallel on rayon; each branch owns its copies of the
//! reach probabilities and fold flags and reads the tree immutably. Branches
//! return the regret and strategy increments they computed, and those are
//! committed to the tree only once the whole iteration has succeeded.

use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;

use crate::cfr::action::{Action, NUM_ACTIONS};
use crate::cfr::builder::GameTreeBuilder;
use crate::cfr::config::{ConfigError, TrainerConfig, TrainingStats};
use crate::cfr::definition::{DefinitionError, GameDefinition};
use crate::cfr::game::{BucketOracle, ShowdownEvaluator};
use crate::cfr::tree::{uniform, ActionNode, GameTree, NodeId, NodeKind};
use crate::games::holdem::{Card, Deck};

/// Errors that abort a training run.
#[derive(Debug, Error)]
pub enum TrainError {
    /// The game definition is invalid.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// The trainer configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Oracle and definition disagree on the number of buckets.
    #[error("oracle produces {oracle} buckets but the game uses {definition}")]
    BucketCountMismatch {
        /// Buckets reported by the oracle.
        oracle: usize,
        /// Buckets the tree was built with.
        definition: usize,
    },

    /// The oracle returned a bucket with no child node.
    #[error("oracle returned bucket {bucket} for player {player}, expected < {bucket_count}")]
    BucketOutOfRange {
        /// Player whose cards were bucketed.
        player: usize,
        /// Returned bucket.
        bucket: usize,
        /// Buckets per card node.
        bucket_count: usize,
    },

    /// Not enough cards left to deal the hand.
    #[error("deck exhausted: needed {needed} cards, {remaining} left")]
    DeckExhausted {
        /// Cards requested.
        needed: usize,
        /// Cards left in the deck.
        remaining: usize,
    },

    /// A showdown produced an empty winner set.
    #[error("showdown evaluator returned no winners")]
    NoWinners,

    /// A showdown named a folded or unknown player.
    #[error("showdown evaluator returned player {0}, who is folded or does not exist")]
    InvalidWinner(usize),

    /// A node id led somewhere the traversal did not expect.
    #[error("node {0} does not match the traversal")]
    TreeMismatch(usize),

    /// The dedicated thread pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Real cards of one iteration and the buckets they map to.
///
/// Cards are dealt from one shuffled deck: each player's hole cards in seat
/// order, then the board of every round. All branches of the iteration read
/// the same deal.
#[derive(Debug, Clone)]
pub struct Deal {
    /// Hole cards, indexed by player.
    pub hole_cards: Vec<Vec<Card>>,
    /// The whole board in reveal order.
    pub board: Vec<Card>,
    /// Preflop bucket of each player.
    pub hole_buckets: Vec<usize>,
    /// Bucket of each player after each round's reveal, indexed by
    /// `[round][player]`. Empty for rounds that reveal no cards.
    pub board_buckets: Vec<Vec<usize>>,
}

impl Deal {
    /// Shuffle a full deck and deal one hand.
    pub fn sample<O, R>(
        definition: &GameDefinition,
        oracle: &O,
        rng: &mut R,
    ) -> Result<Self, TrainError>
    where
        O: BucketOracle + ?Sized,
        R: rand::Rng,
    {
        let mut deck = Deck::new();
        deck.shuffle(rng);

        let num_players = definition.num_players();
        let hole_cards = (0..num_players)
            .map(|_| deal(&mut deck, definition.num_hole_cards()))
            .collect::<Result<Vec<_>, _>>()?;
        let hole_buckets = hole_cards
            .iter()
            .enumerate()
            .map(|(player, hole)| checked_bucket(oracle, player, hole, &[]))
            .collect::<Result<Vec<_>, _>>()?;

        let mut board = Vec::with_capacity(definition.total_board_cards());
        let mut board_buckets = Vec::with_capacity(definition.num_rounds());
        for round in 0..definition.num_rounds() {
            let count = definition.board_card_count(round)?;
            if count == 0 {
                board_buckets.push(Vec::new());
                continue;
            }
            board.extend(deal(&mut deck, count)?);
            let buckets = hole_cards
                .iter()
                .enumerate()
                .map(|(player, hole)| checked_bucket(oracle, player, hole, &board))
                .collect::<Result<Vec<_>, _>>()?;
            board_buckets.push(buckets);
        }

        Ok(Self {
            hole_cards,
            board,
            hole_buckets,
            board_buckets,
        })
    }
}

fn deal(deck: &mut Deck, count: usize) -> Result<Vec<Card>, TrainError> {
    let remaining = deck.remaining();
    deck.deal_n(count).ok_or(TrainError::DeckExhausted {
        needed: count,
        remaining,
    })
}

fn checked_bucket<O: BucketOracle + ?Sized>(
    oracle: &O,
    player: usize,
    hole_cards: &[Card],
    board: &[Card],
) -> Result<usize, TrainError> {
    let bucket = oracle.bucket(hole_cards, board);
    let bucket_count = oracle.bucket_count();
    if bucket >= bucket_count {
        return Err(TrainError::BucketOutOfRange {
            player,
            bucket,
            bucket_count,
        });
    }
    Ok(bucket)
}

/// Strategy from accumulated regrets: positive regrets normalized, uniform
/// over legal actions when none is positive.
pub fn regret_matching(
    regret_sum: &[f64; NUM_ACTIONS],
    legal: &[bool; NUM_ACTIONS],
) -> [f64; NUM_ACTIONS] {
    let mut positive = [0.0; NUM_ACTIONS];
    for a in 0..NUM_ACTIONS {
        if legal[a] {
            positive[a] = regret_sum[a].max(0.0);
        }
    }

    let total: f64 = positive.iter().sum();
    if total > 0.0 {
        positive.map(|r| r / total)
    } else {
        uniform(legal)
    }
}

/// Utility of every player at the end of a hand.
///
/// A lone survivor takes the whole pot without a showdown. Otherwise
/// `winners` is asked who splits it.
pub fn terminal_utility<W>(
    pot_commitment: &[u32],
    folded: &[bool],
    winners: W,
) -> Result<Vec<f64>, TrainError>
where
    W: FnOnce() -> Vec<usize>,
{
    let total: f64 = pot_commitment.iter().map(|&c| c as f64).sum();
    let mut utility: Vec<f64> = pot_commitment.iter().map(|&c| -(c as f64)).collect();

    let mut active = folded.iter().enumerate().filter(|(_, f)| !**f).map(|(p, _)| p);
    if let (Some(survivor), None) = (active.next(), active.next()) {
        utility[survivor] += total;
        return Ok(utility);
    }

    let winners = winners();
    if winners.is_empty() {
        return Err(TrainError::NoWinners);
    }
    let share = total / winners.len() as f64;
    for &p in &winners {
        if folded.get(p).copied().unwrap_or(true) {
            return Err(TrainError::InvalidWinner(p));
        }
        utility[p] += share;
    }
    Ok(utility)
}

/// Increment for one action node, produced during a traversal.
#[derive(Debug, Clone)]
struct NodeUpdate {
    node: NodeId,
    strategy: [f64; NUM_ACTIONS],
    regret_delta: [f64; NUM_ACTIONS],
    strategy_delta: [f64; NUM_ACTIONS],
}

/// Result of walking a subtree.
#[derive(Debug)]
struct Traversal {
    /// Expected utility of every player.
    utility: Vec<f64>,
    updates: Vec<NodeUpdate>,
}

/// Read-only view shared by all branches of one iteration.
struct Walker<'a, E> {
    tree: &'a GameTree,
    deal: &'a Deal,
    evaluator: &'a E,
    parallel_depth: usize,
}

impl<'a, E: ShowdownEvaluator> Walker<'a, E> {
    /// Recursive CFR walk.
    ///
    /// `pointers[p]` is player `p`'s position in the tree. All pointers sit
    /// on nodes of the same kind.
    fn walk(
        &self,
        pointers: &[NodeId],
        reach: &[f64],
        folded: &[bool],
        revealed: usize,
        depth: usize,
    ) -> Result<Traversal, TrainError> {
        let lead = pointers[0];

        match self.tree.node(lead).kind() {
            NodeKind::HoleCards { .. } => {
                let next = self.follow_buckets(pointers, &self.deal.hole_buckets)?;
                self.walk(&next, reach, folded, revealed, depth)
            }
            NodeKind::BoardCards { round, card_count, .. } => {
                let buckets = self
                    .deal
                    .board_buckets
                    .get(*round)
                    .ok_or(TrainError::TreeMismatch(lead.index()))?;
                let next = self.follow_buckets(pointers, buckets)?;
                self.walk(&next, reach, folded, revealed + card_count, depth)
            }
            NodeKind::Action(action) => {
                self.decision(action.player, pointers, reach, folded, revealed, depth)
            }
            NodeKind::Terminal { pot_commitment } => {
                let board = self
                    .deal
                    .board
                    .get(..revealed)
                    .ok_or(TrainError::TreeMismatch(lead.index()))?;
                let utility = terminal_utility(pot_commitment, folded, || {
                    self.evaluator.winners(&self.deal.hole_cards, folded, board)
                })?;
                Ok(Traversal {
                    utility,
                    updates: Vec::new(),
                })
            }
        }
    }

    fn decision(
        &self,
        player: usize,
        pointers: &[NodeId],
        reach: &[f64],
        folded: &[bool],
        revealed: usize,
        depth: usize,
    ) -> Result<Traversal, TrainError> {
        let own_id = *pointers.get(player).ok_or(TrainError::TreeMismatch(pointers[0].index()))?;
        let own = self.action_node(own_id)?;
        let strategy = regret_matching(&own.regret_sum, &own.legal_mask());
        let actions: Vec<Action> = own.legal_children().map(|(action, _)| action).collect();

        let explore = |action: Action| -> Result<(Action, Traversal), TrainError> {
            let next = pointers
                .iter()
                .map(|&id| {
                    self.action_node(id)?.children[action.index()]
                        .ok_or(TrainError::TreeMismatch(id.index()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let mut next_reach = reach.to_vec();
            next_reach[player] *= strategy[action.index()];
            let mut next_folded = folded.to_vec();
            if action == Action::Fold {
                next_folded[player] = true;
            }

            let traversal = self.walk(&next, &next_reach, &next_folded, revealed, depth + 1)?;
            Ok((action, traversal))
        };

        let branches: Vec<(Action, Traversal)> = if depth < self.parallel_depth {
            actions.par_iter().map(|&a| explore(a)).collect::<Result<_, _>>()?
        } else {
            actions.iter().map(|&a| explore(a)).collect::<Result<_, _>>()?
        };

        let mut utility = vec![0.0; pointers.len()];
        for (action, branch) in &branches {
            let p = strategy[action.index()];
            for (u, v) in utility.iter_mut().zip(&branch.utility) {
                *u += p * v;
            }
        }

        let opponent_reach: f64 = reach
            .iter()
            .enumerate()
            .filter(|&(q, _)| q != player)
            .map(|(_, r)| r)
            .product();

        let mut regret_delta = [0.0; NUM_ACTIONS];
        for (action, branch) in &branches {
            regret_delta[action.index()] = opponent_reach * (branch.utility[player] - utility[player]);
        }

        let mut updates = vec![NodeUpdate {
            node: own_id,
            strategy,
            regret_delta,
            strategy_delta: strategy.map(|s| reach[player] * s),
        }];
        for (_, branch) in branches {
            updates.extend(branch.updates);
        }

        Ok(Traversal { utility, updates })
    }

    fn follow_buckets(&self, pointers: &[NodeId], buckets: &[usize]) -> Result<Vec<NodeId>, TrainError> {
        pointers
            .iter()
            .zip(buckets)
            .map(|(&id, &bucket)| match self.tree.node(id).kind() {
                NodeKind::HoleCards { children, .. } | NodeKind::BoardCards { children, .. } => {
                    children.get(bucket).copied().ok_or(TrainError::TreeMismatch(id.index()))
                }
                _ => Err(TrainError::TreeMismatch(id.index())),
            })
            .collect()
    }

    fn action_node(&self, id: NodeId) -> Result<&'a ActionNode, TrainError> {
        self.tree.action(id).ok_or(TrainError::TreeMismatch(id.index()))
    }
}

/// CFR trainer for a limit game.
///
/// # Example
/// ```ignore
/// use limit_cfr::cfr::{CfrTrainer, GameDefinition, TrainerConfig};
/// use limit_cfr::games::holdem::{CardAbstraction, HandEvaluator};
///
/// let definition = GameDefinition::limit_holdem();
/// let oracle = CardAbstraction::new(definition.bucket_count());
/// let mut trainer = CfrTrainer::new(definition, oracle, HandEvaluator::new(), TrainerConfig::default())?;
/// trainer.train(1_000)?;
/// ```
pub struct CfrTrainer<O, E> {
    definition: GameDefinition,
    tree: GameTree,
    oracle: O,
    evaluator: E,
    config: TrainerConfig,
    rng: StdRng,
    pool: Option<ThreadPool>,
    iteration: u64,
    stats: TrainingStats,
}

impl<O: BucketOracle, E: ShowdownEvaluator> CfrTrainer<O, E> {
    /// Validate the inputs and build the game tree.
    pub fn new(
        definition: GameDefinition,
        oracle: O,
        evaluator: E,
        config: TrainerConfig,
    ) -> Result<Self, TrainError> {
        config.validate()?;
        definition.validate()?;

        if oracle.bucket_count() != definition.bucket_count() {
            return Err(TrainError::BucketCountMismatch {
                oracle: oracle.bucket_count(),
                definition: definition.bucket_count(),
            });
        }

        let tree = GameTreeBuilder::new(&definition).build()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let pool = match config.num_threads {
            Some(threads) => Some(ThreadPoolBuilder::new().num_threads(threads).build()?),
            None => None,
        };

        let stats = TrainingStats {
            action_nodes: tree.counts().action,
            ..TrainingStats::new()
        };

        Ok(Self {
            definition,
            tree,
            oracle,
            evaluator,
            config,
            rng,
            pool,
            iteration: 0,
            stats,
        })
    }

    /// Run one iteration: deal a hand, walk the tree, commit the updates.
    ///
    /// On error the tree is left exactly as it was. Average strategies are
    /// not refreshed; `train` does that after its last iteration.
    pub fn run_iteration(&mut self) -> Result<(), TrainError> {
        let deal = Deal::sample(&self.definition, &self.oracle, &mut self.rng)?;

        let n = self.definition.num_players();
        let walker = Walker {
            tree: &self.tree,
            deal: &deal,
            evaluator: &self.evaluator,
            parallel_depth: self.config.parallel_depth,
        };
        let pointers = vec![self.tree.root(); n];
        let reach = vec![1.0; n];
        let folded = vec![false; n];
        let run = || walker.walk(&pointers, &reach, &folded, 0, 0);

        let traversal = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }?;

        self.commit(traversal.updates);
        self.iteration += 1;
        Ok(())
    }

    fn commit(&mut self, updates: Vec<NodeUpdate>) {
        for update in updates {
            if let Some(node) = self.tree.action_mut(update.node) {
                node.strategy = update.strategy;
                for a in 0..NUM_ACTIONS {
                    node.regret_sum[a] += update.regret_delta[a];
                    node.strategy_sum[a] += update.strategy_delta[a];
                }
            }
        }
    }

    /// Train for a number of iterations.
    ///
    /// May be called repeatedly; accumulators and the iteration count keep
    /// growing across calls.
    pub fn train(&mut self, iterations: u64) -> Result<&TrainingStats, TrainError> {
        self.train_with_callback(iterations, 0, |_| {})
    }

    /// Train with a callback for progress tracking.
    ///
    /// # Arguments
    /// * `iterations` - Number of iterations to run
    /// * `callback_interval` - How often to call the callback (0 = never)
    /// * `callback` - Function called every `callback_interval` iterations
    pub fn train_with_callback<F>(
        &mut self,
        iterations: u64,
        callback_interval: u64,
        mut callback: F,
    ) -> Result<&TrainingStats, TrainError>
    where
        F: FnMut(&TrainingStats),
    {
        info!(
            "Training {} iterations over {} action nodes (parallel depth {})",
            iterations, self.stats.action_nodes, self.config.parallel_depth
        );
        let start_time = Instant::now();

        for i in 0..iterations {
            self.run_iteration()?;

            if callback_interval > 0 && (i + 1) % callback_interval == 0 {
                self.update_stats(start_time, i + 1);
                debug!(
                    "Iteration {} ({:.0} it/s)",
                    self.iteration, self.stats.iterations_per_second
                );
                callback(&self.stats);
            }
        }

        self.finalize_average_strategies();
        self.update_stats(start_time, iterations);
        info!(
            "Finished {} iterations in {:.2}s ({:.0} it/s), {} total",
            iterations, self.stats.elapsed_seconds, self.stats.iterations_per_second, self.iteration
        );

        Ok(&self.stats)
    }

    fn update_stats(&mut self, start_time: Instant, batch: u64) {
        self.stats.iterations = self.iteration;
        self.stats.elapsed_seconds = start_time.elapsed().as_secs_f64();
        self.stats.update_rate(batch);
    }

    /// Set `average_strategy` on every action node from its strategy sum.
    pub fn finalize_average_strategies(&mut self) {
        let mut unreached = 0usize;
        for node in self.tree.action_nodes_mut() {
            if node.strategy_sum.iter().sum::<f64>() <= 0.0 {
                unreached += 1;
            }
            node.average_strategy = Some(node.compute_average());
        }
        if unreached > 0 {
            warn!("{} action nodes were never reached; using uniform strategies", unreached);
        }
    }

    /// Total iterations completed across all `train` calls.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// The game tree with its accumulators.
    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    /// Consume the trainer and keep the tree.
    pub fn into_tree(self) -> GameTree {
        self.tree
    }

    /// Ruleset the tree was built from.
    pub fn definition(&self) -> &GameDefinition {
        &self.definition
    }

    /// Active configuration.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Statistics of the last `train` call.
    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::holdem::{CardAbstraction, HandEvaluator};
    use approx::assert_abs_diff_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Bucket 0 for hands holding the ace of spades, bucket 4 otherwise.
    struct AceOfSpadesOracle;

    impl BucketOracle for AceOfSpadesOracle {
        fn bucket_count(&self) -> usize {
            5
        }

        fn bucket(&self, hole_cards: &[Card], _board: &[Card]) -> usize {
            if hole_cards.iter().any(|c| c.to_string() == "As") {
                0
            } else {
                4
            }
        }
    }

    /// Highest preflop bucket wins; ties split.
    struct BucketShowdown;

    impl ShowdownEvaluator for BucketShowdown {
        fn winners(&self, hole_cards: &[Vec<Card>], folded: &[bool], board: &[Card]) -> Vec<usize> {
            let strength: Vec<Option<usize>> = hole_cards
                .iter()
                .zip(folded)
                .map(|(hole, &f)| (!f).then(|| AceOfSpadesOracle.bucket(hole, board)))
                .collect();
            let best = strength.iter().flatten().max().copied();
            (0..hole_cards.len())
                .filter(|&p| strength[p].is_some() && strength[p] == best)
                .collect()
        }
    }

    /// Buckets from card ranks, so board rounds move players around.
    struct RankOracle;

    impl BucketOracle for RankOracle {
        fn bucket_count(&self) -> usize {
            3
        }

        fn bucket(&self, hole_cards: &[Card], board: &[Card]) -> usize {
            let ranks: usize = hole_cards.iter().chain(board).map(|c| c.rank() as usize).sum();
            ranks % 3
        }
    }

    /// Valid for a fixed number of calls, then out of range.
    struct FailingOracle {
        calls: AtomicUsize,
        fail_after: usize,
    }

    impl BucketOracle for FailingOracle {
        fn bucket_count(&self) -> usize {
            5
        }

        fn bucket(&self, _hole_cards: &[Card], _board: &[Card]) -> usize {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
                99
            } else {
                2
            }
        }
    }

    /// Settles showdowns like `BucketShowdown` for a fixed number of calls,
    /// then reports no winners.
    struct FlakyShowdown {
        calls: AtomicUsize,
        fail_after: usize,
    }

    impl ShowdownEvaluator for FlakyShowdown {
        fn winners(&self, hole_cards: &[Vec<Card>], folded: &[bool], board: &[Card]) -> Vec<usize> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
                Vec::new()
            } else {
                BucketShowdown.winners(hole_cards, folded, board)
            }
        }
    }

    fn two_street_definition() -> GameDefinition {
        GameDefinition {
            num_players: 2,
            num_rounds: 2,
            num_hole_cards: 2,
            bucket_count: 3,
            board_cards: vec![0, 3],
            raise_sizes: vec![20, 40],
            max_raises: vec![2, 2],
            max_raises_per_player: vec![2, 2],
            blinds: vec![10, 20],
            first_to_act: vec![0, 1],
        }
    }

    fn average_at(tree: &GameTree, key: &str) -> [f64; NUM_ACTIONS] {
        tree.action_nodes()
            .find(|(id, _)| tree.info_set_key(*id).as_str() == key)
            .and_then(|(_, node)| node.average_strategy)
            .unwrap_or_else(|| panic!("no trained node for key {}", key))
    }

    #[test]
    fn test_regret_matching() {
        let legal = [true, true, true];
        assert_eq!(regret_matching(&[1.0, 3.0, 0.0], &legal), [0.25, 0.75, 0.0]);
        assert_eq!(regret_matching(&[-1.0, 2.0, -5.0], &legal), [0.0, 1.0, 0.0]);

        let no_fold = [false, true, true];
        assert_eq!(regret_matching(&[0.0, 0.0, 0.0], &no_fold), [0.0, 0.5, 0.5]);
        assert_eq!(regret_matching(&[-2.0, -1.0, -3.0], &no_fold), [0.0, 0.5, 0.5]);
        // Regret on an illegal action is ignored.
        assert_eq!(regret_matching(&[9.0, 1.0, 1.0], &no_fold), [0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_regret_matching_is_pure() {
        let regrets = [0.3, 1.7, 4.1];
        let legal = [true, true, true];
        let first = regret_matching(&regrets, &legal);
        let _ = regret_matching(&[5.0, 0.0, 0.0], &legal);
        assert_eq!(regret_matching(&regrets, &legal), first);
    }

    #[test]
    fn test_terminal_utility_fold() {
        let utility = terminal_utility(&[40, 20], &[false, true], || unreachable!()).unwrap();
        assert_eq!(utility, vec![20.0, -20.0]);

        let utility =
            terminal_utility(&[20, 40, 60], &[true, true, false], || unreachable!()).unwrap();
        assert_eq!(utility, vec![-20.0, -40.0, 60.0]);
    }

    #[test]
    fn test_terminal_utility_showdown_is_zero_sum() {
        let utility = terminal_utility(&[40, 40], &[false, false], || vec![1]).unwrap();
        assert_eq!(utility, vec![-40.0, 40.0]);

        let utility = terminal_utility(&[40, 40], &[false, false], || vec![0, 1]).unwrap();
        assert_eq!(utility, vec![0.0, 0.0]);

        let utility =
            terminal_utility(&[20, 40, 40], &[true, false, false], || vec![1, 2]).unwrap();
        assert_eq!(utility, vec![-20.0, 10.0, 10.0]);

        for (pot, folded, winners) in [
            (vec![20u32, 60, 60], vec![false, false, false], vec![0, 1, 2]),
            (vec![30, 70, 70], vec![false, false, false], vec![2]),
            (vec![30, 70, 110], vec![true, false, false], vec![1, 2]),
        ] {
            let utility = terminal_utility(&pot, &folded, || winners.clone()).unwrap();
            assert_abs_diff_eq!(utility.iter().sum::<f64>(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_terminal_utility_rejects_bad_winners() {
        assert!(matches!(
            terminal_utility(&[20, 20], &[false, false], Vec::new),
            Err(TrainError::NoWinners)
        ));
        assert!(matches!(
            terminal_utility(&[20, 20, 20], &[true, false, false], || vec![0]),
            Err(TrainError::InvalidWinner(0))
        ));
    }

    #[test]
    fn test_deal_is_disjoint_and_bucketed() {
        let definition = GameDefinition::limit_holdem();
        let mut rng = StdRng::seed_from_u64(5);
        let deal = Deal::sample(&definition, &RankOracle, &mut rng).unwrap();

        assert_eq!(deal.hole_cards.len(), 2);
        assert_eq!(deal.board.len(), 5);
        assert_eq!(deal.board_buckets.len(), 4);
        assert!(deal.board_buckets[0].is_empty());
        assert_eq!(deal.board_buckets[1].len(), 2);

        let mut all: Vec<Card> = deal.hole_cards.iter().flatten().copied().collect();
        all.extend(&deal.board);
        let dealt = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), dealt);

        // Board buckets use each player's own hole cards.
        for player in 0..2 {
            let expected = RankOracle.bucket(&deal.hole_cards[player], &deal.board[..3]);
            assert_eq!(deal.board_buckets[1][player], expected);
        }
    }

    #[test]
    fn test_bucket_count_mismatch() {
        let result = CfrTrainer::new(
            GameDefinition::heads_up_single_street(4, 1),
            AceOfSpadesOracle,
            BucketShowdown,
            TrainerConfig::deterministic(1),
        );
        assert!(matches!(
            result,
            Err(TrainError::BucketCountMismatch { oracle: 5, definition: 4 })
        ));
    }

    #[test]
    fn test_average_strategies_are_distributions() {
        let mut trainer = CfrTrainer::new(
            two_street_definition(),
            RankOracle,
            BucketShowdown,
            TrainerConfig::deterministic(17),
        )
        .unwrap();
        trainer.train(300).unwrap();
        assert_eq!(trainer.iteration(), 300);

        for (_, node) in trainer.tree().action_nodes() {
            let average = node.average_strategy.unwrap();
            assert_abs_diff_eq!(average.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
            for (a, &p) in average.iter().enumerate() {
                assert!((0.0..=1.0).contains(&p));
                if node.children[a].is_none() {
                    assert_eq!(p, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_weak_hand_stops_raising() {
        let mut trainer = CfrTrainer::new(
            GameDefinition::heads_up_single_street(5, 1),
            AceOfSpadesOracle,
            BucketShowdown,
            TrainerConfig::deterministic(42),
        )
        .unwrap();
        trainer.train(2_000).unwrap();
        let tree = trainer.tree();

        // A weak first player loses every showdown, so raising only costs more.
        assert!(average_at(tree, ":0:")[Action::Raise.index()] < 0.05);
        // A strong hand never folds to a raise, a weak one never calls.
        assert!(average_at(tree, ":4:r")[Action::Fold.index()] < 0.01);
        assert!(average_at(tree, ":0:r")[Action::Call.index()] < 0.05);
        assert!(average_at(tree, ":0:cr")[Action::Fold.index()] > 0.95);
    }

    #[test]
    fn test_incremental_training_accumulates() {
        let definition = GameDefinition::heads_up_single_street(5, 1);
        let mut once = CfrTrainer::new(
            definition.clone(),
            AceOfSpadesOracle,
            BucketShowdown,
            TrainerConfig::deterministic(8),
        )
        .unwrap();
        once.train(100).unwrap();

        let mut twice =
            CfrTrainer::new(definition, AceOfSpadesOracle, BucketShowdown, TrainerConfig::deterministic(8))
                .unwrap();
        twice.train(60).unwrap();
        let stats = twice.train(40).unwrap();
        assert_eq!(stats.iterations, 100);

        assert_eq!(once.tree(), twice.tree());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = {
            let mut trainer = CfrTrainer::new(
                two_street_definition(),
                RankOracle,
                BucketShowdown,
                TrainerConfig::deterministic(23),
            )
            .unwrap();
            trainer.train(50).unwrap();
            trainer.into_tree()
        };
        let parallel = {
            let config = TrainerConfig::default()
                .with_seed(23)
                .with_threads(2)
                .with_parallel_depth(4);
            let mut trainer =
                CfrTrainer::new(two_street_definition(), RankOracle, BucketShowdown, config).unwrap();
            trainer.train(50).unwrap();
            trainer.into_tree()
        };
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_failed_iteration_leaves_tree_untouched() {
        let oracle = FailingOracle {
            calls: AtomicUsize::new(0),
            fail_after: 10,
        };
        let mut trainer = CfrTrainer::new(
            GameDefinition::heads_up_single_street(5, 1),
            oracle,
            BucketShowdown,
            TrainerConfig::deterministic(3).with_parallel_depth(2),
        )
        .unwrap();

        // Two oracle calls per iteration.
        for _ in 0..5 {
            trainer.run_iteration().unwrap();
        }
        let before = trainer.tree().clone();

        assert!(matches!(
            trainer.run_iteration(),
            Err(TrainError::BucketOutOfRange { bucket: 99, .. })
        ));
        assert_eq!(trainer.iteration(), 5);
        assert_eq!(trainer.tree(), &before);
        assert!(trainer.train(10).is_err());
    }

    #[test]
    fn test_failed_parallel_branch_commits_nothing() {
        // Three showdowns per iteration in this game.
        let evaluator = FlakyShowdown {
            calls: AtomicUsize::new(0),
            fail_after: 15,
        };
        let config = TrainerConfig::default()
            .with_seed(3)
            .with_threads(4)
            .with_parallel_depth(3);
        let mut trainer = CfrTrainer::new(
            GameDefinition::heads_up_single_street(5, 1),
            AceOfSpadesOracle,
            evaluator,
            config,
        )
        .unwrap();

        for _ in 0..5 {
            trainer.run_iteration().unwrap();
        }
        let before = trainer.tree().clone();

        assert!(matches!(trainer.run_iteration(), Err(TrainError::NoWinners)));
        assert_eq!(trainer.iteration(), 5);
        assert_eq!(trainer.tree(), &before);

        assert!(matches!(trainer.train(10), Err(TrainError::NoWinners)));
        assert_eq!(trainer.iteration(), 5);
        assert_eq!(trainer.tree(), &before);
    }

    #[test]
    fn test_three_players_two_streets() {
        let definition = GameDefinition {
            num_players: 3,
            num_rounds: 2,
            num_hole_cards: 2,
            bucket_count: 3,
            board_cards: vec![0, 3],
            raise_sizes: vec![20, 40],
            max_raises: vec![1, 1],
            max_raises_per_player: vec![1, 1, 1],
            blinds: vec![10, 20, 20],
            first_to_act: vec![2, 0],
        };
        let mut trainer = CfrTrainer::new(
            definition,
            RankOracle,
            BucketShowdown,
            TrainerConfig::deterministic(29),
        )
        .unwrap();
        trainer.train(200).unwrap();
        assert_eq!(trainer.iteration(), 200);

        let tree = trainer.tree();
        let mut reached_by_player = [0usize; 3];
        for (_, node) in tree.action_nodes() {
            let average = node.average_strategy.unwrap();
            assert_abs_diff_eq!(average.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
            for (a, &p) in average.iter().enumerate() {
                assert!((0.0..=1.0).contains(&p));
                if node.children[a].is_none() {
                    assert_eq!(p, 0.0);
                }
            }
            if node.strategy_sum.iter().sum::<f64>() > 0.0 {
                reached_by_player[node.player] += 1;
            }
        }
        assert!(reached_by_player.iter().all(|&n| n > 0), "{:?}", reached_by_player);
    }

    #[test]
    fn test_trains_with_holdem_collaborators() {
        let definition = GameDefinition::heads_up_single_street(5, 2);
        let mut trainer = CfrTrainer::new(
            definition,
            CardAbstraction::new(5),
            HandEvaluator::new(),
            TrainerConfig::deterministic(11),
        )
        .unwrap();
        let stats = trainer.train(200).unwrap();
        assert_eq!(stats.iterations, 200);
        assert_eq!(stats.action_nodes, 30);

        let reached = trainer
            .tree()
            .action_nodes()
            .filter(|(_, node)| node.strategy_sum.iter().sum::<f64>() > 0.0)
            .count();
        assert!(reached > 0);
    }
}
