//! Construction of the abstracted game tree.
//!
//! The builder walks every betting sequence the ruleset allows, carrying a
//! [`BuildState`] snapshot by value. Each branch gets its own copy, so no
//! counter is ever shared between siblings. Cards are never enumerated: a
//! card node simply fans out into one child per bucket.

use log::info;

use crate::cfr::action::{Action, NUM_ACTIONS};
use crate::cfr::definition::{DefinitionError, GameDefinition};
use crate::cfr::tree::{ActionNode, GameTree, NodeId, NodeKind};

/// Betting state threaded through the recursive build.
#[derive(Debug, Clone)]
struct BuildState {
    folded: Vec<bool>,
    pot_commitment: Vec<u32>,
    /// Raises made by each player over the whole hand.
    player_raises: Vec<u32>,
    rounds_left: usize,
    /// Raises made on the current street.
    round_raises: u32,
    /// Actions taken on the current street.
    players_acted: usize,
    current_player: usize,
}

impl BuildState {
    fn initial(definition: &GameDefinition) -> Result<Self, DefinitionError> {
        let n = definition.num_players();
        let pot_commitment = (0..n)
            .map(|p| definition.blind(p))
            .collect::<Result<Vec<_>, _>>()?;

        let folded = vec![false; n];
        let current_player = next_active(definition.first_player(0)?, &folded);

        Ok(Self {
            folded,
            pot_commitment,
            player_raises: vec![0; n],
            rounds_left: definition.num_rounds(),
            round_raises: 0,
            players_acted: 0,
            current_player,
        })
    }

    fn round(&self, definition: &GameDefinition) -> usize {
        definition.num_rounds() - self.rounds_left
    }

    fn active_count(&self) -> usize {
        self.folded.iter().filter(|&&f| !f).count()
    }

    /// All non-folded players have committed the same amount.
    fn bets_settled(&self) -> bool {
        let mut active = self
            .pot_commitment
            .iter()
            .zip(&self.folded)
            .filter(|(_, folded)| !**folded)
            .map(|(&c, _)| c);
        match active.next() {
            Some(first) => active.all(|c| c == first),
            None => true,
        }
    }

    fn all_acted(&self) -> bool {
        self.players_acted >= self.active_count()
    }

    fn max_commitment(&self) -> u32 {
        self.pot_commitment.iter().copied().max().unwrap_or(0)
    }

    /// Fresh street: counters reset, first active player of the round to act.
    fn next_round(&self, definition: &GameDefinition) -> Result<Self, DefinitionError> {
        let mut next = self.clone();
        next.rounds_left -= 1;
        next.round_raises = 0;
        next.players_acted = 0;
        let round = next.round(definition);
        next.current_player = next_active(definition.first_player(round)?, &next.folded);
        Ok(next)
    }

    /// State after the current player takes `action`.
    fn after(&self, action: Action, raise_size: u32) -> Self {
        let mut next = self.clone();
        let player = self.current_player;
        let max = self.max_commitment();

        match action {
            Action::Fold => next.folded[player] = true,
            Action::Call => next.pot_commitment[player] = max,
            Action::Raise => {
                next.round_raises += 1;
                next.player_raises[player] += 1;
                next.pot_commitment[player] = max + raise_size;
            }
        }

        next.players_acted += 1;
        next.current_player = next_active((player + 1) % self.folded.len(), &next.folded);
        next
    }
}

/// First non-folded seat at or after `start`, wrapping around.
fn next_active(start: usize, folded: &[bool]) -> usize {
    let n = folded.len();
    (0..n)
        .map(|offset| (start + offset) % n)
        .find(|&p| !folded[p])
        .unwrap_or(start)
}

/// Builds the game tree of a [`GameDefinition`].
pub struct GameTreeBuilder<'a> {
    definition: &'a GameDefinition,
}

impl<'a> GameTreeBuilder<'a> {
    /// Builder for `definition`.
    pub fn new(definition: &'a GameDefinition) -> Self {
        Self { definition }
    }

    /// Build the whole tree, rooted at a hole-cards node.
    pub fn build(&self) -> Result<GameTree, DefinitionError> {
        let definition = self.definition;
        definition.validate()?;

        let mut tree = GameTree::empty(definition.num_players());
        let root = tree.push(
            None,
            NodeKind::HoleCards {
                card_count: definition.num_hole_cards(),
                children: Vec::new(),
            },
        );

        let state = BuildState::initial(definition)?;
        let children = (0..definition.bucket_count())
            .map(|_| self.round_start(&mut tree, root, state.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        if let NodeKind::HoleCards { children: slot, .. } = tree.kind_mut(root) {
            *slot = children;
        }

        let counts = tree.counts();
        info!(
            "Built game tree: {} nodes ({} action, {} board, {} terminal)",
            counts.total(),
            counts.action,
            counts.board_cards,
            counts.terminal
        );

        Ok(tree)
    }

    /// Start of a round: a reveal node, or straight to betting if no cards are dealt.
    fn round_start(
        &self,
        tree: &mut GameTree,
        parent: NodeId,
        state: BuildState,
    ) -> Result<NodeId, DefinitionError> {
        let round = state.round(self.definition);
        let card_count = self.definition.board_card_count(round)?;
        if card_count == 0 {
            return self.decision(tree, parent, state);
        }

        let node = tree.push(
            Some(parent),
            NodeKind::BoardCards {
                round,
                card_count,
                children: Vec::new(),
            },
        );
        let children = (0..self.definition.bucket_count())
            .map(|_| self.decision(tree, node, state.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        if let NodeKind::BoardCards { children: slot, .. } = tree.kind_mut(node) {
            *slot = children;
        }
        Ok(node)
    }

    /// Decision point: closes the street, ends the hand, or emits an action node.
    fn decision(
        &self,
        tree: &mut GameTree,
        parent: NodeId,
        state: BuildState,
    ) -> Result<NodeId, DefinitionError> {
        let settled = state.bets_settled();

        if settled && state.all_acted() {
            if state.active_count() > 1 && state.rounds_left > 1 {
                let next = state.next_round(self.definition)?;
                return self.round_start(tree, parent, next);
            }
            return Ok(tree.push(
                Some(parent),
                NodeKind::Terminal {
                    pot_commitment: state.pot_commitment.into_boxed_slice(),
                },
            ));
        }

        let round = state.round(self.definition);
        let player = state.current_player;
        let raise_size = self.definition.raise_size(round)?;
        let can_raise = state.round_raises < self.definition.street_raise_cap(round)?
            && state.player_raises[player] < self.definition.lifetime_raise_cap(player)?;

        let node = tree.push(Some(parent), NodeKind::Action(Box::new(ActionNode::new(player))));

        let mut children = [None; NUM_ACTIONS];
        for action in Action::ALL {
            let legal = match action {
                Action::Fold => !settled,
                Action::Call => true,
                Action::Raise => can_raise,
            };
            if legal {
                let child = self.decision(tree, node, state.after(action, raise_size))?;
                children[action.index()] = Some(child);
            }
        }

        if let Some(slot) = tree.action_mut(node) {
            slot.children = children;
        }
        Ok(node)
    }
}
