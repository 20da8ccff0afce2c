//! Abstracted game tree.
//!
//! Nodes live in a single arena and are addressed by [`NodeId`]. A node owns
//! its children through the ids stored in its [`NodeKind`]; the `parent`
//! link is a plain id used for lookups only.
//!
//! Four node kinds make up the tree:
//!
//! - `HoleCards`: the root, one child per starting-hand bucket
//! - `BoardCards`: a card reveal, one child per updated bucket
//! - `Action`: one player's decision, one child per legal action
//! - `Terminal`: a finished hand with its final pot commitments
//!
//! The shape is fixed once the builder returns. Training only touches the
//! accumulators of action nodes.

use crate::cfr::action::{Action, NUM_ACTIONS};
use crate::cfr::info_key::InfoSetKey;

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A decision point of one player.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionNode {
    /// Player to act.
    pub player: usize,
    /// Child per action; `None` for illegal actions.
    pub children: [Option<NodeId>; NUM_ACTIONS],
    /// Accumulated counterfactual regret per action.
    pub regret_sum: [f64; NUM_ACTIONS],
    /// Strategy of the most recent iteration that reached this node.
    pub strategy: [f64; NUM_ACTIONS],
    /// Reach-weighted sum of strategies over all iterations.
    pub strategy_sum: [f64; NUM_ACTIONS],
    /// Normalized `strategy_sum`, set once training finishes.
    pub average_strategy: Option<[f64; NUM_ACTIONS]>,
}

impl ActionNode {
    /// Decision of `player` with no children and zeroed accumulators.
    pub fn new(player: usize) -> Self {
        Self {
            player,
            children: [None; NUM_ACTIONS],
            regret_sum: [0.0; NUM_ACTIONS],
            strategy: [0.0; NUM_ACTIONS],
            strategy_sum: [0.0; NUM_ACTIONS],
            average_strategy: None,
        }
    }

    /// Which actions have a child.
    pub fn legal_mask(&self) -> [bool; NUM_ACTIONS] {
        self.children.map(|child| child.is_some())
    }

    /// Whether `action` has a child.
    pub fn is_legal(&self, action: Action) -> bool {
        self.children[action.index()].is_some()
    }

    /// Legal actions paired with their children, in index order.
    pub fn legal_children(&self) -> impl Iterator<Item = (Action, NodeId)> + '_ {
        Action::ALL
            .into_iter()
            .filter_map(|action| self.children[action.index()].map(|child| (action, child)))
    }

    /// Normalized strategy sum, uniform over legal actions if nothing accumulated.
    pub fn compute_average(&self) -> [f64; NUM_ACTIONS] {
        let total: f64 = self.strategy_sum.iter().sum();
        if total > 0.0 {
            self.strategy_sum.map(|s| s / total)
        } else {
            uniform(&self.legal_mask())
        }
    }
}

/// Uniform distribution over the legal entries of `mask`.
pub fn uniform(mask: &[bool; NUM_ACTIONS]) -> [f64; NUM_ACTIONS] {
    let legal = mask.iter().filter(|&&m| m).count();
    if legal == 0 {
        return [0.0; NUM_ACTIONS];
    }
    let p = 1.0 / legal as f64;
    mask.map(|m| if m { p } else { 0.0 })
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root: deal of hole cards, children indexed by bucket.
    HoleCards {
        /// Hole cards per player.
        card_count: usize,
        /// One child per bucket.
        children: Vec<NodeId>,
    },
    /// Reveal of `card_count` board cards at the start of `round`.
    BoardCards {
        /// Round the cards open.
        round: usize,
        /// Cards revealed.
        card_count: usize,
        /// One child per bucket.
        children: Vec<NodeId>,
    },
    /// A decision of one player.
    Action(Box<ActionNode>),
    /// End of a hand.
    Terminal {
        /// Final commitment of every player.
        pot_commitment: Box<[u32]>,
    },
}

/// A node and its back-link.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl Node {
    /// Parent node; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Node payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The decision payload, if this is an action node.
    pub fn as_action(&self) -> Option<&ActionNode> {
        match &self.kind {
            NodeKind::Action(action) => Some(action.as_ref()),
            _ => None,
        }
    }

    /// Child ids in key order, whatever the kind.
    pub fn children(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::HoleCards { children, .. } | NodeKind::BoardCards { children, .. } => {
                children.clone()
            }
            NodeKind::Action(action) => action.legal_children().map(|(_, child)| child).collect(),
            NodeKind::Terminal { .. } => Vec::new(),
        }
    }
}

/// Node totals by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCounts {
    /// Hole-card nodes (the root).
    pub hole_cards: usize,
    /// Board-card nodes.
    pub board_cards: usize,
    /// Action nodes.
    pub action: usize,
    /// Terminal nodes.
    pub terminal: usize,
}

impl NodeCounts {
    /// All nodes.
    pub fn total(&self) -> usize {
        self.hole_cards + self.board_cards + self.action + self.terminal
    }
}

/// The full abstracted game tree.
///
/// The shape is read-only outside the crate:
///
/// ```compile_fail
/// use limit_cfr::cfr::{GameDefinition, GameTreeBuilder};
///
/// let definition = GameDefinition::heads_up_single_street(1, 1);
/// let mut tree = GameTreeBuilder::new(&definition).build().unwrap();
/// let root = tree.root();
/// tree.action_mut(root);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GameTree {
    nodes: Vec<Node>,
    root: NodeId,
    num_players: usize,
}

impl GameTree {
    /// An empty arena; the builder pushes the root first.
    pub(crate) fn empty(num_players: usize) -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
            num_players,
        }
    }

    pub(crate) fn push(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { parent, kind });
        id
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    /// Id of the hole-card root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Players the tree was built for.
    pub fn num_players(&self) -> usize {
        self.num_players
    }

    /// Node by id. Ids are only handed out by this tree, so lookups never miss.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Node by id, `None` for a foreign id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True before the builder pushes the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Action payload of node `id`, if it is one.
    pub fn action(&self, id: NodeId) -> Option<&ActionNode> {
        self.get(id).and_then(Node::as_action)
    }

    pub(crate) fn action_mut(&mut self, id: NodeId) -> Option<&mut ActionNode> {
        match self.nodes.get_mut(id.0).map(|node| &mut node.kind) {
            Some(NodeKind::Action(action)) => Some(action.as_mut()),
            _ => None,
        }
    }

    /// Every action node with its id, in arena order.
    pub fn action_nodes(&self) -> impl Iterator<Item = (NodeId, &ActionNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_action().map(|action| (NodeId(i), action)))
    }

    pub(crate) fn action_nodes_mut(&mut self) -> impl Iterator<Item = &mut ActionNode> + '_ {
        self.nodes.iter_mut().filter_map(|node| match &mut node.kind {
            NodeKind::Action(action) => Some(action.as_mut()),
            _ => None,
        })
    }

    /// Count nodes by kind.
    pub fn counts(&self) -> NodeCounts {
        let mut counts = NodeCounts::default();
        for node in &self.nodes {
            match node.kind {
                NodeKind::HoleCards { .. } => counts.hole_cards += 1,
                NodeKind::BoardCards { .. } => counts.board_cards += 1,
                NodeKind::Action(_) => counts.action += 1,
                NodeKind::Terminal { .. } => counts.terminal += 1,
            }
        }
        counts
    }

    /// Info-set key of any node, rebuilt by following parent links to the root.
    pub fn info_set_key(&self, id: NodeId) -> InfoSetKey {
        enum Step {
            Bucket(usize),
            Act(Action),
        }

        let mut steps = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            let step = match &self.node(parent).kind {
                NodeKind::HoleCards { children, .. } | NodeKind::BoardCards { children, .. } => {
                    children.iter().position(|&c| c == current).map(Step::Bucket)
                }
                NodeKind::Action(action) => action
                    .legal_children()
                    .find(|&(_, child)| child == current)
                    .map(|(a, _)| Step::Act(a)),
                NodeKind::Terminal { .. } => None,
            };
            steps.extend(step);
            current = parent;
        }

        let mut key = InfoSetKey::new();
        for step in steps.into_iter().rev() {
            match step {
                Step::Bucket(bucket) => key.push_bucket(bucket),
                Step::Act(action) => key.push_action(action),
            }
        }
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_tree() -> (GameTree, NodeId, NodeId) {
        // root -(bucket 1)-> action(p0) -(call)-> terminal
        let mut tree = GameTree::empty(2);
        let root = tree.push(
            None,
            NodeKind::HoleCards {
                card_count: 2,
                children: Vec::new(),
            },
        );
        let dead = tree.push(
            Some(root),
            NodeKind::Terminal { pot_commitment: vec![1u32, 1].into_boxed_slice() },
        );
        let decision = tree.push(Some(root), NodeKind::Action(Box::new(ActionNode::new(0))));
        let leaf = tree.push(
            Some(decision),
            NodeKind::Terminal { pot_commitment: vec![20u32, 20].into_boxed_slice() },
        );
        if let NodeKind::HoleCards { children, .. } = tree.kind_mut(root) {
            *children = vec![dead, decision];
        }
        if let Some(action) = tree.action_mut(decision) {
            action.children[Action::Call.index()] = Some(leaf);
        }
        (tree, decision, leaf)
    }

    #[test]
    fn test_counts_and_lookup() {
        let (tree, decision, leaf) = tiny_tree();
        let counts = tree.counts();
        assert_eq!(counts.hole_cards, 1);
        assert_eq!(counts.action, 1);
        assert_eq!(counts.terminal, 2);
        assert_eq!(counts.total(), tree.len());

        assert_eq!(tree.node(leaf).parent(), Some(decision));
        assert!(tree.action(leaf).is_none());
        assert_eq!(tree.action(decision).unwrap().legal_mask(), [false, true, false]);
        assert_eq!(tree.node(decision).children(), vec![leaf]);
    }

    #[test]
    fn test_info_set_key_from_parent_walk() {
        let (tree, decision, leaf) = tiny_tree();
        assert_eq!(tree.info_set_key(decision).as_str(), ":1:");
        assert_eq!(tree.info_set_key(leaf).as_str(), ":1:c");
        assert!(tree.info_set_key(tree.root()).is_empty());
    }

    #[test]
    fn test_average_falls_back_to_uniform() {
        let mut node = ActionNode::new(0);
        node.children[Action::Call.index()] = Some(NodeId(1));
        node.children[Action::Raise.index()] = Some(NodeId(2));
        assert_eq!(node.compute_average(), [0.0, 0.5, 0.5]);

        node.strategy_sum = [0.0, 3.0, 1.0];
        assert_eq!(node.compute_average(), [0.0, 0.75, 0.25]);
    }
}
