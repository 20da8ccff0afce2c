//! Betting actions of a limit game.

use std::fmt;

/// Number of distinct betting actions.
pub const NUM_ACTIONS: usize = 3;

/// A limit betting action.
///
/// The discriminant doubles as the index into per-action vectors
/// (`regret_sum`, `strategy`, strategy file columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    /// Give up the hand.
    Fold = 0,
    /// Match the highest commitment (a check when bets are settled).
    Call = 1,
    /// Raise by the round's fixed raise size.
    Raise = 2,
}

impl Action {
    /// All actions in index order.
    pub const ALL: [Action; NUM_ACTIONS] = [Action::Fold, Action::Call, Action::Raise];

    /// Position in per-action arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Action at `index`, if any.
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Character used in info-set keys.
    pub fn as_char(self) -> char {
        match self {
            Action::Fold => 'f',
            Action::Call => 'c',
            Action::Raise => 'r',
        }
    }

    /// Parse a key character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'f' => Some(Action::Fold),
            'c' => Some(Action::Call),
            'r' => Some(Action::Raise),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Fold => write!(f, "Fold"),
            Action::Call => write!(f, "Call"),
            Action::Raise => write!(f, "Raise"),
        }
    }
}
