//! Information-set key grammar.
//!
//! A key records what one player has seen: the bucket reached at every card
//! node and the actions taken since, one street at a time.
//!
//! ```text
//! :<bucket_0>:<actions_0>::<bucket_1>:<actions_1>...
//! ```
//!
//! Buckets are decimal integers, actions are `f`, `c` or `r`. The same
//! builder is used by the serializer while walking the tree and by
//! decision-time consumers replaying a live hand, so both sides always agree
//! on the exact text.

use std::fmt;

use crate::cfr::action::Action;

/// Text key of an information set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoSetKey(String);

impl InfoSetKey {
    /// Empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the bucket reached at a card node, opening a new street.
    pub fn push_bucket(&mut self, bucket: usize) {
        if !self.0.is_empty() && !self.0.ends_with(':') {
            self.0.push(':');
        }
        self.0.push(':');
        self.0.push_str(&bucket.to_string());
        self.0.push(':');
    }

    /// Append an action taken on the current street.
    pub fn push_action(&mut self, action: Action) {
        self.0.push(action.as_char());
    }

    /// Copy of this key extended by a bucket.
    pub fn with_bucket(&self, bucket: usize) -> Self {
        let mut key = self.clone();
        key.push_bucket(bucket);
        key
    }

    /// Copy of this key extended by an action.
    pub fn with_action(&self, action: Action) -> Self {
        let mut key = self.clone();
        key.push_action(action);
        key
    }

    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key as an owned string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for InfoSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InfoSetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
