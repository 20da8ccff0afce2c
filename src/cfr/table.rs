//! Decision-time strategy lookup.
//!
//! Loads a strategy file written by [`crate::cfr::output`] into a hash map
//! from info-set key to action probabilities, and samples actions from it.

use rand::Rng;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use crate::cfr::action::{Action, NUM_ACTIONS};
use crate::cfr::output::HEADER_PREFIX;

/// Errors raised while loading or querying a strategy table.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The strategy file could not be read.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A line is not `<key> <p_fold> <p_call> <p_raise>`.
    #[error("line {line}: {reason}: '{content}'")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// The line as read.
        content: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The same info set appears twice.
    #[error("line {line}: duplicate info set '{key}'")]
    DuplicateKey {
        /// 1-based line number of the second entry.
        line: usize,
        /// Repeated key.
        key: String,
    },

    /// A lookup for a key the table does not hold.
    #[error("unknown info set '{0}'")]
    UnknownInfoSet(String),
}

/// Info-set key to `[p_fold, p_call, p_raise]`.
#[derive(Debug, Clone, Default)]
pub struct StrategyTable {
    iterations: Option<u64>,
    entries: FxHashMap<String, [f64; NUM_ACTIONS]>,
}

impl StrategyTable {
    /// Load a strategy file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StrategyError> {
        let path = path.as_ref();
        let io_error = |source| StrategyError::Io {
            path: path.display().to_string(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;

        let mut table = Self::default();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            table.parse_line(i + 1, &line.map_err(io_error)?)?;
        }
        Ok(table)
    }

    /// Parse strategy file contents.
    pub fn parse(text: &str) -> Result<Self, StrategyError> {
        let mut table = Self::default();
        for (i, line) in text.lines().enumerate() {
            table.parse_line(i + 1, line)?;
        }
        Ok(table)
    }

    fn parse_line(&mut self, number: usize, line: &str) -> Result<(), StrategyError> {
        let malformed = |reason: &str| StrategyError::Malformed {
            line: number,
            content: line.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        if let Some(count) = line.strip_prefix(HEADER_PREFIX) {
            let count = count.trim().parse().map_err(|_| malformed("bad iteration count"))?;
            self.iterations = Some(count);
            return Ok(());
        }
        if trimmed.starts_with('#') {
            return Ok(());
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != NUM_ACTIONS + 1 {
            return Err(malformed(&format!(
                "expected {} fields, found {}",
                NUM_ACTIONS + 1,
                fields.len()
            )));
        }

        let mut probabilities = [0.0; NUM_ACTIONS];
        for (slot, field) in probabilities.iter_mut().zip(&fields[1..]) {
            let p = field
                .parse::<f64>()
                .map_err(|_| malformed("non-numeric probability"))?;
            if !p.is_finite() || p < 0.0 {
                return Err(malformed("negative or non-finite probability"));
            }
            *slot = p;
        }

        let key = fields[0].to_string();
        if self.entries.contains_key(&key) {
            return Err(StrategyError::DuplicateKey { line: number, key });
        }
        self.entries.insert(key, probabilities);
        Ok(())
    }

    /// Iteration count recorded in the header, if any.
    pub fn iterations(&self) -> Option<u64> {
        self.iterations
    }

    /// Number of info sets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for a table without entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Probabilities for `key`. A missing key means the table and the caller
    /// disagree on the abstraction, which is fatal.
    pub fn lookup(&self, key: &str) -> Result<&[f64; NUM_ACTIONS], StrategyError> {
        self.entries
            .get(key)
            .ok_or_else(|| StrategyError::UnknownInfoSet(key.to_string()))
    }

    /// Sample an action for `key` with one uniform draw.
    pub fn sample_action<R: Rng>(&self, key: &str, rng: &mut R) -> Result<Action, StrategyError> {
        let probabilities = self.lookup(key)?;
        Ok(choose_action(probabilities, rng.gen::<f64>()))
    }
}

/// Pick the first action whose cumulative probability exceeds `draw`.
///
/// Zero-probability actions are never picked. If rounding leaves the walk
/// short of `draw`, the last action with positive probability is chosen.
pub fn choose_action(probabilities: &[f64; NUM_ACTIONS], draw: f64) -> Action {
    let mut cumulative = 0.0;
    let mut last = Action::Call;

    for action in Action::ALL {
        let p = probabilities[action.index()];
        if p <= 0.0 {
            continue;
        }
        cumulative += p;
        last = action;
        if draw < cumulative {
            return action;
        }
    }

    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::builder::GameTreeBuilder;
    use crate::cfr::definition::GameDefinition;
    use crate::cfr::output::write_strategy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_and_lookup() {
        let text = "#  Training iterations: 12\n:0: 0.0 0.25 0.75\n\n# comment\n:0:r 1.0 0.0 0.0\n";
        let table = StrategyTable::parse(text).unwrap();
        assert_eq!(table.iterations(), Some(12));
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup(":0:").unwrap(), &[0.0, 0.25, 0.75]);
        assert!(matches!(
            table.lookup(":9:"),
            Err(StrategyError::UnknownInfoSet(key)) if key == ":9:"
        ));
    }

    #[test]
    fn test_malformed_lines_report_position() {
        let err = StrategyTable::parse("#  Training iterations: 1\n:0: 0.5 0.5\n").unwrap_err();
        assert!(matches!(err, StrategyError::Malformed { line: 2, .. }));

        let err = StrategyTable::parse(":0: 0.5 abc 0.5\n").unwrap_err();
        match err {
            StrategyError::Malformed { line, content, .. } => {
                assert_eq!(line, 1);
                assert_eq!(content, ":0: 0.5 abc 0.5");
            }
            other => panic!("unexpected error {:?}", other),
        }

        for bad in ["NaN", "inf", "-0.5"] {
            let text = format!(":0: 0.5 {} 0.5\n", bad);
            let err = StrategyTable::parse(&text).unwrap_err();
            assert!(matches!(err, StrategyError::Malformed { line: 1, .. }), "{}", bad);
        }

        let err = StrategyTable::parse(":0: 1 0 0\n:0: 1 0 0\n").unwrap_err();
        assert!(matches!(err, StrategyError::DuplicateKey { line: 2, .. }));
    }

    #[test]
    fn test_choose_action_walk() {
        let p = [0.0, 0.4, 0.6];
        assert_eq!(choose_action(&p, 0.0), Action::Call);
        assert_eq!(choose_action(&p, 0.39), Action::Call);
        assert_eq!(choose_action(&p, 0.4), Action::Raise);
        // A draw past a sum that rounds short falls back to the last legal action.
        assert_eq!(choose_action(&[0.3, 0.3, 0.0], 0.99), Action::Call);
        assert_eq!(choose_action(&[1.0, 0.0, 0.0], 0.5), Action::Fold);
    }

    #[test]
    fn test_sampling_frequencies() {
        let table = StrategyTable::parse(":1: 0.0 0.25 0.75\n").unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let raises = (0..4000)
            .filter(|_| table.sample_action(":1:", &mut rng).unwrap() == Action::Raise)
            .count();
        assert!((2800..3200).contains(&raises), "raised {} times", raises);
    }

    #[test]
    fn test_round_trip_is_exact() {
        let definition = GameDefinition::heads_up_single_street(3, 2);
        let mut tree = GameTreeBuilder::new(&definition).build().unwrap();
        for (i, node) in tree.action_nodes_mut().enumerate() {
            let legal = node.legal_mask();
            let i = i as f64;
            for a in 0..NUM_ACTIONS {
                if legal[a] {
                    node.strategy_sum[a] = (i + 1.0) / 7.0 + a as f64 * 0.1;
                }
            }
            node.average_strategy = Some(node.compute_average());
        }

        let mut buffer = Vec::new();
        write_strategy(&tree, 77, &mut buffer).unwrap();
        let table = StrategyTable::parse(&String::from_utf8(buffer).unwrap()).unwrap();

        assert_eq!(table.iterations(), Some(77));
        assert_eq!(table.len(), tree.counts().action);
        for (id, node) in tree.action_nodes() {
            let key = tree.info_set_key(id);
            assert_eq!(table.lookup(key.as_str()).unwrap(), &node.average_strategy.unwrap());
        }
    }
}
