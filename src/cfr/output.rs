//! Strategy file export.
//!
//! A trained tree is written as a plain text lookup table:
//!
//! ```text
//! #  Training iterations: <N>
//! <info_set_key> <p_fold> <p_call> <p_raise>
//! ```
//!
//! One line per action node, sorted by key. Probabilities are printed in
//! their shortest round-trip form, so parsing the file back yields the exact
//! values that were trained.

use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::cfr::action::NUM_ACTIONS;
use crate::cfr::info_key::InfoSetKey;
use crate::cfr::tree::{GameTree, NodeId, NodeKind};

/// Header line prefix; the iteration count follows it.
pub const HEADER_PREFIX: &str = "#  Training iterations: ";

/// One serialized action node.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyLine {
    /// Info-set key of the node.
    pub key: InfoSetKey,
    /// Average strategy as `[p_fold, p_call, p_raise]`.
    pub probabilities: [f64; NUM_ACTIONS],
}

/// Collect one line per action node, sorted by key.
///
/// Nodes without an average strategy (an untrained tree) fall back to their
/// normalized strategy sum.
pub fn strategy_lines(tree: &GameTree) -> Vec<StrategyLine> {
    let mut lines = Vec::new();
    collect(tree, tree.root(), InfoSetKey::new(), &mut lines);
    lines.sort_by(|a, b| a.key.cmp(&b.key));
    lines
}

fn collect(tree: &GameTree, id: NodeId, prefix: InfoSetKey, lines: &mut Vec<StrategyLine>) {
    match tree.node(id).kind() {
        NodeKind::HoleCards { children, .. } | NodeKind::BoardCards { children, .. } => {
            for (bucket, &child) in children.iter().enumerate() {
                collect(tree, child, prefix.with_bucket(bucket), lines);
            }
        }
        NodeKind::Action(action) => {
            let probabilities = action
                .average_strategy
                .unwrap_or_else(|| action.compute_average());
            for (a, child) in action.legal_children() {
                collect(tree, child, prefix.with_action(a), lines);
            }
            lines.push(StrategyLine {
                key: prefix,
                probabilities,
            });
        }
        NodeKind::Terminal { .. } => {}
    }
}

/// Format a probability so that it parses back to the same `f64`.
pub fn format_probability(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("{:.1}", p)
    } else {
        p.to_string()
    }
}

/// Write the strategy of `tree` after `iterations` training iterations.
pub fn write_strategy<W: Write>(
    tree: &GameTree,
    iterations: u64,
    writer: &mut W,
) -> io::Result<usize> {
    let lines = strategy_lines(tree);
    writeln!(writer, "{}{}", HEADER_PREFIX, iterations)?;
    for line in &lines {
        let [fold, call, raise] = line.probabilities;
        writeln!(
            writer,
            "{} {} {} {}",
            line.key,
            format_probability(fold),
            format_probability(call),
            format_probability(raise)
        )?;
    }
    Ok(lines.len())
}

/// Save the strategy to a file.
pub fn save_strategy<P: AsRef<Path>>(tree: &GameTree, iterations: u64, path: P) -> io::Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    let count = write_strategy(tree, iterations, &mut writer)?;
    writer.flush()?;
    info!("Wrote {} strategy entries to {}", count, path.display());
    Ok(())
}
