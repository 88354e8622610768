//! Search tree node types.
//!
//! Nodes live in an arena and refer to each other by index, so the parent
//! back-reference never participates in ownership.

use serde::{Deserialize, Serialize};
use tagline_core::{text, TaglineScore, WordOption};

/// Index into the node arena.
///
/// This is a lightweight handle that references a node in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Visit statistics for a single node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodeStats {
    /// Number of backpropagation passes that crossed this node.
    pub visit_count: u32,

    /// Sum of simulation outcomes, each in [0, 1].
    pub total_value: f64,
}

impl NodeStats {
    /// Mean outcome for this node.
    ///
    /// Returns 0.0 if the node has never been visited.
    pub fn mean_value(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_value / f64::from(self.visit_count)
        }
    }

    /// UCB1 score of this node as a child of a parent with `parent_visits`.
    ///
    /// UCB1 = mean + c * sqrt(ln(N_parent) / n)
    ///
    /// Unvisited nodes score +infinity. A parent with at most one visit
    /// gives no exploration bonus instead of a NaN from `ln(0)`.
    pub fn ucb1(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visit_count == 0 {
            return f64::INFINITY;
        }

        let n = f64::from(self.visit_count);
        let log_parent = f64::from(parent_visits).ln();
        let bonus = if log_parent > 0.0 {
            exploration * (log_parent / n).sqrt()
        } else {
            0.0
        };

        self.mean_value() + bonus
    }
}

/// Snapshot of a node's statistics taken during backpropagation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub iteration: usize,
    pub total_value: f64,
    pub visit_count: u32,
}

/// One simulation that terminated at a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// The fully realized tagline that was rated.
    pub tagline: String,

    /// Why the completion provider chose this completion.
    pub rationale: String,

    pub score: TaglineScore,

    pub iteration: usize,
}

/// A node in the search tree: one distinct partial or complete tagline.
#[derive(Clone, Debug)]
pub struct SequenceNode {
    pub(crate) text: String,
    pub(crate) chosen_word: Option<WordOption>,
    pub(crate) stats: NodeStats,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) expanded: bool,
    pub(crate) evaluations: Vec<EvaluationRecord>,
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) created_at_iteration: usize,
}

impl SequenceNode {
    /// Create the root node with an empty tagline.
    pub(crate) fn root() -> Self {
        Self {
            text: String::new(),
            chosen_word: None,
            stats: NodeStats::default(),
            parent: None,
            children: Vec::new(),
            expanded: false,
            evaluations: Vec::new(),
            history: Vec::new(),
            created_at_iteration: 0,
        }
    }

    /// Create an unexpanded child of `parent` by appending `option.word`.
    pub(crate) fn child(
        parent: NodeId,
        parent_text: &str,
        option: WordOption,
        iteration: usize,
    ) -> Self {
        let option = WordOption {
            word: option.word.trim().to_string(),
            ..option
        };
        Self {
            text: text::append_word(parent_text, &option.word),
            chosen_word: Some(option),
            parent: Some(parent),
            created_at_iteration: iteration,
            ..Self::root()
        }
    }

    /// The tagline so far. Empty at the root.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of words in the tagline so far.
    pub fn word_count(&self) -> usize {
        text::word_count(&self.text)
    }

    /// The word (and rationale) that produced this node from its parent.
    pub fn chosen_word(&self) -> Option<&WordOption> {
        self.chosen_word.as_ref()
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether expansion has already run on this node.
    ///
    /// An expanded node may still have no children if the provider had no
    /// suggestions.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn evaluations(&self) -> &[EvaluationRecord] {
        &self.evaluations
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn created_at_iteration(&self) -> usize {
        self.created_at_iteration
    }
}
