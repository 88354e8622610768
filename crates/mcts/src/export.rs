//! Acyclic projection of the search tree for persistence and replay.
//!
//! The export mirrors the arena: nodes sit in a flat list with the root at
//! index 0, and children are referenced by index. Parent links are dropped.
//! Nesting never grows with tree depth, so deep trees serialize and load
//! like shallow ones. Every node keeps its creation iteration, evaluation
//! log and history, which is enough to rebuild the tree as it stood after
//! any earlier iteration.

use crate::node::{EvaluationRecord, HistoryEntry};
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use tagline_core::{Result, TaglineError, WordOption};

/// A node of the exported tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportedNode {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_word: Option<WordOption>,
    pub visit_count: u32,
    pub total_value: f64,
    pub created_at_iteration: usize,
    pub evaluations: Vec<EvaluationRecord>,
    pub history: Vec<HistoryEntry>,

    /// Indices of the children in [`ExportedTree::nodes`].
    pub children: Vec<usize>,
}

impl ExportedNode {
    /// Mean outcome, 0.0 if never visited.
    pub fn mean_value(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_value / f64::from(self.visit_count)
        }
    }

    /// This node as it stood after `iteration`, with the given children.
    fn rewound(&self, iteration: usize, children: Vec<usize>) -> ExportedNode {
        let history: Vec<HistoryEntry> = self
            .history
            .iter()
            .copied()
            .filter(|h| h.iteration <= iteration)
            .collect();
        let (visit_count, total_value) = history
            .last()
            .map_or((0, 0.0), |h| (h.visit_count, h.total_value));

        ExportedNode {
            text: self.text.clone(),
            chosen_word: self.chosen_word.clone(),
            visit_count,
            total_value,
            created_at_iteration: self.created_at_iteration,
            evaluations: self
                .evaluations
                .iter()
                .filter(|e| e.iteration <= iteration)
                .cloned()
                .collect(),
            history,
            children,
        }
    }
}

/// The whole exported tree.
///
/// Invariants, checked when loading:
/// - there is at least one node, the root at index 0
/// - every child index is greater than its parent's and in bounds
/// - every node but the root is the child of exactly one node
/// - no child was created before its parent
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTree")]
pub struct ExportedTree {
    nodes: Vec<ExportedNode>,
}

/// Unchecked form of [`ExportedTree`] as read from disk.
#[derive(Deserialize)]
struct StoredTree {
    nodes: Vec<ExportedNode>,
}

impl TryFrom<StoredTree> for ExportedTree {
    type Error = TaglineError;

    fn try_from(stored: StoredTree) -> Result<Self> {
        Self::from_nodes(stored.nodes)
    }
}

impl ExportedTree {
    /// Build a tree from a flat node list, checking its structure.
    ///
    /// # Errors
    /// Returns `TaglineError::MalformedExport` if the list is empty or the
    /// child indices do not form a tree rooted at index 0.
    pub fn from_nodes(nodes: Vec<ExportedNode>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(malformed("no root node"));
        }

        let mut has_parent = vec![false; nodes.len()];
        for (index, node) in nodes.iter().enumerate() {
            for &child in &node.children {
                if child <= index || child >= nodes.len() {
                    return Err(malformed(format!(
                        "node {index} has out-of-order child {child}"
                    )));
                }
                if has_parent[child] {
                    return Err(malformed(format!("node {child} has two parents")));
                }
                if nodes[child].created_at_iteration < node.created_at_iteration {
                    return Err(malformed(format!(
                        "node {child} was created before its parent {index}"
                    )));
                }
                has_parent[child] = true;
            }
        }

        if let Some(orphan) = has_parent.iter().skip(1).position(|&p| !p) {
            return Err(malformed(format!("node {} has no parent", orphan + 1)));
        }

        Ok(Self { nodes })
    }

    pub fn root(&self) -> &ExportedNode {
        &self.nodes[0]
    }

    /// All nodes, root first, every child after its parent.
    pub fn nodes(&self) -> &[ExportedNode] {
        &self.nodes
    }

    /// Children of `node` in insertion order.
    ///
    /// `node` must belong to this tree.
    pub fn children<'a>(
        &'a self,
        node: &'a ExportedNode,
    ) -> impl Iterator<Item = &'a ExportedNode> + 'a {
        node.children.iter().map(move |&index| &self.nodes[index])
    }

    /// Last iteration recorded anywhere in the tree.
    pub fn max_iteration(&self) -> Option<usize> {
        self.nodes
            .iter()
            .flat_map(|n| {
                n.evaluations
                    .iter()
                    .map(|e| e.iteration)
                    .chain(n.history.iter().map(|h| h.iteration))
            })
            .max()
    }

    /// The tree as it stood after `iteration` completed.
    ///
    /// Nodes created later are dropped, later evaluations and history
    /// entries are removed, and statistics come from the last remaining
    /// history entry. Returns `None` if the root did not exist yet.
    pub fn as_of(&self, iteration: usize) -> Option<ExportedTree> {
        if self.root().created_at_iteration > iteration {
            return None;
        }

        // Children never predate their parents, so a kept node's parent
        // is kept too.
        let mut remap = vec![None; self.nodes.len()];
        let mut kept = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            if node.created_at_iteration <= iteration {
                remap[index] = Some(kept);
                kept += 1;
            }
        }

        let nodes = self
            .nodes
            .iter()
            .zip(&remap)
            .filter(|(_, new_index)| new_index.is_some())
            .map(|(node, _)| {
                let children = node.children.iter().filter_map(|&c| remap[c]).collect();
                node.rewound(iteration, children)
            })
            .collect();

        Some(ExportedTree { nodes })
    }

    /// Every evaluation in the tree, best combined score first.
    ///
    /// Ties are broken by iteration, earliest first.
    pub fn ranked_evaluations(&self) -> Vec<&EvaluationRecord> {
        let mut ranked: Vec<&EvaluationRecord> = self
            .nodes
            .iter()
            .flat_map(|n| n.evaluations.iter())
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .combined()
                .total_cmp(&a.score.combined())
                .then(a.iteration.cmp(&b.iteration))
        });
        ranked
    }
}

fn malformed(reason: impl Into<String>) -> TaglineError {
    TaglineError::MalformedExport {
        reason: reason.into(),
    }
}

impl Tree {
    /// Export the tree without parent links.
    ///
    /// Arena order is kept: node indices in the export match `NodeId`s.
    pub fn export(&self) -> ExportedTree {
        let nodes = self
            .iter()
            .map(|(_, node)| {
                let stats = node.stats();
                ExportedNode {
                    text: node.text().to_string(),
                    chosen_word: node.chosen_word().cloned(),
                    visit_count: stats.visit_count,
                    total_value: stats.total_value,
                    created_at_iteration: node.created_at_iteration(),
                    evaluations: node.evaluations().to_vec(),
                    history: node.history().to_vec(),
                    children: node.children().iter().map(|c| c.index()).collect(),
                }
            })
            .collect();
        ExportedTree { nodes }
    }
}
