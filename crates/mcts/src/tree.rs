//! Arena-allocated search tree.
//!
//! Using a Vec<SequenceNode> with indices keeps ownership explicit: children
//! are owned by the arena and the parent link is just an index, so the tree
//! can be exported without walking a cyclic graph.

use crate::node::{EvaluationRecord, HistoryEntry, NodeId, SequenceNode};
use tagline_core::WordOption;

/// Arena-allocated search tree.
///
/// Nodes are never removed, and a node's children are set at most once.
/// Statistics change only through backpropagation.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<SequenceNode>,
}

impl Tree {
    /// Create a new tree with an empty root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![SequenceNode::root()],
        }
    }

    /// Get a reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId does not belong to this tree.
    pub fn get(&self, id: NodeId) -> &SequenceNode {
        &self.nodes[id.0]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut SequenceNode {
        &mut self.nodes[id.0]
    }

    /// Get the root node.
    pub fn root(&self) -> &SequenceNode {
        self.get(NodeId::ROOT)
    }

    /// Get the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root always exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SequenceNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Append one generation of children under a node that has not been
    /// expanded yet.
    ///
    /// Returns the new child IDs, or `None` if the node was already expanded,
    /// in which case the tree is left untouched. An empty `options` list marks
    /// the node expanded without children.
    pub fn append_children(
        &mut self,
        parent: NodeId,
        options: Vec<WordOption>,
        iteration: usize,
    ) -> Option<Vec<NodeId>> {
        if self.get(parent).expanded {
            return None;
        }

        let parent_text = self.get(parent).text.clone();
        let first = self.nodes.len();
        self.nodes.extend(
            options
                .into_iter()
                .map(|option| SequenceNode::child(parent, &parent_text, option, iteration)),
        );
        let ids: Vec<NodeId> = (first..self.nodes.len()).map(NodeId).collect();

        let node = self.get_mut(parent);
        node.children = ids.clone();
        node.expanded = true;
        Some(ids)
    }

    /// Record one backpropagation pass through a node.
    pub(crate) fn record_visit(&mut self, id: NodeId, value: f64, iteration: usize) {
        let node = self.get_mut(id);
        node.stats.visit_count += 1;
        node.stats.total_value += value;
        node.history.push(HistoryEntry {
            iteration,
            total_value: node.stats.total_value,
            visit_count: node.stats.visit_count,
        });
    }

    /// Append a simulation result to a node's evaluation log.
    pub(crate) fn record_evaluation(&mut self, id: NodeId, record: EvaluationRecord) {
        self.get_mut(id).evaluations.push(record);
    }

    /// Walk from a node up to the root, inclusive.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Every evaluation in the tree, best combined score first.
    ///
    /// Ties are broken by iteration, earliest first.
    pub fn ranked_evaluations(&self) -> Vec<(NodeId, &EvaluationRecord)> {
        let mut ranked: Vec<(NodeId, &EvaluationRecord)> = self
            .iter()
            .flat_map(|(id, node)| node.evaluations.iter().map(move |e| (id, e)))
            .collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.score
                .combined()
                .total_cmp(&a.score.combined())
                .then(a.iteration.cmp(&b.iteration))
        });
        ranked
    }

    /// Follow the most visited child from the root.
    ///
    /// Ties go to the first child. The returned path starts at the root.
    pub fn principal_line(&self) -> Vec<NodeId> {
        let mut line = vec![NodeId::ROOT];
        let mut current = NodeId::ROOT;

        loop {
            let mut best: Option<(NodeId, u32)> = None;
            for &child in self.get(current).children() {
                let visits = self.get(child).stats.visit_count;
                if visits > 0 && best.map_or(true, |(_, v)| visits > v) {
                    best = Some((child, visits));
                }
            }
            match best {
                Some((child, _)) => {
                    line.push(child);
                    current = child;
                }
                None => return line,
            }
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator from a node to the root. See [`Tree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.get(id).parent;
        Some(id)
    }
}
