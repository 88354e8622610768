//! Observation hook for the search loop.
//!
//! The engine reports every state transition to its observers instead of
//! printing anything itself. Observers are called in the order they were
//! registered.

use crate::node::{EvaluationRecord, NodeStats};

/// Receives search events.
///
/// Every method has a no-op default, so implementations only override what
/// they care about. Per iteration the calls arrive in this order:
/// 1. `on_iteration_start`
/// 2. `on_select`
/// 3. `on_expand` (only if children were created)
/// 4. `on_simulate`
/// 5. `on_backpropagate` - once per node on the path, leaf first
/// 6. `on_iteration_end`
pub trait SearchObserver {
    fn on_iteration_start(&mut self, _iteration: usize, _total: usize) {}

    /// The node chosen by UCB1 descent.
    fn on_select(&mut self, _iteration: usize, _text: &str) {}

    /// Children were created under `parent`.
    fn on_expand(&mut self, _iteration: usize, _parent: &str, _children: &[&str]) {}

    /// A completion of `text` was rated.
    fn on_simulate(&mut self, _iteration: usize, _text: &str, _evaluation: &EvaluationRecord) {}

    /// Statistics of `text` after adding this iteration's outcome.
    fn on_backpropagate(&mut self, _iteration: usize, _text: &str, _stats: NodeStats) {}

    /// Root statistics once the iteration has settled.
    fn on_iteration_end(&mut self, _iteration: usize, _root: NodeStats) {}
}

/// Observer that reports search events through `tracing`.
///
/// Transitions are logged at debug level; the per-iteration summary at info.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl SearchObserver for TracingObserver {
    fn on_iteration_start(&mut self, iteration: usize, total: usize) {
        tracing::info!(iteration, total, "starting iteration");
    }

    fn on_select(&mut self, iteration: usize, text: &str) {
        tracing::debug!(iteration, node = text, "selected");
    }

    fn on_expand(&mut self, iteration: usize, parent: &str, children: &[&str]) {
        tracing::debug!(iteration, node = parent, ?children, "expanded");
    }

    fn on_simulate(&mut self, iteration: usize, text: &str, evaluation: &EvaluationRecord) {
        tracing::debug!(
            iteration,
            node = text,
            tagline = %evaluation.tagline,
            combined = evaluation.score.combined(),
            "simulated"
        );
    }

    fn on_backpropagate(&mut self, iteration: usize, text: &str, stats: NodeStats) {
        tracing::debug!(
            iteration,
            node = text,
            visits = stats.visit_count,
            total_value = stats.total_value,
            "backpropagated"
        );
    }

    fn on_iteration_end(&mut self, iteration: usize, root: NodeStats) {
        tracing::info!(
            iteration,
            visits = root.visit_count,
            total_value = root.total_value,
            mean = root.mean_value(),
            "iteration complete"
        );
    }
}
