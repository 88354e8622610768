//! Monte Carlo Tree Search over partial taglines.
//!
//! Each iteration runs four phases, strictly in order:
//! - SELECT: descend from the root by UCB1 until a node without children
//! - EXPAND: ask the word-option provider for that node's children (once)
//! - SIMULATE: complete the node's tagline and rate the completion
//! - BACKPROPAGATE: add the outcome to every node from the leaf to the root
//!
//! Iterations never overlap. Within SIMULATE the four axis ratings are
//! requested concurrently and joined before aggregation.

use crate::{
    config::MctsConfig,
    node::{EvaluationRecord, NodeId, SequenceNode},
    observer::SearchObserver,
    tree::Tree,
};
use std::collections::HashSet;
use tagline_core::{
    text, Axis, CollaboratorKind, ComponentScore, CompletionProvider, Evaluator, Result,
    TaglineError, TaglineScore, WordOption, WordOptionProvider,
};

/// The best rated tagline found by a search.
#[derive(Clone, Debug, PartialEq)]
pub struct BestTagline {
    /// Partial tagline of the node the simulation ran from.
    pub node: String,

    /// The completed tagline that was rated.
    pub tagline: String,

    pub score: TaglineScore,

    /// Iteration in which the tagline was rated.
    pub iteration: usize,
}

/// Summary of a search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// Number of completed iterations.
    pub iterations: usize,

    /// Visit count at the root (equals `iterations`).
    pub root_visits: u32,

    /// Mean outcome at the root, in [0, 1].
    pub root_value: f64,

    /// Highest combined score seen anywhere in the tree.
    pub best: Option<BestTagline>,

    /// Partial taglines along the most visited path, starting at the root.
    pub principal_line: Vec<String>,
}

/// What happened during one iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct IterationReport {
    /// 0-based index of the iteration.
    pub iteration: usize,

    /// Node chosen by UCB1 descent.
    pub selected: NodeId,

    /// Children created by this iteration's expansion (possibly none).
    pub expanded: Vec<NodeId>,

    /// Completed tagline that was rated.
    pub tagline: String,

    /// Outcome backpropagated to the root, in [0, 1].
    pub outcome: f64,
}

/// Monte Carlo Tree Search with UCB1 selection.
///
/// Generic over:
/// - `W`: proposes next words
/// - `C`: completes partial taglines
/// - `E`: rates complete taglines
pub struct Mcts<W, C, E> {
    config: MctsConfig,
    description: String,
    words: W,
    completer: C,
    evaluator: E,
    tree: Tree,
    iteration: usize,
    observers: Vec<Box<dyn SearchObserver>>,
}

impl<W, C, E> Mcts<W, C, E>
where
    W: WordOptionProvider,
    C: CompletionProvider,
    E: Evaluator,
{
    /// Create a search for the company described by `description`.
    ///
    /// # Errors
    /// Returns `TaglineError::InvalidConfig` if `config` does not validate.
    pub fn new(
        config: MctsConfig,
        description: impl Into<String>,
        words: W,
        completer: C,
        evaluator: E,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            description: description.into(),
            words,
            completer,
            evaluator,
            tree: Tree::new(),
            iteration: 0,
            observers: Vec::new(),
        })
    }

    /// Register an observer for search events.
    pub fn with_observer<O: SearchObserver + 'static>(mut self, observer: O) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Consume the search, keeping the tree.
    pub fn into_tree(self) -> Tree {
        self.tree
    }

    /// Number of iterations completed so far.
    pub fn iterations_completed(&self) -> usize {
        self.iteration
    }

    /// Run the remaining configured iterations.
    ///
    /// # Errors
    /// Any collaborator failure or invariant violation aborts the run. The
    /// tree keeps whatever the failed iteration had already changed and
    /// should not be trusted past the last completed iteration.
    pub fn run(&mut self) -> Result<SearchResult> {
        while self.iteration < self.config.iterations {
            self.step()?;
        }
        Ok(self.result())
    }

    /// Run a single iteration: select -> expand -> simulate -> backpropagate.
    pub fn step(&mut self) -> Result<IterationReport> {
        let iteration = self.iteration;
        let total = self.config.iterations;
        notify(&mut self.observers, |o| o.on_iteration_start(iteration, total));

        let selected = self.select();
        let selected_text = self.tree.get(selected).text();
        notify(&mut self.observers, |o| o.on_select(iteration, selected_text));

        let expanded = self.expand(selected, iteration)?;
        let outcome = self.simulate(selected, iteration)?;
        self.backpropagate(selected, outcome, iteration);

        self.iteration += 1;
        let root = self.tree.root().stats();
        notify(&mut self.observers, |o| o.on_iteration_end(iteration, root));

        let tagline = self
            .tree
            .get(selected)
            .evaluations()
            .last()
            .map(|e| e.tagline.clone())
            .unwrap_or_default();

        Ok(IterationReport {
            iteration,
            selected,
            expanded,
            tagline,
            outcome,
        })
    }

    /// SELECT: descend from the root by UCB1 until a node with no children.
    pub fn select(&self) -> NodeId {
        let mut current = NodeId::ROOT;
        while let Some(child) = self.select_child(self.tree.get(current)) {
            current = child;
        }
        current
    }

    /// Child with the highest UCB1 score; the first one wins ties.
    fn select_child(&self, node: &SequenceNode) -> Option<NodeId> {
        let parent_visits = node.stats().visit_count;
        let mut best: Option<(NodeId, f64)> = None;

        for &child_id in node.children() {
            let score = self
                .tree
                .get(child_id)
                .stats()
                .ucb1(parent_visits, self.config.exploration);

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((child_id, score));
            }
        }

        best.map(|(id, _)| id)
    }

    /// EXPAND: create the children of a node.
    ///
    /// No-op if the node was already expanded or its tagline already has
    /// `max_depth` words. Returns the IDs of the children created.
    ///
    /// # Errors
    /// Fails if the word-option provider fails, or returns more options than
    /// the branching factor, a blank or multi-word option, or the same word
    /// twice.
    pub fn expand(&mut self, id: NodeId, iteration: usize) -> Result<Vec<NodeId>> {
        let node = self.tree.get(id);
        if node.is_expanded() || node.word_count() >= self.config.max_depth {
            return Ok(Vec::new());
        }

        let options = self
            .words
            .next_words(&self.description, node.text())
            .map_err(|e| TaglineError::collaborator(CollaboratorKind::WordOptions, e))?;
        self.validate_options(&options)?;

        let children = self
            .tree
            .append_children(id, options, iteration)
            .unwrap_or_default();

        if !children.is_empty() {
            let parent = self.tree.get(id).text();
            let texts: Vec<&str> = children.iter().map(|&c| self.tree.get(c).text()).collect();
            notify(&mut self.observers, |o| o.on_expand(iteration, parent, &texts));
        }

        Ok(children)
    }

    fn validate_options(&self, options: &[WordOption]) -> Result<()> {
        if options.len() > self.config.branching_factor {
            return Err(TaglineError::TooManyWordOptions {
                got: options.len(),
                max: self.config.branching_factor,
            });
        }

        let mut seen = HashSet::new();
        for option in options {
            if !text::is_single_word(&option.word) {
                return Err(TaglineError::MalformedWordOption {
                    word: option.word.clone(),
                });
            }
            if !seen.insert(option.word.trim()) {
                return Err(TaglineError::DuplicateWordOption {
                    word: option.word.clone(),
                });
            }
        }
        Ok(())
    }

    /// SIMULATE: complete and rate the node's tagline.
    ///
    /// Runs on the node itself even if it was just expanded. The rating is
    /// appended to the node's evaluation log and the combined score, rescaled
    /// to [0, 1], is returned.
    ///
    /// # Errors
    /// Fails if any collaborator fails, if the completion does not start with
    /// the node's tagline, or if any rating is outside [1, 5].
    pub fn simulate(&mut self, id: NodeId, iteration: usize) -> Result<f64> {
        let partial = self.tree.get(id).text();
        let completion = self
            .completer
            .complete(&self.description, partial)
            .map_err(|e| TaglineError::collaborator(CollaboratorKind::Completion, e))?;

        if !completion.text.starts_with(partial) {
            return Err(TaglineError::CompletionPrefix {
                prefix: partial.to_string(),
                completion: completion.text,
            });
        }

        let score = self.rate(&completion.text)?;
        let outcome = score.outcome();
        let record = EvaluationRecord {
            tagline: completion.text,
            rationale: completion.rationale,
            score,
            iteration,
        };

        notify(&mut self.observers, |o| o.on_simulate(iteration, partial, &record));
        self.tree.record_evaluation(id, record);
        Ok(outcome)
    }

    /// Request all four axis ratings concurrently and aggregate them.
    fn rate(&self, tagline: &str) -> Result<TaglineScore> {
        let evaluator = &self.evaluator;
        let description = self.description.as_str();
        let rate_axis = |axis: Axis| -> Result<ComponentScore> {
            evaluator
                .rate(axis, description, tagline)
                .map_err(|e| TaglineError::collaborator(CollaboratorKind::Evaluator(axis), e))?
                .validate(axis)
        };

        let ((clarity, simplicity), (creativity, strength)) = rayon::join(
            || rayon::join(|| rate_axis(Axis::Clarity), || rate_axis(Axis::Simplicity)),
            || rayon::join(|| rate_axis(Axis::Creativity), || rate_axis(Axis::Strength)),
        );

        Ok(TaglineScore::from_components(
            clarity?,
            simplicity?,
            creativity?,
            strength?,
        ))
    }

    /// BACKPROPAGATE: add `value` to every node from `id` up to the root.
    ///
    /// The node itself is updated first, the root last. Each node gets a
    /// history snapshot tagged with `iteration`.
    pub fn backpropagate(&mut self, id: NodeId, value: f64, iteration: usize) {
        let path: Vec<NodeId> = self.tree.ancestors(id).collect();

        for node_id in path {
            self.tree.record_visit(node_id, value, iteration);
            let node = self.tree.get(node_id);
            notify(&mut self.observers, |o| {
                o.on_backpropagate(iteration, node.text(), node.stats());
            });
        }
    }

    /// Summarize the search so far.
    pub fn result(&self) -> SearchResult {
        let root = self.tree.root().stats();

        let best = self
            .tree
            .ranked_evaluations()
            .first()
            .map(|(id, record)| BestTagline {
                node: self.tree.get(*id).text().to_string(),
                tagline: record.tagline.clone(),
                score: record.score.clone(),
                iteration: record.iteration,
            });

        let principal_line = self
            .tree
            .principal_line()
            .into_iter()
            .map(|id| self.tree.get(id).text().to_string())
            .collect();

        SearchResult {
            iterations: self.iteration,
            root_visits: root.visit_count,
            root_value: root.mean_value(),
            best,
            principal_line,
        }
    }
}

fn notify(
    observers: &mut [Box<dyn SearchObserver>],
    mut event: impl FnMut(&mut dyn SearchObserver),
) {
    for observer in observers {
        event(observer.as_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tagline_core::{AxisRating, BoxError, Completion, ErrorCategory};

    type CollaboratorResult<T> = std::result::Result<T, BoxError>;

    /// Always proposes the same words.
    struct FixedWords(Vec<&'static str>);

    impl WordOptionProvider for FixedWords {
        fn next_words(&self, _: &str, _: &str) -> CollaboratorResult<Vec<WordOption>> {
            Ok(self.0.iter().map(|w| WordOption::new(*w, "fixed")).collect())
        }
    }

    /// Completes by appending one word.
    struct Suffix(&'static str);

    impl CompletionProvider for Suffix {
        fn complete(&self, _: &str, partial: &str) -> CollaboratorResult<Completion> {
            Ok(Completion::new(text::append_word(partial, self.0), "suffix"))
        }
    }

    /// Ignores the partial tagline.
    struct FixedCompletion(&'static str);

    impl CompletionProvider for FixedCompletion {
        fn complete(&self, _: &str, _: &str) -> CollaboratorResult<Completion> {
            Ok(Completion::new(self.0, "fixed"))
        }
    }

    /// Rates every axis the same.
    struct Constant(f64);

    impl Evaluator for Constant {
        fn rate(&self, _: Axis, _: &str, _: &str) -> CollaboratorResult<AxisRating> {
            Ok(AxisRating::new(self.0, "constant"))
        }
    }

    /// Rates 5 on every axis if the tagline contains a word, 1 otherwise.
    struct Prefers(&'static str);

    impl Evaluator for Prefers {
        fn rate(&self, _: Axis, _: &str, tagline: &str) -> CollaboratorResult<AxisRating> {
            let score = if tagline.split_whitespace().any(|w| w == self.0) {
                5.0
            } else {
                1.0
            };
            Ok(AxisRating::new(score, "preference"))
        }
    }

    /// Gives an out-of-range strength rating.
    struct BadStrength;

    impl Evaluator for BadStrength {
        fn rate(&self, axis: Axis, _: &str, _: &str) -> CollaboratorResult<AxisRating> {
            let score = if axis == Axis::Strength { 6.0 } else { 3.0 };
            Ok(AxisRating::new(score, "bad"))
        }
    }

    struct Unavailable;

    impl Evaluator for Unavailable {
        fn rate(&self, _: Axis, _: &str, _: &str) -> CollaboratorResult<AxisRating> {
            Err("service unavailable".into())
        }
    }

    fn config(max_depth: usize) -> MctsConfig {
        MctsConfig {
            iterations: 8,
            max_depth,
            ..Default::default()
        }
    }

    fn build_ship() -> FixedWords {
        FixedWords(vec!["Build", "Ship"])
    }

    fn texts<W, C, E>(mcts: &Mcts<W, C, E>, ids: &[NodeId]) -> Vec<String>
    where
        W: WordOptionProvider,
        C: CompletionProvider,
        E: Evaluator,
    {
        ids.iter()
            .map(|&id| mcts.tree().get(id).text().to_string())
            .collect()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = Mcts::new(
            MctsConfig::with_iterations(0),
            "",
            build_ship(),
            Suffix("now"),
            Constant(3.0),
        )
        .err()
        .expect("zero iterations must be rejected");
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_first_iteration_expands_root() {
        let mut mcts = Mcts::new(config(3), "", build_ship(), Suffix("now"), Constant(3.0)).unwrap();

        let report = mcts.step().unwrap();
        assert_eq!(report.iteration, 0);
        assert_eq!(report.selected, NodeId::ROOT);
        assert_eq!(report.tagline, "now");

        let root = mcts.tree().root();
        assert_eq!(texts(&mcts, root.children()), ["Build", "Ship"]);
        assert_eq!(report.expanded, root.children());
        assert_eq!(root.stats().visit_count, 1);
        assert_eq!(root.evaluations().len(), 1);
        assert_eq!(mcts.iterations_completed(), 1);
    }

    #[test]
    fn test_simulating_child_updates_path() {
        let mut mcts = Mcts::new(config(3), "", build_ship(), Suffix("now"), Constant(4.0)).unwrap();

        let children = mcts.expand(NodeId::ROOT, 0).unwrap();
        assert_eq!(texts(&mcts, &children), ["Build", "Ship"]);

        let value = mcts.simulate(children[0], 0).unwrap();
        mcts.backpropagate(children[0], value, 0);

        assert!((value - 0.8).abs() < 1e-12);
        assert_eq!(mcts.tree().get(children[0]).stats().visit_count, 1);
        assert_eq!(mcts.tree().root().stats().visit_count, 1);
        assert_eq!(mcts.tree().get(children[1]).stats().visit_count, 0);
        assert_eq!(
            mcts.tree().get(children[0]).evaluations()[0].tagline,
            "Build now"
        );
    }

    #[test]
    fn test_selection_visits_unvisited_children_in_order() {
        let mut mcts = Mcts::new(config(3), "", build_ship(), Suffix("now"), Constant(3.0)).unwrap();

        let first = mcts.step().unwrap();
        let second = mcts.step().unwrap();
        let third = mcts.step().unwrap();

        assert_eq!(first.selected, NodeId::ROOT);
        assert_eq!(mcts.tree().get(second.selected).text(), "Build");
        assert_eq!(mcts.tree().get(third.selected).text(), "Ship");
        assert_eq!(texts(&mcts, &second.expanded), ["Build Build", "Build Ship"]);
    }

    #[test]
    fn test_expand_is_idempotent() {
        let mut mcts = Mcts::new(config(3), "", build_ship(), Suffix("now"), Constant(3.0)).unwrap();

        let first = mcts.expand(NodeId::ROOT, 0).unwrap();
        let len = mcts.tree().len();
        let second = mcts.expand(NodeId::ROOT, 1).unwrap();

        assert!(second.is_empty());
        assert_eq!(mcts.tree().len(), len);
        assert_eq!(mcts.tree().root().children(), &first[..]);
    }

    #[test]
    fn test_expand_respects_max_depth() {
        let mut mcts = Mcts::new(config(1), "", build_ship(), Suffix("now"), Constant(3.0)).unwrap();

        mcts.step().unwrap();
        let report = mcts.step().unwrap();

        assert_eq!(mcts.tree().get(report.selected).text(), "Build");
        assert!(report.expanded.is_empty());
        assert!(mcts.tree().iter().all(|(_, node)| node.word_count() <= 1));
    }

    #[test]
    fn test_punctuation_attaches_to_previous_word() {
        let words = FixedWords(vec!["Build", "!"]);
        let mut mcts = Mcts::new(config(3), "", words, Suffix("now"), Constant(3.0)).unwrap();

        mcts.step().unwrap();
        let report = mcts.step().unwrap();
        assert_eq!(texts(&mcts, &report.expanded), ["Build Build", "Build!"]);
    }

    #[test]
    fn test_no_word_options_leaves_a_leaf() {
        let words = FixedWords(Vec::new());
        let mut mcts = Mcts::new(config(3), "", words, Suffix("now"), Constant(3.0)).unwrap();

        mcts.step().unwrap();
        let report = mcts.step().unwrap();

        assert_eq!(report.selected, NodeId::ROOT);
        assert!(mcts.tree().root().is_expanded());
        assert_eq!(mcts.tree().len(), 1);
        assert_eq!(mcts.tree().root().evaluations().len(), 2);
    }

    #[test]
    fn test_rejects_too_many_word_options() {
        let mut config = config(3);
        config.branching_factor = 1;
        let mut mcts = Mcts::new(config, "", build_ship(), Suffix("now"), Constant(3.0)).unwrap();

        let err = mcts.step().unwrap_err();
        assert!(matches!(
            err,
            TaglineError::TooManyWordOptions { got: 2, max: 1 }
        ));
        assert!(err.is_invariant_violation());
        assert_eq!(mcts.tree().len(), 1);
    }

    #[test]
    fn test_rejects_duplicate_word_options() {
        let words = FixedWords(vec!["Build", "Build"]);
        let mut mcts = Mcts::new(config(3), "", words, Suffix("now"), Constant(3.0)).unwrap();

        let err = mcts.step().unwrap_err();
        assert!(matches!(err, TaglineError::DuplicateWordOption { .. }));
    }

    #[test]
    fn test_rejects_multi_word_option() {
        let words = FixedWords(vec!["Build fast"]);
        let mut mcts = Mcts::new(config(3), "", words, Suffix("now"), Constant(3.0)).unwrap();

        let err = mcts.step().unwrap_err();
        assert!(matches!(err, TaglineError::MalformedWordOption { .. }));
    }

    #[test]
    fn test_rejects_completion_without_prefix() {
        let completer = FixedCompletion("Construct something");
        let mut mcts = Mcts::new(config(3), "", build_ship(), completer, Constant(3.0)).unwrap();

        // Every completion starts with the empty root tagline
        mcts.step().unwrap();

        match mcts.step().unwrap_err() {
            TaglineError::CompletionPrefix { prefix, completion } => {
                assert_eq!(prefix, "Build");
                assert_eq!(completion, "Construct something");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_out_of_range_rating() {
        let mut mcts = Mcts::new(config(3), "", build_ship(), Suffix("now"), BadStrength).unwrap();

        let err = mcts.step().unwrap_err();
        assert!(matches!(
            err,
            TaglineError::ScoreOutOfRange {
                axis: Axis::Strength,
                ..
            }
        ));
        // Nothing was backpropagated
        assert_eq!(mcts.tree().root().stats().visit_count, 0);
    }

    #[test]
    fn test_collaborator_failure_aborts_run() {
        let mut mcts = Mcts::new(config(3), "", build_ship(), Suffix("now"), Unavailable).unwrap();

        let err = mcts.run().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::CollaboratorFailure);
        assert_eq!(mcts.iterations_completed(), 0);
    }

    #[test]
    fn test_run_keeps_history_consistent() {
        let mut mcts = Mcts::new(config(3), "", build_ship(), Suffix("now"), Prefers("Ship")).unwrap();

        let result = mcts.run().unwrap();
        assert_eq!(result.iterations, 8);
        assert_eq!(result.root_visits, 8);

        for (_, node) in mcts.tree().iter() {
            let history = node.history();
            assert_eq!(node.stats().visit_count as usize, history.len());
            for pair in history.windows(2) {
                assert!(pair[0].iteration < pair[1].iteration);
                assert!(pair[0].visit_count < pair[1].visit_count);
            }
        }
    }

    #[test]
    fn test_search_exploits_preferred_word() {
        let mut mcts = Mcts::new(config(3), "", build_ship(), Suffix("now"), Prefers("Ship")).unwrap();

        let result = mcts.run().unwrap();
        let best = result.best.unwrap();

        assert_eq!(best.score.combined(), 5.0);
        assert!(best.tagline.contains("Ship"));
        assert_eq!(result.principal_line[1], "Ship");

        let ship = mcts.tree().root().children()[1];
        let build = mcts.tree().root().children()[0];
        assert!(
            mcts.tree().get(ship).stats().visit_count > mcts.tree().get(build).stats().visit_count
        );
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl SearchObserver for Recorder {
        fn on_iteration_start(&mut self, iteration: usize, total: usize) {
            self.0.borrow_mut().push(format!("start {iteration}/{total}"));
        }

        fn on_select(&mut self, _: usize, text: &str) {
            self.0.borrow_mut().push(format!("select '{text}'"));
        }

        fn on_expand(&mut self, _: usize, _: &str, children: &[&str]) {
            self.0.borrow_mut().push(format!("expand {}", children.join(",")));
        }

        fn on_simulate(&mut self, _: usize, _: &str, evaluation: &EvaluationRecord) {
            self.0.borrow_mut().push(format!("simulate '{}'", evaluation.tagline));
        }

        fn on_backpropagate(&mut self, _: usize, text: &str, stats: crate::NodeStats) {
            self.0
                .borrow_mut()
                .push(format!("backprop '{text}' {}", stats.visit_count));
        }

        fn on_iteration_end(&mut self, iteration: usize, _: crate::NodeStats) {
            self.0.borrow_mut().push(format!("end {iteration}"));
        }
    }

    #[test]
    fn test_observer_event_order() {
        let recorder = Recorder::default();
        let mut mcts = Mcts::new(config(3), "", build_ship(), Suffix("now"), Constant(3.0))
            .unwrap()
            .with_observer(recorder.clone());

        mcts.step().unwrap();
        mcts.step().unwrap();

        let events = recorder.0.borrow();
        assert_eq!(
            *events,
            [
                "start 0/8",
                "select ''",
                "expand Build,Ship",
                "simulate 'now'",
                "backprop '' 1",
                "end 0",
                "start 1/8",
                "select 'Build'",
                "expand Build Build,Build Ship",
                "simulate 'Build now'",
                "backprop 'Build' 1",
                "backprop '' 2",
                "end 1",
            ]
        );
    }
}
