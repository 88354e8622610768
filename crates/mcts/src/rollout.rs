//! Random-rollout collaborators.
//!
//! `RandomRollout` stands in for the language-model collaborators when none
//! are available: it proposes words drawn from the company description,
//! completes taglines with random vocabulary and rates them at random.
//! Runs are reproducible for a seeded generator.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tagline_core::{
    text, Axis, AxisRating, BoxError, Completion, CompletionProvider, Evaluator, WordOption,
    WordOptionProvider,
};

/// Collaborators backed by a random number generator.
pub struct RandomRollout<R: Rng> {
    /// Generator and drawn ratings (behind a Mutex so ratings can run in parallel).
    state: Mutex<RolloutState<R>>,

    /// Distinct candidate words, in order of first appearance.
    vocabulary: Vec<String>,

    /// Maximum number of word options proposed per call.
    branching: usize,

    /// Maximum number of words a completion appends.
    max_extra_words: usize,
}

struct RolloutState<R> {
    rng: R,

    /// Ratings per tagline, indexed by `Axis::index`.
    ratings: HashMap<String, [u8; 4]>,
}

impl<R: Rng> RandomRollout<R> {
    /// Create rollout collaborators over an explicit vocabulary.
    ///
    /// # Arguments
    /// * `rng` - Random number generator for sampling
    /// * `vocabulary` - Candidate words; blanks and repeats are dropped
    /// * `branching` - Maximum word options per call
    /// * `max_extra_words` - Maximum words appended by a completion
    pub fn new(
        rng: R,
        vocabulary: Vec<String>,
        branching: usize,
        max_extra_words: usize,
    ) -> Self {
        let mut seen = HashSet::new();
        let vocabulary = vocabulary
            .into_iter()
            .filter(|w| text::is_single_word(w))
            .filter(|w| seen.insert(w.clone()))
            .collect();

        Self {
            state: Mutex::new(RolloutState {
                rng,
                ratings: HashMap::new(),
            }),
            vocabulary,
            branching,
            max_extra_words,
        }
    }

    /// Create rollout collaborators whose vocabulary is the words of
    /// `description`, stripped of surrounding punctuation.
    pub fn from_description(
        rng: R,
        description: &str,
        branching: usize,
        max_extra_words: usize,
    ) -> Self {
        let words = description
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
            .collect();
        Self::new(rng, words, branching, max_extra_words)
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut RolloutState<R>) -> T) -> Result<T, BoxError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| "rollout random number generator is poisoned")?;
        Ok(f(&mut *state))
    }
}

impl<R: Rng + Send> WordOptionProvider for RandomRollout<R> {
    fn next_words(&self, _description: &str, partial: &str) -> Result<Vec<WordOption>, BoxError> {
        self.with_state(|state| {
            self.vocabulary
                .choose_multiple(&mut state.rng, self.branching)
                .map(|word| {
                    WordOption::new(
                        word.clone(),
                        format!("sampled to follow {partial:?} from the description"),
                    )
                })
                .collect()
        })
    }
}

impl<R: Rng + Send> CompletionProvider for RandomRollout<R> {
    fn complete(&self, _description: &str, partial: &str) -> Result<Completion, BoxError> {
        self.with_state(|state| {
            let rng = &mut state.rng;
            let mut tagline = partial.to_string();
            if !self.vocabulary.is_empty() && self.max_extra_words > 0 {
                let extra = rng.gen_range(1..=self.max_extra_words);
                for _ in 0..extra {
                    // Non-empty vocabulary, so choose always succeeds
                    if let Some(word) = self.vocabulary.choose(rng) {
                        tagline = text::append_word(&tagline, word);
                    }
                }
            }
            Completion::new(tagline, "random rollout")
        })
    }
}

impl<R: Rng + Send> Evaluator for RandomRollout<R> {
    fn rate(&self, axis: Axis, _description: &str, text: &str) -> Result<AxisRating, BoxError> {
        // The four axes of a tagline are drawn together on the first call,
        // so concurrent calls cannot reorder the draws.
        let score = self.with_state(|state| {
            let RolloutState { rng, ratings } = state;
            let drawn = ratings
                .entry(text.to_string())
                .or_insert_with(|| Axis::ALL.map(|_| rng.gen_range(1u8..=5)));
            drawn[axis.index()]
        })?;
        Ok(AxisRating::new(
            f64::from(score),
            format!("random {axis} rating"),
        ))
    }
}
