//! Deterministic collaborators shared by the integration tests.

#![allow(dead_code)]

use tagline_core::{
    text, Axis, AxisRating, BoxError, Completion, CompletionProvider, Evaluator, WordOption,
    WordOptionProvider,
};

pub type CollaboratorResult<T> = Result<T, BoxError>;

/// Always proposes the same words, in order.
pub struct FixedWords(pub Vec<&'static str>);

impl WordOptionProvider for FixedWords {
    fn next_words(&self, _: &str, _: &str) -> CollaboratorResult<Vec<WordOption>> {
        Ok(self
            .0
            .iter()
            .map(|w| WordOption::new(*w, format!("always {w}")))
            .collect())
    }
}

/// Completes a tagline by appending one word.
pub struct Suffix(pub &'static str);

impl CompletionProvider for Suffix {
    fn complete(&self, _: &str, partial: &str) -> CollaboratorResult<Completion> {
        Ok(Completion::new(text::append_word(partial, self.0), "suffix"))
    }
}

/// Returns the same completion whatever the partial tagline.
pub struct FixedCompletion(pub &'static str);

impl CompletionProvider for FixedCompletion {
    fn complete(&self, _: &str, _: &str) -> CollaboratorResult<Completion> {
        Ok(Completion::new(self.0, "fixed"))
    }
}

/// Rates every axis with the same score.
pub struct Constant(pub f64);

impl Evaluator for Constant {
    fn rate(&self, _: Axis, _: &str, _: &str) -> CollaboratorResult<AxisRating> {
        Ok(AxisRating::new(self.0, "constant"))
    }
}
