//! Contracts for the external collaborators driven by the search.
//!
//! The search never talks to a language model directly. It asks three
//! collaborators for candidate words, completions and ratings, and validates
//! what they return. Retries and timeouts belong to the implementations.

use crate::error::BoxError;
use crate::types::{Axis, AxisRating, Completion, WordOption};

/// Proposes candidate next words for a partial tagline.
pub trait WordOptionProvider: Send + Sync {
    /// Return up to the branching factor of distinct candidate next words,
    /// best first.
    ///
    /// `partial` is empty at the root.
    fn next_words(&self, description: &str, partial: &str) -> Result<Vec<WordOption>, BoxError>;
}

/// Completes a partial tagline into a full one.
pub trait CompletionProvider: Send + Sync {
    /// Return one plausible completion.
    ///
    /// The completion must start with `partial` byte for byte; the search
    /// rejects anything else.
    fn complete(&self, description: &str, partial: &str) -> Result<Completion, BoxError>;
}

/// Rates a complete tagline along one quality axis.
///
/// The search calls `rate` once per [`Axis`], concurrently, so
/// implementations must be safe to share between threads.
pub trait Evaluator: Send + Sync {
    /// Rate `text` on `axis` with a score in [1, 5].
    ///
    /// Scores outside that range are rejected by the search.
    fn rate(&self, axis: Axis, description: &str, text: &str) -> Result<AxisRating, BoxError>;
}

impl<T: WordOptionProvider + ?Sized> WordOptionProvider for &T {
    fn next_words(&self, description: &str, partial: &str) -> Result<Vec<WordOption>, BoxError> {
        (**self).next_words(description, partial)
    }
}

impl<T: CompletionProvider + ?Sized> CompletionProvider for &T {
    fn complete(&self, description: &str, partial: &str) -> Result<Completion, BoxError> {
        (**self).complete(description, partial)
    }
}

impl<T: Evaluator + ?Sized> Evaluator for &T {
    fn rate(&self, axis: Axis, description: &str, text: &str) -> Result<AxisRating, BoxError> {
        (**self).rate(axis, description, text)
    }
}

impl<T: WordOptionProvider + ?Sized> WordOptionProvider for Box<T> {
    fn next_words(&self, description: &str, partial: &str) -> Result<Vec<WordOption>, BoxError> {
        (**self).next_words(description, partial)
    }
}

impl<T: CompletionProvider + ?Sized> CompletionProvider for Box<T> {
    fn complete(&self, description: &str, partial: &str) -> Result<Completion, BoxError> {
        (**self).complete(description, partial)
    }
}

impl<T: Evaluator + ?Sized> Evaluator for Box<T> {
    fn rate(&self, axis: Axis, description: &str, text: &str) -> Result<AxisRating, BoxError> {
        (**self).rate(axis, description, text)
    }
}
