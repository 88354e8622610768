//! Tagline Core - domain types, scoring and collaborator contracts
//!
//! This crate provides the vocabulary shared by the tagline search: the
//! rating and score types, the scoring aggregator, the rules for appending
//! words to a partial tagline, and the traits external collaborators
//! implement.
//!
//! # Types
//!
//! - [`Rating`] - Component rating in [1, 5]
//! - [`TaglineScore`] - Four component ratings plus their weighted mean
//! - [`WordOptionProvider`], [`CompletionProvider`], [`Evaluator`] -
//!   Collaborator contracts

mod error;
mod provider;
pub mod scoring;
pub mod text;
mod types;

pub use error::{BoxError, CollaboratorKind, ErrorCategory, Result, TaglineError};
pub use provider::{CompletionProvider, Evaluator, WordOptionProvider};
pub use types::{
    Axis, AxisRating, Completion, ComponentScore, Rating, TaglineScore, WordOption, MAX_RATING,
    MIN_RATING,
};
