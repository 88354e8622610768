use std::fmt;
use thiserror::Error;

use crate::types::Axis;

/// Boxed error returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which external collaborator produced a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollaboratorKind {
    /// Proposes candidate next words.
    WordOptions,
    /// Completes a partial sequence into a full tagline.
    Completion,
    /// Rates a complete tagline along one axis.
    Evaluator(Axis),
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WordOptions => write!(f, "word-option provider"),
            Self::Completion => write!(f, "completion provider"),
            Self::Evaluator(axis) => write!(f, "{axis} evaluator"),
        }
    }
}

/// Coarse classification of a [`TaglineError`].
///
/// Lets callers decide whether a failure is worth retrying at their level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// An external call failed after its own retry policy was exhausted.
    CollaboratorFailure,
    /// Collaborator output or a loaded tree breaks a search invariant.
    InvariantViolation,
    /// The search was configured with unusable parameters.
    Configuration,
}

/// Errors that can occur while searching for taglines.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TaglineError {
    #[error("{collaborator} failed: {source}")]
    Collaborator {
        collaborator: CollaboratorKind,
        #[source]
        source: BoxError,
    },

    #[error("completion {completion:?} does not start with partial tagline {prefix:?}")]
    CompletionPrefix { prefix: String, completion: String },

    #[error("{axis} score {score} is outside [1, 5]")]
    ScoreOutOfRange { axis: Axis, score: f64 },

    #[error("rating {0} is outside [1, 5]")]
    RatingOutOfRange(f64),

    #[error("word option {word:?} was proposed more than once")]
    DuplicateWordOption { word: String },

    #[error("word option {word:?} is not a single word")]
    MalformedWordOption { word: String },

    #[error("provider returned {got} word options, at most {max} allowed")]
    TooManyWordOptions { got: usize, max: usize },

    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("malformed exported tree: {reason}")]
    MalformedExport { reason: String },
}

impl TaglineError {
    /// Wrap a collaborator failure.
    pub fn collaborator(collaborator: CollaboratorKind, source: BoxError) -> Self {
        Self::Collaborator {
            collaborator,
            source,
        }
    }

    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Collaborator { .. } => ErrorCategory::CollaboratorFailure,
            Self::InvalidConfig { .. } => ErrorCategory::Configuration,
            Self::CompletionPrefix { .. }
            | Self::ScoreOutOfRange { .. }
            | Self::RatingOutOfRange(_)
            | Self::DuplicateWordOption { .. }
            | Self::MalformedWordOption { .. }
            | Self::TooManyWordOptions { .. }
            | Self::MalformedExport { .. } => ErrorCategory::InvariantViolation,
        }
    }

    /// True if a collaborator produced malformed output.
    pub fn is_invariant_violation(&self) -> bool {
        self.category() == ErrorCategory::InvariantViolation
    }
}

/// Convenience Result type for tagline search operations.
pub type Result<T> = std::result::Result<T, TaglineError>;
