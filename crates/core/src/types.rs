//! Tagline domain types with enforced invariants.
//!
//! These types ensure critical invariants are maintained at the type level:
//! - Rating: component score in range [1, 5]
//! - TaglineScore: combined score is always derived by the aggregator

use crate::scoring;
use crate::{Result, TaglineError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest rating an evaluator may give.
pub const MIN_RATING: f64 = 1.0;

/// Highest rating an evaluator may give.
pub const MAX_RATING: f64 = 5.0;

/// A component rating.
///
/// Invariant: finite and in range [1, 5].
///
/// # Example
/// ```
/// use tagline_core::Rating;
///
/// let rating = Rating::new(4.0).unwrap();
/// assert_eq!(rating.weight(), 2.0);
/// assert!(Rating::new(0.5).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(f64);

impl Rating {
    /// Create a new rating.
    ///
    /// # Errors
    /// Returns `TaglineError::RatingOutOfRange` if the value is not finite or
    /// lies outside [1, 5].
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(TaglineError::RatingOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Lowest possible rating.
    pub const MIN: Self = Self(MIN_RATING);

    /// Highest possible rating.
    pub const MAX: Self = Self(MAX_RATING);

    /// Get the underlying value.
    pub fn get(self) -> f64 {
        self.0
    }

    /// The rating rounded to the nearest whole step 1..=5.
    pub fn step(self) -> u8 {
        // Range is checked on construction, so the cast cannot truncate.
        self.0.round().clamp(MIN_RATING, MAX_RATING) as u8
    }

    /// Aggregation weight of this rating.
    ///
    /// Extreme ratings (1 and 5) weigh 5, moderate ones (2 and 4) weigh 2 and
    /// the neutral 3 weighs 1.
    pub fn weight(self) -> f64 {
        match self.step() {
            1 | 5 => 5.0,
            2 | 4 => 2.0,
            _ => 1.0,
        }
    }
}

impl TryFrom<f64> for Rating {
    type Error = TaglineError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Rating> for f64 {
    fn from(r: Rating) -> f64 {
        r.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// One of the four independent quality axes a tagline is rated on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Unambiguous communication of the value proposition.
    Clarity,
    /// Ease and pleasantness of the linguistic rhythm.
    Simplicity,
    /// Originality and memorability.
    Creativity,
    /// Assertiveness and boldness of tone.
    Strength,
}

impl Axis {
    /// All axes, in the order scores are reported.
    pub const ALL: [Self; 4] = [
        Self::Clarity,
        Self::Simplicity,
        Self::Creativity,
        Self::Strength,
    ];

    /// Position of the axis in [`Axis::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::Clarity => 0,
            Self::Simplicity => 1,
            Self::Creativity => 2,
            Self::Strength => 3,
        }
    }

    /// Lowercase name of the axis.
    pub fn name(self) -> &'static str {
        match self {
            Self::Clarity => "clarity",
            Self::Simplicity => "simplicity",
            Self::Creativity => "creativity",
            Self::Strength => "strength",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A rating on a single axis with the evaluator's rationale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub score: Rating,
    pub rationale: String,
}

impl ComponentScore {
    pub fn new(score: Rating, rationale: impl Into<String>) -> Self {
        Self {
            score,
            rationale: rationale.into(),
        }
    }
}

/// An evaluator's rating before range validation.
///
/// The search converts it into a [`ComponentScore`] and rejects scores
/// outside [1, 5].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRating {
    pub score: f64,
    pub rationale: String,
}

impl AxisRating {
    pub fn new(score: f64, rationale: impl Into<String>) -> Self {
        Self {
            score,
            rationale: rationale.into(),
        }
    }

    /// Validate the rating given for `axis`.
    ///
    /// # Errors
    /// Returns `TaglineError::ScoreOutOfRange` naming the axis if the score
    /// is not a valid [`Rating`].
    pub fn validate(self, axis: Axis) -> Result<ComponentScore> {
        let score = Rating::new(self.score).map_err(|_| TaglineError::ScoreOutOfRange {
            axis,
            score: self.score,
        })?;
        Ok(ComponentScore::new(score, self.rationale))
    }
}

/// Four component ratings and their combined score.
///
/// Invariant: `combined` is the weighted mean of the four components, so it
/// always lies in [1, 5]. A stored `combined` is ignored on load and
/// recomputed from the components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredScore")]
pub struct TaglineScore {
    combined: f64,
    pub clarity: ComponentScore,
    pub simplicity: ComponentScore,
    pub creativity: ComponentScore,
    pub strength: ComponentScore,
}

/// The components of a [`TaglineScore`] as read from disk.
#[derive(Deserialize)]
struct StoredScore {
    clarity: ComponentScore,
    simplicity: ComponentScore,
    creativity: ComponentScore,
    strength: ComponentScore,
}

impl From<StoredScore> for TaglineScore {
    fn from(stored: StoredScore) -> Self {
        Self::from_components(
            stored.clarity,
            stored.simplicity,
            stored.creativity,
            stored.strength,
        )
    }
}

impl TaglineScore {
    /// Combine four component ratings into a score.
    pub fn from_components(
        clarity: ComponentScore,
        simplicity: ComponentScore,
        creativity: ComponentScore,
        strength: ComponentScore,
    ) -> Self {
        let combined = scoring::combine([
            clarity.score,
            simplicity.score,
            creativity.score,
            strength.score,
        ]);
        Self {
            combined,
            clarity,
            simplicity,
            creativity,
            strength,
        }
    }

    /// Weighted mean of the components, in [1, 5].
    pub fn combined(&self) -> f64 {
        self.combined
    }

    /// Combined score rescaled to [0, 1] for backpropagation.
    pub fn outcome(&self) -> f64 {
        self.combined / MAX_RATING
    }

    /// The component rated on `axis`.
    pub fn component(&self, axis: Axis) -> &ComponentScore {
        match axis {
            Axis::Clarity => &self.clarity,
            Axis::Simplicity => &self.simplicity,
            Axis::Creativity => &self.creativity,
            Axis::Strength => &self.strength,
        }
    }
}

/// A candidate next word and why the provider proposed it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordOption {
    pub word: String,
    pub rationale: String,
}

impl WordOption {
    pub fn new(word: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            rationale: rationale.into(),
        }
    }
}

/// A full tagline derived from a partial one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub rationale: String,
}

impl Completion {
    pub fn new(text: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rationale: rationale.into(),
        }
    }
}
