//! Scoring aggregator.
//!
//! Combines the four component ratings into one scalar using a weighted
//! arithmetic mean in which extreme ratings dominate a neutral 3.

use crate::Rating;

/// Weighted mean of component ratings.
///
/// `sum(s * weight(s)) / sum(weight(s))`, see [`Rating::weight`]. The result
/// is a convex combination of the inputs and therefore lies in [1, 5].
/// An empty slice combines to the neutral rating 3.
pub fn combine<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = Rating>,
{
    let (weighted_sum, total_weight) = ratings
        .into_iter()
        .fold((0.0, 0.0), |(sum, weight), r| {
            (sum + r.get() * r.weight(), weight + r.weight())
        });

    if total_weight == 0.0 {
        return 3.0;
    }
    weighted_sum / total_weight
}
