//! Filters for the "most liked" ranking views.

use serde::Deserialize;

use crate::{Gender, ValidationError};

/// Inclusive customer age range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AgeBand {
    pub min_age: i32,
    pub max_age: i32,
}

impl AgeBand {
    /// # Errors
    ///
    /// Returns [`ValidationError::Invalid`] for negative bounds or `min_age > max_age`.
    pub fn new(min_age: i32, max_age: i32) -> Result<Self, ValidationError> {
        if min_age < 0 || max_age < 0 {
            return Err(ValidationError::Invalid(format!(
                "age bounds must be non-negative, got {min_age}..={max_age}"
            )));
        }
        if min_age > max_age {
            return Err(ValidationError::Invalid(format!(
                "min_age ({min_age}) must not exceed max_age ({max_age})"
            )));
        }
        Ok(Self { min_age, max_age })
    }

    #[must_use]
    pub fn contains(self, age: i32) -> bool {
        (self.min_age..=self.max_age).contains(&age)
    }
}

/// Which likes count toward a ranking.
///
/// A like qualifies when the liking customer falls in the age band, has the
/// given gender, or (for `Effect`) when the liked merchandise carries the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingFilter {
    Age(AgeBand),
    Gender(Gender),
    Effect(i64),
}

impl RankingFilter {
    /// Human-readable summary attached to the ranking result.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            RankingFilter::Age(band) => format!(
                "most liked by customers aged {} to {}",
                band.min_age, band.max_age
            ),
            RankingFilter::Gender(gender) => format!("most liked by {gender} customers"),
            RankingFilter::Effect(effect_id) => {
                format!("most liked merchandise tagged with effect {effect_id}")
            }
        }
    }
}
