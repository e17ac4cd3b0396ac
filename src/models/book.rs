//! Book model and score aggregation

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub name: String,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateBook {
    /// Unique book name
    #[validate(length(min = 1, message = "Book name must be a non-empty string"))]
    pub name: String,
}

/// Count and sum of the scores recorded for a book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct ScoreTotals {
    pub scored: i64,
    pub total: i64,
}

/// Mean user score of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AverageScore {
    /// No return has been scored yet
    Unscored,
    /// Mean rounded to two decimal places
    Mean(Decimal),
}

impl AverageScore {
    pub fn from_totals(totals: ScoreTotals) -> Self {
        if totals.scored <= 0 {
            return AverageScore::Unscored;
        }

        let mut mean = (Decimal::from(totals.total) / Decimal::from(totals.scored))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        mean.rescale(2);
        AverageScore::Mean(mean)
    }

    pub fn mean(&self) -> Option<Decimal> {
        match self {
            AverageScore::Unscored => None,
            AverageScore::Mean(mean) => Some(*mean),
        }
    }
}

/// Book with its aggregated score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetails {
    pub book: Book,
    pub score: AverageScore,
}
