//! Review mappers

use peiplay_core::value_objects::round_rating;
use peiplay_core::{RatingSummary, Review, Snowflake};

use crate::models::{RatingSummaryModel, ReviewModel};

impl From<ReviewModel> for Review {
    fn from(model: ReviewModel) -> Self {
        Review {
            id: Snowflake::new(model.id),
            booking_id: Snowflake::new(model.booking_id),
            reviewer_id: Snowflake::new(model.reviewer_id),
            reviewee_id: Snowflake::new(model.reviewee_id),
            rating: model.rating,
            comment: model.comment,
            is_approved: model.is_approved,
            created_at: model.created_at,
        }
    }
}

impl From<RatingSummaryModel> for RatingSummary {
    fn from(model: RatingSummaryModel) -> Self {
        RatingSummary {
            average: model.average.map(round_rating),
            count: model.count,
        }
    }
}
