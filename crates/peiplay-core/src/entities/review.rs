//! Reviews left after a completed booking

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::value_objects::Snowflake;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: Snowflake,
    pub booking_id: Snowflake,
    pub reviewer_id: Snowflake,
    pub reviewee_id: Snowflake,
    pub rating: i16,
    pub comment: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// New reviews wait for moderation
    pub fn new(
        id: Snowflake,
        booking_id: Snowflake,
        reviewer_id: Snowflake,
        reviewee_id: Snowflake,
        rating: i16,
        comment: Option<String>,
    ) -> Self {
        Self {
            id,
            booking_id,
            reviewer_id,
            reviewee_id,
            rating,
            comment: comment.filter(|c| !c.trim().is_empty()),
            is_approved: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatingSummary {
    /// Average of approved ratings, one decimal place
    pub average: Option<Decimal>,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_review_unapproved_and_blank_comment_dropped() {
        let r = Review::new(
            Snowflake::new(1),
            Snowflake::new(2),
            Snowflake::new(3),
            Snowflake::new(4),
            5,
            Some("  ".to_string()),
        );
        assert!(!r.is_approved);
        assert!(r.comment.is_none());
    }
}
