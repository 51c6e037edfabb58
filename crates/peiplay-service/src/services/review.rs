//! Review service

use peiplay_core::entities::{BookingStatus, Review};
use peiplay_core::{DomainError, Snowflake};
use tracing::{info, instrument};

use crate::dto::{
    map_all, CreateReviewRequest, ModerateReviewRequest, ModerationAction, PageParams,
    RatingResponse, ReviewListQuery, ReviewResponse,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

pub struct ReviewService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReviewService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Review the other party of a completed booking
    #[instrument(skip(self, request), fields(booking_id = %request.booking_id, rating = request.rating))]
    pub async fn create(
        &self,
        user_id: Snowflake,
        request: CreateReviewRequest,
    ) -> ServiceResult<ReviewResponse> {
        if !(1..=5).contains(&request.rating) {
            return Err(DomainError::ValidationError("rating must be between 1 and 5".to_string()).into());
        }

        let booking = self
            .ctx
            .booking_repo()
            .find_by_id(request.booking_id)
            .await?
            .ok_or(DomainError::BookingNotFound(request.booking_id))?;

        let reviewee_id = if booking.is_customer(user_id) {
            booking.partner_user_id
        } else if booking.is_partner(user_id) {
            booking.customer_user_id
        } else {
            return Err(DomainError::Forbidden("not a party to this booking".to_string()).into());
        };

        if booking.status != BookingStatus::Completed {
            return Err(DomainError::BookingNotCompleted.into());
        }
        if self.ctx.review_repo().exists(booking.id, user_id).await? {
            return Err(DomainError::AlreadyReviewed.into());
        }

        let review = Review::new(
            self.ctx.generate_id(),
            booking.id,
            user_id,
            reviewee_id,
            request.rating,
            request.comment,
        );
        self.ctx.review_repo().create(&review).await?;

        info!(review_id = %review.id, "Review submitted");
        Ok(ReviewResponse::from(&review))
    }

    /// Reviews for a user or a booking; admins also see unmoderated ones
    #[instrument(skip(self, query))]
    pub async fn list(
        &self,
        caller: Option<Snowflake>,
        query: ReviewListQuery,
        page: PageParams,
    ) -> ServiceResult<Vec<ReviewResponse>> {
        let include_unapproved = match caller {
            Some(user_id) => AccessService::new(self.ctx).is_admin(user_id).await?,
            None => false,
        };

        let repo = self.ctx.review_repo();
        let reviews = match (query.reviewee_id, query.booking_id) {
            (Some(reviewee_id), _) => {
                repo.list_by_reviewee(reviewee_id, include_unapproved, page.limit, page.offset())
                    .await?
            }
            (None, Some(booking_id)) => repo.list_by_booking(booking_id, include_unapproved).await?,
            (None, None) => {
                return Err(ServiceError::validation("reviewee_id or booking_id is required"));
            }
        };
        Ok(map_all(&reviews))
    }

    #[instrument(skip(self))]
    pub async fn admin_pending(
        &self,
        admin_id: Snowflake,
        page: PageParams,
    ) -> ServiceResult<Vec<ReviewResponse>> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;
        let reviews = self
            .ctx
            .review_repo()
            .list_pending(page.limit, page.offset())
            .await?;
        Ok(map_all(&reviews))
    }

    /// Approve publishes the review; reject removes it
    #[instrument(skip(self, request), fields(action = ?request.action))]
    pub async fn admin_moderate(
        &self,
        admin_id: Snowflake,
        review_id: Snowflake,
        request: ModerateReviewRequest,
    ) -> ServiceResult<()> {
        AccessService::new(self.ctx).require_admin(admin_id).await?;

        let repo = self.ctx.review_repo();
        repo.find_by_id(review_id)
            .await?
            .ok_or(DomainError::ReviewNotFound(review_id))?;

        match request.action {
            ModerationAction::Approve => repo.approve(review_id).await?,
            ModerationAction::Reject => repo.delete(review_id).await?,
        }

        info!(review_id = %review_id, admin_id = %admin_id, "Review moderated");
        Ok(())
    }

    /// Approved-review average for a partner
    #[instrument(skip(self))]
    pub async fn average_rating(&self, partner_id: Snowflake) -> ServiceResult<RatingResponse> {
        let partner = AccessService::new(self.ctx).find_partner(partner_id).await?;
        let summary = self.ctx.review_repo().rating_summary(partner.user_id).await?;
        Ok(RatingResponse {
            average_rating: summary.average,
            review_count: summary.count,
        })
    }
}
