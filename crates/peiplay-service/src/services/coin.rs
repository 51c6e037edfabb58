//! Coin wallet service

use chrono::Utc;
use peiplay_core::entities::{CoinTransaction, CoinTransactionType, RechargeRecord, MAX_RECHARGE_COINS};
use peiplay_core::{DomainError, Snowflake};
use tracing::{info, instrument};

use crate::dto::{
    map_all, AdminAddCoinsRequest, CoinBalanceResponse, CoinTransactionResponse, PageParams,
    PaginatedResponse, RechargeRequest, RechargeResponse,
};

use super::access::AccessService;
use super::context::ServiceContext;
use super::error::ServiceResult;

/// Ledger entries shown alongside the balance
const RECENT_TRANSACTIONS: i64 = 5;

pub struct CoinService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CoinService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self))]
    pub async fn balance(&self, user_id: Snowflake) -> ServiceResult<CoinBalanceResponse> {
        let repo = self.ctx.coin_repo();
        let wallet = repo.get_or_create(user_id).await?;
        let recent = repo.transactions(user_id, RECENT_TRANSACTIONS, 0).await?;

        Ok(CoinBalanceResponse {
            coin_balance: wallet.coin_balance,
            total_recharged: wallet.total_recharged,
            total_spent: wallet.total_spent,
            recent_transactions: map_all(&recent),
        })
    }

    #[instrument(skip(self))]
    pub async fn transactions(
        &self,
        user_id: Snowflake,
        page: PageParams,
    ) -> ServiceResult<PaginatedResponse<CoinTransactionResponse>> {
        let repo = self.ctx.coin_repo();
        let items = repo.transactions(user_id, page.limit, page.offset()).await?;
        let total = repo.count_transactions(user_id).await?;
        Ok(PaginatedResponse::new(map_all(&items), page, total))
    }

    /// Open a pending recharge order; coins arrive with the payment callback
    #[instrument(skip(self, request), fields(coins = request.coin_amount))]
    pub async fn recharge(
        &self,
        user_id: Snowflake,
        request: RechargeRequest,
    ) -> ServiceResult<RechargeResponse> {
        if !(1..=MAX_RECHARGE_COINS).contains(&request.coin_amount) {
            return Err(DomainError::ValidationError(format!(
                "coin_amount must be between 1 and {MAX_RECHARGE_COINS}"
            ))
            .into());
        }
        AccessService::new(self.ctx).require_active_user(user_id).await?;

        let record = RechargeRecord::new(self.ctx.generate_id(), user_id, request.coin_amount, Utc::now());
        self.ctx.coin_repo().create_recharge(&record).await?;

        info!(order_number = %record.order_number, user_id = %user_id, "Recharge order created");
        Ok(RechargeResponse::from(&record))
    }

    /// Credit a paid recharge; a repeated confirmation credits nothing
    #[instrument(skip(self))]
    pub async fn confirm_recharge(&self, order_number: &str) -> ServiceResult<Option<CoinTransaction>> {
        let credited = self
            .ctx
            .coin_repo()
            .complete_recharge(order_number, self.ctx.generate_id())
            .await?;

        match &credited {
            Some(tx) => info!(
                order_number = %order_number,
                user_id = %tx.user_id,
                amount = tx.amount,
                "Recharge credited"
            ),
            None => info!(order_number = %order_number, "Recharge already credited"),
        }
        Ok(credited)
    }

    #[instrument(skip(self, request), fields(target = %request.user_id, amount = request.amount))]
    pub async fn admin_add(
        &self,
        admin_id: Snowflake,
        request: AdminAddCoinsRequest,
    ) -> ServiceResult<CoinTransactionResponse> {
        let access = AccessService::new(self.ctx);
        access.require_admin(admin_id).await?;
        access.require_user(request.user_id).await?;

        if request.amount <= 0 {
            return Err(DomainError::ValidationError("amount must be positive".to_string()).into());
        }

        let description = request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        let tx = self
            .ctx
            .coin_repo()
            .credit(
                request.user_id,
                request.amount,
                CoinTransactionType::AdminAdjustment,
                description,
                self.ctx.generate_id(),
            )
            .await?;

        info!(admin_id = %admin_id, user_id = %request.user_id, balance = tx.balance_after, "Coins added by admin");
        Ok(CoinTransactionResponse::from(&tx))
    }
}
