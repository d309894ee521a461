//! `SeaORM` implementation of the `AdminService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::models::user::{BulkAction, User, UserAction, UserFilter, format_timestamp};
use crate::services::admin_service::{
    AdminError, AdminService, AdminStats, ReferralBonuses, Statistics, UserList, UserListQuery,
};
use crate::services::referral;

const LATEST_USERS: u64 = 10;

pub struct SeaOrmAdminService {
    store: Store,
    config: Arc<RwLock<Config>>,
}

impl SeaOrmAdminService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl AdminService for SeaOrmAdminService {
    async fn stats(&self) -> Result<AdminStats, AdminError> {
        let day_ago = format_timestamp(Utc::now() - chrono::Duration::hours(24));

        let statistics = Statistics {
            total_users: self.store.count_users(UserFilter::All).await?,
            verified_users: self.store.count_users(UserFilter::Verified).await?,
            premium_users: self.store.count_users(UserFilter::Premium).await?,
            blocked_users: self.store.count_users(UserFilter::Blocked).await?,
            cheaters: self.store.count_users(UserFilter::Cheaters).await?,
            bots: self.store.count_users(UserFilter::Bots).await?,
            active_users: self.store.count_active_since(&day_ago).await?,
            honest_users: self.store.count_users(UserFilter::Honest).await?,
        };

        let latest_users = self.store.latest_users(LATEST_USERS).await?;

        Ok(AdminStats {
            statistics,
            latest_users,
        })
    }

    async fn list_users(&self, query: UserListQuery) -> Result<UserList, AdminError> {
        let page = self
            .store
            .list_users(query.page, query.limit, query.search.as_deref(), query.filter)
            .await?;

        Ok(UserList {
            users: page.users,
            total: page.total,
            pages: page.total.div_ceil(query.limit),
            page: query.page,
            limit: query.limit,
        })
    }

    async fn user_action(&self, user_id: &str, action: &str) -> Result<User, AdminError> {
        let action: UserAction = action.parse().map_err(AdminError::Validation)?;
        let initial_stars = self.config.read().await.referral.initial_stars;

        let user = self
            .store
            .patch_user(user_id, &action.patch(initial_stars))
            .await?
            .ok_or_else(|| AdminError::UserNotFound(user_id.to_string()))?;

        info!(user_id = %user_id, action = ?action, "Applied admin action");
        Ok(user)
    }

    async fn bulk_action(&self, action: &str) -> Result<u64, AdminError> {
        let action: BulkAction = action.parse().map_err(AdminError::Validation)?;
        let referral_config = self.config.read().await.referral.clone();

        let count = match action {
            BulkAction::BlockAllCheaters => self.store.block_cheaters().await?,
            BulkAction::UnblockAll => self.store.unblock_all_users().await?,
            BulkAction::MarkMultipleIpsAsCheaters => {
                referral::flag_all_shared_ips(&self.store, referral_config.cheater_ip_threshold)
                    .await?
            }
            BulkAction::VerifyAll => self.store.set_verified_all(true).await?,
            BulkAction::UnverifyAll => self.store.set_verified_all(false).await?,
            BulkAction::BlockAll => self.store.block_all_users().await?,
            BulkAction::ResetReferrals => self.store.reset_referrals_all().await?,
            BulkAction::ResetStars => {
                self.store
                    .reset_stars_all(referral_config.initial_stars)
                    .await?
            }
        };

        info!(action = ?action, count = count, "Applied bulk action");
        Ok(count)
    }

    async fn referral_bonuses(&self) -> ReferralBonuses {
        let config = self.config.read().await;
        ReferralBonuses {
            referral_bonus: config.referral.referral_bonus,
            premium_referral_bonus: config.referral.premium_referral_bonus,
        }
    }

    async fn update_referral_bonuses(
        &self,
        bonuses: ReferralBonuses,
    ) -> Result<ReferralBonuses, AdminError> {
        if bonuses.referral_bonus < 0 || bonuses.premium_referral_bonus < 0 {
            return Err(AdminError::Validation(
                "Invalid bonus values".to_string(),
            ));
        }

        let mut config = self.config.write().await;
        config.referral.referral_bonus = bonuses.referral_bonus;
        config.referral.premium_referral_bonus = bonuses.premium_referral_bonus;

        info!(
            referral_bonus = bonuses.referral_bonus,
            premium_referral_bonus = bonuses.premium_referral_bonus,
            "Updated referral bonuses"
        );
        Ok(bonuses)
    }
}
