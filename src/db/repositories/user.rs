use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{prelude::*, users};
use crate::models::user::{NewUser, ProfileFields, User, UserFilter, UserPatch, now_timestamp};

/// Page of users plus the total number of matches.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: u64,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = Users::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_telegram_id(&self, telegram_id: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::TelegramId.eq(telegram_id))
            .one(&self.conn)
            .await
            .context("Failed to query user by Telegram ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_special_id(&self, special_id: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::SpecialId.eq(special_id))
            .one(&self.conn)
            .await
            .context("Failed to query user by special ID")?;

        Ok(user.map(User::from))
    }

    pub async fn special_id_exists(&self, special_id: &str) -> Result<bool> {
        let count = Users::find()
            .filter(users::Column::SpecialId.eq(special_id))
            .count(&self.conn)
            .await
            .context("Failed to check special ID")?;

        Ok(count > 0)
    }

    /// Inserts a user and, when a referrer is given, credits it in the same
    /// transaction.
    pub async fn create(
        &self,
        new_user: NewUser,
        referrer: Option<(&str, i32)>,
    ) -> Result<User> {
        let now = now_timestamp();
        let id = uuid::Uuid::new_v4().to_string();

        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin user creation")?;

        let active = users::ActiveModel {
            id: Set(id),
            telegram_id: Set(new_user.telegram_id),
            first_name: Set(new_user.profile.first_name),
            last_name: Set(new_user.profile.last_name),
            username: Set(new_user.profile.username),
            photo_url: Set(new_user.profile.photo_url),
            special_id: Set(new_user.special_id),
            referrer_id: Set(referrer.map(|(referrer_id, _)| referrer_id.to_string())),
            referrals: Set(0),
            stars: Set(new_user.initial_stars),
            is_verified: Set(false),
            is_admin: Set(false),
            is_cheater: Set(false),
            is_bot: Set(false),
            is_blocked: Set(false),
            is_premium: Set(new_user.profile.is_premium),
            joined_channel: Set(false),
            ip_address: Set(new_user.ip_address),
            created_at: Set(now.clone()),
            last_active: Set(now),
        };

        let model = active
            .insert(&txn)
            .await
            .context("Failed to insert user")?;

        if let Some((referrer_id, bonus)) = referrer {
            Users::update_many()
                .col_expr(
                    users::Column::Referrals,
                    Expr::col(users::Column::Referrals).add(1),
                )
                .col_expr(
                    users::Column::Stars,
                    Expr::col(users::Column::Stars).add(bonus),
                )
                .filter(users::Column::Id.eq(referrer_id))
                .exec(&txn)
                .await
                .context("Failed to credit referrer")?;
        }

        txn.commit().await.context("Failed to commit user creation")?;

        Ok(User::from(model))
    }

    /// Rewrites the Telegram profile of an existing user and marks it active.
    /// The stored IP is kept when no new one is supplied.
    pub async fn refresh_profile(
        &self,
        id: &str,
        profile: ProfileFields,
        ip_address: Option<String>,
    ) -> Result<Option<User>> {
        let Some(model) = Users::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query user for profile refresh")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        active.first_name = Set(profile.first_name);
        active.last_name = Set(profile.last_name);
        active.username = Set(profile.username);
        active.photo_url = Set(profile.photo_url);
        active.is_premium = Set(profile.is_premium);
        active.last_active = Set(now_timestamp());
        if let Some(ip) = ip_address {
            active.ip_address = Set(Some(ip));
        }

        let model = active.update(&self.conn).await?;
        Ok(Some(User::from(model)))
    }

    pub async fn promote_to_admin(&self, id: &str) -> Result<Option<User>> {
        let Some(model) = Users::find_by_id(id.to_string()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        active.is_admin = Set(true);
        active.is_verified = Set(true);

        let model = active.update(&self.conn).await?;
        Ok(Some(User::from(model)))
    }

    pub async fn touch_last_active(&self, id: &str) -> Result<()> {
        Users::update_many()
            .col_expr(users::Column::LastActive, Expr::value(now_timestamp()))
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update last active")?;

        Ok(())
    }

    pub async fn set_joined_channel(&self, id: &str) -> Result<Option<User>> {
        let Some(model) = Users::find_by_id(id.to_string()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        active.joined_channel = Set(true);

        let model = active.update(&self.conn).await?;
        Ok(Some(User::from(model)))
    }

    pub async fn apply_patch(&self, id: &str, patch: &UserPatch) -> Result<Option<User>> {
        let Some(model) = Users::find_by_id(id.to_string()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        if let Some(value) = patch.is_blocked {
            active.is_blocked = Set(value);
        }
        if let Some(value) = patch.is_verified {
            active.is_verified = Set(value);
        }
        if let Some(value) = patch.is_cheater {
            active.is_cheater = Set(value);
        }
        if let Some(value) = patch.is_bot {
            active.is_bot = Set(value);
        }
        if let Some(value) = patch.referrals {
            active.referrals = Set(value);
        }
        if let Some(value) = patch.stars {
            active.stars = Set(value);
        }

        let model = active.update(&self.conn).await?;
        Ok(Some(User::from(model)))
    }

    /// Users referred by `id`, newest first.
    pub async fn referred_users(&self, id: &str) -> Result<Vec<User>> {
        let referred = Users::find()
            .filter(users::Column::ReferrerId.eq(id))
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query referred users")?;

        Ok(referred.into_iter().map(User::from).collect())
    }

    pub async fn first_with_referrals(&self) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Referrals.gt(0))
            .order_by_desc(users::Column::Referrals)
            .one(&self.conn)
            .await?;

        Ok(user.map(User::from))
    }

    pub async fn count_by_ip(&self, ip_address: &str) -> Result<u64> {
        let count = Users::find()
            .filter(users::Column::IpAddress.eq(ip_address))
            .count(&self.conn)
            .await
            .context("Failed to count users by IP")?;

        Ok(count)
    }

    /// Marks every account on `ip_address` as cheater and bot.
    pub async fn flag_ip_as_cheaters(&self, ip_address: &str) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::IsCheater, Expr::value(true))
            .col_expr(users::Column::IsBot, Expr::value(true))
            .filter(users::Column::IpAddress.eq(ip_address))
            .exec(&self.conn)
            .await
            .context("Failed to flag accounts sharing an IP")?;

        Ok(result.rows_affected)
    }

    /// IPs shared by at least `threshold` accounts.
    pub async fn shared_ips(&self, threshold: u64) -> Result<Vec<String>> {
        let rows: Vec<(String, i64)> = Users::find()
            .select_only()
            .column(users::Column::IpAddress)
            .column_as(Expr::col(users::Column::Id).count(), "accounts")
            .filter(users::Column::IpAddress.is_not_null())
            .group_by(users::Column::IpAddress)
            .having(
                Expr::expr(Expr::col(users::Column::Id).count())
                    .gte(i64::try_from(threshold).unwrap_or(i64::MAX)),
            )
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to group users by IP")?;

        Ok(rows.into_iter().map(|(ip, _)| ip).collect())
    }

    pub async fn count(&self, filter: UserFilter) -> Result<u64> {
        let count = Users::find()
            .filter(filter_condition(filter))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    pub async fn count_active_since(&self, since: &str) -> Result<u64> {
        let count = Users::find()
            .filter(users::Column::LastActive.gte(since))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    pub async fn latest(&self, limit: u64) -> Result<Vec<User>> {
        let latest = Users::find()
            .order_by_desc(users::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await?;

        Ok(latest.into_iter().map(User::from).collect())
    }

    /// `page` is 1-based.
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        search: Option<&str>,
        filter: UserFilter,
    ) -> Result<UserPage> {
        let mut condition = filter_condition(filter);

        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            // SQLite LIKE is case-insensitive for ASCII
            condition = condition.add(
                Condition::any()
                    .add(users::Column::FirstName.contains(term))
                    .add(users::Column::LastName.contains(term))
                    .add(users::Column::Username.contains(term))
                    .add(users::Column::TelegramId.contains(term))
                    .add(users::Column::SpecialId.contains(term)),
            );
        }

        let query = Users::find()
            .filter(condition)
            .order_by_desc(users::Column::CreatedAt);

        let page_index = page.saturating_sub(1);
        page_index
            .checked_mul(limit)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .with_context(|| format!("Page {page} with limit {limit} is out of range"))?;

        let paginator = query.paginate(&self.conn, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page_index).await?;

        Ok(UserPage {
            users: items.into_iter().map(User::from).collect(),
            total,
        })
    }

    pub async fn block_cheaters(&self) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::IsBlocked, Expr::value(true))
            .filter(users::Column::IsCheater.eq(true))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    /// Blocks every non-admin account.
    pub async fn block_all(&self) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::IsBlocked, Expr::value(true))
            .filter(users::Column::IsAdmin.eq(false))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn unblock_all(&self) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::IsBlocked, Expr::value(false))
            .filter(users::Column::IsBlocked.eq(true))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn set_verified_all(&self, verified: bool) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::IsVerified, Expr::value(verified))
            .filter(users::Column::IsVerified.eq(!verified))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn reset_referrals_all(&self) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::Referrals, Expr::value(0))
            .filter(users::Column::Referrals.ne(0))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn reset_stars_all(&self, stars: i32) -> Result<u64> {
        let result = Users::update_many()
            .col_expr(users::Column::Stars, Expr::value(stars))
            .filter(users::Column::Stars.ne(stars))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}

fn filter_condition(filter: UserFilter) -> Condition {
    let condition = Condition::all();
    match filter {
        UserFilter::All => condition,
        UserFilter::Premium => condition.add(users::Column::IsPremium.eq(true)),
        UserFilter::Verified => condition.add(users::Column::IsVerified.eq(true)),
        UserFilter::Blocked => condition.add(users::Column::IsBlocked.eq(true)),
        UserFilter::Cheaters => condition.add(users::Column::IsCheater.eq(true)),
        UserFilter::Bots => condition.add(users::Column::IsBot.eq(true)),
        UserFilter::Honest => condition
            .add(users::Column::IsCheater.eq(false))
            .add(users::Column::IsBot.eq(false)),
    }
}
