use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::models::user::{NewUser, ProfileFields, User, UserFilter, UserPatch};

pub mod migrator;
pub mod repositories;

pub use repositories::user::UserPage;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_telegram_id(&self, telegram_id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_telegram_id(telegram_id).await
    }

    pub async fn get_user_by_special_id(&self, special_id: &str) -> Result<Option<User>> {
        self.user_repo().get_by_special_id(special_id).await
    }

    pub async fn special_id_exists(&self, special_id: &str) -> Result<bool> {
        self.user_repo().special_id_exists(special_id).await
    }

    pub async fn create_user(
        &self,
        new_user: NewUser,
        referrer: Option<(&str, i32)>,
    ) -> Result<User> {
        self.user_repo().create(new_user, referrer).await
    }

    pub async fn refresh_user_profile(
        &self,
        id: &str,
        profile: ProfileFields,
        ip_address: Option<String>,
    ) -> Result<Option<User>> {
        self.user_repo()
            .refresh_profile(id, profile, ip_address)
            .await
    }

    pub async fn promote_to_admin(&self, id: &str) -> Result<Option<User>> {
        self.user_repo().promote_to_admin(id).await
    }

    pub async fn touch_last_active(&self, id: &str) -> Result<()> {
        self.user_repo().touch_last_active(id).await
    }

    pub async fn set_joined_channel(&self, id: &str) -> Result<Option<User>> {
        self.user_repo().set_joined_channel(id).await
    }

    pub async fn patch_user(&self, id: &str, patch: &UserPatch) -> Result<Option<User>> {
        self.user_repo().apply_patch(id, patch).await
    }

    pub async fn get_referred_users(&self, id: &str) -> Result<Vec<User>> {
        self.user_repo().referred_users(id).await
    }

    pub async fn first_user_with_referrals(&self) -> Result<Option<User>> {
        self.user_repo().first_with_referrals().await
    }

    pub async fn count_users_by_ip(&self, ip_address: &str) -> Result<u64> {
        self.user_repo().count_by_ip(ip_address).await
    }

    pub async fn flag_ip_as_cheaters(&self, ip_address: &str) -> Result<u64> {
        self.user_repo().flag_ip_as_cheaters(ip_address).await
    }

    pub async fn shared_ips(&self, threshold: u64) -> Result<Vec<String>> {
        self.user_repo().shared_ips(threshold).await
    }

    pub async fn count_users(&self, filter: UserFilter) -> Result<u64> {
        self.user_repo().count(filter).await
    }

    pub async fn count_active_since(&self, since: &str) -> Result<u64> {
        self.user_repo().count_active_since(since).await
    }

    pub async fn latest_users(&self, limit: u64) -> Result<Vec<User>> {
        self.user_repo().latest(limit).await
    }

    pub async fn list_users(
        &self,
        page: u64,
        limit: u64,
        search: Option<&str>,
        filter: UserFilter,
    ) -> Result<UserPage> {
        self.user_repo().list(page, limit, search, filter).await
    }

    pub async fn block_cheaters(&self) -> Result<u64> {
        self.user_repo().block_cheaters().await
    }

    pub async fn block_all_users(&self) -> Result<u64> {
        self.user_repo().block_all().await
    }

    pub async fn unblock_all_users(&self) -> Result<u64> {
        self.user_repo().unblock_all().await
    }

    pub async fn set_verified_all(&self, verified: bool) -> Result<u64> {
        self.user_repo().set_verified_all(verified).await
    }

    pub async fn reset_referrals_all(&self) -> Result<u64> {
        self.user_repo().reset_referrals_all().await
    }

    pub async fn reset_stars_all(&self, stars: i32) -> Result<u64> {
        self.user_repo().reset_stars_all(stars).await
    }
}
