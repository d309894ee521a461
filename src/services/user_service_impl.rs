//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::models::user::User;
use crate::services::user_service::{UserError, UserProfile, UserService};

pub struct SeaOrmUserService {
    store: Store,
    config: Arc<RwLock<Config>>,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, UserError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(UserError::NotFound)?;

        if user.is_blocked {
            return Err(UserError::Blocked);
        }

        self.store.touch_last_active(&user.id).await?;

        let referred_users = self.store.get_referred_users(&user.id).await?;
        let referral_link = self.config.read().await.referral_link(&user.special_id);

        Ok(UserProfile {
            user,
            referred_users,
            referral_link,
        })
    }

    async fn join_channel(&self, user_id: &str) -> Result<User, UserError> {
        self.store
            .set_joined_channel(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }
}
