//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::Store;
use crate::models::telegram::TelegramUser;
use crate::models::user::{NewUser, ProfileFields, User};
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use crate::services::referral;
use crate::services::telegram::{InitDataValidator, parse_init_data};
use crate::services::token::TokenSigner;

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<RwLock<Config>>,
    validator: InitDataValidator,
    signer: TokenSigner,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, config: Arc<RwLock<Config>>, startup: &Config) -> Self {
        Self {
            store,
            config,
            validator: InitDataValidator::new(
                startup.telegram.bot_token.clone(),
                startup.telegram.init_data_max_age_seconds,
            ),
            signer: TokenSigner::new(&startup.auth.jwt_secret, startup.auth.token_ttl_days),
        }
    }

    async fn register(
        &self,
        telegram_id: String,
        profile: ProfileFields,
        ip_address: Option<String>,
        referral_code: Option<String>,
    ) -> Result<User, AuthError> {
        let referral_config = self.config.read().await.referral.clone();

        let referrer = match referral_code {
            Some(code) => {
                let referrer = self.store.get_user_by_special_id(&code).await?;
                if referrer.is_none() {
                    debug!("Ignoring unknown referral code {code}");
                }
                referrer
            }
            None => None,
        };

        let bonus = if profile.is_premium {
            referral_config.premium_referral_bonus
        } else {
            referral_config.referral_bonus
        };

        let new_user = NewUser {
            telegram_id: telegram_id.clone(),
            profile,
            special_id: String::new(),
            ip_address,
            initial_stars: referral_config.initial_stars,
        };

        let created = referral::insert_with_special_id(
            &self.store,
            new_user,
            referrer.as_ref().map(|r| (r.id.as_str(), bonus)),
            referral::generate_special_id,
        )
        .await;

        let mut user = match created {
            Ok(user) => user,
            Err(e) => {
                // A concurrent first login may have inserted the same Telegram id
                if let Some(existing) = self.store.get_user_by_telegram_id(&telegram_id).await? {
                    warn!("Concurrent registration for Telegram id {telegram_id}: {e}");
                    return Ok(existing);
                }
                return Err(e.into());
            }
        };

        metrics::counter!("users_created_total").increment(1);
        if let Some(referrer) = &referrer {
            metrics::counter!("referrals_credited_total").increment(1);
            info!(
                referrer_id = %referrer.id,
                user_id = %user.id,
                bonus = bonus,
                "Credited referral"
            );
        }

        if let Some(ip) = user.ip_address.clone()
            && referral::flag_shared_ip(&self.store, &ip, referral_config.cheater_ip_threshold)
                .await?
        {
            user = self
                .store
                .get_user(&user.id)
                .await?
                .ok_or(AuthError::UserNotFound)?;
        }

        Ok(user)
    }
}

fn profile_fields(user: &TelegramUser) -> ProfileFields {
    ProfileFields {
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
        photo_url: user.photo_url.clone(),
        is_premium: user.is_premium.unwrap_or(false),
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(
        &self,
        init_data: &str,
        ip_address: Option<String>,
    ) -> Result<LoginResult, AuthError> {
        if !self.validator.validate(init_data) {
            return Err(AuthError::InvalidInitData);
        }

        let data = parse_init_data(init_data);
        let telegram_user = data.user.ok_or(AuthError::MissingTelegramUser)?;
        let telegram_id = telegram_user.id.to_string();
        let profile = profile_fields(&telegram_user);
        let ip_address = ip_address
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());

        let existing = self.store.get_user_by_telegram_id(&telegram_id).await?;
        let created = existing.is_none();

        let mut user = match existing {
            Some(user) => self
                .store
                .refresh_user_profile(&user.id, profile, ip_address)
                .await?
                .ok_or(AuthError::UserNotFound)?,
            None => {
                self.register(telegram_id, profile, ip_address, data.start_param)
                    .await?
            }
        };

        let is_admin_id = self.config.read().await.is_admin_telegram_id(&user.telegram_id);
        if is_admin_id && !user.is_admin {
            user = self
                .store
                .promote_to_admin(&user.id)
                .await?
                .ok_or(AuthError::UserNotFound)?;
            info!(user_id = %user.id, "Promoted configured admin");
        }

        let token = self.signer.issue(&user.id)?;

        Ok(LoginResult {
            token,
            user,
            created,
        })
    }

    fn verify_token(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.signer.verify(token)?;
        Ok(claims.user_id)
    }

    fn issue_token(&self, user_id: &str) -> Result<String, AuthError> {
        Ok(self.signer.issue(user_id)?)
    }

    async fn require_admin(&self, user_id: &str) -> Result<User, AuthError> {
        match self.store.get_user(user_id).await? {
            Some(user) if user.is_admin => Ok(user),
            _ => Err(AuthError::Forbidden),
        }
    }
}
