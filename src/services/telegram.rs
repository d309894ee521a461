//! Telegram WebApp init-data verification.
//!
//! The signing key is `HMAC_SHA256(key = "WebAppData", msg = bot_token)`; the
//! signature is `HMAC_SHA256(key = signing_key, msg = data_check_string)` where
//! the check string is every `key=value` pair except `hash`, sorted by key and
//! joined with `\n`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::models::telegram::{InitData, TelegramUser};

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";

#[derive(Debug, Clone)]
pub struct InitDataValidator {
    bot_token: String,
    max_age_seconds: u64,
}

impl InitDataValidator {
    #[must_use]
    pub fn new(bot_token: impl Into<String>, max_age_seconds: u64) -> Self {
        Self {
            bot_token: bot_token.into(),
            max_age_seconds,
        }
    }

    /// Returns `true` only for init-data signed with this bot's token.
    /// Every parse or decode failure counts as invalid.
    #[must_use]
    pub fn validate(&self, raw: &str) -> bool {
        self.validate_at(raw, chrono::Utc::now().timestamp())
    }

    #[must_use]
    pub fn validate_at(&self, raw: &str, now_unix: i64) -> bool {
        if self.bot_token.is_empty() {
            debug!("Rejecting init-data: bot token not configured");
            return false;
        }

        let mut hash = None;
        let mut pairs = Vec::new();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            if key == "hash" {
                hash = Some(value.into_owned());
            } else {
                pairs.push((key.into_owned(), value.into_owned()));
            }
        }

        let Some(hash) = hash else {
            return false;
        };
        let Ok(expected) = hex::decode(hash.trim()) else {
            return false;
        };

        let Some(mac) = self.check_mac(&pairs) else {
            return false;
        };
        if mac.verify_slice(&expected).is_err() {
            return false;
        }

        if self.max_age_seconds > 0 {
            let auth_date = pairs
                .iter()
                .find(|(key, _)| key == "auth_date")
                .and_then(|(_, value)| value.parse::<i64>().ok());

            let fresh = auth_date.is_some_and(|at| {
                u64::try_from(now_unix.saturating_sub(at)).unwrap_or(0) <= self.max_age_seconds
            });
            if !fresh {
                debug!("Rejecting init-data: auth_date missing or stale");
                return false;
            }
        }

        true
    }

    /// Hex signature for the given fields, as Telegram would compute it.
    #[must_use]
    pub fn sign(&self, fields: &[(&str, &str)]) -> Option<String> {
        let pairs: Vec<(String, String)> = fields
            .iter()
            .filter(|(key, _)| *key != "hash")
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();

        let mac = self.check_mac(&pairs)?;
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    /// Url-encoded init-data string including a valid `hash`.
    #[must_use]
    pub fn signed_query(&self, fields: &[(&str, &str)]) -> Option<String> {
        let hash = self.sign(fields)?;
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in fields {
            serializer.append_pair(key, value);
        }
        serializer.append_pair("hash", &hash);
        Some(serializer.finish())
    }

    fn check_mac(&self, pairs: &[(String, String)]) -> Option<HmacSha256> {
        let mut secret = HmacSha256::new_from_slice(WEB_APP_DATA_KEY).ok()?;
        secret.update(self.bot_token.as_bytes());
        let secret_key = secret.finalize().into_bytes();

        let mut mac = HmacSha256::new_from_slice(&secret_key).ok()?;
        mac.update(data_check_string(pairs).as_bytes());
        Some(mac)
    }
}

fn data_check_string(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracts the fields the portal uses. A malformed `user` JSON yields no user.
#[must_use]
pub fn parse_init_data(raw: &str) -> InitData {
    let mut data = InitData::default();

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match key.as_ref() {
            "query_id" => data.query_id = Some(value.into_owned()),
            "auth_date" => data.auth_date = value.parse().ok(),
            "hash" => data.hash = Some(value.into_owned()),
            "start_param" => {
                let code = value.trim();
                if !code.is_empty() {
                    data.start_param = Some(code.to_string());
                }
            }
            "user" => match serde_json::from_str::<TelegramUser>(&value) {
                Ok(user) => data.user = Some(user),
                Err(e) => debug!("Ignoring malformed init-data user: {e}"),
            },
            _ => {}
        }
    }

    data
}
