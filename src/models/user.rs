use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::str::FromStr;

use crate::entities::users;

/// Timestamps are stored as fixed-width RFC 3339 strings so that string
/// ordering matches chronological ordering.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[must_use]
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub telegram_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub special_id: String,
    pub referrer_id: Option<String>,
    pub referrals: i32,
    pub stars: i32,
    pub is_verified: bool,
    pub is_admin: bool,
    pub is_cheater: bool,
    pub is_bot: bool,
    pub is_blocked: bool,
    pub is_premium: bool,
    pub joined_channel: bool,
    pub ip_address: Option<String>,
    pub created_at: String,
    pub last_active: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            telegram_id: model.telegram_id,
            first_name: model.first_name,
            last_name: model.last_name,
            username: model.username,
            photo_url: model.photo_url,
            special_id: model.special_id,
            referrer_id: model.referrer_id,
            referrals: model.referrals,
            stars: model.stars,
            is_verified: model.is_verified,
            is_admin: model.is_admin,
            is_cheater: model.is_cheater,
            is_bot: model.is_bot,
            is_blocked: model.is_blocked,
            is_premium: model.is_premium,
            joined_channel: model.joined_channel,
            ip_address: model.ip_address,
            created_at: model.created_at,
            last_active: model.last_active,
        }
    }
}

/// Profile fields taken from the Telegram user on every login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub is_premium: bool,
}

/// Everything needed to insert a user on first login.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub telegram_id: String,
    pub profile: ProfileFields,
    pub special_id: String,
    pub ip_address: Option<String>,
    pub initial_stars: i32,
}

/// Selective column update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub is_blocked: Option<bool>,
    pub is_verified: Option<bool>,
    pub is_cheater: Option<bool>,
    pub is_bot: Option<bool>,
    pub referrals: Option<i32>,
    pub stars: Option<i32>,
}

/// Admin list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserFilter {
    #[default]
    All,
    Premium,
    Verified,
    Blocked,
    Cheaters,
    Bots,
    Honest,
}

impl UserFilter {
    /// Unknown filter names fall back to no filtering.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "premium" => Self::Premium,
            "verified" => Self::Verified,
            "blocked" => Self::Blocked,
            "cheaters" => Self::Cheaters,
            "bots" => Self::Bots,
            "honest" => Self::Honest,
            _ => Self::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Block,
    Unblock,
    Verify,
    Unverify,
    ResetReferrals,
    ResetStars,
    MarkAsCheater,
    UnmarkAsCheater,
}

impl UserAction {
    #[must_use]
    pub fn patch(self, initial_stars: i32) -> UserPatch {
        match self {
            Self::Block => UserPatch {
                is_blocked: Some(true),
                ..Default::default()
            },
            Self::Unblock => UserPatch {
                is_blocked: Some(false),
                ..Default::default()
            },
            Self::Verify => UserPatch {
                is_verified: Some(true),
                ..Default::default()
            },
            Self::Unverify => UserPatch {
                is_verified: Some(false),
                ..Default::default()
            },
            Self::ResetReferrals => UserPatch {
                referrals: Some(0),
                ..Default::default()
            },
            Self::ResetStars => UserPatch {
                stars: Some(initial_stars),
                ..Default::default()
            },
            Self::MarkAsCheater => UserPatch {
                is_cheater: Some(true),
                is_bot: Some(true),
                ..Default::default()
            },
            Self::UnmarkAsCheater => UserPatch {
                is_cheater: Some(false),
                is_bot: Some(false),
                ..Default::default()
            },
        }
    }
}

impl FromStr for UserAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(Self::Block),
            "unblock" => Ok(Self::Unblock),
            "verify" => Ok(Self::Verify),
            "unverify" => Ok(Self::Unverify),
            "reset-referrals" => Ok(Self::ResetReferrals),
            "reset-stars" => Ok(Self::ResetStars),
            "mark-as-cheater" => Ok(Self::MarkAsCheater),
            "unmark-as-cheater" => Ok(Self::UnmarkAsCheater),
            other => Err(format!("Invalid action: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    BlockAllCheaters,
    UnblockAll,
    MarkMultipleIpsAsCheaters,
    VerifyAll,
    UnverifyAll,
    BlockAll,
    ResetReferrals,
    ResetStars,
}

impl FromStr for BulkAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block-all-cheaters" => Ok(Self::BlockAllCheaters),
            "unblock-all" => Ok(Self::UnblockAll),
            "mark-multiple-ips-as-cheaters" => Ok(Self::MarkMultipleIpsAsCheaters),
            "verify-all" => Ok(Self::VerifyAll),
            "unverify-all" => Ok(Self::UnverifyAll),
            "block-all" => Ok(Self::BlockAll),
            "reset-referrals" => Ok(Self::ResetReferrals),
            "reset-stars" => Ok(Self::ResetStars),
            other => Err(format!("Invalid action: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_sort_chronologically() {
        let early = Utc.with_ymd_and_hms(2025, 3, 1, 9, 59, 59).unwrap();
        let late = early + chrono::Duration::milliseconds(1);
        assert!(format_timestamp(early) < format_timestamp(late));
        assert!(format_timestamp(early).ends_with('Z'));
    }

    #[test]
    fn test_user_action_parsing() {
        assert_eq!("block".parse::<UserAction>(), Ok(UserAction::Block));
        assert_eq!(
            "unmark-as-cheater".parse::<UserAction>(),
            Ok(UserAction::UnmarkAsCheater)
        );
        assert!("delete".parse::<UserAction>().is_err());
    }

    #[test]
    fn test_cheater_actions_touch_both_flags() {
        let patch = UserAction::MarkAsCheater.patch(5);
        assert_eq!(patch.is_cheater, Some(true));
        assert_eq!(patch.is_bot, Some(true));
        assert_eq!(patch.is_blocked, None);

        assert_eq!(UserAction::ResetStars.patch(5).stars, Some(5));
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!(UserFilter::parse("honest"), UserFilter::Honest);
        assert_eq!(UserFilter::parse(""), UserFilter::All);
        assert_eq!(UserFilter::parse("whatever"), UserFilter::All);
    }

    #[test]
    fn test_bulk_action_parsing() {
        assert_eq!(
            "mark-multiple-ips-as-cheaters".parse::<BulkAction>(),
            Ok(BulkAction::MarkMultipleIpsAsCheaters)
        );
        assert!("nuke".parse::<BulkAction>().is_err());
    }
}
