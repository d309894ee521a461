use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// UUID v4 string
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub telegram_id: String,

    pub first_name: String,

    pub last_name: Option<String>,

    pub username: Option<String>,

    pub photo_url: Option<String>,

    /// Six-digit referral code shared in `startapp` links
    #[sea_orm(unique)]
    pub special_id: String,

    /// Set once at creation, never rewritten
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

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ReferrerId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Referrer,
}

impl ActiveModelBehavior for ActiveModel {}
