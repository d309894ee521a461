pub mod referral;
pub mod telegram;
pub mod token;

pub use telegram::{InitDataValidator, parse_init_data};
pub use token::{Claims, TokenError, TokenSigner};

pub mod auth_service;
pub use auth_service::{AuthError, AuthService, LoginResult};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_service;
pub use user_service::{UserError, UserProfile, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;

pub mod admin_service;
pub use admin_service::{
    AdminError, AdminService, AdminStats, ReferralBonuses, Statistics, UserList, UserListQuery,
};

pub mod admin_service_impl;
pub use admin_service_impl::SeaOrmAdminService;
