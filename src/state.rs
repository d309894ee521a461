use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AdminService, AuthService, SeaOrmAdminService, SeaOrmAuthService, SeaOrmUserService,
    UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<dyn UserService>,

    pub admin_service: Arc<dyn AdminService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let startup = config.clone();
        let config_arc = Arc::new(RwLock::new(config));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config_arc.clone(),
            &startup,
        )) as Arc<dyn AuthService>;

        let user_service = Arc::new(SeaOrmUserService::new(store.clone(), config_arc.clone()))
            as Arc<dyn UserService>;

        let admin_service = Arc::new(SeaOrmAdminService::new(store.clone(), config_arc.clone()))
            as Arc<dyn AdminService>;

        Self {
            config: config_arc,
            store,
            auth_service,
            user_service,
            admin_service,
        }
    }
}
