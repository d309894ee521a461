//! Issue token command handler

use crate::config::Config;
use crate::db::Store;
use crate::state::SharedState;

pub async fn cmd_issue_token(config: &Config, telegram_id: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(user) = store.get_user_by_telegram_id(telegram_id).await? else {
        println!("User with Telegram id {telegram_id} not found.");
        return Ok(());
    };

    let state = SharedState::with_store(config.clone(), store);
    let token = state.auth_service.issue_token(&user.id)?;

    println!("Token for {} ({}):", user.first_name, user.id);
    println!("{token}");

    Ok(())
}
