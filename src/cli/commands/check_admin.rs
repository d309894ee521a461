//! Check admin command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_check_admin(config: &Config) -> anyhow::Result<()> {
    let Some(admin_id) = config.telegram.admin_telegram_id.as_deref() else {
        println!("No admin configured.");
        println!("Set ADMIN_TELEGRAM_ID or telegram.admin_telegram_id in config.toml");
        return Ok(());
    };

    let store = Store::new(&config.general.database_path).await?;

    let Some(user) = store.get_user_by_telegram_id(admin_id).await? else {
        println!("Admin {admin_id} has not logged in yet.");
        return Ok(());
    };

    println!("Configured admin");
    println!("{:-<60}", "");
    super::print_user(&user);

    if !user.is_admin {
        println!();
        println!("⚠ Not flagged as admin yet; the flag is set on the next login.");
    }

    Ok(())
}
