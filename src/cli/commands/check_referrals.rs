//! Check referrals command handler

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_check_referrals(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(user) = store.first_user_with_referrals().await? else {
        println!("No user has referrals yet.");
        return Ok(());
    };

    super::print_user(&user);
    println!("  Link: {}", config.referral_link(&user.special_id));
    println!();

    let referred = store.get_referred_users(&user.id).await?;
    println!("Referred users ({} total)", referred.len());
    println!("{:-<60}", "");

    for referred_user in referred {
        println!(
            "• {} [{}] joined {}",
            referred_user.first_name, referred_user.special_id, referred_user.created_at
        );
    }

    Ok(())
}
