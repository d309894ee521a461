//! Referral codes and the shared-IP cheater heuristic.

use anyhow::Result;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::db::Store;
use crate::models::user::{NewUser, User};

const SPECIAL_ID_MIN: u32 = 100_000;
const SPECIAL_ID_MAX: u32 = 999_999;
const MAX_SPECIAL_ID_ATTEMPTS: usize = 16;

/// Random six-digit code without a leading zero.
#[must_use]
pub fn generate_special_id() -> String {
    rand::rng()
        .random_range(SPECIAL_ID_MIN..=SPECIAL_ID_MAX)
        .to_string()
}

#[must_use]
pub fn is_valid_special_id(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit()) && !code.starts_with('0')
}

/// Inserts `new_user` under a fresh special ID drawn from `next_code`.
///
/// A unique violation on `special_id` (two registrations racing for the same
/// code) retries with another code. Any other failure, including a duplicate
/// Telegram id, is returned to the caller. `new_user.special_id` is overwritten.
pub async fn insert_with_special_id(
    store: &Store,
    mut new_user: NewUser,
    referrer: Option<(&str, i32)>,
    mut next_code: impl FnMut() -> String,
) -> Result<User> {
    for attempt in 1..=MAX_SPECIAL_ID_ATTEMPTS {
        let candidate = next_code();
        new_user.special_id.clone_from(&candidate);

        match store.create_user(new_user.clone(), referrer).await {
            Ok(user) => return Ok(user),
            Err(e) if store.special_id_exists(&candidate).await? => {
                debug!(attempt, special_id = %candidate, "Special ID taken, retrying: {e}");
            }
            Err(e) => return Err(e),
        }
    }

    anyhow::bail!("Could not allocate a free special ID after {MAX_SPECIAL_ID_ATTEMPTS} attempts")
}

/// Flags every account on `ip_address` once at least `threshold` accounts share it.
/// Returns whether the IP was flagged.
pub async fn flag_shared_ip(store: &Store, ip_address: &str, threshold: u64) -> Result<bool> {
    if ip_address.trim().is_empty() {
        return Ok(false);
    }

    let accounts = store.count_users_by_ip(ip_address).await?;
    if accounts < threshold {
        return Ok(false);
    }

    let flagged = store.flag_ip_as_cheaters(ip_address).await?;
    warn!(
        ip_address = %ip_address,
        accounts = accounts,
        "Flagged {} accounts sharing one IP as cheaters",
        flagged
    );
    metrics::counter!("cheater_flags_total").increment(flagged);

    Ok(true)
}

/// Flags every IP group at or above `threshold`. Returns the number of groups.
pub async fn flag_all_shared_ips(store: &Store, threshold: u64) -> Result<u64> {
    let ips = store.shared_ips(threshold).await?;

    for ip in &ips {
        let flagged = store.flag_ip_as_cheaters(ip).await?;
        metrics::counter!("cheater_flags_total").increment(flagged);
    }

    info!("Flagged {} shared IP groups", ips.len());
    Ok(ips.len() as u64)
}
