//! Command-line interface for frogmates.

mod commands;

use clap::{Parser, Subcommand};

/// Frogmates - Telegram Mini App referral portal
#[derive(Parser)]
#[command(name = "frogmates")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Show the account of the configured admin
    CheckAdmin,

    /// Show a user with referrals and the accounts they referred
    CheckReferrals,

    /// Mint a session token for an existing user
    IssueToken {
        /// Telegram id of the user
        telegram_id: String,
    },
}

pub use commands::*;
