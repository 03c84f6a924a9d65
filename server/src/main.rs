//! Plasma License Server
//!
//! Serves the admin HTTP API over the encrypted license store, and offers
//! operator subcommands that act on the same store directly.
//!
//! Usage:
//!   plasma-license-server --port 5000 --data-dir /var/lib/plasma
//!   plasma-license-server generate 7d --count 3
//!   plasma-license-server code create WELCOME 30d --days 14
//!   plasma-license-server ban 123456789 violation of terms

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use plasma_license::{BanList, CodeBook, LicenseStore};
use plasma_license_server::{
    AppState, admin, build_router, credentials::load_or_generate_api_token,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "plasma-license-server")]
#[command(about = "Plasma license admin API server")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "5000", env = "PLASMA_PORT")]
    port: u16,

    /// Directory holding the licenses/ and users/ store files
    #[arg(short, long, default_value = ".", env = "PLASMA_DATA_DIR")]
    data_dir: PathBuf,

    /// Path to the API token file
    #[arg(long, default_value = "api_token.txt", env = "PLASMA_API_TOKEN_FILE")]
    api_token_file: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long, env = "PLASMA_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (the default)
    Serve,
    /// Mint license keys
    Generate {
        /// Duration such as 30mins, 2h, 7d, 1w, 3mo, 1y or permanent
        duration: String,
        #[arg(short, long, default_value = "1")]
        count: u32,
    },
    /// List issued keys
    List,
    /// Delete a key
    Revoke { key: String },
    /// Manage custom codes
    #[command(subcommand)]
    Code(CodeCommand),
    /// Refuse onboarding to a chat user
    Ban {
        user: u64,
        /// Free-text reason
        #[arg(trailing_var_arg = true)]
        reason: Vec<String>,
    },
    /// Lift a ban
    Unban { user: u64 },
    /// List banned users
    Bans,
}

#[derive(Subcommand, Debug)]
enum CodeCommand {
    /// Create a code backed by a freshly minted key
    Create {
        name: String,
        duration: String,
        /// Days the code itself stays redeemable
        #[arg(long)]
        days: Option<u32>,
    },
    List,
    Info { name: String },
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let mut store = LicenseStore::open_dir(&args.data_dir)
        .with_context(|| format!("Failed to open license store in {:?}", args.data_dir))?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(store, args.port, &args.api_token_file).await,
        Command::Generate { duration, count } => {
            let keys = admin::generate_keys(&mut store, &duration, count)
                .context("Failed to generate keys")?;
            println!("{} {} key(s) generated:", keys.len(), duration);
            for (i, key) in keys.iter().enumerate() {
                println!("{:>3}. {}", i + 1, key);
            }
            Ok(())
        }
        Command::List => {
            print!("{}", admin::render_key_list(&store.list()?, Utc::now()));
            Ok(())
        }
        Command::Revoke { key } => {
            if store.revoke(&key)? {
                println!("Key revoked successfully");
            } else {
                println!("Key not found");
            }
            Ok(())
        }
        Command::Code(command) => run_code_command(&mut store, command),
        Command::Ban { user, reason } => {
            let mut bans = BanList::open(store.paths()).context("Failed to open ban list")?;
            let record = admin::ban_user(&mut bans, user, &reason)?;
            println!("User {} banned: {}", user, record.reason);
            Ok(())
        }
        Command::Unban { user } => {
            let mut bans = BanList::open(store.paths()).context("Failed to open ban list")?;
            if bans.unban(user)? {
                println!("User {} unbanned", user);
            } else {
                println!("User {} is not banned", user);
            }
            Ok(())
        }
        Command::Bans => {
            let bans = BanList::open(store.paths()).context("Failed to open ban list")?;
            print!("{}", admin::render_ban_list(&bans.list()?));
            Ok(())
        }
    }
}

fn run_code_command(store: &mut LicenseStore, command: CodeCommand) -> Result<()> {
    let mut codes = CodeBook::open(store.paths()).context("Failed to open custom codes")?;
    match command {
        CodeCommand::Create { name, duration, days } => {
            let code = codes
                .create_code(store, &name, &duration, days)
                .context("Failed to create code")?;
            print!("{}", admin::render_code_info(&name, &code));
        }
        CodeCommand::List => {
            print!("{}", admin::render_code_list(&codes.list_codes()?, Utc::now()));
        }
        CodeCommand::Info { name } => match codes.code_info(&name)? {
            Some(code) => print!("{}", admin::render_code_info(&name, &code)),
            None => println!("Code {} not found", CodeBook::normalize(&name)),
        },
        CodeCommand::Remove { name } => match codes.remove_code(&name)? {
            Some(code) => println!(
                "Removed {} ({}, key {})",
                CodeBook::normalize(&name),
                code.duration,
                code.license_key
            ),
            None => println!("Code {} not found", CodeBook::normalize(&name)),
        },
    }
    Ok(())
}

async fn serve(store: LicenseStore, port: u16, token_file: &Path) -> Result<()> {
    let (api_token, created) = load_or_generate_api_token(token_file)?;
    if created {
        println!("\n========================================");
        println!("  New API token generated");
        println!("========================================");
        println!("  Token file: {}", token_file.display());
        println!("  Configure remote validators with this token.");
        println!("========================================\n");
    }

    let app = build_router(AppState::new(store, api_token));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP port {port}"))?;
    info!("License API listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")
}
