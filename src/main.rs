//! osint-store - operator CLI for the lookup bot database
//!
//! Opens the configured database and runs one store operation per call.

use clap::Parser;
use osint_store::{config::AppConfig, db::Database, logging};
use std::path::PathBuf;

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Create the database and its tables
    Init,
    /// Overall totals
    Stats,
    /// Show one user
    User {
        user_id: i64,
    },
    /// List users, most recently seen first
    Users {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Users seen in the last N days
    Recent {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Users not seen for N days
    Inactive {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Recent lookups of a user
    Lookups {
        user_id: i64,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Top users by lookup count
    Leaderboard {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Per-day, per-command counters
    Daily {
        #[arg(long)]
        days: Option<u32>,
    },
    /// Lookup totals per command
    Commands {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Admin management
    Admin {
        #[command(subcommand)]
        cmd: AdminCmd,
    },
    /// Ban a user
    Ban {
        user_id: i64,
        /// Admin issuing the ban
        #[arg(long)]
        by: i64,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Lift a ban
    Unban {
        user_id: i64,
    },
    /// List bans, newest first
    Bans,
}

#[derive(clap::Subcommand, Debug)]
enum AdminCmd {
    /// Grant admin
    Add {
        user_id: i64,
        /// Admin granting the role
        #[arg(long)]
        by: i64,
    },
    /// Revoke admin
    Remove { user_id: i64 },
    /// List admin ids
    List,
}

#[derive(Parser, Debug)]
#[command(name = "osint-store")]
#[command(version)]
#[command(about = "Inspect and moderate the lookup bot database", long_about = None)]
struct Args {
    /// Configuration file path (overrides defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database path (overrides config)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    logging::init_logging(args.verbose || config.debug);

    if let Some(path) = args.db_path {
        config.database.path = path;
    }
    config.validate()?;

    tracing::debug!("Using database at {:?}", config.database.path);
    let db = Database::new(&config.database).await?;

    let result = run(&db, &config, args.command).await;
    db.close().await;
    result
}

async fn run(db: &Database, config: &AppConfig, command: Command) -> anyhow::Result<()> {
    let defaults = config.defaults;

    match command {
        Command::Init => {
            println!("Database ready at {}", config.database.path.display());
        }
        Command::Stats => {
            let stats = db.get_stats().await?;
            println!("users:   {}", stats.total_users);
            println!("lookups: {}", stats.total_lookups);
            println!("admins:  {}", stats.total_admins);
            println!("banned:  {}", stats.total_banned);
        }
        Command::User { user_id } => match db.get_user(user_id).await? {
            Some(user) => {
                println!("{} ({})", user.display_name(), user.user_id);
                println!("  first seen: {}", user.first_seen);
                println!("  last seen:  {}", user.last_seen);
                println!("  lookups:    {}", user.total_lookups);
                println!("  admin:      {}", db.is_admin(user_id).await?);
                if let Some(ban) = db.get_ban(user_id).await? {
                    println!(
                        "  banned:     {} by {} ({})",
                        ban.banned_on,
                        or_dash(ban.banned_by),
                        ban.reason.as_deref().unwrap_or("no reason")
                    );
                }
            }
            None => println!("User {} not found", user_id),
        },
        Command::Users { limit, offset } => {
            let limit = limit.unwrap_or(defaults.users_page_size);
            for user in db.list_users(limit, offset).await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    user.user_id,
                    user.username.as_deref().unwrap_or("-"),
                    user.first_name.as_deref().unwrap_or("-"),
                    user.total_lookups,
                    user.last_seen
                );
            }
        }
        Command::Recent { days } => {
            let days = days.unwrap_or(defaults.recent_days);
            for user in db.get_recent_users(days).await? {
                print_activity(&user);
            }
        }
        Command::Inactive { days } => {
            let days = days.unwrap_or(defaults.inactive_days);
            for user in db.get_inactive_users(days).await? {
                print_activity(&user);
            }
        }
        Command::Lookups { user_id, limit } => {
            let limit = limit.unwrap_or(defaults.lookups_limit);
            for lookup in db.get_user_lookups(user_id, limit).await? {
                println!("{}\t{}\t{}", lookup.timestamp, lookup.command, lookup.query);
            }
        }
        Command::Leaderboard { limit } => {
            let limit = limit.unwrap_or(defaults.leaderboard_limit);
            for (rank, entry) in db.get_leaderboard(limit).await?.iter().enumerate() {
                println!("{:>3}. {}\t{}", rank + 1, entry.user_id, entry.total_lookups);
            }
        }
        Command::Daily { days } => {
            let days = days.unwrap_or(defaults.daily_stats_days);
            for stat in db.get_daily_stats(days).await? {
                println!("{}\t{}\t{}", stat.date, stat.command, stat.count);
            }
        }
        Command::Commands { limit } => {
            let limit = limit.unwrap_or(defaults.lookup_stats_limit);
            for stat in db.get_lookup_stats(limit).await? {
                println!("{}\t{}", stat.command, stat.count);
            }
        }
        Command::Admin { cmd } => match cmd {
            AdminCmd::Add { user_id, by } => {
                db.add_admin(user_id, by).await?;
                println!("User {} is admin", user_id);
            }
            AdminCmd::Remove { user_id } => {
                db.remove_admin(user_id).await?;
                println!("User {} is not admin", user_id);
            }
            AdminCmd::List => {
                for user_id in db.list_admins().await? {
                    println!("{}", user_id);
                }
            }
        },
        Command::Ban {
            user_id,
            by,
            reason,
        } => match db.ban_user(user_id, reason.as_deref(), by).await {
            Ok(()) => println!("User {} banned", user_id),
            Err(e) if e.is_unique_violation() => {
                anyhow::bail!("User {} is already banned", user_id)
            }
            Err(e) => return Err(e.into()),
        },
        Command::Unban { user_id } => {
            db.unban_user(user_id).await?;
            println!("User {} unbanned", user_id);
        }
        Command::Bans => {
            for ban in db.list_banned().await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    ban.user_id,
                    or_dash(ban.banned_by),
                    ban.banned_on,
                    ban.reason.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

fn print_activity(user: &osint_store::db::UserActivity) {
    println!(
        "{}\t{}\t{}",
        user.user_id,
        user.username.as_deref().unwrap_or("-"),
        user.last_seen
    );
}

fn or_dash(user_id: Option<i64>) -> String {
    user_id.map_or_else(|| "-".to_string(), |id| id.to_string())
}
