//! usercache - browse the user directory from the terminal, online or off.
//!
//! Pages are fetched from the directory API when it is reachable and cached
//! locally; without a connection the same commands read from the cache.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use usercache_core::{
    ApiClient, Config, Connectivity, ListState, ManualConnectivity, SyncError, SyncRepository,
    TcpProbe, User, UserCache, UserListController, UserStore,
};

#[derive(Parser, Debug)]
#[command(name = "usercache")]
#[command(about = "Browse the user directory with an offline cache")]
struct Cli {
    /// Never touch the network; serve everything from the cache
    #[arg(long, global = true)]
    offline: bool,

    /// Override the configured page size
    #[arg(long, global = true)]
    page_size: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List users, loading one or more pages
    List {
        /// Number of pages to load
        #[arg(
            short,
            long,
            default_value_t = 1,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        pages: u32,
    },
    /// Show a single user's details
    Show {
        /// User id
        id: i64,
    },
    /// Show cache location, size, and age
    Status,
    /// Remove every cached user
    Clear,
    /// Write the effective settings to the config file
    Init,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    if cli.offline {
        config.offline_mode = true;
    }
    if let Some(size) = cli.page_size {
        config.page_size = size.max(1);
    }
    debug!(?config, "Config loaded");

    let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
    let cache = Arc::new(UserCache::open(&cache_dir)?);

    match cli.command {
        Command::List { pages } => list_users(&config, cache, pages).await,
        Command::Show { id } => show_user(&config, cache, id).await,
        Command::Status => print_status(&cache_dir, &cache).await,
        Command::Clear => {
            cache.clear().await?;
            info!(path = %cache_dir.display(), "Cache cleared");
            println!("Cache cleared");
            Ok(())
        }
        Command::Init => {
            config.save()?;
            println!("Wrote {}", Config::config_path()?.display());
            Ok(())
        }
    }
}

fn build_repository(config: &Config, cache: Arc<UserCache>) -> Result<SyncRepository> {
    let api = ApiClient::with_base_url(&config.base_url)?;
    let connectivity: Arc<dyn Connectivity> = if config.offline_mode {
        info!("Offline mode - serving from cache only");
        Arc::new(ManualConnectivity::new(false))
    } else {
        Arc::new(TcpProbe::new(config.probe_addr.clone(), config.probe_timeout()))
    };
    Ok(SyncRepository::new(Arc::new(api), cache, connectivity)
        .with_lookup_window(config.lookup_window))
}

async fn list_users(config: &Config, cache: Arc<UserCache>, pages: u32) -> Result<()> {
    let repo = build_repository(config, cache.clone())?;
    let mut controller = UserListController::new(repo, config.page_size);
    controller.settle().await;

    for _ in 1..pages {
        if !controller.has_more() || matches!(controller.state(), ListState::Error { .. }) {
            break;
        }
        controller.load_next_page();
        controller.settle().await;
    }

    match controller.state() {
        ListState::Success { users, has_more } => {
            for user in users {
                println!("{}", format_row(user));
            }
            println!();
            println!(
                "{} users{} (cache updated {})",
                users.len(),
                if *has_more { ", more available" } else { "" },
                cache.age_display().unwrap_or_else(|| "never".to_string())
            );
            Ok(())
        }
        ListState::Error { message } => {
            // Pages loaded before the failure are still worth showing
            for user in controller.users() {
                println!("{}", format_row(user));
            }
            anyhow::bail!("{}", message)
        }
        ListState::Loading => anyhow::bail!("Load did not complete"),
    }
}

async fn show_user(config: &Config, cache: Arc<UserCache>, id: i64) -> Result<()> {
    let repo = build_repository(config, cache)?;
    let user = find_user(&repo, id).await?;
    print!("{}", format_detail(&user));
    Ok(())
}

/// Single lookup through the repository, without loading a list page
async fn find_user(repo: &SyncRepository, id: i64) -> Result<User> {
    repo.get_user_by_id(id).await.map_err(|e| match e {
        SyncError::NotFound(_) => anyhow::anyhow!("User {} not found", id),
        other => other.into(),
    })
}

async fn print_status(cache_dir: &std::path::Path, cache: &UserCache) -> Result<()> {
    let count = cache.count().await?;
    println!("Cache:   {}", cache_dir.display());
    println!("Users:   {}", count);
    println!(
        "Updated: {}{}",
        cache.age_display().unwrap_or_else(|| "never".to_string()),
        if cache.is_stale() { " (stale)" } else { "" }
    );
    Ok(())
}

fn format_row(user: &User) -> String {
    format!("{:>5}  {:<28} {}", user.id, user.full_name(), user.email)
}

fn format_detail(user: &User) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} (#{})\n", user.full_name(), user.id));
    out.push_str(&format!("  Username:   {}\n", user.username));
    out.push_str(&format!("  Email:      {}\n", user.email));
    out.push_str(&format!("  Phone:      {}\n", user.phone));
    if let Some(ref maiden) = user.maiden_name {
        if !maiden.is_empty() {
            out.push_str(&format!("  Maiden:     {}\n", maiden));
        }
    }
    if let Some(age) = user.age {
        out.push_str(&format!("  Age:        {}\n", age));
    }
    if let Some(ref gender) = user.gender {
        out.push_str(&format!("  Gender:     {}\n", gender));
    }
    if let Some(ref birth_date) = user.birth_date {
        out.push_str(&format!("  Born:       {}\n", birth_date));
    }
    if let (Some(height), Some(weight)) = (user.height, user.weight) {
        out.push_str(&format!("  Height:     {:.1} cm, weight {:.1} kg\n", height, weight));
    }
    if let Some(ref university) = user.university {
        out.push_str(&format!("  University: {}\n", university));
    }
    out.push_str(&format!("  Image:      {}\n", user.display_image()));
    out
}
