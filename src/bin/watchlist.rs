use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;

use raydium_pool_watcher::config;
use raydium_pool_watcher::db::{Database, WatchlistQuery, WatchlistStore};
use raydium_pool_watcher::utils::raw_to_ui;

/// Inspect or clear the pool watchlist
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Watchlist database (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the first record matching one key
    Show {
        #[arg(long)]
        signature: Option<String>,
        #[arg(long)]
        pool: Option<String>,
        #[arg(long)]
        creator: Option<String>,
    },
    /// Delete every record
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().filter_or("RUST_LOG", "warn"));

    let cli = Cli::parse();
    let config = config::load_config()?;
    let database_url = cli.database_url.unwrap_or(config.database_url);
    let db = Database::new(&database_url).await?;

    match cli.command {
        Commands::Show { signature, pool, creator } => {
            let query = match (signature, pool, creator) {
                (Some(s), None, None) => WatchlistQuery::Signature(s),
                (None, Some(p), None) => WatchlistQuery::PoolAddress(p),
                (None, None, Some(c)) => WatchlistQuery::Creator(c),
                _ => bail!("Pass exactly one of --signature, --pool or --creator"),
            };

            match db.find_one(&query).await? {
                Some(record) => {
                    println!("Signature: {}", record.signature);
                    println!("Discovered: {}", record.discovered_at);
                    println!("Creator: {}", record.creator.as_deref().unwrap_or("-"));
                    println!("Pool: {}", record.pool_address.as_deref().unwrap_or("-"));
                    println!("Market: {}", record.market.as_deref().unwrap_or("-"));
                    if let Some(open_time) = record.open_time {
                        println!("Opens at: {}", open_time);
                    }
                    println!(
                        "Base: {} ({}) {} amount {}",
                        record.base_token.name,
                        record.base_token.symbol,
                        record.base_token.address.as_deref().unwrap_or("-"),
                        raw_to_ui(record.base_token.lp_amount, record.base_token.decimals)
                    );
                    println!(
                        "Quote: {} amount {}",
                        record.quote_token.address.as_deref().unwrap_or("-"),
                        raw_to_ui(record.quote_token.lp_amount, record.quote_token.decimals)
                    );
                    println!(
                        "Reserves: {} / {}",
                        raw_to_ui(record.reserves.base_reserve_raw, record.base_token.decimals),
                        raw_to_ui(record.reserves.quote_reserve_raw, record.quote_token.decimals)
                    );
                }
                None => println!("No matching record"),
            }
        }
        Commands::Purge => {
            let deleted = db.delete_all().await?;
            println!("Deleted {} records", deleted);
        }
    }

    Ok(())
}
