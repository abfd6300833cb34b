use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rust_screener::{
    favorites::{FavoritesStore, InMemoryFavorites},
    models::{Config, UserId},
    news::{HeadlineSource, NewsClient},
    notify::{send_favorite_news, send_weekly_digest, LogNotifier},
    universe::{load_universe_csv, parse_ticker_list},
    ValuationScreener, YahooClient,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Graham-style undervalued stock screener", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Screen tickers for undervalued stocks
    Screen {
        /// Tickers to screen (defaults to SCREEN_TICKERS or the built-in list)
        tickers: Vec<String>,

        /// CSV file with a Symbol column to screen instead
        #[arg(short, long)]
        universe: Option<PathBuf>,

        /// Print the full run as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the latest headlines for a ticker or query, or send each
    /// subscribed user the news for their favorites
    News {
        #[arg(required_unless_present = "users")]
        query: Option<String>,

        /// Subscription as USER_ID:TICKER[,TICKER...]; repeatable
        #[arg(long = "user", value_parser = parse_subscription, conflicts_with = "query")]
        users: Vec<Subscription>,
    },
    /// Run a screen and send the weekly digest to subscribed users
    Digest {
        tickers: Vec<String>,

        #[arg(short, long)]
        universe: Option<PathBuf>,

        /// Subscription as USER_ID:TICKER[,TICKER...]; repeatable
        #[arg(long = "user", value_parser = parse_subscription, required = true)]
        users: Vec<Subscription>,
    },
}

#[derive(Debug, Clone)]
struct Subscription {
    user: UserId,
    tickers: Vec<String>,
}

fn parse_subscription(value: &str) -> Result<Subscription, String> {
    let (user, tickers) = value
        .split_once(':')
        .ok_or_else(|| format!("expected USER_ID:TICKERS, got '{}'", value))?;
    let user = user
        .trim()
        .parse()
        .map_err(|e| format!("invalid user id '{}': {}", user, e))?;
    let tickers = parse_ticker_list(tickers);
    if tickers.is_empty() {
        return Err(format!("no tickers given for user {}", user));
    }
    Ok(Subscription { user, tickers })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rust_screener=info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("❌ Configuration Error: {}", e);
            std::process::exit(1);
        }
    };

    match args.command {
        Command::Screen { tickers, universe, json } => {
            let tickers = resolve_tickers(&config, &tickers, universe)?;
            run_screen(&config, &tickers, json).await
        }
        Command::News { query: Some(query), .. } => run_news(&config, &query).await,
        Command::News { query: None, users } => run_favorite_news(&config, &users).await,
        Command::Digest { tickers, universe, users } => {
            let tickers = resolve_tickers(&config, &tickers, universe)?;
            run_digest(&config, &tickers, &users).await
        }
    }
}

fn resolve_tickers(config: &Config, tickers: &[String], universe: Option<PathBuf>) -> Result<Vec<String>> {
    if !tickers.is_empty() {
        return Ok(parse_ticker_list(&tickers.join(",")));
    }
    if let Some(path) = universe {
        let tickers = load_universe_csv(&path)?;
        if tickers.is_empty() {
            return Err(anyhow!("No tickers found in {}", path.display()));
        }
        return Ok(tickers);
    }
    Ok(config.screen_tickers.clone())
}

fn build_screener(config: &Config) -> Result<ValuationScreener<YahooClient>> {
    let client = YahooClient::new(config)?;
    Ok(ValuationScreener::new(client).with_timeout(Duration::from_secs(config.fetch_timeout_secs.max(1))))
}

async fn run_screen(config: &Config, tickers: &[String], json: bool) -> Result<()> {
    let screener = build_screener(config)?;
    let run = screener.screen_run(tickers).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    if run.is_outage() {
        warn!("No fundamentals could be fetched; results say nothing about valuations");
        println!("⚠️  Could not fetch data for any of {} tickers", tickers.len());
        for failure in &run.failed {
            println!("   - {}: {}", failure.ticker, failure.error);
        }
        return Ok(());
    }

    if run.results.is_empty() {
        println!("No undervalued stocks found among {} tickers.", tickers.len());
    } else {
        println!("📉 Undervalued stocks:");
        for result in &run.results {
            println!("{}", result);
        }
    }

    if !run.failed.is_empty() {
        println!("⚠️  Skipped {} tickers: {}", run.failed.len(),
                 run.failed.iter().map(|f| f.ticker.as_str()).collect::<Vec<_>>().join(", "));
    }

    Ok(())
}

async fn run_news(config: &Config, query: &str) -> Result<()> {
    let client = NewsClient::new(config)?;
    let headlines = client.latest_headlines(query).await?;

    if headlines.is_empty() {
        println!("No news for {}", query);
    }
    for headline in headlines {
        println!("📰 {}", headline);
    }
    Ok(())
}

fn favorites_from(users: &[Subscription]) -> InMemoryFavorites {
    let store = InMemoryFavorites::new();
    for subscription in users {
        for ticker in &subscription.tickers {
            store.add(subscription.user, ticker);
        }
    }
    store
}

async fn run_favorite_news(config: &Config, users: &[Subscription]) -> Result<()> {
    let client = NewsClient::new(config)?;
    let store = favorites_from(users);

    let served = send_favorite_news(&store, &client, &LogNotifier).await;
    info!("✅ News delivered to {} users", served);
    Ok(())
}

async fn run_digest(config: &Config, tickers: &[String], users: &[Subscription]) -> Result<()> {
    let store = favorites_from(users);

    let screener = build_screener(config)?;
    let results = screener.screen(tickers).await;

    let notified = send_weekly_digest(&store, &LogNotifier, &results).await;
    info!("✅ Digest delivered to {} users", notified);
    Ok(())
}
