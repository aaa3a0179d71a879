//! ledgerlink process entry point: a `clap` driver exposing crawl,
//! benchmark, resolve, balance, and block subcommands over the wire
//! protocol implemented in `ledgerlink-core`/`ledgerlink-protocol`/
//! `ledgerlink-registry`.
//!
//! This binary and `ledgerlink-config`'s settings file are the external
//! collaborators spec.md §1 calls out as out of scope for the core: the
//! core never reads a file or parses argv itself.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledgerlink_config::Settings;
use ledgerlink_core::WotsAddress;
use ledgerlink_protocol::{get_block_bytes, resolve_tag, Session};
use ledgerlink_registry::{benchmark, expand, query_balance, sample_peers};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledgerlink")]
#[command(about = "Client driver for the ledgerlink peer-to-peer network", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the settings TOML file.
    #[arg(long, default_value = "settings.toml", global = true)]
    settings: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expand the peer registry by crawling known peers for their peer lists.
    Crawl {
        /// Override the configured expansion depth.
        #[arg(long)]
        rounds: Option<usize>,
    },

    /// Measure handshake latency to every known peer and update the registry.
    Benchmark {
        /// Number of peers to probe concurrently per batch.
        #[arg(long, default_value_t = 10)]
        batch_size: usize,
    },

    /// Resolve a 12-byte hex tag to its address and amount.
    Resolve {
        /// Tag, as 24 hex characters (12 bytes).
        tag: String,
        /// Query this peer directly instead of sampling the registry.
        #[arg(long)]
        ip: Option<String>,
    },

    /// Query the majority-agreed balance of a WOTS address.
    Balance {
        /// Address, as 4416 hex characters (2208 bytes).
        address: String,
    },

    /// Download a block's raw bytes and write them to a file.
    Block {
        /// Block number to fetch.
        height: u64,
        /// Query this peer directly instead of sampling the registry.
        #[arg(long)]
        ip: Option<String>,
        /// Output file path.
        #[arg(long, default_value = "block.dat")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let mut settings = load_or_default(&cli.settings);

    match cli.command {
        Command::Crawl { rounds } => {
            let depth = rounds.unwrap_or(settings.ip_expand_depth);
            let mut registry = settings.to_registry();
            let rounds_completed = expand(&mut registry, &settings.seed_ips, depth).await;
            settings.update_from_registry(&registry);
            settings.save(&cli.settings).with_context(|| "saving settings after crawl")?;
            println!("crawl completed {rounds_completed} round(s); {} peers known", registry.len());
        }

        Command::Benchmark { batch_size } => {
            let mut registry = settings.to_registry();
            let ips: Vec<String> = registry.ips().map(str::to_string).collect();
            benchmark(&mut registry, &ips, batch_size).await;
            settings.update_from_registry(&registry);
            settings.save(&cli.settings).with_context(|| "saving settings after benchmark")?;
            println!("benchmarked {} peers", ips.len());
        }

        Command::Resolve { tag, ip } => {
            let tag_bytes = hex::decode(&tag).context("tag must be valid hex")?;
            let registry = settings.to_registry();
            let target_ip = resolve_target_ip(ip, &registry, &settings)?;

            let mut session = Session::open(&target_ip).await.with_context(|| format!("connecting to {target_ip}"))?;
            let (address, amount) = resolve_tag(&mut session, &tag_bytes).await?;
            println!("address: {}", hex::encode(address.bytes()));
            println!("amount:  {amount}");
        }

        Command::Balance { address } => {
            let address_bytes = hex::decode(&address).context("address must be valid hex")?;
            let wots = WotsAddress::from_bytes(&address_bytes);
            let registry = settings.to_registry();
            let amount = query_balance(
                &registry,
                &wots,
                settings.query_size,
                settings.force_query_start_ips,
                &settings.seed_ips,
            )
            .await?;
            println!("balance: {amount}");
        }

        Command::Block { height, ip, out } => {
            let registry = settings.to_registry();
            let target_ip = resolve_target_ip(ip, &registry, &settings)?;

            let mut session = Session::open(&target_ip).await.with_context(|| format!("connecting to {target_ip}"))?;
            let bytes = get_block_bytes(&mut session, height).await?;
            std::fs::write(&out, &bytes).with_context(|| format!("writing {}", out.display()))?;
            println!("wrote {} bytes to {}", bytes.len(), out.display());
        }
    }

    Ok(())
}

/// For commands that don't go through the quorum engine, resolve a single
/// target IP: an explicit `--ip` wins, otherwise sample one peer from the
/// registry under the configured force-seed policy.
fn resolve_target_ip(
    ip: Option<String>,
    registry: &ledgerlink_registry::PeerRegistry,
    settings: &Settings,
) -> Result<String> {
    if let Some(ip) = ip {
        return Ok(ip);
    }
    let sampled = sample_peers(registry, 1, settings.force_query_start_ips, &settings.seed_ips);
    sampled
        .into_iter()
        .next()
        .map(|peer| peer.ip)
        .context("no peers known; run `crawl` first or pass --ip")
}

fn load_or_default(path: &PathBuf) -> Settings {
    match Settings::load(path) {
        Ok(settings) => settings,
        Err(error) => {
            tracing::warn!(%error, "could not load settings, using defaults");
            Settings::default()
        }
    }
}
