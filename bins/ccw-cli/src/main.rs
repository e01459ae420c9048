//! ccw-cli: drive per-user wallets from the command line.
//!
//! Exercises the same wallet service a chat bot would hold: one wallet per
//! (user, network), keys derived from `CCW_ROOT_SECRET`, balances and
//! broadcasts through Insight explorers.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ccw_core::currency::{Bitcoin, Currency, Litecoin, Monacoin};
use ccw_core::locale::Locale;
use ccw_core::money::DecimalAmount;
use ccw_core::network::NetworkParams;
use ccw_insight::InsightClient;
use ccw_wallet::{BroadcastOutcome, NetworkContext, SeedKeyStore, UserId, Wallet, WalletService};

mod config;

use config::Config;

/// Per-user HD wallet command-line interface.
#[derive(Parser)]
#[command(name = "ccw-cli")]
#[command(version, about = "Per-user HD wallets for chat bots.")]
struct Cli {
    /// Tracing filter, e.g. `debug` or `ccw_wallet=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Locale for amounts (en-US, ja-JP, de-DE, fr-FR). Overrides CCW_LOCALE.
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported networks.
    Networks,
    /// Show a user's receiving address.
    Address(WalletArgs),
    /// Query a user's balance from the explorer.
    Balance(WalletArgs),
    /// Send coins from a user's wallet.
    Send(SendArgs),
}

#[derive(Args)]
struct WalletArgs {
    /// Chat-platform user id.
    #[arg(short, long)]
    user: u64,

    /// Network name, e.g. `monacoin-main`.
    #[arg(short, long, default_value = "bitcoin-test")]
    network: String,
}

#[derive(Args)]
struct SendArgs {
    #[command(flatten)]
    wallet: WalletArgs,

    /// Destination address.
    #[arg(short, long)]
    to: String,

    /// Amount in whole coins, e.g. `0.5`.
    #[arg(short, long)]
    amount: DecimalAmount,

    /// Build and print the transaction without broadcasting it.
    #[arg(long)]
    dry_run: bool,
}

fn currency_for(network: &NetworkParams) -> Result<Arc<dyn Currency>> {
    let family = network.name.split('-').next().unwrap_or_default();
    let currency: Arc<dyn Currency> = match family {
        "bitcoin" => Arc::new(Bitcoin),
        "litecoin" => Arc::new(Litecoin),
        "monacoin" => Arc::new(Monacoin),
        _ => bail!("no currency for network {network}"),
    };
    Ok(currency)
}

fn build_service(config: &Config) -> Result<WalletService> {
    let root = config
        .root_secret
        .as_ref()
        .context("CCW_ROOT_SECRET is required")?;
    let mut service = WalletService::new(Arc::new(SeedKeyStore::new(root.to_vec())));

    for params in NetworkParams::known() {
        let url = config
            .insight_urls
            .get(params.name)
            .with_context(|| format!("no explorer configured for {params}"))?;
        let client = InsightClient::new(url, config.http_timeout)
            .with_context(|| format!("Failed to create explorer client for {url}"))?;
        service.register(NetworkContext {
            params,
            currency: currency_for(&params)?,
            client: Arc::new(client),
        });
    }
    Ok(service)
}

fn open_wallet(service: &WalletService, args: &WalletArgs, locale: Locale) -> Result<Arc<Wallet>> {
    let wallet = service
        .wallet(UserId(args.user), &args.network)
        .with_context(|| format!("Failed to open wallet for user {}", args.user))?;
    wallet.set_locale(locale);
    Ok(wallet)
}

async fn cmd_balance(wallet: &Wallet) -> Result<()> {
    wallet
        .refresh_balance()
        .await
        .context("Failed to query balance")?;
    println!("Address:     {}", wallet.address());
    println!("Total:       {}", wallet.total_balance());
    println!("Confirmed:   {}", wallet.confirmed_balance());
    println!("Pending:     {}", wallet.pending_balance());
    println!("Unconfirmed: {}", wallet.unconfirmed_balance());
    Ok(())
}

async fn cmd_send(wallet: &Wallet, args: &SendArgs) -> Result<()> {
    let destination = wallet
        .parse_address(&args.to)
        .context("Invalid destination address")?;
    wallet
        .refresh_balance()
        .await
        .context("Failed to query balance")?;

    if args.dry_run {
        let built = wallet
            .build_transaction(&destination, args.amount)
            .context("Failed to build transaction")?;
        println!("Txid:    {}", built.txid());
        println!("Payment: {}", wallet.format_amount(built.payment));
        println!("Change:  {}", wallet.format_amount(built.change));
        println!("Fee:     {}", wallet.format_amount(built.fee));
        println!("Raw:     {}", bitcoin::consensus::encode::serialize_hex(&built.tx));
        return Ok(());
    }

    let outcome = wallet
        .send(&destination, args.amount)
        .await
        .context("Failed to send")?;
    match outcome.broadcast {
        BroadcastOutcome::Accepted { txid } => {
            println!("Sent {} to {destination}", wallet.format_decimal(args.amount)?);
            println!("Txid: {txid}");
            if let Some(e) = outcome.refresh_error {
                eprintln!("Warning: balance not refreshed: {e}");
            }
            Ok(())
        }
        BroadcastOutcome::Rejected { message } => bail!("Transaction rejected: {message}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level).context("Invalid --log-level")?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let locale = match &cli.locale {
        Some(tag) => Locale::from_tag(tag).with_context(|| format!("Unsupported locale {tag}"))?,
        None => config.locale,
    };

    match cli.command {
        Commands::Networks => {
            for params in NetworkParams::known() {
                let currency = currency_for(&params)?;
                println!(
                    "{:<14} {:<9} {:<5} confirms={}",
                    params.name,
                    currency.name(),
                    currency.symbol(),
                    currency.transaction_confirms()
                );
            }
        }
        Commands::Address(args) => {
            let service = build_service(&config)?;
            let wallet = open_wallet(&service, &args, locale)?;
            println!("{}", wallet.address());
        }
        Commands::Balance(args) => {
            let service = build_service(&config)?;
            let wallet = open_wallet(&service, &args, locale)?;
            cmd_balance(&wallet).await?;
        }
        Commands::Send(args) => {
            let service = build_service(&config)?;
            let wallet = open_wallet(&service, &args.wallet, locale)?;
            info!(user = args.wallet.user, network = %args.wallet.network, "sending");
            cmd_send(&wallet, &args).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_network_has_a_currency() {
        for params in NetworkParams::known() {
            let currency = currency_for(&params).unwrap();
            assert!(params.name.starts_with(&currency.name().to_ascii_lowercase()));
        }
    }

    #[test]
    fn cli_parses_send() {
        let cli = Cli::try_parse_from([
            "ccw-cli", "send", "--user", "7", "--network", "monacoin-main", "--to", "MAddr",
            "--amount", "1.5", "--dry-run",
        ])
        .unwrap();
        let Commands::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.wallet.user, 7);
        assert_eq!(args.amount, "1.5".parse::<DecimalAmount>().unwrap());
        assert!(args.dry_run);
    }

    #[test]
    fn cli_rejects_malformed_amount() {
        assert!(
            Cli::try_parse_from(["ccw-cli", "send", "-u", "1", "-t", "x", "-a", "1.2.3"]).is_err()
        );
    }

    #[test]
    fn service_needs_root_secret() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert!(build_service(&config).is_err());
    }
}
