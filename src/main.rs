mod amount;
mod config;
mod dispatch;
mod error;
mod ledger;
mod recipients;
mod report;
mod signer;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::amount::TokenAmount;
use crate::config::Config;
use crate::dispatch::{DispatchConfig, Dispatcher};
use crate::error::{AppError, AppResult};
use crate::ledger::{JsonRpcLedger, LedgerClient, LedgerConfig};
use crate::recipients::RecipientMode;
use crate::signer::SignerPool;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Distributes a fixed token amount from a rotating wallet pool")]
struct Args {
    /// Token amount to transfer to each recipient (e.g. 100 or 0.5)
    #[clap(long)]
    amount: String,

    /// Number of recipient wallets to process
    #[clap(long)]
    count: usize,

    /// Where recipient addresses come from
    #[clap(long, value_enum, default_value = "file")]
    mode: RecipientMode,

    /// Sender signing keys, one hex-encoded key per line
    #[clap(long, default_value = "private_keys.txt")]
    keys_file: PathBuf,

    /// Candidate recipient addresses, one per line (file mode only)
    #[clap(long, default_value = "addresses.txt")]
    recipients_file: PathBuf,

    /// Skip the confirmation prompt
    #[clap(short, long)]
    yes: bool,
}

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    dotenv::dotenv().ok();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> AppResult<()> {
    let config = Config::from_env()?;

    if args.count == 0 {
        return Err(AppError::Config(
            "--count must be a positive integer".to_string(),
        ));
    }
    let amount = TokenAmount::parse(&args.amount)?;

    let signers = SignerPool::from_file(&args.keys_file)?;

    let ledger_config = LedgerConfig::new(config.rpc_url.clone(), config.token_address.clone());
    let client: Arc<dyn LedgerClient> = Arc::new(JsonRpcLedger::new(ledger_config));

    let recipients = match args.mode {
        RecipientMode::File => {
            recipients::from_file(&args.recipients_file, args.count, client.as_ref())?
        }
        RecipientMode::Random => recipients::generated(args.count, client.as_ref()),
    };

    info!("Ledger endpoint: {}", config.rpc_url);
    info!("Token contract: {}", config.token_address);
    info!("Gas paid in {}", config.gas_token);

    print_transfer_details(&amount, &recipients, args.mode);

    if !args.yes && !confirm()? {
        println!("Transfer cancelled.");
        return Ok(());
    }

    let dispatcher = Dispatcher::new(client, signers, DispatchConfig::default());
    let result = dispatcher.run(&recipients, &amount).await;

    report::print_summary(&result);
    Ok(())
}

fn print_transfer_details(amount: &TokenAmount, recipients: &[String], mode: RecipientMode) {
    println!();
    println!("=== Transfer Details ===");
    println!("Amount per recipient: {} tokens", amount);
    println!("Recipient wallets: {}", recipients.len());
    println!(
        "Recipient mode: {}",
        match mode {
            RecipientMode::File => "file (random subset of the address file)",
            RecipientMode::Random => "random (freshly generated addresses)",
        }
    );
    println!("Recipients:");
    for (i, address) in recipients.iter().enumerate() {
        println!("  {}. {}", i + 1, address);
    }
    println!("========================");
    println!();
}

fn confirm() -> AppResult<bool> {
    print!("Proceed with the transfers? (y/n): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}
