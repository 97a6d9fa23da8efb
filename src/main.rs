use clap::{Parser, Subcommand};
use gigpay::application::engine::PaymentEngine;
use gigpay::application::reporting::{DEFAULT_BEST_CLIENTS_LIMIT, DateRange, Reporting};
use gigpay::config::ServiceConfig;
use gigpay::domain::money::Amount;
use gigpay::domain::ports::LedgerRef;
use gigpay::error::{MarketError, Result as MarketResult};
use gigpay::infrastructure::in_memory::InMemoryLedger;
use gigpay::interfaces::csv::balance_writer::BalanceWriter;
use gigpay::interfaces::csv::operation_reader::{Operation, OperationKind, OperationReader};
use gigpay::interfaces::seed::Dataset;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed dataset (JSON with profiles, contracts and jobs)
    #[arg(long, global = true)]
    seed: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a CSV of pay/deposit/transfer operations and print final balances
    Process {
        /// Input operations CSV file
        input: PathBuf,
    },
    /// Print the best-profession and best-clients reports for a date range
    Report {
        /// Range start, YYYY-MM-DD (inclusive)
        #[arg(long)]
        start: String,
        /// Range end, YYYY-MM-DD (inclusive)
        #[arg(long)]
        end: String,
        /// How many top clients to include
        #[arg(long, default_value_t = DEFAULT_BEST_CLIENTS_LIMIT)]
        limit: usize,
        /// Admin token, checked against GIGPAY_ADMIN_TOKEN
        #[arg(long)]
        admin_token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::from_env();

    #[cfg(feature = "storage-rocksdb")]
    let ledger: LedgerRef = match &cli.db_path {
        Some(db_path) => {
            // Use persistent storage (RocksDB)
            let store = gigpay::infrastructure::rocksdb::RocksLedger::open(db_path, config.lock_wait)
                .into_diagnostic()?;
            Arc::new(store)
        }
        None => Arc::new(InMemoryLedger::with_lock_wait(config.lock_wait)),
    };
    #[cfg(not(feature = "storage-rocksdb"))]
    let ledger: LedgerRef = Arc::new(InMemoryLedger::with_lock_wait(config.lock_wait));

    if let Some(seed) = &cli.seed {
        let dataset = Dataset::from_file(seed).into_diagnostic()?;
        dataset.load_into(ledger.as_ref()).await.into_diagnostic()?;
    }

    match cli.command {
        Command::Process { input } => process(ledger, input).await,
        Command::Report {
            start,
            end,
            limit,
            admin_token,
        } => report(ledger, &config, &start, &end, limit, &admin_token).await,
    }
}

async fn process(ledger: LedgerRef, input: PathBuf) -> Result<()> {
    let engine = PaymentEngine::new(ledger.clone());

    let file = File::open(input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for op_result in reader.operations() {
        match op_result {
            Ok(op) => {
                if let Err(e) = apply(&engine, &op).await {
                    eprintln!("Error processing operation: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {}", e);
            }
        }
    }

    let profiles = ledger.profiles().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = BalanceWriter::new(stdout.lock());
    writer.write_profiles(profiles).into_diagnostic()?;

    Ok(())
}

async fn apply(engine: &PaymentEngine, op: &Operation) -> MarketResult<()> {
    match op.op {
        OperationKind::Pay => {
            let job = op
                .job
                .ok_or_else(|| MarketError::Validation("pay needs a job id".into()))?;
            engine.pay_job(op.actor, job).await
        }
        OperationKind::Deposit => {
            let target = op
                .target
                .ok_or_else(|| MarketError::Validation("deposit needs a target profile".into()))?;
            let amount = op.amount.ok_or(MarketError::InvalidAmount)?;
            engine.deposit(op.actor, target, amount).await
        }
        OperationKind::Transfer => {
            let target = op
                .target
                .ok_or_else(|| MarketError::Validation("transfer needs a target profile".into()))?;
            let amount = Amount::new(op.amount.ok_or(MarketError::InvalidAmount)?)?;
            engine.transfer(op.actor, target, amount).await
        }
    }
}

async fn report(
    ledger: LedgerRef,
    config: &ServiceConfig,
    start: &str,
    end: &str,
    limit: usize,
    admin_token: &str,
) -> Result<()> {
    config.verify_admin(admin_token).into_diagnostic()?;
    let range = DateRange::parse(Some(start), Some(end)).into_diagnostic()?;

    let reporting = Reporting::new(ledger);
    let best_profession = reporting.best_profession(&range).await.into_diagnostic()?;
    let best_clients = reporting
        .best_clients(&range, limit)
        .await
        .into_diagnostic()?;

    let out = serde_json::json!({
        "best_profession": best_profession,
        "best_clients": best_clients,
    });
    println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);

    Ok(())
}
