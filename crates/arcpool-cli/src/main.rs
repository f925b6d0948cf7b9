//! ArcPool CLI: command-line interface for an ArcPool settlement node.
//!
//! Subcommands: init, status, lp, invoice, deposit, withdraw, redeem, finance,
//! repay, admin, sign, invoice-id.

mod commands;

use clap::{Parser, Subcommand};

/// ArcPool: invoice financing against pooled liquidity.
#[derive(Parser, Debug)]
#[command(name = "arcpool", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a starter node configuration.
    Init(commands::init::InitArgs),
    /// Show pool status.
    Status(commands::status::StatusArgs),
    /// Show an LP position.
    Lp(commands::lp::LpArgs),
    /// Show an invoice's financing record and repayment quote.
    Invoice(commands::invoice::InvoiceArgs),
    /// Deposit assets and mint shares.
    Deposit(commands::deposit::DepositArgs),
    /// Withdraw an exact amount of assets.
    Withdraw(commands::withdraw::WithdrawArgs),
    /// Redeem an exact number of shares.
    Redeem(commands::redeem::RedeemArgs),
    /// Draw a financing advance with a signed authorization.
    Finance(commands::finance::FinanceArgs),
    /// Repay a financed invoice.
    Repay(commands::repay::RepayArgs),
    /// Administrative operations.
    Admin(commands::admin::AdminArgs),
    /// Sign a financing authorization locally.
    Sign(commands::sign::SignArgs),
    /// Compute the invoice id for an invoice reference.
    InvoiceId(commands::invoice_id::InvoiceIdArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Lp(args) => commands::lp::run(args).await,
        Commands::Invoice(args) => commands::invoice::run(args).await,
        Commands::Deposit(args) => commands::deposit::run(args).await,
        Commands::Withdraw(args) => commands::withdraw::run(args).await,
        Commands::Redeem(args) => commands::redeem::run(args).await,
        Commands::Finance(args) => commands::finance::run(args).await,
        Commands::Repay(args) => commands::repay::run(args).await,
        Commands::Admin(args) => commands::admin::run(args).await,
        Commands::Sign(args) => commands::sign::run(args).await,
        Commands::InvoiceId(args) => commands::invoice_id::run(args),
    }
}
