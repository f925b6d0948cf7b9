//! `arcpool deposit`: Deposit assets and mint shares.

use arcpool_core::types::amount_string;
use arcpool_core::Address;
use clap::Args;
use serde::Serialize;

use super::{field, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct DepositArgs {
    /// LP address.
    #[arg(long)]
    pub lp: Address,

    /// Amount in base units.
    #[arg(short, long)]
    pub amount: u128,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Serialize)]
struct DepositRequest {
    lp: Address,
    #[serde(with = "amount_string")]
    amount: u128,
}

pub async fn run(args: &DepositArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let receipt = client
        .post(
            "/deposits",
            &DepositRequest {
                lp: args.lp,
                amount: args.amount,
            },
        )
        .await?;

    println!("Deposit accepted:");
    println!("  Assets:          {}", field(&receipt, "assets"));
    println!("  Shares minted:   {}", field(&receipt, "shares"));
    println!("  Pool size after: {}", field(&receipt, "new_total_pool_size"));

    Ok(())
}
