//! `arcpool withdraw`: Withdraw an exact amount of assets.

use arcpool_core::types::amount_string;
use arcpool_core::Address;
use clap::Args;
use serde::Serialize;

use super::{field, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// LP address.
    #[arg(long)]
    pub lp: Address,

    /// Assets to withdraw, in base units.
    #[arg(short, long)]
    pub amount: u128,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Serialize)]
struct WithdrawRequest {
    lp: Address,
    #[serde(with = "amount_string")]
    amount: u128,
}

pub async fn run(args: &WithdrawArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let receipt = client
        .post(
            "/withdrawals",
            &WithdrawRequest {
                lp: args.lp,
                amount: args.amount,
            },
        )
        .await?;

    println!("Withdrawal complete:");
    println!("  Assets:        {}", field(&receipt, "assets"));
    println!("  Shares burned: {}", field(&receipt, "shares"));

    Ok(())
}
