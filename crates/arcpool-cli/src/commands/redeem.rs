//! `arcpool redeem`: Redeem an exact number of shares.

use arcpool_core::types::amount_string;
use arcpool_core::Address;
use clap::Args;
use serde::Serialize;

use super::{field, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct RedeemArgs {
    /// LP address.
    #[arg(long)]
    pub lp: Address,

    /// Shares to burn.
    #[arg(short, long)]
    pub shares: u128,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Serialize)]
struct RedeemRequest {
    lp: Address,
    #[serde(with = "amount_string")]
    shares: u128,
}

pub async fn run(args: &RedeemArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let receipt = client
        .post(
            "/redemptions",
            &RedeemRequest {
                lp: args.lp,
                shares: args.shares,
            },
        )
        .await?;

    println!("Redemption complete:");
    println!("  Shares burned: {}", field(&receipt, "shares"));
    println!("  Assets paid:   {}", field(&receipt, "assets"));

    Ok(())
}
