//! `arcpool lp`: Show an LP position.

use arcpool_core::Address;
use clap::Args;

use super::{field, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct LpArgs {
    /// LP address.
    pub address: Address,

    #[command(flatten)]
    pub node: NodeArgs,
}

pub async fn run(args: &LpArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let position = client.get(&format!("/lps/{}", args.address)).await?;

    println!("LP {}:", args.address);
    println!("  Shares:      {}", field(&position, "shares"));
    println!("  Asset value: {}", field(&position, "asset_value"));

    Ok(())
}
