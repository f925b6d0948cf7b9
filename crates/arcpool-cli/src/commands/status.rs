//! `arcpool status`: Show pool status.

use clap::Args;

use super::{field, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub node: NodeArgs,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let pool = client.get("/pool").await?;

    println!("Pool Status ({}):", args.node.endpoint);
    println!("  Total assets:      {}", field(&pool, "total"));
    println!("  Available:         {}", field(&pool, "available"));
    println!("  Utilized:          {}", field(&pool, "utilized"));
    println!("  Financed (total):  {}", field(&pool, "financed"));
    println!("  Interest earned:   {}", field(&pool, "total_interest_earned"));
    println!("  Total shares:      {}", field(&pool, "total_shares"));
    println!("  Share price (e18): {}", field(&pool, "share_price_e18"));
    println!("  Utilization (bps): {}", field(&pool, "utilization_bps"));
    println!("  Paused:            {}", field(&pool, "paused"));
    println!("  Trusted signer:    {}", field(&pool, "trusted_signer"));
    println!("  Chain id:          {}", field(&pool["domain"], "chain_id"));
    println!("  Pool address:      {}", field(&pool["domain"], "verifying_contract"));

    Ok(())
}
