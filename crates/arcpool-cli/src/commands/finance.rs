//! `arcpool finance`: Draw a financing advance with a signed authorization.

use clap::Args;
use std::io::Read;
use std::path::PathBuf;

use super::sign::SignedAuthorization;
use super::{field, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct FinanceArgs {
    /// JSON authorization produced by `arcpool sign` ("-" for stdin).
    pub authorization: PathBuf,

    #[command(flatten)]
    pub node: NodeArgs,
}

fn read_authorization(path: &PathBuf) -> anyhow::Result<SignedAuthorization> {
    let contents = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&contents)?)
}

pub async fn run(args: &FinanceArgs) -> anyhow::Result<()> {
    let authorization = read_authorization(&args.authorization)?;
    let client = NodeClient::new(&args.node);

    println!("Requesting financing...");
    println!("  Invoice:  {}", authorization.request.invoice_id);
    println!("  Supplier: {}", authorization.request.supplier);
    println!("  Payout:   {}", authorization.request.payout_amount);
    println!("  Via:      {}", args.node.endpoint);
    println!();

    let record = client.post("/financings", &authorization).await?;
    println!("Financing withdrawn:");
    println!("  Repayment: {}", field(&record, "repayment_amount"));
    println!("  Due date:  {}", field(&record, "due_date"));
    println!("  Financed:  {}", field(&record, "created_at"));

    Ok(())
}
