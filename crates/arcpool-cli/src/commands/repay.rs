//! `arcpool repay`: Repay a financed invoice.

use arcpool_core::types::amount_string;
use arcpool_core::{Address, InvoiceId};
use clap::Args;
use serde::Serialize;

use super::{field, resolve_invoice, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct RepayArgs {
    /// Invoice id (0x hex) or invoice reference.
    #[arg(long)]
    pub invoice: String,

    /// Buyer address.
    #[arg(long)]
    pub payer: Address,

    /// Payment in base units. Defaults to the node's current quote.
    #[arg(short, long)]
    pub amount: Option<u128>,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Serialize)]
struct RepayRequest {
    invoice_id: InvoiceId,
    payer: Address,
    #[serde(with = "amount_string")]
    amount: u128,
}

pub async fn run(args: &RepayArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let invoice_id = resolve_invoice(&args.invoice);

    let amount = match args.amount {
        Some(amount) => amount,
        None => {
            let invoice = client.get(&format!("/invoices/{}", invoice_id)).await?;
            let due = field(&invoice["quote"], "total_due");
            due.parse()
                .map_err(|_| anyhow::anyhow!("invoice {} has nothing due", invoice_id))?
        }
    };

    let receipt = client
        .post(
            "/repayments",
            &RepayRequest {
                invoice_id,
                payer: args.payer,
                amount,
            },
        )
        .await?;

    println!("Repayment settled:");
    println!("  Invoice:   {}", invoice_id);
    println!("  Paid:      {}", field(&receipt, "amount"));
    println!("  Principal: {}", field(&receipt, "principal"));
    println!("  Interest:  {}", field(&receipt, "interest"));

    Ok(())
}
