//! `arcpool invoice`: Show an invoice's financing record and repayment quote.

use clap::Args;

use super::{field, resolve_invoice, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct InvoiceArgs {
    /// Invoice id (0x hex) or invoice reference.
    pub invoice: String,

    #[command(flatten)]
    pub node: NodeArgs,
}

pub async fn run(args: &InvoiceArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let id = resolve_invoice(&args.invoice);
    let invoice = client.get(&format!("/invoices/{}", id)).await?;

    println!("Invoice {}:", id);
    println!("  Status: {}", field(&invoice, "status"));

    let record = &invoice["record"];
    if !record.is_null() {
        println!("  Supplier:         {}", field(record, "supplier"));
        println!("  Payout:           {}", field(record, "payout_amount"));
        println!("  Repayment:        {}", field(record, "repayment_amount"));
        println!("  Due date:         {}", field(record, "due_date"));
        println!("  Financed at:      {}", field(record, "created_at"));
        println!("  Amount paid:      {}", field(record, "amount_paid"));
        println!("  Repaid at:        {}", field(record, "repaid_at"));
    }
    let quote = &invoice["quote"];
    if !quote.is_null() {
        println!("  Days late:        {}", field(quote, "days_late"));
        println!("  Late fee:         {}", field(quote, "late_fee"));
        println!("  Total due now:    {}", field(quote, "total_due"));
    }

    Ok(())
}
