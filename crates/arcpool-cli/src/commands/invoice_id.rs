//! `arcpool invoice-id`: Compute the invoice id for an invoice reference.

use clap::Args;

#[derive(Args, Debug)]
pub struct InvoiceIdArgs {
    /// Invoice reference, e.g. INV-2024-001.
    pub reference: String,
}

pub fn run(args: &InvoiceIdArgs) -> anyhow::Result<()> {
    println!("{}", arcpool_crypto::invoice_id(&args.reference));
    Ok(())
}
