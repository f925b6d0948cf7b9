//! `arcpool sign`: Sign a financing authorization as the pricing signer.
//!
//! Prints the request body accepted by `POST /api/v1/financings`. With
//! `--submit` the body is posted straight to the node.

use arcpool_core::{Address, Timestamp};
use arcpool_crypto::{sign_financing_request, FinancingRequest, KeyPair, TypedDataDomain};
use clap::Args;
use serde::{Deserialize, Serialize};

use super::{field, resolve_invoice, NodeArgs, NodeClient};

const KEY_ENV: &str = "ARCPOOL_SIGNER_KEY";
/// Authorizations stay valid for one hour unless told otherwise.
const DEFAULT_VALIDITY_SECS: u64 = 3_600;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Signer secret key as hex. Falls back to $ARCPOOL_SIGNER_KEY.
    #[arg(long)]
    pub key: Option<String>,

    /// Invoice id (0x hex) or invoice reference.
    #[arg(long)]
    pub invoice: String,

    /// Supplier that will draw the advance.
    #[arg(long)]
    pub supplier: Address,

    /// Advance paid to the supplier, in base units.
    #[arg(long)]
    pub payout: u128,

    /// Amount the buyer owes at maturity, in base units.
    #[arg(long)]
    pub repayment: u128,

    /// Invoice due date (Unix seconds).
    #[arg(long)]
    pub due_date: Timestamp,

    /// Authorization nonce. Defaults to the current time in milliseconds.
    #[arg(long)]
    pub nonce: Option<u128>,

    /// Signature deadline (Unix seconds). Defaults to one hour from now.
    #[arg(long)]
    pub deadline: Option<Timestamp>,

    /// Chain id of the pool's domain.
    #[arg(long, default_value_t = 421_614)]
    pub chain_id: u64,

    /// Pool address of the domain.
    #[arg(long)]
    pub pool_address: Address,

    /// Post the signed authorization to the node.
    #[arg(long)]
    pub submit: bool,

    #[command(flatten)]
    pub node: NodeArgs,
}

/// A signed financing request, as posted to the node.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignedAuthorization {
    #[serde(flatten)]
    pub request: FinancingRequest,
    pub signature: String,
}

pub fn build_request(args: &SignArgs, now_millis: i64) -> FinancingRequest {
    let now = (now_millis / 1_000).max(0) as Timestamp;
    FinancingRequest {
        invoice_id: resolve_invoice(&args.invoice),
        supplier: args.supplier,
        payout_amount: args.payout,
        repayment_amount: args.repayment,
        due_date: args.due_date,
        nonce: args.nonce.unwrap_or(now_millis.max(0) as u128),
        deadline: args.deadline.unwrap_or(now + DEFAULT_VALIDITY_SECS),
    }
}

fn load_key(args: &SignArgs) -> anyhow::Result<KeyPair> {
    let hex = match &args.key {
        Some(key) => key.clone(),
        None => std::env::var(KEY_ENV)
            .map_err(|_| anyhow::anyhow!("no signer key: pass --key or set ${}", KEY_ENV))?,
    };
    Ok(KeyPair::from_hex(hex.trim())?)
}

pub async fn run(args: &SignArgs) -> anyhow::Result<()> {
    let keypair = load_key(args)?;
    let domain = TypedDataDomain::new(args.chain_id, args.pool_address);
    let request = build_request(args, chrono::Utc::now().timestamp_millis());
    if request.repayment_amount <= request.payout_amount {
        anyhow::bail!(
            "repayment {} must exceed payout {}",
            request.repayment_amount,
            request.payout_amount
        );
    }

    let signature = sign_financing_request(&request, &domain, &keypair);
    let authorization = SignedAuthorization {
        request,
        signature: signature.to_hex(),
    };

    if !args.submit {
        println!("{}", serde_json::to_string_pretty(&authorization)?);
        return Ok(());
    }

    let client = NodeClient::new(&args.node);
    let record = client.post("/financings", &authorization).await?;
    println!("Financing withdrawn:");
    println!("  Invoice:  {}", field(&record, "invoice_id"));
    println!("  Supplier: {}", field(&record, "supplier"));
    println!("  Payout:   {}", field(&record, "payout_amount"));
    println!("  Due date: {}", field(&record, "due_date"));

    Ok(())
}
