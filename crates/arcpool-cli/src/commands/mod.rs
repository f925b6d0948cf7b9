pub mod admin;
pub mod deposit;
pub mod finance;
pub mod init;
pub mod invoice;
pub mod invoice_id;
pub mod lp;
pub mod redeem;
pub mod repay;
pub mod sign;
pub mod status;
pub mod withdraw;

use anyhow::Context;
use arcpool_core::InvoiceId;
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9100";

/// Connection options shared by every subcommand that talks to a node.
#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    kind: String,
    error: String,
}

/// Thin JSON client for the node's `/api/v1` surface.
pub struct NodeClient {
    endpoint: String,
    http: reqwest::Client,
}

impl NodeClient {
    pub fn new(args: &NodeArgs) -> Self {
        Self {
            endpoint: args.endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.endpoint, path)
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .with_context(|| self.unreachable())?;
        Self::decode(resp).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| self.unreachable())?;
        Self::decode(resp).await
    }

    fn unreachable(&self) -> String {
        format!(
            "could not reach node at {} (is arcpool-node running?)",
            self.endpoint
        )
    }

    async fn decode(resp: reqwest::Response) -> anyhow::Result<Value> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }
        match resp.json::<ErrorResponse>().await {
            Ok(err) => anyhow::bail!("request failed (HTTP {}, {}): {}", status, err.kind, err.error),
            Err(_) => anyhow::bail!("request failed (HTTP {})", status),
        }
    }
}

/// Accept either a `0x` invoice id or the raw invoice reference, which is
/// hashed the same way the pricing service does.
pub fn resolve_invoice(input: &str) -> InvoiceId {
    match InvoiceId::from_hex(input) {
        Ok(id) if input.starts_with("0x") => id,
        _ => arcpool_crypto::invoice_id(input),
    }
}

/// Render a JSON string or number field for display.
pub fn field(value: &Value, key: &str) -> String {
    match &value[key] {
        Value::String(s) => s.clone(),
        Value::Null => "-".into(),
        other => other.to_string(),
    }
}
