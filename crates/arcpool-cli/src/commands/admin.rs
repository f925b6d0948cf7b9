//! `arcpool admin`: Signer rotation, pausing and admin management.

use arcpool_core::Address;
use clap::{Args, Subcommand};
use serde::Serialize;

use super::{field, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct AdminArgs {
    /// Admin address issuing the call.
    #[arg(long)]
    pub caller: Address,

    #[command(subcommand)]
    pub action: AdminAction,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Subcommand, Debug)]
pub enum AdminAction {
    /// Replace the trusted pricing signer.
    SetSigner { new_signer: Address },
    /// Stop new deposits and financings.
    Pause,
    /// Resume deposits and financings.
    Unpause,
    /// Grant the admin role.
    Grant { account: Address },
    /// Revoke the admin role.
    Revoke { account: Address },
}

#[derive(Serialize)]
struct CallerBody {
    caller: Address,
}

#[derive(Serialize)]
struct SignerBody {
    caller: Address,
    new_signer: Address,
}

#[derive(Serialize)]
struct RoleBody {
    caller: Address,
    account: Address,
}

pub async fn run(args: &AdminArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let caller = args.caller;

    match &args.action {
        AdminAction::SetSigner { new_signer } => {
            let resp = client
                .post(
                    "/admin/signer",
                    &SignerBody {
                        caller,
                        new_signer: *new_signer,
                    },
                )
                .await?;
            println!("Trusted signer updated:");
            println!("  Old: {}", field(&resp, "old"));
            println!("  New: {}", field(&resp, "new"));
        }
        AdminAction::Pause | AdminAction::Unpause => {
            let path = if matches!(args.action, AdminAction::Pause) {
                "/admin/pause"
            } else {
                "/admin/unpause"
            };
            let resp = client.post(path, &CallerBody { caller }).await?;
            println!(
                "Paused: {} (changed: {})",
                field(&resp, "paused"),
                field(&resp, "changed")
            );
        }
        AdminAction::Grant { account } | AdminAction::Revoke { account } => {
            let path = if matches!(args.action, AdminAction::Grant { .. }) {
                "/admin/admins/grant"
            } else {
                "/admin/admins/revoke"
            };
            let resp = client
                .post(
                    path,
                    &RoleBody {
                        caller,
                        account: *account,
                    },
                )
                .await?;
            println!(
                "{}: admin = {} (changed: {})",
                field(&resp, "account"),
                field(&resp, "is_admin"),
                field(&resp, "changed")
            );
        }
    }

    Ok(())
}
