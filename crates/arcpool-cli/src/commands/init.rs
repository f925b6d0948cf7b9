//! `arcpool init`: Write a starter node configuration.

use arcpool_core::Address;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory).
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Trusted pricing signer address.
    #[arg(long, default_value_t = Address::ZERO)]
    pub signer: Address,

    /// Initial admin address.
    #[arg(long, default_value_t = Address::ZERO)]
    pub admin: Address,

    /// Pool identity in the typed-data domain.
    #[arg(long, default_value_t = Address::ZERO)]
    pub pool_address: Address,

    /// Chain id of the deployment.
    #[arg(long, default_value_t = 421_614)]
    pub chain_id: u64,
}

pub fn render_config(args: &InitArgs) -> String {
    format!(
        r#"# ArcPool Node Configuration

[pool]
name = "ArcPool"
version = "1"
chain_id = {chain_id}
pool_address = "{pool_address}"
trusted_signer = "{signer}"
admin = "{admin}"

[api]
listen_addr = "127.0.0.1"
port = 9100

[storage]
data_dir = "./data"
in_memory = false

[logging]
level = "info"
format = "text"
"#,
        chain_id = args.chain_id,
        pool_address = args.pool_address,
        signer = args.signer,
        admin = args.admin,
    )
}

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    let config_path = args.dir.join("arcpool.toml");

    if config_path.exists() {
        anyhow::bail!("configuration file already exists at {}", config_path.display());
    }

    std::fs::create_dir_all(&args.dir)?;
    std::fs::write(&config_path, render_config(args))?;
    println!("Initialized ArcPool node at {}", config_path.display());
    if args.signer.is_zero() || args.admin.is_zero() {
        println!("Set [pool].trusted_signer and [pool].admin before starting the node.");
    }
    println!("Run 'arcpool-node --config {}' to start it.", config_path.display());

    // Create data directory
    let data_dir = args.dir.join("data");
    std::fs::create_dir_all(&data_dir)?;

    Ok(())
}
