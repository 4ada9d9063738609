use crate::contracts::{alarm, registry};
use crate::fixtures::DeployedContracts;
use crate::node::config::VerifierConfig;
use crate::node::dev_node::DevNode;
use crate::rpc::HttpRpcClient;
use crate::utils::{init_logging, METRICS};
use crate::verifier::{RegistrationVerifier, VerificationReport};
use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

/// Verify the alarm registration workflow against a node.
#[derive(Parser)]
#[clap(name = "alarm-calldata", version)]
pub struct Cli {
    /// Path to a TOML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[clap(long, global = true, default_value = "info")]
    pub log: String,

    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Write a config file with every default filled in
    Init {
        #[clap(long, default_value = "alarm-calldata.toml")]
        path: PathBuf,

        /// overwrite an existing file
        #[clap(long)]
        force: bool,
    },
    /// Serve a devchain over JSON-RPC until Ctrl+C
    Devnet {
        /// rpc bind address (host:port)
        #[clap(long)]
        bind: Option<String>,

        #[clap(long)]
        block_time_ms: Option<u64>,

        /// deploy Alarm and TestDataRegistry once the node is up
        #[clap(long)]
        deploy: bool,
    },
    /// Run the registration check against a running node
    Check {
        /// JSON-RPC endpoint
        #[clap(long)]
        rpc: Option<String>,

        /// deployed TestDataRegistry
        #[clap(long)]
        registry: Address,

        /// deployed Alarm
        #[clap(long)]
        alarm: Address,

        /// address to register
        #[clap(long)]
        target: Option<Address>,

        /// sending account (node's first account by default)
        #[clap(long)]
        from: Option<Address>,
    },
    /// Spawn a devnode, deploy both contracts, run the check, tear down
    Simulate {
        #[clap(long)]
        target: Option<Address>,

        #[clap(long)]
        block_time_ms: Option<u64>,
    },
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    let mut cfg = match &cli.config {
        Some(path) => VerifierConfig::load(path)?,
        None => VerifierConfig::default(),
    };

    match cli.cmd {
        Cmd::Init { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (pass --force to overwrite)", path.display());
            }
            std::fs::write(&path, VerifierConfig::default().to_toml()?)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("wrote default config to {}", path.display());
            Ok(())
        }
        Cmd::Devnet { bind, block_time_ms, deploy } => {
            if let Some(b) = bind {
                cfg.devnet.bind = b;
            }
            if let Some(ms) = block_time_ms {
                cfg.devnet.block_time_ms = ms;
            }
            let node = DevNode::spawn(cfg.dev_node_config()?).await?;
            println!("devnet listening on {}", node.endpoint());
            for account in node.chain().accounts() {
                println!("  account {account}");
            }
            if deploy {
                let deployed =
                    DeployedContracts::deploy_registration_pair(&node.local_client(), &cfg.deploy_config()).await?;
                for name in [alarm::NAME, registry::NAME] {
                    if let Some(addr) = deployed.get(name) {
                        println!("  {name} at {addr}");
                    }
                }
            }
            tokio::signal::ctrl_c().await?;
            println!("Shutting down devnet...");
            node.shutdown().await
        }
        Cmd::Check { rpc, registry, alarm, target, from } => {
            if let Some(url) = rpc {
                cfg.rpc_url = url;
            }
            let mut registration = cfg.registration();
            if let Some(t) = target {
                registration.target = t;
            }
            if from.is_some() {
                registration.from = from;
            }

            let client = HttpRpcClient::new(&cfg.rpc_url, cfg.request_timeout())?;
            let verifier = RegistrationVerifier::new(&client, registry, alarm, cfg.tx_wait());
            let report = verifier.verify(&registration).await?;
            print_report(&report);
            Ok(())
        }
        Cmd::Simulate { target, block_time_ms } => {
            if let Some(ms) = block_time_ms {
                cfg.devnet.block_time_ms = ms;
            }
            let mut registration = cfg.registration();
            if let Some(t) = target {
                registration.target = t;
            }
            let mut node_cfg = cfg.dev_node_config()?;
            node_cfg.bind.set_port(0);

            let node = DevNode::spawn(node_cfg).await?;
            let outcome = async {
                let client = node.client()?;
                let deployed = DeployedContracts::deploy_registration_pair(&client, &cfg.deploy_config()).await?;
                let (registry_addr, alarm_addr) = match (deployed.get(registry::NAME), deployed.get(alarm::NAME)) {
                    (Some(r), Some(a)) => (r, a),
                    _ => bail!("deployment did not return both contract addresses"),
                };
                let verifier = RegistrationVerifier::new(&client, registry_addr, alarm_addr, cfg.tx_wait());
                Ok::<_, anyhow::Error>(verifier.verify(&registration).await?)
            }
            .await;
            node.shutdown().await?;

            let report = outcome?;
            print_report(&report);
            info!(metrics = ?METRICS.snapshot(), "simulation finished");
            Ok(())
        }
    }
}

fn print_report(report: &VerificationReport) {
    println!("registration verified");
    println!("  tx:        {}", report.tx_hash);
    println!("  block:     {}", report.block_number);
    println!("  data hash: {}", report.data_hash);
    println!("  data:      0x{}", hex::encode(&report.data));
    if !report.hash_consistent {
        println!("  note: data hash is not keccak256(data)");
    }
}
