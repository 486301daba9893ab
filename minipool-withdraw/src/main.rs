use clap::Parser;
use futures::future::{AbortHandle, Abortable, Aborted};
use log::*;
use minipool_api::domain::AggregateResult;
use minipool_eth_client::client::EthChain;
use minipool_withdraw::config::Config;
use minipool_withdraw::console::StdConsole;
use minipool_withdraw::context::WithdrawContext;
use minipool_withdraw::error::{Error, Result};
use minipool_withdraw::withdraw::{ensure_success, withdraw_minipools};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(about, version, author)]
struct Args {
    /// TOML configuration file, missing file means defaults
    #[clap(long, short, default_value = "minipool.toml", env = "MINIPOOL_CONFIG")]
    config: PathBuf,
    /// JSON-RPC endpoint of the execution client, overrides the configuration file
    #[clap(long, env = "MINIPOOL_NODE_URL")]
    node_url: Option<String>,
    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug, Clone)]
enum SubCommand {
    /// Withdraw node deposits from minipools of the configured node
    Withdraw,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let mut config = Config::load(&args.config)?;
    if let Some(node_url) = args.node_url {
        config.node_url = node_url;
    }

    match args.subcmd {
        SubCommand::Withdraw => {
            let (abort_handle, abort_reg) = AbortHandle::new_pair();
            let on_interrupt = abort_handle.clone();
            ctrlc::set_handler(move || {
                on_interrupt.abort();
            })?;
            match Abortable::new(withdraw(config, abort_handle), abort_reg).await {
                Ok(res) => {
                    let result = res?;
                    debug!("Withdrawal finished with {} outcomes", result.outcomes.len());
                }
                Err(Aborted) => {
                    error!("{}, interrupted by operator", Error::Aborted);
                    // A pending stdin read cannot be cancelled and would block runtime shutdown
                    std::process::exit(130);
                }
            }
        }
    }
    Ok(())
}

async fn withdraw(config: Config, abort: AbortHandle) -> Result<AggregateResult> {
    config.validate()?;
    info!("Connecting to {}", config.node_url);
    let chain = EthChain::connect(config.chain_params()).await?;
    let mut ctx = WithdrawContext::new(chain, config.node_account, StdConsole::stdio())
        .with_abort(abort);
    let result = withdraw_minipools(&mut ctx).await?;
    ensure_success(result)
}
