use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand};
use dotenv::dotenv;
use log::{error, info};
use serde_json::{json, Value};

use interop_transfer::configure::{load_config, AppConfig};
use interop_transfer::interop::adapters::{GatewayLedgerClient, RelayViewClient};
use interop_transfer::interop::{
    run_with_retry, ClaimParams, Credentials, ErrorClass, FlowOutcome, InteropError,
    InteropFlowOrchestrator, OrchestratorConfig, PledgeParams, ReclaimParams, RetryPolicy, TransferProtocol,
};
use interop_transfer::logger;
use interop_transfer::logging::now_secs;

#[derive(Parser)]
#[clap(author, version, about = "Cross-ledger asset transfer: pledge, claim, reclaim", long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[clap(long)]
    config: Option<String>,
    /// Local network id (the ledger transactions are submitted to)
    #[clap(long)]
    local_network: String,
    /// Caller user name
    #[clap(long, env = "INTEROP_USER")]
    user: String,
    /// Caller identity certificate (base64)
    #[clap(long, env = "INTEROP_CERT")]
    cert: String,
    /// Use https when talking to relays
    #[clap(long, action = clap::ArgAction::Set, default_value_t = false)]
    relay_tls: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(ClapArgs)]
struct AssetArgs {
    /// Asset category: bond or token
    #[clap(long)]
    category: String,
    /// <assetType>:<idOrQuantity>
    #[clap(long)]
    param: String,
}

#[derive(ClapArgs)]
struct ClaimArgs {
    #[clap(flatten)]
    asset: AssetArgs,
    #[clap(long)]
    pledge_id: String,
    #[clap(long)]
    source_network: String,
    #[clap(long)]
    pledger_cert: String,
}

#[derive(ClapArgs)]
struct ReclaimArgs {
    #[clap(flatten)]
    asset: AssetArgs,
    #[clap(long)]
    pledge_id: String,
    #[clap(long)]
    dest_network: String,
    #[clap(long)]
    recipient_cert: String,
    #[clap(long)]
    expiry_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Pledge a local asset to a recipient on a remote network
    Pledge {
        #[clap(flatten)]
        asset: AssetArgs,
        #[clap(long)]
        remote_network: String,
        #[clap(long)]
        recipient_cert: String,
        /// Seconds from now until the pledge becomes reclaimable
        #[clap(long, default_value_t = 3600)]
        timeout_secs: u64,
    },
    /// Claim an asset pledged to us on a remote network
    Claim(ClaimArgs),
    /// Reclaim an expired, unclaimed pledge
    Reclaim(ReclaimArgs),
    /// Show the verified pledge record held by the source network
    PledgeStatus(ClaimArgs),
    /// Show the verified claim status held by the destination network
    ClaimStatus(ReclaimArgs),
}

impl ClaimArgs {
    fn params(&self, local_network: &str) -> ClaimParams {
        ClaimParams {
            category: self.asset.category.clone(),
            param: self.asset.param.clone(),
            pledge_id: self.pledge_id.clone(),
            local_network: local_network.to_string(),
            source_network: self.source_network.clone(),
            pledger_cert: self.pledger_cert.clone(),
        }
    }
}

impl ReclaimArgs {
    fn params(&self, local_network: &str) -> ReclaimParams {
        ReclaimParams {
            category: self.asset.category.clone(),
            param: self.asset.param.clone(),
            pledge_id: self.pledge_id.clone(),
            local_network: local_network.to_string(),
            dest_network: self.dest_network.clone(),
            recipient_cert: self.recipient_cert.clone(),
            expiry_secs: self.expiry_secs,
        }
    }
}

fn exit_code(e: &InteropError) -> ExitCode {
    match e.class() {
        ErrorClass::InputValidation | ErrorClass::Configuration => ExitCode::from(2),
        ErrorClass::RelayUnreachable => ExitCode::from(3),
        _ => ExitCode::from(1),
    }
}

fn pledge_expiry(now: u64, timeout_secs: u64) -> Result<u64, InteropError> {
    now.checked_add(timeout_secs).ok_or_else(|| {
        InteropError::InvalidInput(format!("pledge timeout {}s is out of range", timeout_secs))
    })
}

fn flow_output(outcome: FlowOutcome) -> Value {
    json!({
        "trace_id": outcome.trace_id,
        "result": outcome.local_result,
        "views": outcome.views.iter().map(|v| v.address.as_str()).collect::<Vec<_>>(),
    })
}

fn build_protocol(cfg: &AppConfig, args: &Args) -> anyhow::Result<TransferProtocol> {
    let directory = cfg.directory();
    let local = directory.local(&args.local_network)?;

    let view_client = Arc::new(RelayViewClient::new(
        args.relay_tls,
        Duration::from_millis(cfg.fetch_timeout_ms),
    )?);
    let ledger = Arc::new(GatewayLedgerClient::new(
        &local.gateway_url,
        Duration::from_millis(cfg.invoke_timeout_ms),
    )?);
    let orchestrator = Arc::new(InteropFlowOrchestrator::new(
        view_client,
        ledger,
        OrchestratorConfig::from(cfg),
    ));
    Ok(TransferProtocol::new(orchestrator, directory))
}

async fn run(protocol: &TransferProtocol, args: &Args, retry: &RetryPolicy) -> Result<Value, InteropError> {
    let credentials = Credentials::new(&args.user, &args.cert);
    let local = args.local_network.as_str();

    match &args.command {
        Command::Pledge {
            asset,
            remote_network,
            recipient_cert,
            timeout_secs,
        } => {
            let params = PledgeParams {
                category: asset.category.clone(),
                param: asset.param.clone(),
                local_network: local.to_string(),
                remote_network: remote_network.clone(),
                recipient_cert: recipient_cert.clone(),
                expiry_secs: pledge_expiry(now_secs(), *timeout_secs)?,
            };
            // not retried: a lost response may still have committed the lock
            let outcome = protocol.pledge(&params, &credentials).await?;
            Ok(flow_output(outcome))
        }
        Command::Claim(claim) => {
            let params = claim.params(local);
            let outcome = run_with_retry(retry, || protocol.claim(&params, &credentials)).await?;
            Ok(flow_output(outcome))
        }
        Command::Reclaim(reclaim) => {
            let params = reclaim.params(local);
            let outcome = run_with_retry(retry, || protocol.reclaim(&params, &credentials)).await?;
            Ok(flow_output(outcome))
        }
        Command::PledgeStatus(claim) => {
            let params = claim.params(local);
            let record = run_with_retry(retry, || protocol.pledge_status(&params, &credentials)).await?;
            Ok(json!(record))
        }
        Command::ClaimStatus(reclaim) => {
            let params = reclaim.params(local);
            let status = run_with_retry(retry, || protocol.claim_status(&params, &credentials)).await?;
            Ok(json!(status))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = Args::parse();

    let cfg = match load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };
    if let Err(e) = logger::setup_logger(&cfg) {
        eprintln!("failed to set up logger: {:#}", e);
        return ExitCode::from(2);
    }

    let protocol = match build_protocol(&cfg, &args) {
        Ok(protocol) => protocol,
        Err(e) => {
            error!("startup failed: {:#}", e);
            return ExitCode::from(2);
        }
    };

    let retry = RetryPolicy::from(&cfg.retry);
    match run(&protocol, &args, &retry).await {
        Ok(output) => {
            info!("command completed");
            println!("{:#}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("[{}] {}", e.error_code(), e);
            exit_code(&e)
        }
    }
}
