use anyhow::{Context, Result};
use caip_scope::{merge_scopes, validate_and_flatten_scopes, ScopeMap};
use clap::{Parser, Subcommand};
use serde_json::{json, Value as JsonValue};
use session_grant::{
    InMemoryWallet, NegotiationRequest, SessionConfig, SessionError, SessionGrantOrchestrator,
    WalletFixture,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "sessionctl", about = "Negotiate multichain sessions against a wallet fixture")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full negotiation and print the granted session.
    Negotiate {
        #[arg(long)]
        wallet: PathBuf,
        #[arg(long)]
        request: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate and flatten the scopes of a request.
    Flatten {
        #[arg(long)]
        request: PathBuf,
    },
    /// Merge two scope maps, `a` first.
    Merge { a: PathBuf, b: PathBuf },
}

fn main() {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<SessionError>() {
            Some(session_err) => {
                eprintln!("sessionctl error {}: {}", session_err.code(), session_err)
            }
            None => eprintln!("sessionctl error: {err:#}"),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let output = match cli.command {
        Command::Negotiate { wallet, request, config } => negotiate(&wallet, &request, config)?,
        Command::Flatten { request } => flatten(&request)?,
        Command::Merge { a, b } => merge(&a, &b)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn negotiate(wallet: &Path, request: &Path, config: Option<PathBuf>) -> Result<JsonValue> {
    let fixture = WalletFixture::from_path(wallet)
        .with_context(|| format!("loading wallet fixture {}", wallet.display()))?;
    let config = match config {
        Some(path) => SessionConfig::from_path(&path)
            .with_context(|| format!("loading session config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    let request: NegotiationRequest = read_json(request)?;
    log::debug!("negotiating session for {}", request.origin);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;
    let orchestrator =
        SessionGrantOrchestrator::new(Arc::new(InMemoryWallet::from_fixture(fixture)), config);
    let result = runtime.block_on(orchestrator.negotiate(request))?;
    Ok(serde_json::to_value(result)?)
}

fn flatten(request: &Path) -> Result<JsonValue> {
    let request: NegotiationRequest = read_json(request)?;
    let (required, optional) =
        validate_and_flatten_scopes(&request.required_scopes, &request.optional_scopes)
            .map_err(SessionError::from)?;
    Ok(json!({ "requiredScopes": required, "optionalScopes": optional }))
}

fn merge(a: &Path, b: &Path) -> Result<JsonValue> {
    let a: ScopeMap = read_json(a)?;
    let b: ScopeMap = read_json(b)?;
    Ok(serde_json::to_value(merge_scopes(&a, &b))?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}
