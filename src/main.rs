#![allow(clippy::print_stdout, reason = "the CLI prints operation output to stdout")]
#![allow(clippy::print_stderr, reason = "the CLI reports fatal errors on stderr")]

use std::{process::ExitCode, sync::Arc};

use clap::{Args, Parser, Subcommand};
use odos_swap::{ChainRegistry, SwapArgs, SwapConfig, SwapTools};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "odos-swap", version, about = "Quote and execute swaps through the Odos router")]
struct Cli {
    /// Log filter, either a bare level or full `RUST_LOG` directives.
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a quote without sending anything.
    Quote(TradeArgs),
    /// Quote, approve if needed, and execute the swap.
    Swap(TradeArgs),
    /// List the supported chains and their ids.
    Chains,
}

#[derive(Debug, Args)]
struct TradeArgs {
    /// Chain name, e.g. "fraxtal" or "base".
    #[arg(long)]
    chain: Option<String>,
    /// Address of the token to swap from.
    #[arg(long = "from")]
    from_token: String,
    /// Address of the token to swap to.
    #[arg(long = "to")]
    to_token: String,
    /// Amount to swap, in base units.
    #[arg(long)]
    amount: String,
    /// Print raw JSON instead of the formatted summary.
    #[arg(long)]
    raw: bool,
}

impl From<TradeArgs> for SwapArgs {
    fn from(args: TradeArgs) -> Self {
        Self {
            chain: args.chain,
            from_token: args.from_token,
            to_token: args.to_token,
            amount: args.amount,
            pretty: !args.raw,
        }
    }
}

fn setup_logging(log_level: &str, json_format: bool) {
    // Bare levels get the HTTP stack capped; full directive strings are kept as-is.
    let level = log_level.trim();
    let directives = if level.contains(',') || level.contains('=') {
        level.to_string()
    } else {
        format!("{level},h2=info,hyper=info,hyper_util=info,reqwest=info,alloy_transport_http=info")
    };
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json_format {
        registry
            .with(fmt::layer().json().with_target(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(&cli.log_level, cli.log_json);

    let (config, registry) = match SwapConfig::from_env().and_then(|config| {
        ChainRegistry::builtin().map(|registry| (config, registry))
    }) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let tools = SwapTools::new(config, Arc::new(registry));

    let result = match cli.command {
        Command::Quote(args) => tools.get_quote(&args.into()).await,
        Command::Swap(args) => tools.swap(&args.into()).await,
        Command::Chains => Ok(tools.list_chains()),
    };

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
