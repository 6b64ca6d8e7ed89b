mod args;
mod commands;
mod daemon;
mod error;
mod token;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::Args;
use error::CliError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let result = dispatch(&args).await;
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("vigil: {e}");
            std::process::exit(e.exit_code());
        }
    }
}

async fn dispatch(args: &Args) -> Result<(), CliError> {
    if args.validate {
        return commands::validate(args).await;
    }
    if args.migrate {
        return commands::migrate(args).await;
    }
    if args.purge_alerts {
        return commands::purge_alerts(args).await;
    }
    if args.maintenance {
        return commands::maintenance(args).await;
    }
    daemon::run(args).await
}
