mod cmd;

use clap::Parser;
use cmd::config::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Generate(args) => cmd::generate::run(&args).await,
        Commands::Inspect(args) => cmd::inspect::run(&args).await,
        Commands::Fetch(args) => cmd::remote::fetch(&args).await,
        Commands::Submit(args) => cmd::remote::submit(&args).await,
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
