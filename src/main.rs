use clap::Parser;
use keel_cli::{commands, error_view, Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.config.engine_config() {
        Ok(config) => match &cli.command {
            Command::Migrate(args) => commands::migrate::run(args, config).await,
            Command::Validate(args) => commands::validate::run(args, config).await,
            Command::Baseline(args) => commands::baseline::run(args, config).await,
            Command::Info(args) => commands::info::run(args, config).await,
            Command::Repair(args) => commands::repair::run(args, config).await,
            Command::Clean(args) => commands::clean::run(args, config).await,
        },
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        error_view::print(&err);
        std::process::exit(err.exit_code());
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("KEEL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
