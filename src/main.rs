mod app;
mod cli;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter; falls back to RUST_LOG
const LOG_ENV: &str = "FFSPEED_LOG";

fn init_logging(verbose: bool) {
    let default = if verbose { "ffspeed=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = cli::parse();
    init_logging(cli.verbose);
    app::run(cli);
}
