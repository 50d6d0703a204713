use clap::Parser;
use reurb_seed::cmd::{self, Cli};

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    if let Err(e) = cmd::run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
