//! rkintai entrypoint.

use clap::Parser;
use rkintai::cli::parser::Cli;
use rkintai::{dispatch, load_config, ui::messages};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let result = load_config(&cli).and_then(|cfg| {
        init_tracing(&cfg.log_level);
        dispatch(&cli, &cfg)
    });

    if let Err(e) = result {
        messages::failure(&e);
        std::process::exit(1);
    }
}
