use clap::Parser;

mod cli;
mod content;
mod ledger;

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = cli::Cli::parse();
    cli::run(args)
}
