use clap::Parser;
use ksw_cli::Cli;

fn main() -> anyhow::Result<()> {
    ksw_cli::run(Cli::parse())
}
