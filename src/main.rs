use anyhow::Result;
use clap::Parser;
use cnn_mnist::cli::Cli;

fn main() -> Result<()> {
    cnn_mnist::init_tracing();

    let cli = Cli::parse();
    cli.run()
}
