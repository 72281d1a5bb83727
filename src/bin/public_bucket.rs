use anyhow::Result;
use clap::Parser;
use cnn_mnist::cli::BucketCli;

fn main() -> Result<()> {
    cnn_mnist::init_tracing();

    let cli = BucketCli::parse();
    cli.run()
}
