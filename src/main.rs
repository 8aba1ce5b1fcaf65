use std::process;
use clap::Parser;

use cara_store::cli::Cli;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
