//! sendmail - send one transactional email through the configured provider

use clap::Parser;
use eyre::Result;
use sendmail::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    sendmail::run(cli).await
}
