use clap::Parser;
use tab::{run, Cli, TracingSink};

#[tokio::main]
async fn main() {
    TracingSink::install_global_subscriber();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
