use clap::Parser;
use setup_fluence::error_message;
use setup_fluence::logging::setup_logging;
use setup_fluence::types::SetupFluenceCli;

#[tokio::main]
async fn main() {
    if let Err(e) = setup_logging() {
        eprintln!("Failed to initialize logging: {e:#}");
    }

    let cli = SetupFluenceCli::parse();

    if let Err(err) = setup_fluence::run(&cli).await {
        error_message!("{}", err.report());
        std::process::exit(1);
    }
}
