use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = webmux::cli::Cli::parse();
    if let Err(e) = webmux::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
