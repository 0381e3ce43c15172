use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "visit-counter-cli")]
#[command(about = "Command-line client for the visit counter", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show composite backend health
    Health,
    /// Show durable visit totals per host
    Stats,
    /// Record one visit and print the counter
    Visit,
    /// Show public configuration
    Config,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Health => "/health",
            Commands::Stats => "/api/stats",
            Commands::Visit => "/api/count",
            Commands::Config => "/api/config",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(url).send().await?;

    // /health answers 503 with a full report body when degraded.
    let tolerated = matches!(cli.command, Commands::Health);
    print_response(res, tolerated).await
}

async fn print_response(
    res: reqwest::Response,
    error_has_body: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() && !error_has_body {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    if !status.is_success() {
        eprintln!("Status: {}", status);
    }
    Ok(())
}
