mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use client::SmartPixClient;
use output::{OutputConfig, OutputFormat};
use std::process;

/// CLI for the SmartPix image editing service
#[derive(Parser, Debug)]
#[clap(name = "smartpix-cli", about = "CLI for the SmartPix image editing service")]
struct Cli {
    /// Server URL to connect to
    #[clap(
        long,
        env = "SMARTPIX_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    server_url: String,

    /// Bearer token printed by `login` or `signup`
    #[clap(long, env = "SMARTPIX_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs, tokens or counts)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Account(commands::account::AccountCommands),
    #[command(flatten)]
    Image(commands::image::ImageCommands),
}

/// Formats an error for human-readable stderr output
fn format_error(err: &dyn std::error::Error) -> String {
    let err_string = err.to_string();

    // ClientError::Request wraps reqwest errors, check for connection issues
    if err_string.contains("error sending request")
        || err_string.contains("connection refused")
        || err_string.contains("Connection refused")
        || err_string.contains("tcp connect error")
    {
        return format!(
            "Could not connect to server. Is smartpix running?\n  {}",
            err_string
        );
    }

    err_string
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = SmartPixClient::new(cli.server_url, cli.token);
    let output_config = OutputConfig {
        format: cli.format,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Account(cmd) => commands::account::execute(&client, cmd, &output_config).await,
        Commands::Image(cmd) => commands::image::execute(&client, cmd, &output_config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref()));
        process::exit(1);
    }
}
