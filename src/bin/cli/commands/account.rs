use clap::Subcommand;

use crate::client::SmartPixClient;
use crate::output::{self, OutputConfig};

/// Account commands
#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Create an account and print its token
    Signup {
        /// Email address to register
        #[clap(long)]
        email: String,
        /// Password for the new account
        #[clap(long, env = "SMARTPIX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and print a fresh token
    Login {
        /// Registered email address
        #[clap(long)]
        email: String,
        /// Account password
        #[clap(long, env = "SMARTPIX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the account behind the current token
    Me,
}

/// Executes an account command
pub async fn execute(
    client: &SmartPixClient,
    cmd: AccountCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        AccountCommands::Signup { email, password } => {
            let auth = client.signup(email, password).await?;
            output::print_auth(&auth, config);
        }
        AccountCommands::Login { email, password } => {
            let auth = client.login(email, password).await?;
            output::print_auth(&auth, config);
        }
        AccountCommands::Me => {
            let me = client.me().await?;
            output::print_me(&me, config);
        }
    }
    Ok(())
}
