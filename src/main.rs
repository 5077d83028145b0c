use clap::Parser;
use kripto::cli::commands::{audit_cmd, secret, token, user};
use kripto::cli::{Cli, Commands, SecretAction, TokenAction, UserAction};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Diagnostics go to stderr so stdout stays clean for tokens and JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("KRIPTO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::User { ref action } => match action {
            UserAction::Add { username, ttl } => user::add(&cli, username, ttl.as_deref()),
            UserAction::Remove { username, force } => user::remove(&cli, username, *force),
            UserAction::Check { username } => user::check(&cli, username),
            UserAction::List => user::list(&cli),
        },
        Commands::Token { ref action } => match action {
            TokenAction::Issue { username } => token::issue(&cli, username),
            TokenAction::Verify { token } => token::verify(&cli, token),
        },
        Commands::Secret {
            ref token,
            ref action,
        } => {
            let token = token.as_deref();
            match action {
                SecretAction::Put { app, vars } => secret::put(&cli, token, app, vars),
                SecretAction::Get { app, json } => secret::get(&cli, token, app, *json),
                SecretAction::Delete { app, force } => secret::delete(&cli, token, app, *force),
                SecretAction::List => secret::list(&cli, token),
            }
        }
        Commands::Audit { last, ref since } => audit_cmd::execute(&cli, last, since.as_deref()),
    };

    if let Err(e) = result {
        kripto::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
