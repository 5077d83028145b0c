//! `kripto user`: register, remove, check and list users.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_core, parse_duration, passphrase, prompt_new_password, prompt_password, Cli};
use crate::errors::{KriptoError, Result};

/// Execute `user add`.
pub fn add(cli: &Cli, username: &str, ttl: Option<&str>) -> Result<()> {
    let ttl = ttl.map(parse_duration).transpose()?;
    let kripto = open_core(cli)?;

    let password = prompt_new_password(username)?;
    let phrase = passphrase(cli)?;
    kripto
        .credentials()
        .register_with_ttl(username, &password, &phrase, ttl)?;

    match ttl {
        Some(ttl) => output::success(&format!(
            "User '{username}' registered (tokens last {}m)",
            ttl.num_minutes()
        )),
        None => output::success(&format!("User '{username}' registered")),
    }
    output::tip(&format!("Get a token: kripto token issue {username}"));

    Ok(())
}

/// Execute `user remove`.
pub fn remove(cli: &Cli, username: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove user '{username}'?"))
            .default(false)
            .interact()
            .map_err(|e| KriptoError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let kripto = open_core(cli)?;
    kripto.credentials().remove(username)?;
    output::success(&format!("Removed user '{username}'"));

    Ok(())
}

/// Execute `user check`. Fails when the password does not match.
pub fn check(cli: &Cli, username: &str) -> Result<()> {
    let kripto = open_core(cli)?;

    let password = prompt_password(username)?;
    let phrase = passphrase(cli)?;
    if !kripto.credentials().verify(username, &password, &phrase)? {
        return Err(KriptoError::BadCredentials);
    }

    output::success(&format!("Password for '{username}' is correct"));
    Ok(())
}

/// Execute `user list`.
pub fn list(cli: &Cli) -> Result<()> {
    let kripto = open_core(cli)?;
    let users = kripto.credentials().list()?;
    output::print_names(&users, "No users registered yet.");
    Ok(())
}
