//! `kripto token`: log in for a token, or inspect one.

use crate::cli::output;
use crate::cli::{open_core, passphrase, prompt_password, Cli};
use crate::errors::Result;

/// Execute `token issue`: check the password, print the token on stdout.
pub fn issue(cli: &Cli, username: &str) -> Result<()> {
    let kripto = open_core(cli)?;

    let password = prompt_password(username)?;
    let phrase = passphrase(cli)?;
    let token = kripto.login(username, &password, &phrase)?;

    // Bare token so `KRIPTO_TOKEN=$(kripto token issue alice)` works.
    println!("{token}");
    Ok(())
}

/// Execute `token verify`.
pub fn verify(cli: &Cli, token: &str) -> Result<()> {
    let kripto = open_core(cli)?;
    let verified = kripto.tokens().verify(token)?;

    output::success(&format!(
        "Token for '{}' valid until {}",
        verified.username,
        verified.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    Ok(())
}
