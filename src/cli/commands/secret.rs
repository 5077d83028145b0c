//! `kripto secret`: token-gated access to secret bundles.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_core, parse_assignments, passphrase, require_token, Cli};
use crate::errors::{KriptoError, Result};
use crate::vault::SecretBundle;

/// Execute `secret put`.
pub fn put(cli: &Cli, token: Option<&str>, app: &str, vars: &[String]) -> Result<()> {
    let token = require_token(token)?;
    let mut bundle = SecretBundle::new(app);
    for (key, value) in parse_assignments(vars)? {
        bundle.vars.insert(key, value);
    }

    let kripto = open_core(cli)?;
    let phrase = passphrase(cli)?;
    kripto.vault().put(token, &bundle, &phrase)?;

    output::success(&format!(
        "Stored {} variable(s) for '{app}'",
        bundle.len()
    ));
    Ok(())
}

/// Execute `secret get`.
pub fn get(cli: &Cli, token: Option<&str>, app: &str, json: bool) -> Result<()> {
    let token = require_token(token)?;
    let kripto = open_core(cli)?;
    let phrase = passphrase(cli)?;

    let Some(bundle) = kripto.vault().lookup(token, app, &phrase)? else {
        if json {
            // Missing and empty look the same to scripts.
            println!("{}", String::from_utf8_lossy(&SecretBundle::new(app).to_json()?));
        } else {
            output::info(&format!("Nothing stored for '{app}'."));
        }
        return Ok(());
    };

    if json {
        println!("{}", String::from_utf8_lossy(&bundle.to_json()?));
    } else {
        output::print_bundle_table(&bundle);
    }
    Ok(())
}

/// Execute `secret delete`.
pub fn delete(cli: &Cli, token: Option<&str>, app: &str, force: bool) -> Result<()> {
    let token = require_token(token)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete all secrets for '{app}'?"))
            .default(false)
            .interact()
            .map_err(|e| KriptoError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let kripto = open_core(cli)?;
    kripto.vault().delete(token, app)?;
    output::success(&format!("Deleted secrets for '{app}'"));
    Ok(())
}

/// Execute `secret list`.
pub fn list(cli: &Cli, token: Option<&str>) -> Result<()> {
    let token = require_token(token)?;
    let kripto = open_core(cli)?;
    let apps = kripto.vault().list(token)?;
    output::print_names(&apps, "No secrets stored yet.");
    Ok(())
}
