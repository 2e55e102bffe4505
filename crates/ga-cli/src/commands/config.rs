use std::io::Write;

use ga_cli_core::config::CredentialStore;
use tracing::{info, warn};

use crate::context::CommandContext;
use crate::error::{CliError, CliResult};
use crate::utils::expand_home;

/// Validate a credential file against the live API, then persist its path.
///
/// Nothing is written when the credentials can't list any account.
pub async fn init(
    ctx: &mut CommandContext,
    credentials: &str,
    out: &mut impl Write,
) -> CliResult<()> {
    let path = expand_home(credentials);
    if !path.exists() {
        return Err(CliError::validation(format!(
            "Credentials file not found at {}",
            path.display()
        )));
    }

    writeln!(out, "Testing credentials...")?;
    out.flush()?;
    ctx.use_credentials(path.clone());
    let accounts = ctx
        .call("list_accounts", |client| async move { client.list_accounts().await })
        .await?;

    if accounts.is_empty() {
        warn!(path = %path.display(), "Credentials are valid but no accounts found");
        return Ok(());
    }
    writeln!(out, "Credentials valid! Found {} account(s)", accounts.len())?;

    let store = ctx.store();
    let warnings = store.set_path(&path)?;
    info!(
        path = %path.display(),
        warnings = warnings.len(),
        "Saved credentials path"
    );

    writeln!(out, "Configuration saved to {}", store.config_file().display())?;
    writeln!(
        out,
        "\nYou can now use ga-cli commands without specifying credentials"
    )?;
    Ok(())
}

pub fn show(store: &CredentialStore, out: &mut impl Write) -> CliResult<()> {
    match store.persisted_path()? {
        Some(path) => {
            writeln!(out, "Configuration:")?;
            writeln!(out, "  Credentials: {}", path.display())?;
            writeln!(out, "  Config file: {}", store.config_file().display())?;
        }
        None => {
            writeln!(out, "No configuration found. Run 'ga-cli config init' to set up.")?;
        }
    }
    Ok(())
}
