//! Design settings commands.
//!
//! # Usage
//!
//! ```bash
//! # Pull the admin settings from the backend
//! schoolhouse settings sync
//!
//! # Save new settings (admin only)
//! schoolhouse settings push design.json
//! ```

use std::io::Write;
use std::path::Path;

use schoolhouse_client::{ClientError, PortalState};
use schoolhouse_core::{DesignSettings, RawDesignSettings};

use super::CommandError;

fn print_summary(settings: &DesignSettings, out: &mut impl Write) -> Result<(), CommandError> {
    writeln!(
        out,
        "Applied {} theme, {} default, primary {}",
        settings.theme, settings.default_mode, settings.primary_color
    )?;
    Ok(())
}

pub async fn sync(portal: &PortalState, out: &mut impl Write) -> Result<(), CommandError> {
    portal.api().session().load_persisted();
    let settings = portal.theme().sync(portal.api()).await?;
    print_summary(&settings, out)
}

pub async fn push(
    portal: &PortalState,
    path: &Path,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CommandError::SettingsFile {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawDesignSettings =
        serde_json::from_str(&contents).map_err(|source| CommandError::SettingsJson {
            path: path.to_path_buf(),
            source,
        })?;

    if !portal.api().session().load_persisted() {
        return Err(ClientError::NotLoggedIn.into());
    }

    let settings = portal.theme().publish(portal.api(), &raw).await?;
    print_summary(&settings, out)
}
