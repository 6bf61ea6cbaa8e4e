//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! # Log in (password from SCHOOLHOUSE_PASSWORD or the flag)
//! schoolhouse login -u teacher@school.test
//!
//! # Show who is logged in
//! schoolhouse whoami
//!
//! # Log out
//! schoolhouse logout
//! ```

use std::io::Write;

use schoolhouse_client::api::auth::LoginCredentials;
use schoolhouse_client::auth::{AuthLostModal, GateView};
use schoolhouse_client::{PortalState, routes};

use super::CommandError;

/// Log in and print the dashboard the user lands on.
pub async fn login(
    portal: &PortalState,
    identifier: &str,
    password: String,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let credentials = LoginCredentials::new(identifier, password);

    let outcome = match portal.auth().login(&credentials).await {
        Ok(outcome) => outcome,
        Err(e) => {
            writeln!(out, "{}", e.user_message())?;
            return Err(e.into());
        }
    };

    writeln!(out, "Logged in as {} ({})", outcome.user.name, outcome.user.role)?;
    writeln!(out, "Destination: {}", outcome.destination)?;
    Ok(())
}

/// Log out, telling the backend when there is a stored token.
pub async fn logout(portal: &PortalState, out: &mut impl Write) -> Result<(), CommandError> {
    portal.api().session().load_persisted();
    portal.auth().logout().await;
    writeln!(out, "Logged out")?;
    Ok(())
}

/// Print the current user after validating the stored session.
pub async fn whoami(portal: &PortalState, out: &mut impl Write) -> Result<(), CommandError> {
    portal.auth().restore().await;

    match portal.auth().gate() {
        GateView::Protected(user) => {
            writeln!(out, "{} ({})", user.name, user.role)?;
            if let Some(email) = &user.email {
                writeln!(out, "Email: {email}")?;
            }
            writeln!(out, "Dashboard: {}", user.destination())?;
        }
        GateView::SessionLost { message } => writeln!(out, "{message}")?,
        GateView::Unauthenticated => {
            writeln!(out, "Not logged in (log in at {})", routes::LOGIN)?;
        }
        GateView::Loading => writeln!(out, "Session is still loading")?,
    }
    Ok(())
}

/// Answer a raised auth-lost signal the only way a terminal can: drop the
/// stored session and tell the user to log in again.
///
/// Returns whether the signal was up.
pub fn answer_auth_lost(
    modal: &AuthLostModal,
    out: &mut impl Write,
) -> Result<bool, CommandError> {
    let Some(message) = modal.message() else {
        return Ok(false);
    };

    let route = modal.relogin();
    writeln!(out, "{message}")?;
    writeln!(out, "Run `schoolhouse login` to continue (entry: {route})")?;
    Ok(true)
}
