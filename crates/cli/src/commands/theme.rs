//! Theme commands. These only touch local storage.

use std::io::Write;

use schoolhouse_client::{ClientError, PortalState};
use schoolhouse_client::theme::{ModeState, ThemeMode};
use schoolhouse_core::ColorMode;

use super::CommandError;

fn print_mode(mode: ThemeMode, out: &mut impl Write) -> Result<(), CommandError> {
    let source = if mode.is_user_override {
        "your choice"
    } else {
        "admin default"
    };
    writeln!(out, "Mode: {} ({source})", mode.theme)?;
    Ok(())
}

/// Print the effective settings and mode.
pub fn show(portal: &PortalState, out: &mut impl Write) -> Result<(), CommandError> {
    let settings = portal.theme().design().get_settings();
    let controller = portal.theme().mode();

    writeln!(out, "Theme: {}", settings.theme)?;
    print_mode(controller.snapshot(), out)?;
    if let ModeState::UserOverride(_) = controller.state() {
        writeln!(out, "Admin default: {}", controller.admin_default())?;
    }
    writeln!(out, "Primary color: {}", settings.primary_color)?;
    writeln!(out, "Font: {}", settings.font_family)?;
    writeln!(out, "Radius: {}", settings.border_radius)?;
    writeln!(out, "Shadow: {}", settings.shadow_style.as_str())?;
    writeln!(
        out,
        "Animations: {}",
        if settings.animations_enabled { "on" } else { "off" }
    )?;
    writeln!(out, "Root classes: {}", portal.theme().root_classes())?;
    Ok(())
}

pub fn toggle(portal: &PortalState, out: &mut impl Write) -> Result<(), CommandError> {
    print_mode(portal.theme().mode().toggle_theme(), out)
}

pub fn set(
    portal: &PortalState,
    mode: ColorMode,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    print_mode(portal.theme().mode().set_theme(mode), out)
}

pub fn reset(portal: &PortalState, out: &mut impl Write) -> Result<(), CommandError> {
    print_mode(portal.theme().mode().reset_to_admin_default(), out)
}

/// Print the `:root` stylesheet.
pub fn css(portal: &PortalState, out: &mut impl Write) -> Result<(), CommandError> {
    let css = portal.theme().stylesheet().map_err(ClientError::from)?;
    writeln!(out, "{css}")?;
    Ok(())
}
