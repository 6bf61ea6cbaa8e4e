//! CSS custom properties for the current theme.

use askama::Template;

use schoolhouse_core::{ColorMode, DesignSettings, ThemeName};

/// Surface colors for one theme in one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg_primary: &'static str,
    pub bg_secondary: &'static str,
    pub text_primary: &'static str,
    pub border_color: &'static str,
}

/// Surface colors for a theme and mode.
#[must_use]
pub const fn palette(theme: ThemeName, mode: ColorMode) -> Palette {
    match (theme, mode) {
        (ThemeName::Modern, ColorMode::Light) => Palette {
            bg_primary: "#FFFFFF",
            bg_secondary: "#F3F4F6",
            text_primary: "#111827",
            border_color: "#E5E7EB",
        },
        (ThemeName::Modern, ColorMode::Dark) => Palette {
            bg_primary: "#111827",
            bg_secondary: "#1F2937",
            text_primary: "#F9FAFB",
            border_color: "#374151",
        },
        (ThemeName::Classic, ColorMode::Light) => Palette {
            bg_primary: "#FDFBF7",
            bg_secondary: "#F1EDE4",
            text_primary: "#2D2A26",
            border_color: "#D6CFC2",
        },
        (ThemeName::Classic, ColorMode::Dark) => Palette {
            bg_primary: "#1C1A17",
            bg_secondary: "#2A2723",
            text_primary: "#EDE8DF",
            border_color: "#4A453D",
        },
        (ThemeName::Premium, ColorMode::Light) => Palette {
            bg_primary: "#FAFAFF",
            bg_secondary: "#EEF0FB",
            text_primary: "#1E1B4B",
            border_color: "#C7CBEA",
        },
        (ThemeName::Premium, ColorMode::Dark) => Palette {
            bg_primary: "#0F0D1F",
            bg_secondary: "#1B1838",
            text_primary: "#EEF0FB",
            border_color: "#34306A",
        },
    }
}

#[derive(Template)]
#[template(path = "theme.css", escape = "none")]
struct ThemeStylesheet<'a> {
    theme: &'a str,
    mode: &'a str,
    primary_color: &'a str,
    font_family: &'a str,
    palette: Palette,
    border_radius: &'a str,
    shadow: &'a str,
    animations_enabled: bool,
}

/// Render the `:root` stylesheet for `settings` in `mode`.
///
/// # Errors
///
/// Returns an error if template rendering fails.
pub fn render(settings: &DesignSettings, mode: ColorMode) -> Result<String, askama::Error> {
    ThemeStylesheet {
        theme: settings.theme.as_str(),
        mode: mode.label(),
        primary_color: &settings.primary_color,
        font_family: &settings.font_family,
        palette: palette(settings.theme, mode),
        border_radius: &settings.border_radius,
        shadow: settings.shadow_style.css(),
        animations_enabled: settings.animations_enabled,
    }
    .render()
}

/// Classes for the document root element, e.g. `theme-modern dark`.
#[must_use]
pub fn root_classes(settings: &DesignSettings, mode: ColorMode) -> String {
    let mut classes = format!("theme-{} {}", settings.theme, mode.label());
    if !settings.animations_enabled {
        classes.push_str(" no-animations");
    }
    classes
}
