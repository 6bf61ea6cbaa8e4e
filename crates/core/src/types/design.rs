//! Admin-configured design settings.
//!
//! The backend stores whatever the settings form submitted, so the wire shape
//! ([`RawDesignSettings`]) is loose: every field is optional and string-typed.
//! [`DesignSettings::normalize`] is the only way to turn it into the strict
//! shape the rest of the client consumes. Invalid or missing values fall back
//! to the documented defaults field by field.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Fallback primary color.
pub const DEFAULT_PRIMARY_COLOR: &str = "#3B82F6";
/// Fallback font stack.
pub const DEFAULT_FONT_FAMILY: &str = "Inter, system-ui, sans-serif";
/// Fallback corner radius.
pub const DEFAULT_BORDER_RADIUS: &str = "0.5rem";

/// Named visual theme selected by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeName {
    #[default]
    Modern,
    Classic,
    Premium,
}

impl ThemeName {
    /// Parse a theme name, ignoring case. Unknown names yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "modern" => Some(Self::Modern),
            "classic" => Some(Self::Classic),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::Classic => "classic",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Light or dark color mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    Light,
    Dark,
}

impl ColorMode {
    /// Parse `"light"` or `"dark"`, ignoring case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// The other mode.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    #[must_use]
    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    /// Label used for the root class toggle and in persisted values.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl From<bool> for ColorMode {
    fn from(is_dark: bool) -> Self {
        if is_dark { Self::Dark } else { Self::Light }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Box-shadow intensity token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowStyle {
    None,
    Subtle,
    #[default]
    Medium,
    Strong,
}

impl ShadowStyle {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" | "flat" => Some(Self::None),
            "subtle" | "small" | "sm" => Some(Self::Subtle),
            "medium" | "md" => Some(Self::Medium),
            "strong" | "large" | "lg" => Some(Self::Strong),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Subtle => "subtle",
            Self::Medium => "medium",
            Self::Strong => "strong",
        }
    }

    /// CSS `box-shadow` value for this token.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Subtle => "0 1px 2px rgba(0, 0, 0, 0.05)",
            Self::Medium => "0 4px 6px rgba(0, 0, 0, 0.1)",
            Self::Strong => "0 10px 25px rgba(0, 0, 0, 0.2)",
        }
    }
}

/// Design settings exactly as the backend returns them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawDesignSettings {
    #[serde(alias = "primary_color")]
    pub primary_color: Option<String>,
    #[serde(alias = "font_family", alias = "typography")]
    pub font_family: Option<String>,
    #[serde(alias = "themeName")]
    pub theme: Option<String>,
    #[serde(alias = "border_radius")]
    pub border_radius: Option<String>,
    #[serde(alias = "shadow_style")]
    pub shadow_style: Option<String>,
    #[serde(alias = "animations_enabled", alias = "animations")]
    pub animations_enabled: Option<bool>,
    #[serde(alias = "default_mode", alias = "defaultTheme")]
    pub default_mode: Option<String>,
}

/// Validated design settings.
///
/// Every field holds a usable value; consumers never need to guard against
/// missing or malformed entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignSettings {
    /// Primary brand color as a `#RGB`, `#RRGGBB` or `#RRGGBBAA` hex string.
    pub primary_color: String,
    pub font_family: String,
    pub theme: ThemeName,
    /// CSS length for corner rounding.
    pub border_radius: String,
    pub shadow_style: ShadowStyle,
    pub animations_enabled: bool,
    /// Mode visitors see until they pick one themselves.
    pub default_mode: ColorMode,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            primary_color: DEFAULT_PRIMARY_COLOR.to_owned(),
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            theme: ThemeName::default(),
            border_radius: DEFAULT_BORDER_RADIUS.to_owned(),
            shadow_style: ShadowStyle::default(),
            animations_enabled: true,
            default_mode: ColorMode::default(),
        }
    }
}

impl DesignSettings {
    /// Build validated settings from the backend shape.
    ///
    /// Each field is checked on its own; one bad value does not discard the
    /// rest of the configuration.
    #[must_use]
    pub fn normalize(raw: &RawDesignSettings) -> Self {
        let defaults = Self::default();

        Self {
            primary_color: raw
                .primary_color
                .as_deref()
                .and_then(normalize_hex_color)
                .unwrap_or(defaults.primary_color),
            font_family: raw
                .font_family
                .as_deref()
                .and_then(normalize_font_family)
                .unwrap_or(defaults.font_family),
            theme: raw
                .theme
                .as_deref()
                .and_then(ThemeName::parse)
                .unwrap_or(defaults.theme),
            border_radius: raw
                .border_radius
                .as_deref()
                .and_then(normalize_radius)
                .unwrap_or(defaults.border_radius),
            shadow_style: raw
                .shadow_style
                .as_deref()
                .and_then(ShadowStyle::parse)
                .unwrap_or(defaults.shadow_style),
            animations_enabled: raw.animations_enabled.unwrap_or(defaults.animations_enabled),
            default_mode: raw
                .default_mode
                .as_deref()
                .and_then(ColorMode::parse)
                .unwrap_or(defaults.default_mode),
        }
    }
}

impl From<&DesignSettings> for RawDesignSettings {
    fn from(settings: &DesignSettings) -> Self {
        Self {
            primary_color: Some(settings.primary_color.clone()),
            font_family: Some(settings.font_family.clone()),
            theme: Some(settings.theme.to_string()),
            border_radius: Some(settings.border_radius.clone()),
            shadow_style: Some(settings.shadow_style.as_str().to_owned()),
            animations_enabled: Some(settings.animations_enabled),
            default_mode: Some(settings.default_mode.to_string()),
        }
    }
}

/// Accept `#RGB`, `#RRGGBB` or `#RRGGBBAA`; the leading `#` is optional.
/// Returns the color uppercased with a `#` prefix.
fn normalize_hex_color(raw: &str) -> Option<String> {
    let digits = raw.trim().trim_start_matches('#');
    let valid_len = matches!(digits.len(), 3 | 6 | 8);
    if !valid_len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("#{}", digits.to_ascii_uppercase()))
}

fn normalize_font_family(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    // Braces and semicolons would escape the custom property declaration.
    if trimmed.is_empty() || trimmed.contains(['{', '}', ';', '<', '>']) {
        return None;
    }
    Some(trimmed.to_owned())
}

/// Accept a named token or a plain CSS length (`8px`, `0.75rem`, `50%`, `0`).
fn normalize_radius(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_ascii_lowercase();
    let named = match trimmed.as_str() {
        "none" => Some("0"),
        "small" | "sm" => Some("0.25rem"),
        "medium" | "md" => Some("0.5rem"),
        "large" | "lg" => Some("1rem"),
        "full" | "pill" => Some("9999px"),
        _ => None,
    };
    if let Some(value) = named {
        return Some(value.to_owned());
    }

    if trimmed == "0" {
        return Some(trimmed);
    }

    let unit_start = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(unit_start);
    let number_ok = !number.is_empty() && number.parse::<f64>().is_ok();
    let unit_ok = matches!(unit, "px" | "rem" | "em" | "%");
    (number_ok && unit_ok).then_some(trimmed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_raw_settings_yield_defaults() {
        let settings = DesignSettings::normalize(&RawDesignSettings::default());
        assert_eq!(settings, DesignSettings::default());
        assert_eq!(settings.primary_color, "#3B82F6");
        assert_eq!(settings.theme, ThemeName::Modern);
    }

    #[test]
    fn test_bad_fields_fall_back_individually() {
        let raw = RawDesignSettings {
            primary_color: Some("not-a-color".to_string()),
            font_family: Some("Georgia, serif".to_string()),
            theme: Some("brutalist".to_string()),
            border_radius: Some("12px".to_string()),
            shadow_style: Some("LARGE".to_string()),
            animations_enabled: Some(false),
            default_mode: Some("Dark".to_string()),
        };

        let settings = DesignSettings::normalize(&raw);
        assert_eq!(settings.primary_color, DEFAULT_PRIMARY_COLOR);
        assert_eq!(settings.font_family, "Georgia, serif");
        assert_eq!(settings.theme, ThemeName::Modern);
        assert_eq!(settings.border_radius, "12px");
        assert_eq!(settings.shadow_style, ShadowStyle::Strong);
        assert!(!settings.animations_enabled);
        assert_eq!(settings.default_mode, ColorMode::Dark);
    }

    #[test]
    fn test_hex_color_normalization() {
        assert_eq!(normalize_hex_color("#1e40af").unwrap(), "#1E40AF");
        assert_eq!(normalize_hex_color("fff").unwrap(), "#FFF");
        assert_eq!(normalize_hex_color("#11223344").unwrap(), "#11223344");
        assert!(normalize_hex_color("#12345").is_none());
        assert!(normalize_hex_color("#GGGGGG").is_none());
        assert!(normalize_hex_color("").is_none());
    }

    #[test]
    fn test_font_family_rejects_css_injection() {
        assert!(normalize_font_family("Arial; } body { display: none").is_none());
        assert!(normalize_font_family("   ").is_none());
    }

    #[test]
    fn test_radius_tokens_and_lengths() {
        assert_eq!(normalize_radius("full").unwrap(), "9999px");
        assert_eq!(normalize_radius("0").unwrap(), "0");
        assert_eq!(normalize_radius("0.75rem").unwrap(), "0.75rem");
        assert_eq!(normalize_radius("50%").unwrap(), "50%");
        assert!(normalize_radius("12").is_none());
        assert!(normalize_radius("px").is_none());
        assert!(normalize_radius("calc(1px)").is_none());
    }

    #[test]
    fn test_raw_settings_accept_backend_aliases() {
        let raw: RawDesignSettings = serde_json::from_str(
            r##"{"primary_color":"#10B981","typography":"Roboto","themeName":"premium","animations":false}"##,
        )
        .unwrap();

        let settings = DesignSettings::normalize(&raw);
        assert_eq!(settings.primary_color, "#10B981");
        assert_eq!(settings.font_family, "Roboto");
        assert_eq!(settings.theme, ThemeName::Premium);
        assert!(!settings.animations_enabled);
    }

    #[test]
    fn test_settings_survive_raw_conversion() {
        let settings = DesignSettings {
            theme: ThemeName::Classic,
            shadow_style: ShadowStyle::Subtle,
            default_mode: ColorMode::Dark,
            ..DesignSettings::default()
        };

        let raw = RawDesignSettings::from(&settings);
        assert_eq!(DesignSettings::normalize(&raw), settings);
    }

    #[test]
    fn test_color_mode_helpers() {
        assert_eq!(ColorMode::Light.opposite(), ColorMode::Dark);
        assert!(ColorMode::from(true).is_dark());
        assert_eq!(ColorMode::parse(" DARK "), Some(ColorMode::Dark));
        assert_eq!(ColorMode::parse("sepia"), None);
    }
}
