//! Theme state: design settings plus light/dark mode.
//!
//! [`ThemeContext`] wires the [`DesignStore`] to the [`ThemeModeController`]
//! so the controller always knows the admin's current default mode, and
//! renders the stylesheet from both.

pub mod mode;
pub mod stylesheet;

pub use mode::{ModeState, ThemeMode, ThemeModeController};
pub use stylesheet::{Palette, palette, root_classes};

use std::sync::Arc;

use tracing::instrument;

use schoolhouse_core::{DesignSettings, RawDesignSettings};

use crate::api::{self, ApiClient, ApiError};
use crate::design::{DesignStore, Subscription};
use crate::storage::KeyValueStore;

/// Design settings and mode for one client.
///
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct ThemeContext {
    inner: Arc<ThemeContextInner>,
}

#[derive(Debug)]
struct ThemeContextInner {
    design: DesignStore,
    mode: ThemeModeController,
    _admin_default: Subscription,
}

impl ThemeContext {
    /// Load persisted settings and override from `storage`.
    #[must_use]
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let design = DesignStore::load(Arc::clone(&storage));
        let mode = ThemeModeController::new(storage, design.get_settings().default_mode);

        let follower = mode.clone();
        let admin_default = design.subscribe(move |settings| {
            follower.set_admin_default(settings.default_mode);
        });

        Self {
            inner: Arc::new(ThemeContextInner {
                design,
                mode,
                _admin_default: admin_default,
            }),
        }
    }

    #[must_use]
    pub fn design(&self) -> &DesignStore {
        &self.inner.design
    }

    #[must_use]
    pub fn mode(&self) -> &ThemeModeController {
        &self.inner.mode
    }

    /// Stylesheet for the current settings and mode.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn stylesheet(&self) -> Result<String, askama::Error> {
        stylesheet::render(&self.design().get_settings(), self.mode().snapshot().mode())
    }

    #[must_use]
    pub fn root_classes(&self) -> String {
        root_classes(&self.design().get_settings(), self.mode().snapshot().mode())
    }

    /// Fetch the admin settings from the backend and apply them.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`]; the current settings stay in place.
    #[instrument(skip(self, api))]
    pub async fn sync(&self, api: &ApiClient) -> Result<DesignSettings, ApiError> {
        let raw = api::design::fetch_design_settings(api).await?;
        Ok(self.design().apply(&raw))
    }

    /// Save settings as an administrator, then apply what the backend kept.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`]; nothing is applied on failure.
    #[instrument(skip(self, api, raw))]
    pub async fn publish(
        &self,
        api: &ApiClient,
        raw: &RawDesignSettings,
    ) -> Result<DesignSettings, ApiError> {
        let stored = api::design::save_design_settings(api, raw).await?;
        Ok(self.design().apply(&stored))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use schoolhouse_core::ColorMode;

    use super::*;
    use crate::storage::MemoryStore;

    fn dark_default() -> RawDesignSettings {
        RawDesignSettings {
            default_mode: Some("dark".to_string()),
            ..RawDesignSettings::default()
        }
    }

    #[test]
    fn test_mode_follows_admin_default_updates() {
        let theme = ThemeContext::load(Arc::new(MemoryStore::new()));
        assert!(!theme.mode().snapshot().is_dark_mode);

        theme.design().apply(&dark_default());
        assert!(theme.mode().snapshot().is_dark_mode);
        assert!(theme.stylesheet().unwrap().contains("color-scheme: dark;"));
    }

    #[test]
    fn test_override_beats_later_admin_default() {
        let theme = ThemeContext::load(Arc::new(MemoryStore::new()));
        theme.mode().set_theme(ColorMode::Light);

        theme.design().apply(&dark_default());
        let mode = theme.mode().snapshot();
        assert!(!mode.is_dark_mode);
        assert!(mode.is_user_override);

        let reset = theme.mode().reset_to_admin_default();
        assert!(reset.is_dark_mode);
    }

    #[test]
    fn test_reload_uses_persisted_admin_default() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        ThemeContext::load(Arc::clone(&storage))
            .design()
            .apply(&dark_default());

        let reloaded = ThemeContext::load(storage);
        assert_eq!(reloaded.mode().admin_default(), ColorMode::Dark);
        assert_eq!(reloaded.root_classes(), "theme-modern dark");
    }
}
