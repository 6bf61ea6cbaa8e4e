//! Design settings endpoints.

use tracing::instrument;

use schoolhouse_core::RawDesignSettings;

use super::{ApiClient, ApiError};

const DESIGN_SETTINGS_PATH: &str = "/design-settings";

/// Fetch the admin-configured design settings.
///
/// Returns the raw backend shape; normalization happens in the store.
///
/// # Errors
///
/// See [`ApiError`].
#[instrument(skip(api))]
pub async fn fetch_design_settings(api: &ApiClient) -> Result<RawDesignSettings, ApiError> {
    let settings: Option<RawDesignSettings> = api.get(DESIGN_SETTINGS_PATH).await?;
    Ok(settings.unwrap_or_default())
}

/// Save design settings from the admin settings form.
///
/// Returns what the backend stored, which may differ from what was sent.
///
/// # Errors
///
/// Returns `ApiError::Forbidden` for non-admin users and
/// `ApiError::Validation` when the backend rejects a field.
#[instrument(skip(api, settings))]
pub async fn save_design_settings(
    api: &ApiClient,
    settings: &RawDesignSettings,
) -> Result<RawDesignSettings, ApiError> {
    api.put(DESIGN_SETTINGS_PATH, settings).await
}
