//! Timetable endpoints.

use reqwest::Method;
use tracing::instrument;

use schoolhouse_core::CurrentPeriod;

use super::{ApiClient, ApiError, OnAuthFailure};

const CURRENT_PERIOD_PATH: &str = "/periods/current";

/// Fetch the period in progress, or `None` outside lesson hours.
///
/// Used by background polling, so an auth failure is returned rather than
/// raising the auth-lost signal.
///
/// # Errors
///
/// See [`ApiError`].
#[instrument(skip(api))]
pub async fn fetch_current_period(api: &ApiClient) -> Result<Option<CurrentPeriod>, ApiError> {
    match api
        .request::<(), Option<CurrentPeriod>>(
            Method::GET,
            CURRENT_PERIOD_PATH,
            None,
            OnAuthFailure::ReturnError,
        )
        .await
    {
        Err(ApiError::NotFound(_)) => Ok(None),
        other => other,
    }
}
