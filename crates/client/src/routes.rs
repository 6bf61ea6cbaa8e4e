//! Fixed client routes.
//!
//! Role dashboards live on [`schoolhouse_core::UserRole::destination`].

/// Application entry point; where a forced re-login lands.
pub const ENTRY: &str = "/";

/// Login form.
pub const LOGIN: &str = "/login";
