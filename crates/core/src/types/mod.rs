//! Core types for the school portal client.
//!
//! Type-safe wrappers for identities, roles and admin design settings.

pub mod design;
pub mod id;
pub mod period;
pub mod role;
pub mod user;

pub use design::{ColorMode, DesignSettings, RawDesignSettings, ShadowStyle, ThemeName};
pub use id::*;
pub use period::CurrentPeriod;
pub use role::{DEFAULT_DESTINATION, Section, UserRole, destination_for};
pub use user::AuthUser;
