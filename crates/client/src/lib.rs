//! Schoolhouse Client - front-end state for the school portal.
//!
//! This crate holds the cross-cutting state every portal view relies on:
//!
//! - [`design`] - admin design settings with subscriptions
//! - [`theme`] - light/dark mode state machine and stylesheet rendering
//! - [`auth`] - session, login/logout, view gate and the auth-lost signal
//! - [`api`] - REST client for the school backend
//! - [`timers`] - carousel auto-advance and current-period polling
//! - [`scope`] - dropping async results for unmounted views
//! - [`storage`] - `localStorage`-style persistence
//!
//! [`PortalState`] bundles one instance of each for a running client.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod config;
pub mod design;
pub mod error;
pub mod routes;
pub mod scope;
pub mod state;
pub mod storage;
pub mod theme;
pub mod timers;

pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use state::PortalState;
