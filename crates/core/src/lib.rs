//! Schoolhouse Core - Shared types library.
//!
//! This crate provides the types shared by the school portal components:
//! - `client` - Theme, session and timer state for the portal front-end
//! - `cli` - Command-line front-end over the client library
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage,
//! no HTTP clients. Anything that touches the backend or local storage lives
//! in the client crate.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, user roles, design settings and timetable periods

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
