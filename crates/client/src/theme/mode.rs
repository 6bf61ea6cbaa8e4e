//! Light/dark mode with admin-default vs. user-override precedence.
//!
//! The controller is a two-state machine:
//!
//! ```text
//!                toggle / set_theme
//!  AdminDefault ───────────────────▶ UserOverride(mode)
//!       ▲                               │  ▲
//!       │  reset_to_admin_default       │  │ toggle / set_theme
//!       └───────────────────────────────┘  └──┘
//! ```
//!
//! An active override wins over the admin default, including when the admin
//! default changes later. Only [`ThemeModeController::reset_to_admin_default`]
//! returns to following the administrator.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use schoolhouse_core::ColorMode;

use crate::storage::{KeyValueStore, get_json, keys, set_json};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeState {
    /// Follow the admin-configured mode.
    AdminDefault,
    /// The visitor picked this mode.
    UserOverride(ColorMode),
}

/// What theme consumers read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeMode {
    pub is_dark_mode: bool,
    /// `"dark"` or `"light"`.
    pub theme: &'static str,
    pub is_user_override: bool,
}

impl ThemeMode {
    #[must_use]
    pub const fn mode(self) -> ColorMode {
        if self.is_dark_mode {
            ColorMode::Dark
        } else {
            ColorMode::Light
        }
    }
}

/// Persisted form of an override.
#[derive(Debug, Serialize, Deserialize)]
struct StoredOverride {
    mode: ColorMode,
}

#[derive(Debug, Clone, Copy)]
struct ModeCell {
    admin_default: ColorMode,
    state: ModeState,
}

impl ModeCell {
    const fn effective(self) -> ColorMode {
        match self.state {
            ModeState::AdminDefault => self.admin_default,
            ModeState::UserOverride(mode) => mode,
        }
    }

    const fn snapshot(self) -> ThemeMode {
        let mode = self.effective();
        ThemeMode {
            is_dark_mode: mode.is_dark(),
            theme: mode.label(),
            is_user_override: matches!(self.state, ModeState::UserOverride(_)),
        }
    }
}

/// Shared handle to the mode state machine.
#[derive(Clone)]
pub struct ThemeModeController {
    inner: Arc<ThemeModeInner>,
}

struct ThemeModeInner {
    storage: Arc<dyn KeyValueStore>,
    cell: RwLock<ModeCell>,
    changes: watch::Sender<ThemeMode>,
}

impl std::fmt::Debug for ThemeModeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeModeController")
            .field("cell", &*self.read())
            .finish()
    }
}

impl ThemeModeController {
    /// Create a controller following `admin_default`, restoring any override
    /// left in storage by a previous run.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, admin_default: ColorMode) -> Self {
        let state = get_json::<StoredOverride>(storage.as_ref(), keys::THEME_OVERRIDE)
            .map_or(ModeState::AdminDefault, |stored| {
                ModeState::UserOverride(stored.mode)
            });
        if let ModeState::UserOverride(mode) = state {
            tracing::debug!(%mode, "Restored theme override");
        }

        let cell = ModeCell {
            admin_default,
            state,
        };
        let (changes, _) = watch::channel(cell.snapshot());

        Self {
            inner: Arc::new(ThemeModeInner {
                storage,
                cell: RwLock::new(cell),
                changes,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ModeCell> {
        self.inner.cell.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModeCell> {
        self.inner.cell.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current mode as consumers see it.
    #[must_use]
    pub fn snapshot(&self) -> ThemeMode {
        self.read().snapshot()
    }

    #[must_use]
    pub fn state(&self) -> ModeState {
        self.read().state
    }

    #[must_use]
    pub fn admin_default(&self) -> ColorMode {
        self.read().admin_default
    }

    /// Receiver that yields every change of the effective mode.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ThemeMode> {
        self.inner.changes.subscribe()
    }

    fn transition(&self, update: impl FnOnce(&mut ModeCell)) -> ThemeMode {
        let snapshot = {
            let mut cell = self.write();
            update(&mut cell);
            cell.snapshot()
        };
        self.inner.changes.send_if_modified(|current| {
            let changed = *current != snapshot;
            *current = snapshot;
            changed
        });
        snapshot
    }

    /// Switch to the opposite of the current mode as a user override.
    pub fn toggle_theme(&self) -> ThemeMode {
        let next = self.read().effective().opposite();
        self.set_theme(next)
    }

    /// Select `mode` as a user override.
    pub fn set_theme(&self, mode: ColorMode) -> ThemeMode {
        if let Err(e) = set_json(
            self.inner.storage.as_ref(),
            keys::THEME_OVERRIDE,
            &StoredOverride { mode },
        ) {
            tracing::warn!(error = %e, "Failed to persist theme override");
        }
        tracing::debug!(%mode, "Theme override set");
        self.transition(|cell| cell.state = ModeState::UserOverride(mode))
    }

    /// Drop the user override and follow the admin default again.
    pub fn reset_to_admin_default(&self) -> ThemeMode {
        if let Err(e) = self.inner.storage.remove(keys::THEME_OVERRIDE) {
            tracing::warn!(error = %e, "Failed to remove theme override");
        }
        tracing::debug!("Theme override cleared");
        self.transition(|cell| cell.state = ModeState::AdminDefault)
    }

    /// Record a new admin default. An active override is left alone.
    pub fn set_admin_default(&self, mode: ColorMode) -> ThemeMode {
        self.transition(|cell| cell.admin_default = mode)
    }
}
