//! Theme preference store.
//!
//! # Invariants
//! - Every change is written to the local theme slot.
//! - The remote profile is updated only with a session and connectivity,
//!   and its failure is logged, never returned.

use crate::connectivity::Connectivity;
use crate::mirror::local_mirror::LocalMirror;
use crate::model::profile::{Theme, UserProfile};
use crate::remote::document_store::DocumentStore;
use crate::service::auth_service::Session;
use log::{debug, warn};
use std::sync::{Arc, Mutex, PoisonError};

/// Holds the light/dark preference.
pub struct ThemeStore {
    mirror: LocalMirror,
    store: Arc<dyn DocumentStore>,
    connectivity: Arc<dyn Connectivity>,
    current: Mutex<Theme>,
}

impl ThemeStore {
    pub fn new(
        mirror: LocalMirror,
        store: Arc<dyn DocumentStore>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        let current = mirror.theme();
        Self {
            mirror,
            store,
            connectivity,
            current: Mutex::new(current),
        }
    }

    /// Adopts the profile theme when a profile exists, otherwise the stored
    /// theme, otherwise light.
    pub fn load(&self, profile: Option<&UserProfile>) -> Theme {
        let theme = match profile {
            Some(profile) => profile.theme,
            None => self.mirror.theme(),
        };
        self.replace(theme);
        theme
    }

    pub fn current(&self) -> Theme {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flips the theme and returns the new value.
    pub fn toggle(&self, session: Option<&Session>) -> Theme {
        self.set(self.current().toggled(), session)
    }

    /// Applies `theme` locally and mirrors it to the remote profile when possible.
    pub fn set(&self, theme: Theme, session: Option<&Session>) -> Theme {
        self.replace(theme);
        self.mirror.set_theme(theme);

        match session {
            Some(session) if self.connectivity.is_online() => {
                if let Err(err) = self.store.update_theme(session.uid(), theme) {
                    warn!(
                        "event=theme_sync module=theme status=fallback uid={} theme={} error={}",
                        session.uid(),
                        theme.as_str(),
                        err
                    );
                }
            }
            _ => debug!(
                "event=theme_sync module=theme status=local_only theme={}",
                theme.as_str()
            ),
        }
        theme
    }

    fn replace(&self, theme: Theme) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = theme;
    }
}
