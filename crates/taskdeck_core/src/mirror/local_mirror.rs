//! Typed facade over the three mirror slots.
//!
//! # Invariants
//! - Lenient accessors never fail: storage or payload errors are logged at
//!   `warn` and replaced by the empty default.
//! - Payloads carry no schema version.

use crate::mirror::slot_store::{MemorySlotStore, MirrorError, MirrorResult, Slot, SlotStore};
use crate::model::profile::{Theme, UserProfile};
use crate::model::task::Task;
use log::warn;
use std::sync::Arc;

/// Last-known server state, mirrored locally.
#[derive(Clone)]
pub struct LocalMirror {
    store: Arc<dyn SlotStore>,
}

impl LocalMirror {
    pub fn new(store: Arc<dyn SlotStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySlotStore::new()))
    }

    /// Reads the task slot. A missing slot is an empty list.
    pub fn read_tasks(&self) -> MirrorResult<Vec<Task>> {
        match self.store.read_slot(Slot::Tasks)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn write_tasks(&self, tasks: &[Task]) -> MirrorResult<()> {
        let raw = serde_json::to_string(tasks)?;
        self.store.write_slot(Slot::Tasks, &raw)
    }

    /// Lenient task read; `[]` on failure.
    pub fn tasks(&self) -> Vec<Task> {
        self.read_tasks().unwrap_or_else(|err| {
            warn!("event=mirror_read module=mirror status=error slot=tasks error={err}");
            Vec::new()
        })
    }

    pub fn set_tasks(&self, tasks: &[Task]) {
        if let Err(err) = self.write_tasks(tasks) {
            warn!(
                "event=mirror_write module=mirror status=error slot=tasks count={} error={}",
                tasks.len(),
                err
            );
        }
    }

    pub fn profile(&self) -> Option<UserProfile> {
        let parsed = self
            .store
            .read_slot(Slot::UserProfile)
            .and_then(|raw| match raw {
                Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
                None => Ok(None),
            });
        parsed.unwrap_or_else(|err| {
            warn!("event=mirror_read module=mirror status=error slot=userProfile error={err}");
            None
        })
    }

    pub fn set_profile(&self, profile: &UserProfile) {
        let written = serde_json::to_string(profile)
            .map_err(MirrorError::from)
            .and_then(|raw| self.store.write_slot(Slot::UserProfile, &raw));
        if let Err(err) = written {
            warn!("event=mirror_write module=mirror status=error slot=userProfile error={err}");
        }
    }

    /// Stored theme, or `None` when nothing valid is stored.
    pub fn stored_theme(&self) -> Option<Theme> {
        match self.store.read_slot(Slot::Theme) {
            Ok(raw) => raw.as_deref().and_then(Theme::parse),
            Err(err) => {
                warn!("event=mirror_read module=mirror status=error slot=theme error={err}");
                None
            }
        }
    }

    /// Stored theme, defaulting to light.
    pub fn theme(&self) -> Theme {
        self.stored_theme().unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) {
        if let Err(err) = self.store.write_slot(Slot::Theme, theme.as_str()) {
            warn!("event=mirror_write module=mirror status=error slot=theme error={err}");
        }
    }

    /// Removes every slot. Used on sign-out.
    pub fn clear(&self) {
        for slot in Slot::ALL {
            if let Err(err) = self.store.remove_slot(slot) {
                warn!(
                    "event=mirror_clear module=mirror status=error slot={} error={}",
                    slot.key(),
                    err
                );
            }
        }
    }
}
