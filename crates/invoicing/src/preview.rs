//! Ephemeral preview handles for attachments.
//!
//! A handle lets the UI open an attachment without re-reading it from storage.
//! Handles are process-local: minted on attach or hydration, released exactly
//! once when the attachment (or its draft) goes away, and never persisted.

use std::collections::HashMap;

use factordesk_core::{AttachmentId, DraftId};
use uuid::Uuid;

const HANDLE_SCHEME: &str = "preview://";

/// Opaque reference to a live preview.
///
/// Deliberately not `Clone`: the attachment owns its handle and gives it up
/// to [`PreviewRegistry::release`], so a handle cannot be released twice.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner of every live preview handle, held by the draft store.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: HashMap<String, (DraftId, AttachmentId)>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new handle for an attachment.
    pub fn acquire(&mut self, draft_id: DraftId, attachment_id: AttachmentId) -> PreviewHandle {
        let handle = format!("{HANDLE_SCHEME}{}", Uuid::now_v7());
        self.live.insert(handle.clone(), (draft_id, attachment_id));
        tracing::trace!(%handle, %draft_id, %attachment_id, "preview acquired");
        PreviewHandle(handle)
    }

    /// Invalidate a handle. Returns `false` if the registry did not know it.
    pub fn release(&mut self, handle: PreviewHandle) -> bool {
        match self.live.remove(&handle.0) {
            Some(_) => {
                tracing::trace!(handle = %handle.0, "preview released");
                true
            }
            None => {
                tracing::warn!(handle = %handle.0, "release of unknown preview handle ignored");
                false
            }
        }
    }

    /// Resolve a handle string to the attachment it previews.
    pub fn resolve(&self, handle: &str) -> Option<(DraftId, AttachmentId)> {
        self.live.get(handle).copied()
    }

    pub fn is_live(&self, handle: &str) -> bool {
        self.live.contains_key(handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
