//! Attachment codec for the persistence boundary.
//!
//! Bytes travel as standard base64 next to their name and MIME type. Preview
//! handles are never encoded; decoding yields a payload and the store mints a
//! fresh handle for it.

use base64::{engine::general_purpose::STANDARD, Engine};
use factordesk_core::AttachmentId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attachment::AttachmentPayload;

/// Persisted form of one attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAttachment {
    pub id: AttachmentId,
    pub name: String,
    pub mime_type: String,
    /// Base64-encoded content.
    pub data: String,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("attachment {name:?} has a corrupt payload: {source}")]
    InvalidPayload {
        name: String,
        #[source]
        source: base64::DecodeError,
    },
}

pub fn encode(payload: &AttachmentPayload) -> StoredAttachment {
    StoredAttachment {
        id: payload.id,
        name: payload.name.clone(),
        mime_type: payload.mime_type.clone(),
        data: STANDARD.encode(&payload.content),
    }
}

pub fn decode(stored: &StoredAttachment) -> Result<AttachmentPayload, CodecError> {
    let content = STANDARD
        .decode(stored.data.as_bytes())
        .map_err(|source| CodecError::InvalidPayload {
            name: stored.name.clone(),
            source,
        })?;

    Ok(AttachmentPayload {
        id: stored.id,
        name: stored.name.clone(),
        mime_type: stored.mime_type.clone(),
        content,
    })
}
