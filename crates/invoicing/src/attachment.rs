//! Documents attached to invoice drafts.

use std::path::Path;

use anyhow::Context;
use factordesk_core::{AttachmentId, Entity};

use crate::preview::PreviewHandle;

pub const PDF_MIME: &str = "application/pdf";
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// The persistable part of an attachment: identity, name, type and bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPayload {
    pub id: AttachmentId,
    pub name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// A document held by a draft, together with its live preview handle.
#[derive(Debug, PartialEq, Eq)]
pub struct Attachment {
    payload: AttachmentPayload,
    preview: PreviewHandle,
}

impl Attachment {
    pub(crate) fn new(payload: AttachmentPayload, preview: PreviewHandle) -> Self {
        Self { payload, preview }
    }

    pub fn name(&self) -> &str {
        &self.payload.name
    }

    pub fn mime_type(&self) -> &str {
        &self.payload.mime_type
    }

    pub fn content(&self) -> &[u8] {
        &self.payload.content
    }

    pub fn size(&self) -> usize {
        self.payload.content.len()
    }

    pub fn payload(&self) -> &AttachmentPayload {
        &self.payload
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    pub(crate) fn into_parts(self) -> (AttachmentPayload, PreviewHandle) {
        (self.payload, self.preview)
    }
}

impl Entity for Attachment {
    type Id = AttachmentId;

    fn id(&self) -> &Self::Id {
        &self.payload.id
    }
}

/// A file handed to the store by a drop or a file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    /// Browser-reported type; may be empty.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk; the MIME type is derived from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read attachment {:?}", path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("attachment path {:?} has no file name", path))?;
        let mime_type = mime_for_name(&name).to_string();
        Ok(Self { name, mime_type, bytes })
    }

    /// Reported type, falling back to the extension when the reporter sent none.
    pub fn effective_mime(&self) -> String {
        let reported = self
            .mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if reported.is_empty() {
            mime_for_name(&self.name).to_string()
        } else {
            reported
        }
    }
}

/// Best-effort MIME type from a file name.
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => PDF_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        _ => FALLBACK_MIME,
    }
}

/// Which files a draft accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    /// `None` accepts any type.
    allowed_mime_types: Option<Vec<String>>,
    max_bytes: Option<usize>,
}

impl AttachmentPolicy {
    pub fn pdf_only() -> Self {
        Self {
            allowed_mime_types: Some(vec![PDF_MIME.to_string()]),
            max_bytes: None,
        }
    }

    pub fn unrestricted() -> Self {
        Self {
            allowed_mime_types: None,
            max_bytes: None,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    /// Check a file against the policy, returning the resolved MIME type.
    pub fn check(&self, file: &IncomingFile) -> Result<String, RejectionReason> {
        let mime = file.effective_mime();

        if let Some(allowed) = &self.allowed_mime_types {
            if !allowed.iter().any(|a| a.eq_ignore_ascii_case(&mime)) {
                return Err(RejectionReason::MimeType(mime));
            }
        }

        if let Some(max) = self.max_bytes {
            if file.bytes.len() > max {
                return Err(RejectionReason::TooLarge {
                    size: file.bytes.len(),
                    max,
                });
            }
        }

        Ok(mime)
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self::pdf_only()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    #[error("file type {0} is not accepted")]
    MimeType(String),

    #[error("file is {size} bytes; the limit is {max}")]
    TooLarge { size: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub name: String,
    pub reason: RejectionReason,
}

/// Result of [`attach_documents`](crate::DraftStore::attach_documents).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachOutcome {
    pub accepted: Vec<AttachmentId>,
    pub rejected: Vec<RejectedFile>,
}
