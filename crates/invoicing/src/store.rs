//! The invoice draft store.
//!
//! Owns the ordered draft set, the attachment preview handles and the link to
//! durable storage. All operations are synchronous. Every successful mutation
//! is followed by a write of the whole set; a failed write is logged and the
//! in-memory state stays authoritative for the session.

use std::collections::HashSet;
use std::sync::Arc;

use factordesk_core::{AttachmentId, DomainError, DomainResult, DraftId, Entity};
use factordesk_storage::{LocalStorage, StorageError};
use rust_decimal::Decimal;

use crate::amount::format_decimal;
use crate::attachment::{
    AttachOutcome, Attachment, AttachmentPayload, AttachmentPolicy, IncomingFile, RejectedFile,
};
use crate::codec;
use crate::draft::{DraftField, InvoiceDraft};
use crate::persistence::{self, DRAFTS_KEY, StoredDraft};
use crate::preview::PreviewRegistry;
use crate::validation::NOTES_MAX_CHARS;

/// Errors raised by an explicit [`DraftStore::persist`] call.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to serialize drafts: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Read-only, restartable view of the draft set in display order.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    drafts: &'a [InvoiceDraft],
}

impl<'a> Snapshot<'a> {
    pub fn iter(&self) -> std::slice::Iter<'a, InvoiceDraft> {
        self.drafts.iter()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

impl<'a> IntoIterator for Snapshot<'a> {
    type Item = &'a InvoiceDraft;
    type IntoIter = std::slice::Iter<'a, InvoiceDraft>;

    fn into_iter(self) -> Self::IntoIter {
        self.drafts.iter()
    }
}

/// Content behind a live preview handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewContent<'a> {
    pub draft_id: DraftId,
    pub attachment_id: AttachmentId,
    pub name: &'a str,
    pub mime_type: &'a str,
    pub content: &'a [u8],
}

/// Totals shown on the purchase bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseSummary {
    pub draft_count: usize,
    pub total: Decimal,
    pub formatted_total: String,
    pub generate_cover_pages: bool,
    /// "Submit purchase" is enabled.
    pub can_submit: bool,
    /// "Remove (n)" is enabled.
    pub can_remove: bool,
}

/// In-memory draft set mirrored to durable local storage.
#[derive(Debug)]
pub struct DraftStore {
    drafts: Vec<InvoiceDraft>,
    previews: PreviewRegistry,
    policy: AttachmentPolicy,
    storage: Arc<dyn LocalStorage>,
}

impl DraftStore {
    /// An empty store that has not read anything from storage.
    pub fn new(storage: Arc<dyn LocalStorage>, policy: AttachmentPolicy) -> Self {
        Self {
            drafts: Vec::new(),
            previews: PreviewRegistry::new(),
            policy,
            storage,
        }
    }

    /// Load the draft set once at session start.
    ///
    /// Never fails: unreadable storage or a corrupt blob yields an empty set,
    /// and bad records are dropped individually. Nothing is written back.
    pub fn hydrate(storage: Arc<dyn LocalStorage>, policy: AttachmentPolicy) -> Self {
        let mut store = Self::new(storage, policy);

        let blob = match store.storage.get(DRAFTS_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                tracing::debug!("no stored drafts");
                return store;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to read stored drafts; starting empty");
                return store;
            }
        };

        let stored = match persistence::decode_drafts(&blob) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::error!(error = %err, "stored drafts are unreadable; starting empty");
                return store;
            }
        };

        let mut seen = HashSet::new();
        for record in stored {
            if !seen.insert(record.id) {
                tracing::warn!(draft_id = %record.id, "dropping duplicate stored draft");
                continue;
            }
            let draft = store.restore_draft(record);
            store.drafts.push(draft);
        }

        tracing::info!(
            drafts = store.drafts.len(),
            previews = store.previews.live_count(),
            "drafts hydrated"
        );
        store
    }

    /// Rebuild one draft from storage, re-checking every field rule.
    fn restore_draft(&mut self, record: StoredDraft) -> InvoiceDraft {
        let id = record.id;
        let mut draft = InvoiceDraft::empty(id);

        draft.apply(DraftField::InvoiceNumber, &record.invoice_number);
        draft.apply(DraftField::CustomerName, &record.customer_name);
        draft.apply(DraftField::PoNumber, &record.po_number);
        draft.apply(DraftField::CustomerEmail, &record.customer_email);
        draft.apply(DraftField::PaymentCheck, &record.payment_check);
        draft.apply(DraftField::PaymentStatus, record.payment_status.as_str());

        if !draft.apply(DraftField::Amount, &record.amount) {
            tracing::warn!(draft_id = %id, amount = %record.amount, "dropping invalid stored amount");
        }
        if !draft.apply(DraftField::CustomerPhone, &record.customer_phone) {
            tracing::warn!(draft_id = %id, "dropping invalid stored phone number");
        }
        if !draft.apply(DraftField::PaymentDate, &record.payment_date) {
            tracing::warn!(draft_id = %id, date = %record.payment_date, "dropping invalid stored payment date");
        }
        if record.notes.chars().count() > NOTES_MAX_CHARS {
            tracing::warn!(draft_id = %id, "truncating stored notes");
        }
        draft.set_notes_truncated(&record.notes);

        let mut seen = HashSet::new();
        for stored in record.stored_attachments() {
            if !seen.insert(stored.id) {
                tracing::warn!(draft_id = %id, attachment_id = %stored.id, "dropping duplicate stored attachment");
                continue;
            }
            match codec::decode(&stored) {
                Ok(payload) => {
                    let preview = self.previews.acquire(id, payload.id);
                    draft.push_document(Attachment::new(payload, preview));
                }
                Err(err) => {
                    tracing::warn!(draft_id = %id, error = %err, "dropping undecodable attachment");
                }
            }
        }

        draft
    }

    /// Append a blank draft.
    pub fn create_draft(&mut self) -> DraftId {
        let id = DraftId::new();
        self.drafts.push(InvoiceDraft::empty(id));
        tracing::debug!(draft_id = %id, "draft created");
        self.sync();
        id
    }

    /// Remove a draft, releasing its preview handles first.
    pub fn delete_draft(&mut self, id: DraftId) -> DomainResult<()> {
        let index = self.position(id)?;
        let documents = self.drafts[index].take_documents();
        self.release_all(documents);
        self.drafts.remove(index);
        tracing::debug!(draft_id = %id, "draft deleted");
        self.sync();
        Ok(())
    }

    /// Clear the whole draft set.
    pub fn remove_all(&mut self) {
        let mut drafts = std::mem::take(&mut self.drafts);
        for draft in &mut drafts {
            let documents = draft.take_documents();
            self.release_all(documents);
        }
        tracing::debug!(removed = drafts.len(), "draft set cleared");
        self.sync();
    }

    /// Set one scalar field, subject to that field's rule.
    ///
    /// `Ok(false)` means the value was rejected and the previous one kept.
    /// Notes longer than the limit are rejected here; use
    /// [`set_notes`](Self::set_notes) to clip instead.
    pub fn update_field(&mut self, id: DraftId, field: DraftField, value: &str) -> DomainResult<bool> {
        let draft = self.draft_mut(id)?;
        if !draft.apply(field, value) {
            tracing::debug!(draft_id = %id, field = field.as_str(), "edit rejected");
            return Ok(false);
        }
        self.sync();
        Ok(true)
    }

    /// Set notes, clipping to the limit.
    pub fn set_notes(&mut self, id: DraftId, text: &str) -> DomainResult<()> {
        self.draft_mut(id)?.set_notes_truncated(text);
        self.sync();
        Ok(())
    }

    /// Attach the files the policy accepts; the rest are reported back.
    pub fn attach_documents(
        &mut self,
        id: DraftId,
        files: impl IntoIterator<Item = IncomingFile>,
    ) -> DomainResult<AttachOutcome> {
        let index = self.position(id)?;
        let mut outcome = AttachOutcome::default();

        for file in files {
            let mime_type = match self.policy.check(&file) {
                Ok(mime) => mime,
                Err(reason) => {
                    tracing::debug!(draft_id = %id, file = %file.name, %reason, "attachment rejected");
                    outcome.rejected.push(RejectedFile { name: file.name, reason });
                    continue;
                }
            };

            let payload = AttachmentPayload {
                id: AttachmentId::new(),
                name: file.name,
                mime_type,
                content: file.bytes,
            };
            let preview = self.previews.acquire(id, payload.id);
            outcome.accepted.push(payload.id);
            self.drafts[index].push_document(Attachment::new(payload, preview));
        }

        if !outcome.accepted.is_empty() {
            self.sync();
        }
        Ok(outcome)
    }

    /// Detach one document and release its preview handle.
    pub fn remove_document(&mut self, draft_id: DraftId, doc_id: AttachmentId) -> DomainResult<()> {
        let draft = self.draft_mut(draft_id)?;
        let attachment = draft
            .take_document(doc_id)
            .ok_or_else(|| DomainError::not_found(format!("attachment {doc_id}")))?;
        let (_, preview) = attachment.into_parts();
        self.previews.release(preview);
        self.sync();
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot { drafts: &self.drafts }
    }

    pub fn get(&self, id: DraftId) -> Option<&InvoiceDraft> {
        self.drafts.iter().find(|d| *d.id() == id)
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// Completeness of one draft; unknown ids are never complete.
    pub fn is_complete(&self, id: DraftId) -> bool {
        self.get(id).is_some_and(InvoiceDraft::is_complete)
    }

    /// Bulk submission gate: at least one draft, and every draft complete.
    pub fn can_submit(&self) -> bool {
        !self.drafts.is_empty() && self.drafts.iter().all(InvoiceDraft::is_complete)
    }

    /// Sum of all parsed amounts; blank or unparsable amounts count as zero.
    pub fn total_amount(&self) -> Decimal {
        self.drafts
            .iter()
            .filter_map(InvoiceDraft::parsed_amount)
            .fold(Decimal::ZERO, |total, amount| {
                total.checked_add(amount).unwrap_or_else(|| {
                    tracing::warn!("draft total overflowed; ignoring amount {amount}");
                    total
                })
            })
    }

    pub fn formatted_total(&self) -> String {
        format_decimal(self.total_amount())
    }

    pub fn purchase_summary(&self, generate_cover_pages: bool) -> PurchaseSummary {
        let total = self.total_amount();
        PurchaseSummary {
            draft_count: self.drafts.len(),
            total,
            formatted_total: format_decimal(total),
            generate_cover_pages,
            can_submit: self.can_submit(),
            can_remove: !self.drafts.is_empty(),
        }
    }

    /// Resolve a preview handle string to the document it shows.
    pub fn preview(&self, handle: &str) -> Option<PreviewContent<'_>> {
        let (draft_id, attachment_id) = self.previews.resolve(handle)?;
        let doc = self.get(draft_id)?.document(attachment_id)?;
        Some(PreviewContent {
            draft_id,
            attachment_id,
            name: doc.name(),
            mime_type: doc.mime_type(),
            content: doc.content(),
        })
    }

    /// Number of preview handles currently live.
    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    /// Write the whole draft set to storage.
    pub fn persist(&self) -> Result<(), PersistError> {
        let blob = persistence::encode_drafts(&self.drafts)?;
        self.storage.set(DRAFTS_KEY, &blob)?;
        Ok(())
    }

    /// Persist after a mutation; failures are logged, never raised.
    fn sync(&self) {
        if let Err(err) = self.persist() {
            tracing::error!(error = %err, "failed to persist drafts; keeping in-memory state");
        }
    }

    fn release_all(&mut self, documents: Vec<Attachment>) {
        for attachment in documents {
            let (_, preview) = attachment.into_parts();
            self.previews.release(preview);
        }
    }

    fn position(&self, id: DraftId) -> DomainResult<usize> {
        self.drafts
            .iter()
            .position(|d| *d.id() == id)
            .ok_or_else(|| DomainError::not_found(format!("draft {id}")))
    }

    fn draft_mut(&mut self, id: DraftId) -> DomainResult<&mut InvoiceDraft> {
        let index = self.position(id)?;
        Ok(&mut self.drafts[index])
    }
}
