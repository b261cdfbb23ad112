//! Stored representation of the draft set.
//!
//! The whole set is one JSON blob under [`DRAFTS_KEY`]:
//!
//! ```json
//! { "version": 1, "drafts": [ { "id": "...", "invoiceNumber": "...", "documents": [ ... ] } ] }
//! ```
//!
//! Reading is deliberately lenient: a malformed draft or attachment is dropped
//! on its own without failing the rest of the set.

use factordesk_core::{DraftId, Entity};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{self, StoredAttachment};
use crate::draft::{InvoiceDraft, PaymentStatus};

/// Storage key of the draft blob.
pub const DRAFTS_KEY: &str = "invoiceDrafts";

/// Current blob format version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredDraftSet<T> {
    pub version: u32,
    pub drafts: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredDraft {
    pub id: DraftId,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub po_number: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub documents: Vec<Value>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub payment_check: String,
    #[serde(default)]
    pub payment_date: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
}

impl StoredDraft {
    pub fn from_draft(draft: &InvoiceDraft) -> Result<Self, serde_json::Error> {
        let documents = draft
            .documents()
            .iter()
            .map(|doc| serde_json::to_value(codec::encode(doc.payload())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: *draft.id(),
            invoice_number: draft.invoice_number().to_string(),
            customer_name: draft.customer_name().to_string(),
            po_number: draft.po_number().to_string(),
            amount: draft.amount().to_string(),
            documents,
            notes: draft.notes().to_string(),
            customer_email: draft.customer_email().to_string(),
            customer_phone: draft.customer_phone().to_string(),
            payment_check: draft.payment_check().to_string(),
            payment_date: draft.payment_date().to_string(),
            payment_status: draft.payment_status(),
        })
    }

    /// Parse the attachments of this draft, skipping entries that are not
    /// attachment-shaped.
    pub fn stored_attachments(&self) -> Vec<StoredAttachment> {
        self.documents
            .iter()
            .filter_map(|value| match serde_json::from_value::<StoredAttachment>(value.clone()) {
                Ok(stored) => Some(stored),
                Err(err) => {
                    tracing::warn!(draft_id = %self.id, error = %err, "dropping malformed stored attachment");
                    None
                }
            })
            .collect()
    }
}

/// Serialize the draft set into the stored blob.
pub(crate) fn encode_drafts(drafts: &[InvoiceDraft]) -> Result<String, serde_json::Error> {
    let drafts = drafts
        .iter()
        .map(StoredDraft::from_draft)
        .collect::<Result<Vec<_>, _>>()?;

    serde_json::to_string(&StoredDraftSet {
        version: FORMAT_VERSION,
        drafts,
    })
}

/// Parse the stored blob into per-draft records.
///
/// Accepts the versioned envelope as well as a bare JSON array of drafts.
/// Returns `Err` only when the blob as a whole is not JSON of either shape.
pub(crate) fn decode_drafts(blob: &str) -> Result<Vec<StoredDraft>, serde_json::Error> {
    let root: Value = serde_json::from_str(blob)?;

    let raw_drafts = match root {
        Value::Array(items) => items,
        other => {
            let set: StoredDraftSet<Value> = serde_json::from_value(other)?;
            if set.version > FORMAT_VERSION {
                tracing::warn!(
                    version = set.version,
                    supported = FORMAT_VERSION,
                    "stored drafts use a newer format; loading what is readable"
                );
            }
            set.drafts
        }
    };

    let drafts = raw_drafts
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<StoredDraft>(value) {
            Ok(draft) => Some(draft),
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed stored draft");
                None
            }
        })
        .collect();

    Ok(drafts)
}
