//! Invoice intake: client-side drafts awaiting submission.
//!
//! This crate holds the draft set behind the intake table: field validation at
//! the edit boundary, local PDF attachments with preview handles, the base64
//! attachment codec used for durable storage, and the amount display rules of
//! the purchase bar. It performs no network IO.

pub mod amount;
pub mod attachment;
pub mod codec;
pub mod draft;
pub mod persistence;
pub mod preview;
pub mod store;
pub mod validation;

pub use amount::{format_amount, format_decimal, is_valid_amount_input, parse_amount};
pub use attachment::{
    AttachOutcome, Attachment, AttachmentPayload, AttachmentPolicy, IncomingFile, RejectedFile,
    RejectionReason,
};
pub use codec::{CodecError, StoredAttachment};
pub use draft::{DraftField, InvoiceDraft, PaymentStatus};
pub use persistence::DRAFTS_KEY;
pub use preview::{PreviewHandle, PreviewRegistry};
pub use store::{DraftStore, PersistError, PreviewContent, PurchaseSummary, Snapshot};
