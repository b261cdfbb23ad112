//! Invoice draft entity and its field-level edit rules.

use std::str::FromStr;

use factordesk_core::{AttachmentId, DomainError, DraftId, Entity};
use serde::{Deserialize, Serialize};

use crate::amount::{is_valid_amount_input, parse_amount};
use crate::attachment::Attachment;
use crate::validation::{is_valid_phone, normalize_payment_date, notes_within_limit, truncate_notes};

/// Whether the purchase backing a draft has been processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unset,
    Processed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unset => "unset",
            PaymentStatus::Processed => "processed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "unset" => Ok(PaymentStatus::Unset),
            "processed" => Ok(PaymentStatus::Processed),
            other => Err(DomainError::validation(format!("unknown payment status {other:?}"))),
        }
    }
}

/// Scalar, user-editable fields of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    InvoiceNumber,
    CustomerName,
    PoNumber,
    Amount,
    Notes,
    CustomerEmail,
    CustomerPhone,
    PaymentCheck,
    PaymentDate,
    PaymentStatus,
}

impl DraftField {
    /// Form/storage key of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::InvoiceNumber => "invoiceNumber",
            DraftField::CustomerName => "customerName",
            DraftField::PoNumber => "poNumber",
            DraftField::Amount => "amount",
            DraftField::Notes => "notes",
            DraftField::CustomerEmail => "customerEmail",
            DraftField::CustomerPhone => "customerPhone",
            DraftField::PaymentCheck => "paymentCheck",
            DraftField::PaymentDate => "paymentDate",
            DraftField::PaymentStatus => "paymentStatus",
        }
    }
}

impl FromStr for DraftField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "invoiceNumber" => DraftField::InvoiceNumber,
            "customerName" => DraftField::CustomerName,
            "poNumber" => DraftField::PoNumber,
            "amount" => DraftField::Amount,
            "notes" => DraftField::Notes,
            "customerEmail" => DraftField::CustomerEmail,
            "customerPhone" => DraftField::CustomerPhone,
            "paymentCheck" => DraftField::PaymentCheck,
            "paymentDate" => DraftField::PaymentDate,
            "paymentStatus" => DraftField::PaymentStatus,
            other => return Err(DomainError::validation(format!("unknown draft field {other:?}"))),
        };
        Ok(field)
    }
}

/// An invoice being assembled before submission.
#[derive(Debug, PartialEq, Eq)]
pub struct InvoiceDraft {
    id: DraftId,
    invoice_number: String,
    customer_name: String,
    po_number: String,
    amount: String,
    documents: Vec<Attachment>,
    notes: String,
    customer_email: String,
    customer_phone: String,
    payment_check: String,
    payment_date: String,
    payment_status: PaymentStatus,
}

impl InvoiceDraft {
    /// A new, blank draft.
    pub fn empty(id: DraftId) -> Self {
        Self {
            id,
            invoice_number: String::new(),
            customer_name: String::new(),
            po_number: String::new(),
            amount: String::new(),
            documents: Vec::new(),
            notes: String::new(),
            customer_email: String::new(),
            customer_phone: String::new(),
            payment_check: String::new(),
            payment_date: String::new(),
            payment_status: PaymentStatus::Unset,
        }
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn po_number(&self) -> &str {
        &self.po_number
    }

    /// Raw amount as typed (no `$` or separators).
    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn documents(&self) -> &[Attachment] {
        &self.documents
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }

    pub fn customer_phone(&self) -> &str {
        &self.customer_phone
    }

    pub fn payment_check(&self) -> &str {
        &self.payment_check
    }

    /// Payment date as `YYYY-MM-DD`, or empty.
    pub fn payment_date(&self) -> &str {
        &self.payment_date
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Read a scalar field by name.
    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::InvoiceNumber => &self.invoice_number,
            DraftField::CustomerName => &self.customer_name,
            DraftField::PoNumber => &self.po_number,
            DraftField::Amount => &self.amount,
            DraftField::Notes => &self.notes,
            DraftField::CustomerEmail => &self.customer_email,
            DraftField::CustomerPhone => &self.customer_phone,
            DraftField::PaymentCheck => &self.payment_check,
            DraftField::PaymentDate => &self.payment_date,
            DraftField::PaymentStatus => self.payment_status.as_str(),
        }
    }

    /// Parsed amount; blank or unparsable amounts count as `None`.
    pub fn parsed_amount(&self) -> Option<rust_decimal::Decimal> {
        parse_amount(&self.amount)
    }

    /// Ready for submission: the four identifying fields are filled in and at
    /// least one document is attached.
    pub fn is_complete(&self) -> bool {
        !self.invoice_number.trim().is_empty()
            && !self.customer_name.trim().is_empty()
            && !self.po_number.trim().is_empty()
            && !self.amount.trim().is_empty()
            && !self.documents.is_empty()
    }

    pub fn document(&self, id: AttachmentId) -> Option<&Attachment> {
        self.documents.iter().find(|d| *d.id() == id)
    }

    /// Apply one edit if it passes the field's boundary rule.
    ///
    /// Returns `false` (leaving the previous value untouched) when rejected.
    pub(crate) fn apply(&mut self, field: DraftField, value: &str) -> bool {
        match field {
            DraftField::InvoiceNumber => self.invoice_number = value.to_string(),
            DraftField::CustomerName => self.customer_name = value.to_string(),
            DraftField::PoNumber => self.po_number = value.to_string(),
            DraftField::CustomerEmail => self.customer_email = value.to_string(),
            DraftField::PaymentCheck => self.payment_check = value.to_string(),
            DraftField::Amount => {
                if !is_valid_amount_input(value) {
                    return false;
                }
                self.amount = value.to_string();
            }
            DraftField::Notes => {
                if !notes_within_limit(value) {
                    return false;
                }
                self.notes = value.to_string();
            }
            DraftField::CustomerPhone => {
                if !is_valid_phone(value) {
                    return false;
                }
                self.customer_phone = value.to_string();
            }
            DraftField::PaymentDate => match normalize_payment_date(value) {
                Some(date) => self.payment_date = date,
                None => return false,
            },
            DraftField::PaymentStatus => match value.parse::<PaymentStatus>() {
                Ok(status) => self.payment_status = status,
                Err(_) => return false,
            },
        }
        true
    }

    pub(crate) fn set_notes_truncated(&mut self, text: &str) {
        self.notes = truncate_notes(text);
    }

    pub(crate) fn push_document(&mut self, attachment: Attachment) {
        self.documents.push(attachment);
    }

    pub(crate) fn take_document(&mut self, id: AttachmentId) -> Option<Attachment> {
        let index = self.documents.iter().position(|d| *d.id() == id)?;
        Some(self.documents.remove(index))
    }

    pub(crate) fn take_documents(&mut self) -> Vec<Attachment> {
        std::mem::take(&mut self.documents)
    }
}

impl Entity for InvoiceDraft {
    type Id = DraftId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn amount_edit_rejects_non_numeric_input() {
        let mut draft = InvoiceDraft::empty(DraftId::new());
        assert!(draft.apply(DraftField::Amount, "150.2"));
        assert!(!draft.apply(DraftField::Amount, "150.2.1"));
        assert!(!draft.apply(DraftField::Amount, "$150"));
        assert_eq!(draft.amount(), "150.2");
        assert!(draft.apply(DraftField::Amount, ""));
        assert_eq!(draft.amount(), "");
    }

    #[test]
    fn phone_edit_rejects_letters() {
        let mut draft = InvoiceDraft::empty(DraftId::new());
        assert!(draft.apply(DraftField::CustomerPhone, "913.335.9000"));
        assert!(!draft.apply(DraftField::CustomerPhone, "913.335.90OO"));
        assert_eq!(draft.customer_phone(), "913.335.9000");
    }

    #[test]
    fn payment_date_is_stored_canonically() {
        let mut draft = InvoiceDraft::empty(DraftId::new());
        assert!(draft.apply(DraftField::PaymentDate, "12/19/2025"));
        assert_eq!(draft.payment_date(), "2025-12-19");
        assert!(!draft.apply(DraftField::PaymentDate, "next tuesday"));
        assert_eq!(draft.payment_date(), "2025-12-19");
    }

    #[test]
    fn payment_status_accepts_known_values_only() {
        let mut draft = InvoiceDraft::empty(DraftId::new());
        assert!(draft.apply(DraftField::PaymentStatus, "processed"));
        assert_eq!(draft.payment_status(), PaymentStatus::Processed);
        assert!(!draft.apply(DraftField::PaymentStatus, "denied"));
        assert_eq!(draft.field(DraftField::PaymentStatus), "processed");
        assert!(draft.apply(DraftField::PaymentStatus, ""));
        assert_eq!(draft.payment_status(), PaymentStatus::Unset);
    }

    #[test]
    fn field_names_round_trip() {
        for field in [
            DraftField::InvoiceNumber,
            DraftField::CustomerName,
            DraftField::PoNumber,
            DraftField::Amount,
            DraftField::Notes,
            DraftField::CustomerEmail,
            DraftField::CustomerPhone,
            DraftField::PaymentCheck,
            DraftField::PaymentDate,
            DraftField::PaymentStatus,
        ] {
            assert_eq!(field.as_str().parse::<DraftField>().unwrap(), field);
        }
        assert!("documents".parse::<DraftField>().is_err());
    }

    #[test]
    fn blank_whitespace_does_not_count_as_filled() {
        let mut draft = InvoiceDraft::empty(DraftId::new());
        draft.apply(DraftField::InvoiceNumber, "   ");
        draft.apply(DraftField::CustomerName, "Acme");
        draft.apply(DraftField::PoNumber, "PO1");
        draft.apply(DraftField::Amount, "5");
        assert!(!draft.is_complete());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a rejected amount edit leaves the previous value intact,
        /// and the stored amount always matches the amount charset.
        #[test]
        fn rejected_amount_edits_keep_previous_value(edits in prop::collection::vec(".{0,8}", 1..20)) {
            let mut draft = InvoiceDraft::empty(DraftId::new());
            for edit in edits {
                let before = draft.amount().to_string();
                let applied = draft.apply(DraftField::Amount, &edit);
                if applied {
                    prop_assert_eq!(draft.amount(), edit.as_str());
                } else {
                    prop_assert_eq!(draft.amount(), before.as_str());
                }
                prop_assert!(is_valid_amount_input(draft.amount()));
            }
        }

        /// Property: notes never exceed the limit, whatever is pasted in.
        #[test]
        fn notes_never_exceed_limit(text in ".{0,600}") {
            let mut draft = InvoiceDraft::empty(DraftId::new());
            draft.set_notes_truncated(&text);
            prop_assert!(draft.notes().chars().count() <= crate::validation::NOTES_MAX_CHARS);
            let _ = draft.apply(DraftField::Notes, &text);
            prop_assert!(draft.notes().chars().count() <= crate::validation::NOTES_MAX_CHARS);
        }
    }
}
