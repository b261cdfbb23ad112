//! Display model of a single invoice.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::format::{format_date, format_money};
use crate::row::InvoiceRow;

const MISSING: &str = "-";

/// The single note line shown in the notes table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    pub date: String,
    pub by: &'static str,
    pub action: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDocument {
    /// 1-based position in the document list.
    pub index: usize,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentsError {
    #[error("No documents available for this invoice.")]
    NoDocuments,

    #[error("Some document URLs are invalid: {}", describe(.0))]
    InvalidUrls(Vec<InvalidDocument>),
}

fn describe(invalid: &[InvalidDocument]) -> String {
    invalid
        .iter()
        .map(|doc| format!("document {} ({:?})", doc.index, doc.url))
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_valid_url(url: &str) -> bool {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = URL_REGEX
        .get_or_init(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url pattern is valid"));
    regex.is_match(url.trim())
}

/// Invoice detail screen, every value already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDetail {
    pub id: String,
    pub title: String,
    pub purchase_date: String,
    pub invoice_number: String,
    pub load_number: String,
    pub po_number: String,
    pub amount: String,
    pub balance: String,
    pub fee: String,
    pub purchase_file_number: String,
    pub description: String,
    pub note: Option<NoteEntry>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    documents: Vec<String>,
}

impl InvoiceDetail {
    pub fn from_row(row: &InvoiceRow) -> Self {
        let notes = present(row.notes.as_deref());

        Self {
            id: row.id.clone(),
            title: present(row.invoice_number.as_deref()).unwrap_or_default().to_string(),
            purchase_date: format_date(
                present(row.invoice_date.as_deref())
                    .or(present(row.created_at.as_deref()))
                    .unwrap_or_default(),
            ),
            invoice_number: or_dash(row.invoice_number.as_deref()),
            load_number: or_dash(row.load_number.as_deref()),
            po_number: or_dash(row.po_number.as_deref()),
            amount: format_money(row.amount),
            balance: format_money(row.balance),
            fee: format_money(Some(row.fee.unwrap_or(Decimal::ZERO))),
            purchase_file_number: or_dash(
                present(row.purchase_file_number.as_deref()).or(present(row.batch_number.as_deref())),
            ),
            description: or_dash(present(row.description.as_deref()).or(notes)),
            note: notes.map(|text| NoteEntry {
                date: format_date(
                    present(row.updated_at.as_deref())
                        .or(present(row.created_at.as_deref()))
                        .unwrap_or_default(),
                ),
                by: "admin",
                action: "Note Added",
                text: text.to_string(),
            }),
            customer_name: or_dash(row.customer_name.as_deref()),
            customer_phone: or_dash(row.customer_phone.as_deref()),
            customer_email: or_dash(row.customer_email.as_deref()),
            documents: row.documents.clone(),
        }
    }

    pub fn has_documents(&self) -> bool {
        !self.documents.is_empty()
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// Document links ready to open. Nothing opens if any link is invalid.
    pub fn document_links(&self) -> Result<&[String], DocumentsError> {
        if self.documents.is_empty() {
            return Err(DocumentsError::NoDocuments);
        }
        let invalid: Vec<_> = self
            .documents
            .iter()
            .enumerate()
            .filter(|(_, url)| !is_valid_url(url))
            .map(|(i, url)| InvalidDocument {
                index: i + 1,
                url: url.clone(),
            })
            .collect();
        if !invalid.is_empty() {
            tracing::warn!(invoice_id = %self.id, invalid = invalid.len(), "invoice has invalid document urls");
            return Err(DocumentsError::InvalidUrls(invalid));
        }
        Ok(&self.documents)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn or_dash(value: Option<&str>) -> String {
    present(value).unwrap_or(MISSING).to_string()
}
