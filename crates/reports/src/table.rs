//! Contract with the remote invoice table.

use async_trait::async_trait;
use factordesk_auth::is_session_error;
use thiserror::Error;

use crate::query::InvoiceQuery;
use crate::row::InvoiceRow;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Enter an invoice number or a reference number.")]
    EmptyQuery,

    #[error("invoice {0} not found")]
    NotFound(String),

    #[error("{message}")]
    Remote {
        code: Option<String>,
        message: String,
    },

    #[error("invoice service unreachable: {0}")]
    Transport(String),

    #[error("unexpected invoice data: {0}")]
    Decode(String),
}

impl QueryError {
    /// Whether the failure means the login session is gone.
    pub fn is_session_error(&self) -> bool {
        match self {
            QueryError::Remote { code, message } => is_session_error(code.as_deref(), message),
            _ => false,
        }
    }
}

/// Read-only access to invoice rows.
#[async_trait]
pub trait InvoiceTable: Send + Sync {
    async fn search(&self, query: &InvoiceQuery) -> Result<Vec<InvoiceRow>, QueryError>;

    async fn fetch(&self, id: &str) -> Result<InvoiceRow, QueryError>;
}

/// Fixed set of rows, for tests and offline demos.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvoiceTable {
    rows: Vec<InvoiceRow>,
}

impl InMemoryInvoiceTable {
    pub fn new(rows: Vec<InvoiceRow>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: InvoiceRow) {
        self.rows.push(row);
    }
}

#[async_trait]
impl InvoiceTable for InMemoryInvoiceTable {
    async fn search(&self, query: &InvoiceQuery) -> Result<Vec<InvoiceRow>, QueryError> {
        Ok(self.rows.iter().filter(|row| query.matches(row)).cloned().collect())
    }

    async fn fetch(&self, id: &str) -> Result<InvoiceRow, QueryError> {
        self.rows
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or_else(|| QueryError::NotFound(id.to_string()))
    }
}
