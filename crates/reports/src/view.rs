//! State of the invoice search screen.

use crate::query::{InvoiceQuery, PageRange, Pagination};
use crate::row::InvoiceRow;
use crate::table::InvoiceTable;

/// What a search run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Loaded(usize),
    /// Neither search input was filled in.
    Rejected,
    /// The table reported an error; it is shown inline.
    Failed,
    /// The login session is gone. The caller must log out.
    SessionExpired,
}

#[derive(Debug, Clone, Default)]
pub struct SearchView {
    invoice_number: String,
    reference_number: String,
    rows: Vec<InvoiceRow>,
    pagination: Pagination,
    error: Option<String>,
}

impl SearchView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_invoice_number(&mut self, value: &str) {
        self.invoice_number = value.to_string();
    }

    pub fn set_reference_number(&mut self, value: &str) {
        self.reference_number = value.to_string();
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn rows(&self) -> &[InvoiceRow] {
        &self.rows
    }

    /// Run the search with the current inputs. Results replace the previous
    /// ones and paging restarts at page 1.
    pub async fn run(&mut self, table: &dyn InvoiceTable) -> SearchOutcome {
        let query = match InvoiceQuery::new(&self.invoice_number, &self.reference_number) {
            Ok(query) => query,
            Err(err) => {
                self.error = Some(err.to_string());
                return SearchOutcome::Rejected;
            }
        };

        match table.search(&query).await {
            Ok(rows) => {
                tracing::debug!(rows = rows.len(), "invoice search loaded");
                self.rows = rows;
                self.pagination.set_page(1);
                self.error = None;
                SearchOutcome::Loaded(self.rows.len())
            }
            Err(err) if err.is_session_error() => {
                tracing::warn!(error = %err, "invoice search hit an expired session");
                self.rows.clear();
                self.error = None;
                SearchOutcome::SessionExpired
            }
            Err(err) => {
                tracing::error!(error = %err, "invoice search failed");
                self.rows.clear();
                self.error = Some(err.to_string());
                SearchOutcome::Failed
            }
        }
    }

    pub fn page_rows(&self) -> &[InvoiceRow] {
        &self.rows[self.pagination.bounds(self.rows.len())]
    }

    pub fn page_range(&self) -> PageRange {
        self.pagination.range(self.rows.len())
    }

    pub fn page(&self) -> usize {
        self.pagination.page()
    }

    pub fn page_count(&self) -> usize {
        self.pagination.page_count(self.rows.len())
    }

    pub fn next_page(&mut self) -> bool {
        let page = self.pagination.page();
        if page < self.page_count() {
            self.pagination.set_page(page + 1);
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        let page = self.pagination.page();
        if page > 1 {
            self.pagination.set_page(page - 1);
            true
        } else {
            false
        }
    }

    /// Change the page size; paging restarts at page 1.
    pub fn set_rows_per_page(&mut self, rows_per_page: usize) {
        self.pagination = Pagination::new(rows_per_page);
    }
}
