//! Search criteria and pagination for the invoice search screen.

use std::fmt;

use crate::row::InvoiceRow;
use crate::table::QueryError;

/// Invoice number and/or reference (PO) number. At least one is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceQuery {
    invoice_number: Option<String>,
    reference_number: Option<String>,
}

impl InvoiceQuery {
    /// Build a query from the two search inputs; blank inputs are ignored.
    pub fn new(invoice_number: &str, reference_number: &str) -> Result<Self, QueryError> {
        let invoice_number = non_blank(invoice_number);
        let reference_number = non_blank(reference_number);
        if invoice_number.is_none() && reference_number.is_none() {
            return Err(QueryError::EmptyQuery);
        }
        Ok(Self {
            invoice_number,
            reference_number,
        })
    }

    pub fn invoice_number(&self) -> Option<&str> {
        self.invoice_number.as_deref()
    }

    pub fn reference_number(&self) -> Option<&str> {
        self.reference_number.as_deref()
    }

    /// Exact, case-sensitive match on every given criterion.
    pub fn matches(&self, row: &InvoiceRow) -> bool {
        let field_matches = |wanted: Option<&str>, actual: Option<&str>| match wanted {
            Some(wanted) => actual.map(str::trim) == Some(wanted),
            None => true,
        };
        field_matches(self.invoice_number(), row.invoice_number.as_deref())
            && field_matches(self.reference_number(), row.po_number.as_deref())
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Client-side paging over a result set.
///
/// Both the page size and the 1-based page number are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    rows_per_page: usize,
    page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            rows_per_page: 10,
            page: 1,
        }
    }
}

impl Pagination {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            rows_per_page: rows_per_page.max(1),
            page: 1,
        }
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Jump to a 1-based page; 0 lands on the first page.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.rows_per_page).max(1)
    }

    pub fn range(&self, total: usize) -> PageRange {
        let bounds = self.bounds(total);
        let (start, end) = if bounds.is_empty() {
            (0, 0)
        } else {
            (bounds.start + 1, bounds.end)
        };
        PageRange { start, end, total }
    }

    /// Index bounds of the current page within `total` rows.
    pub fn bounds(&self, total: usize) -> std::ops::Range<usize> {
        let start = (self.page - 1).saturating_mul(self.rows_per_page).min(total);
        let end = start.saturating_add(self.rows_per_page).min(total);
        start..end
    }
}

/// "1-10 of 42" footer values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} of {}", self.start, self.end, self.total)
    }
}
