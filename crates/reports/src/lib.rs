//! `factordesk-reports`: read-only invoice search and detail.
//!
//! Rows come from the remote invoice table through [`InvoiceTable`]; this
//! crate normalizes them, pages them and turns them into display values.

pub mod detail;
pub mod format;
pub mod query;
#[cfg(feature = "remote")]
pub mod remote;
pub mod row;
pub mod table;
pub mod view;

pub use detail::{DocumentsError, InvalidDocument, InvoiceDetail, NoteEntry};
pub use format::{format_currency, format_date, format_money};
pub use query::{InvoiceQuery, PageRange, Pagination};
#[cfg(feature = "remote")]
pub use remote::PostgrestInvoiceTable;
pub use row::{InvoiceRow, normalize_documents};
pub use table::{InMemoryInvoiceTable, InvoiceTable, QueryError};
pub use view::{SearchOutcome, SearchView};
