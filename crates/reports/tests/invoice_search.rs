//! Search-to-detail walkthrough against an in-memory table.

use factordesk_reports::{
    InMemoryInvoiceTable, InvoiceDetail, InvoiceRow, InvoiceTable, SearchOutcome, SearchView,
};
use serde_json::json;

fn table() -> InMemoryInvoiceTable {
    let rows: Vec<InvoiceRow> = serde_json::from_value(json!([
        {
            "id": "a1",
            "invoice_number": "6834",
            "customer_name": "PACE LOGISTICS INC",
            "invoice_date": "2025-12-18",
            "batch_number": "14588232",
            "po_number": "31450-36401",
            "amount": "150.00",
            "balance": 150,
            "documents": "[\"http://a\",\"\",null]"
        },
        {
            "id": "a2",
            "invoice_number": "6835",
            "po_number": "99999",
            "amount": 75.5
        }
    ]))
    .unwrap();
    InMemoryInvoiceTable::new(rows)
}

#[tokio::test]
async fn search_then_open_detail() {
    let table = table();
    let mut view = SearchView::new();
    view.set_invoice_number("6834");

    assert_eq!(view.run(&table).await, SearchOutcome::Loaded(1));
    assert_eq!(view.page_range().to_string(), "1-1 of 1");

    let hit = &view.page_rows()[0];
    assert_eq!(hit.documents, vec!["http://a".to_string()]);

    let row = table.fetch(&hit.id).await.unwrap();
    let detail = InvoiceDetail::from_row(&row);
    assert_eq!(detail.title, "6834");
    assert_eq!(detail.purchase_date, "12/18/2025");
    assert_eq!(detail.amount, "$150.00");
    assert_eq!(detail.balance, "$150.00");
    assert_eq!(detail.purchase_file_number, "14588232");
    assert_eq!(detail.description, "-");
    assert_eq!(detail.document_links().unwrap(), ["http://a".to_string()]);
}

#[tokio::test]
async fn no_match_is_an_empty_page() {
    let mut view = SearchView::new();
    view.set_invoice_number("0000");
    assert_eq!(view.run(&table()).await, SearchOutcome::Loaded(0));
    assert!(view.page_rows().is_empty());
    assert_eq!(view.page_range().to_string(), "0-0 of 0");
    assert_eq!(view.error(), None);
}
