use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use factordesk_invoicing::{
    format_amount, AttachmentPolicy, DraftField, DraftStore, IncomingFile,
};
use factordesk_core::Entity;
use factordesk_storage::MemoryStorage;

/// Store with `drafts` drafts, each holding one attachment of `doc_bytes` bytes.
fn populated_store(storage: Arc<MemoryStorage>, drafts: usize, doc_bytes: usize) -> DraftStore {
    let mut store = DraftStore::new(storage, AttachmentPolicy::pdf_only());
    for i in 0..drafts {
        let id = store.create_draft();
        store
            .update_field(id, DraftField::InvoiceNumber, &format!("INV-{i}"))
            .unwrap();
        store.update_field(id, DraftField::Amount, "1250.50").unwrap();
        store
            .attach_documents(
                id,
                vec![IncomingFile::new(
                    format!("{i}.pdf"),
                    "application/pdf",
                    vec![0x25; doc_bytes],
                )],
            )
            .unwrap();
    }
    store
}

fn bench_field_edit(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_edit");

    // Every accepted edit rewrites the whole set, so cost grows with set size.
    for drafts in [1usize, 10, 50] {
        group.bench_with_input(BenchmarkId::new("update_amount", drafts), &drafts, |b, &drafts| {
            let mut store = populated_store(Arc::new(MemoryStorage::new()), drafts, 16 * 1024);
            let id = *store.snapshot().iter().next().unwrap().id();
            b.iter(|| {
                store
                    .update_field(id, DraftField::Amount, black_box("999.99"))
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_hydrate(c: &mut Criterion) {
    let mut group = c.benchmark_group("hydrate");

    for doc_kib in [4usize, 256, 1024] {
        let storage = Arc::new(MemoryStorage::new());
        populated_store(storage.clone(), 10, doc_kib * 1024);

        group.throughput(Throughput::Bytes((10 * doc_kib * 1024) as u64));
        group.bench_with_input(BenchmarkId::new("ten_drafts", doc_kib), &storage, |b, storage| {
            b.iter(|| {
                let store = DraftStore::hydrate(storage.clone(), AttachmentPolicy::pdf_only());
                black_box(store.len());
            });
        });
    }

    group.finish();
}

fn bench_totals(c: &mut Criterion) {
    let store = populated_store(Arc::new(MemoryStorage::new()), 200, 0);

    c.bench_function("formatted_total_200_drafts", |b| {
        b.iter(|| black_box(store.formatted_total()));
    });

    c.bench_function("format_amount", |b| {
        b.iter(|| format_amount(black_box("1234567.891")));
    });
}

criterion_group!(benches, bench_field_edit, bench_hydrate, bench_totals);
criterion_main!(benches);
