use common::{Money, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::OrderLine;
use orchestrator::{InMemoryCatalog, InventoryLedger, Product};

fn ledger(stock: u32) -> InventoryLedger<InMemoryCatalog> {
    let catalog = InMemoryCatalog::new();
    catalog.add_product(Product::new(1, "Widget", Money::new(1_000), stock));
    catalog.add_product(Product::new(2, "Gadget", Money::new(2_500), stock));
    InventoryLedger::new(catalog)
}

fn bench_reserve_check(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = ledger(1_000);

    c.bench_function("inventory/reserve_check", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.reserve_check(ProductId::new(1), 3).await.unwrap();
            });
        });
    });
}

fn bench_debit_restore(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = ledger(1_000);

    c.bench_function("inventory/debit_then_restore", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.debit(ProductId::new(1), 2).await.unwrap();
                ledger.restore(ProductId::new(1), 2).await.unwrap();
            });
        });
    });
}

fn bench_debit_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = ledger(1_000);
    let lines = vec![
        OrderLine::new(1, 2, Money::new(1_000)),
        OrderLine::new(2, 1, Money::new(2_500)),
    ];

    c.bench_function("inventory/debit_lines_two_products", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.debit_lines(&lines).await.unwrap();
                ledger.restore_lines(&lines).await.unwrap();
            });
        });
    });
}

fn bench_contended_debits(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .build()
        .unwrap();

    c.bench_function("inventory/contended_debits_x32", |b| {
        b.iter(|| {
            rt.block_on(async {
                let ledger = std::sync::Arc::new(ledger(64));
                let mut handles = Vec::with_capacity(32);
                for _ in 0..32 {
                    let ledger = ledger.clone();
                    handles.push(tokio::spawn(async move {
                        ledger.debit(ProductId::new(1), 2).await.unwrap();
                    }));
                }
                for handle in handles {
                    handle.await.unwrap();
                }
            });
        });
    });
}

criterion_group!(
    benches,
    bench_reserve_check,
    bench_debit_restore,
    bench_debit_lines,
    bench_contended_debits
);
criterion_main!(benches);
