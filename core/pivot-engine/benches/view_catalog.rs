use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use engine::{build, FactTable, FilterRequest, Item, Store, Transaction};
use pivot_engine::{calculate_view, run_pipeline, Dimension, SortOrder, ViewCatalog, ViewDefinition};

/// One year of transactions across 10 stores and 40 items.
fn synthetic_table(per_day: u32) -> FactTable {
    let stores: Vec<Store> = (0..10).map(|i| Store::new(i, format!("Store {}", i))).collect();
    let items: Vec<Item> = (0..40).map(|i| Item::new(i, format!("Item {}", i))).collect();
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

    let mut txs = Vec::new();
    for day in 0..365u32 {
        let date = start + Days::new(u64::from(day));
        for k in 0..per_day {
            let seed = day.wrapping_mul(7919).wrapping_add(k.wrapping_mul(104_729));
            txs.push(Transaction::new(
                date,
                seed % 10,
                seed % 40,
                f64::from(seed % 17) + 0.99,
                i64::from(seed % 5),
            ));
        }
    }
    build(&txs, &stores, &items).unwrap()
}

fn bench_catalog(c: &mut Criterion) {
    let table = synthetic_table(200);
    let catalog = ViewCatalog::default();
    let request = FilterRequest::default();

    c.bench_function("full_catalog_73k_rows", |b| {
        b.iter(|| run_pipeline(black_box(&table), black_box(&request), &catalog).unwrap())
    });

    let top = ViewDefinition::sum("top", vec![Dimension::StoreName, Dimension::ItemName])
        .sorted(SortOrder::ValueDescending)
        .top_n(5, Some(Dimension::StoreName));
    c.bench_function("top_items_per_store_73k_rows", |b| {
        b.iter(|| calculate_view(black_box(&top), black_box(&table)))
    });
}

criterion_group!(benches, bench_catalog);
criterion_main!(benches);
