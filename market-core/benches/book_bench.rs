use criterion::{black_box, criterion_group, criterion_main, Criterion};
use market_core::{Book, Price, Quantity, Side, Symbol, Timestamp};

fn seeded_book() -> Book {
    let book = Book::new(Symbol::new("AAPL"));
    let mid = 150.00;
    for i in 0..50u64 {
        book.apply_add(
            Price::from_f64(mid - 0.01 * (i + 1) as f64),
            Quantity::new(500 + i * 10),
            Side::Buy,
            Timestamp::ZERO,
        );
        book.apply_add(
            Price::from_f64(mid + 0.01 * (i + 1) as f64),
            Quantity::new(500 + i * 10),
            Side::Sell,
            Timestamp::ZERO,
        );
    }
    book
}

fn bench_apply_add(c: &mut Criterion) {
    let book = seeded_book();
    let mut i = 0u64;

    c.bench_function("book/apply_add", |b| {
        b.iter(|| {
            i = i.wrapping_add(1);
            let price = Price::from_f64(150.0 + (i % 200) as f64 * 0.01);
            book.apply_add(black_box(price), black_box(Quantity::new(10)), Side::Buy, Timestamp::ZERO);
        })
    });
}

fn bench_apply_trade(c: &mut Criterion) {
    let book = seeded_book();

    c.bench_function("book/apply_trade", |b| {
        b.iter(|| {
            book.apply_trade(Timestamp::ZERO, black_box(Price::from_f64(150.0)), black_box(Quantity::new(100)))
                .unwrap();
        })
    });
}

fn bench_best_price_readers(c: &mut Criterion) {
    let book = seeded_book();

    c.bench_function("book/best_bid_ask", |b| {
        b.iter(|| {
            black_box(book.best_bid());
            black_box(book.best_ask());
        })
    });
}

fn bench_imbalance_and_weighted_mid(c: &mut Criterion) {
    let book = seeded_book();

    c.bench_function("book/imbalance", |b| {
        b.iter(|| black_box(book.imbalance()))
    });

    c.bench_function("book/weighted_mid", |b| {
        b.iter(|| black_box(book.weighted_mid()))
    });
}

fn bench_top_n_levels(c: &mut Criterion) {
    let book = seeded_book();

    c.bench_function("book/top_n_bids_10", |b| {
        b.iter(|| black_box(book.top_n_bids(black_box(10))))
    });
}

criterion_group!(
    benches,
    bench_apply_add,
    bench_apply_trade,
    bench_best_price_readers,
    bench_imbalance_and_weighted_mid,
    bench_top_n_levels,
);
criterion_main!(benches);
