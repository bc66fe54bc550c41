//! Benchmarks for the pricing hot path: line totals and discount math.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use domain::{DiscountRule, Money, OrderItem};

fn items(n: usize) -> Vec<OrderItem> {
    (0..n)
        .map(|i| OrderItem {
            product_id: common::ProductId::new(),
            name: format!("Product {i}"),
            quantity: (i % 5 + 1) as u32,
            price: Money::from_cents(500 + i as i64 * 37),
            image: String::new(),
        })
        .collect()
}

fn bench_items_price(c: &mut Criterion) {
    let lines = items(50);
    c.bench_function("items_price_50_lines", |b| {
        b.iter(|| {
            let total: Money = black_box(&lines).iter().map(OrderItem::line_total).sum();
            black_box(total)
        })
    });
}

fn bench_discounts(c: &mut Criterion) {
    let subtotal = Money::from_cents(123_456);
    let percentage = DiscountRule::Percentage(15);
    let flat = DiscountRule::Flat(Money::from_cents(20_000));

    c.bench_function("percentage_discount", |b| {
        b.iter(|| black_box(percentage.discount_for(black_box(subtotal))))
    });
    c.bench_function("flat_discount_clamped", |b| {
        b.iter(|| black_box(flat.discount_for(black_box(subtotal))))
    });
}

criterion_group!(benches, bench_items_price, bench_discounts);
criterion_main!(benches);
