//! End-to-end checkout flows over the in-memory store: cart → coupon
//! preview → order placement → cancellation, with stock round-trips.

use chrono::{Duration, Utc};
use common::UserId;
use doc_store::{DocStore, DocStoreExt, InMemoryDocStore};
use domain::{
    Cart, CartService, CatalogService, Category, CouponError, CouponService, DiscountRule,
    DomainError, InMemoryMediaStore, Money, NewCoupon, NewOrder, NewOrderItem, NewProduct,
    OrderService, OrderStatus, PaymentInfo, Product, ShippingInfo,
};

struct World {
    store: InMemoryDocStore,
    catalog: CatalogService<InMemoryDocStore, InMemoryMediaStore>,
    carts: CartService<InMemoryDocStore>,
    coupons: CouponService<InMemoryDocStore>,
    orders: OrderService<InMemoryDocStore>,
}

impl World {
    fn new() -> Self {
        let store = InMemoryDocStore::new();
        Self {
            catalog: CatalogService::new(store.clone(), InMemoryMediaStore::new()),
            carts: CartService::new(store.clone()),
            coupons: CouponService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            store,
        }
    }

    async fn product(&self, name: &str, price_cents: i64, stock: i64) -> Product {
        self.catalog
            .create_product(
                UserId::new(),
                NewProduct {
                    name: name.to_string(),
                    description: "integration fixture".to_string(),
                    price: Money::from_cents(price_cents),
                    category: Category::Electronics,
                    stock,
                    images: vec![],
                },
            )
            .await
            .unwrap()
    }

    async fn coupon(&self, code: &str, rule: DiscountRule, min_cents: i64) {
        self.coupons
            .create(NewCoupon {
                code: code.to_string(),
                rule,
                min_cart_value: Some(Money::from_cents(min_cents)),
                expiry_date: Utc::now() + Duration::days(30),
            })
            .await
            .unwrap();
    }

    async fn stock_of(&self, product: &Product) -> i64 {
        self.store
            .get_doc::<Product>(product.id.as_uuid())
            .await
            .unwrap()
            .unwrap()
            .stock
    }
}

fn order_request(items: Vec<NewOrderItem>, tax: i64, ship: i64, coupon: Option<&str>) -> NewOrder {
    NewOrder {
        shipping_info: ShippingInfo {
            address: "1 Main St".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            country: "India".to_string(),
            pin_code: "411001".to_string(),
            phone_no: "5550100".to_string(),
        },
        items,
        payment_info: PaymentInfo {
            id: "pay_123".to_string(),
            status: "succeeded".to_string(),
        },
        tax_price: Money::from_cents(tax),
        shipping_price: Money::from_cents(ship),
        coupon_code: coupon.map(String::from),
    }
}

#[tokio::test]
async fn cart_subtotal_always_matches_current_prices() {
    let w = World::new();
    let user = UserId::new();
    let widget = w.product("Widget", 1000, 50).await;
    let gadget = w.product("Gadget", 2500, 50).await;

    w.carts.get_or_create(user).await.unwrap();
    w.carts.upsert_item(user, widget.id, 3).await.unwrap();
    let cart = w.carts.upsert_item(user, gadget.id, 2).await.unwrap();
    assert_eq!(cart.subtotal, Money::from_cents(3 * 1000 + 2 * 2500));

    let cart = w.carts.remove_item(user, gadget.id).await.unwrap();
    assert_eq!(cart.subtotal, Money::from_cents(3000));

    let cart = w.carts.clear(user).await.unwrap();
    assert_eq!(cart.subtotal, Money::zero());
    assert!(cart.is_empty());
}

#[tokio::test]
async fn preview_matches_spec_examples() {
    let w = World::new();
    let user = UserId::new();
    let product = w.product("Widget", 20000, 50).await;

    w.carts.get_or_create(user).await.unwrap();
    w.carts.upsert_item(user, product.id, 1).await.unwrap();

    // 10% of 200.00 is 20.00
    w.coupon("TEN", DiscountRule::Percentage(10), 0).await;
    let quote = w.coupons.preview(user, "TEN").await.unwrap();
    assert_eq!(quote.discount, Money::from_cents(2000));
    assert_eq!(quote.total_price, Money::from_cents(18000));

    // Flat 50.00 against a 30.00 cart clamps to the subtotal
    let cheap_user = UserId::new();
    let cheap = w.product("Trinket", 3000, 50).await;
    w.carts.get_or_create(cheap_user).await.unwrap();
    w.carts.upsert_item(cheap_user, cheap.id, 1).await.unwrap();

    w.coupon("FLAT50", DiscountRule::Flat(Money::from_cents(5000)), 0)
        .await;
    let quote = w.coupons.preview(cheap_user, "FLAT50").await.unwrap();
    assert_eq!(quote.discount, Money::from_cents(3000));
    assert_eq!(quote.total_price, Money::zero());
}

#[tokio::test]
async fn order_totals_with_and_without_coupon() {
    let w = World::new();
    let a = w.product("Widget", 10000, 20).await;
    let b = w.product("Gadget", 5000, 20).await;

    let items = vec![
        NewOrderItem {
            product_id: a.id,
            quantity: 2,
        },
        NewOrderItem {
            product_id: b.id,
            quantity: 1,
        },
    ];

    let order = w
        .orders
        .create(UserId::new(), order_request(items.clone(), 1000, 500, None))
        .await
        .unwrap();
    assert_eq!(order.items_price, Money::from_cents(25000));
    assert_eq!(order.total_price, Money::from_cents(26500));

    w.coupon("TEN", DiscountRule::Percentage(10), 10000).await;
    let order = w
        .orders
        .create(
            UserId::new(),
            order_request(items, 1000, 500, Some("TEN")),
        )
        .await
        .unwrap();
    assert_eq!(order.total_price, Money::from_cents(24000));
    assert!(order.coupon_applied.is_some());
}

#[tokio::test]
async fn create_then_cancel_restores_stock_exactly() {
    let w = World::new();
    let user = UserId::new();
    let product = w.product("Widget", 1000, 7).await;

    let order = w
        .orders
        .create(
            user,
            order_request(
                vec![NewOrderItem {
                    product_id: product.id,
                    quantity: 5,
                }],
                0,
                0,
                None,
            ),
        )
        .await
        .unwrap();
    assert_eq!(w.stock_of(&product).await, 2);

    w.orders.cancel(user, order.id).await.unwrap();
    assert_eq!(w.stock_of(&product).await, 7);
}

#[tokio::test]
async fn shipped_orders_cannot_be_cancelled() {
    let w = World::new();
    let user = UserId::new();
    let product = w.product("Widget", 1000, 10).await;

    let order = w
        .orders
        .create(
            user,
            order_request(
                vec![NewOrderItem {
                    product_id: product.id,
                    quantity: 1,
                }],
                0,
                0,
                None,
            ),
        )
        .await
        .unwrap();

    w.orders
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let result = w.orders.cancel(user, order.id).await;
    assert!(matches!(result, Err(e) if e.kind() == domain::ErrorKind::InvalidState));
}

#[tokio::test]
async fn deleted_coupon_stops_applying() {
    let w = World::new();
    let user = UserId::new();
    let product = w.product("Widget", 20000, 50).await;

    w.carts.get_or_create(user).await.unwrap();
    w.carts.upsert_item(user, product.id, 1).await.unwrap();
    w.coupon("GONE", DiscountRule::Percentage(10), 0).await;

    w.coupons.preview(user, "GONE").await.unwrap();

    let coupon = w.coupons.list().await.unwrap().remove(0);
    w.coupons.delete(coupon.id).await.unwrap();

    let result = w.coupons.preview(user, "GONE").await;
    assert!(matches!(
        result,
        Err(DomainError::Coupon(CouponError::InvalidCode { .. }))
    ));
}

#[tokio::test]
async fn order_time_revalidation_ignores_active_flag() {
    // Deactivating a coupon blocks the preview but not order placement;
    // only expiry and the minimum are re-checked there.
    let w = World::new();
    let user = UserId::new();
    let product = w.product("Widget", 20000, 50).await;

    w.carts.get_or_create(user).await.unwrap();
    w.carts.upsert_item(user, product.id, 1).await.unwrap();
    w.coupon("SLEEPY", DiscountRule::Percentage(10), 0).await;

    let mut coupon = w.coupons.list().await.unwrap().remove(0);
    coupon.is_active = false;
    w.store.put_doc(&coupon).await.unwrap();

    let result = w.coupons.preview(user, "SLEEPY").await;
    assert!(matches!(
        result,
        Err(DomainError::Coupon(CouponError::Inactive { .. }))
    ));

    let order = w
        .orders
        .create(
            user,
            order_request(
                vec![NewOrderItem {
                    product_id: product.id,
                    quantity: 1,
                }],
                0,
                0,
                Some("SLEEPY"),
            ),
        )
        .await
        .unwrap();
    assert_eq!(order.total_price, Money::from_cents(18000));
}

#[tokio::test]
async fn full_checkout_journey() {
    let w = World::new();
    let user = UserId::new();
    let widget = w.product("Widget", 10000, 10).await;
    let gadget = w.product("Gadget", 5000, 10).await;

    // Build the cart
    w.carts.get_or_create(user).await.unwrap();
    w.carts.upsert_item(user, widget.id, 2).await.unwrap();
    let cart = w.carts.upsert_item(user, gadget.id, 1).await.unwrap();
    assert_eq!(cart.subtotal, Money::from_cents(25000));

    // Preview a coupon against it
    w.coupon("TEN", DiscountRule::Percentage(10), 10000).await;
    let quote = w.coupons.preview(user, "ten").await.unwrap();
    assert_eq!(quote.total_price, Money::from_cents(22500));

    // Place the order (server re-derives everything)
    let order = w
        .orders
        .create(
            user,
            order_request(
                cart.items
                    .iter()
                    .map(|(product_id, quantity)| NewOrderItem {
                        product_id: *product_id,
                        quantity: *quantity,
                    })
                    .collect(),
                1000,
                500,
                Some("TEN"),
            ),
        )
        .await
        .unwrap();
    assert_eq!(order.total_price, Money::from_cents(24000));
    assert_eq!(w.stock_of(&widget).await, 8);
    assert_eq!(w.stock_of(&gadget).await, 9);

    // Clear the cart after checkout, as the client does
    let cart = w.carts.clear(user).await.unwrap();
    assert!(cart.is_empty());

    // The user's order history shows the snapshot
    let mine = w.orders.list_for_user(user).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].items.len(), 2);

    // A later price change does not rewrite the order
    w.catalog
        .update_product(
            widget.id,
            domain::ProductUpdate {
                price: Some(Money::from_cents(99999)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let again = w.orders.get(order.id).await.unwrap();
    assert_eq!(again.total_price, Money::from_cents(24000));
    assert_eq!(again.items_price, Money::from_cents(25000));
}

#[tokio::test]
async fn cart_document_is_keyed_by_user() {
    let w = World::new();
    let user = UserId::new();

    w.carts.get_or_create(user).await.unwrap();
    let raw: Option<Cart> = w.store.get_doc(user.as_uuid()).await.unwrap();
    assert!(raw.is_some());
    assert_eq!(w.store.count("carts").await.unwrap(), 1);

    // Fetching again never creates a second cart for the same user
    w.carts.get_or_create(user).await.unwrap();
    assert_eq!(w.store.count("carts").await.unwrap(), 1);
}
