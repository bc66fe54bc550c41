//! Order pipeline: creation, lifecycle, and stock effects.

use chrono::Utc;
use common::{OrderId, UserId};
use doc_store::{DocStore, DocStoreExt, Document};
use serde_json::Value;

use crate::catalog::{StockDirection, adjust_stock, load_product};
use crate::coupon::Coupon;
use crate::error::DomainError;
use crate::money::Money;

use super::{NewOrder, Order, OrderError, OrderItem, OrderStatus};

/// All orders plus the grand total, for the admin dashboard.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrdersSummary {
    pub orders: Vec<Order>,
    pub total_amount: Money,
}

/// Service for placing and managing orders.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
}

impl<S: DocStore> OrderService<S> {
    /// Creates a new order service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Places an order for a user.
    ///
    /// Unit prices, names, and images are snapshotted from the catalog at
    /// this moment; client-submitted prices are never consulted. An optional
    /// coupon is re-validated here from scratch — the preview endpoint's
    /// quote is not trusted either. The lookup uses the submitted code
    /// verbatim (codes are stored uppercase), unlike the preview which
    /// normalizes case first.
    ///
    /// After the order is persisted, stock is decremented one product at a
    /// time. The loop is not atomic across items: if a product vanishes
    /// mid-way, earlier decrements stay in place and the error propagates.
    #[tracing::instrument(skip(self, new), fields(items = new.items.len()))]
    pub async fn create(&self, user_id: UserId, new: NewOrder) -> Result<Order, DomainError> {
        if new.items.is_empty() {
            return Err(OrderError::NoItems.into());
        }

        let mut items = Vec::with_capacity(new.items.len());
        for line in &new.items {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: line.product_id,
                }
                .into());
            }

            let product = load_product(&self.store, line.product_id).await?;
            items.push(OrderItem {
                product_id: product.id,
                name: product.name,
                quantity: line.quantity,
                price: product.price,
                image: product
                    .images
                    .first()
                    .map(|i| i.url.clone())
                    .unwrap_or_default(),
            });
        }

        let items_price: Money = items.iter().map(OrderItem::line_total).sum();

        let mut coupon_applied = None;
        let mut total_price = items_price + new.tax_price + new.shipping_price;
        if let Some(ref code) = new.coupon_code {
            let coupon = self
                .store
                .find_doc_by::<Coupon>("code", Value::String(code.clone()))
                .await?
                .ok_or(OrderError::CouponInvalid)?;

            if items_price < coupon.min_cart_value {
                return Err(OrderError::CouponBelowMinimum.into());
            }
            if coupon.is_expired(Utc::now()) {
                return Err(OrderError::CouponExpired.into());
            }

            let discount = coupon.rule.discount_for(items_price);
            total_price = items_price - discount + new.tax_price + new.shipping_price;
            coupon_applied = Some(coupon.id);
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            user_id,
            shipping_info: new.shipping_info,
            items,
            payment_info: new.payment_info,
            items_price,
            tax_price: new.tax_price,
            shipping_price: new.shipping_price,
            total_price,
            coupon_applied,
            status: OrderStatus::Processing,
            paid_at: now,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_doc(&order).await?;

        for item in &order.items {
            adjust_stock(
                &self.store,
                item.product_id,
                item.quantity,
                StockDirection::Consume,
            )
            .await?;
        }

        metrics::counter!("orders_created_total").increment(1);
        Ok(order)
    }

    /// Loads an order by id.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_doc::<Order>(id.as_uuid())
            .await?
            .ok_or_else(|| OrderError::OrderNotFound { id }.into())
    }

    /// Lists the orders placed by one user.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .store
            .find_docs_by::<Order>("user_id", Value::String(user_id.to_string()))
            .await?)
    }

    /// Lists every order with the grand total. Admin operation.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self) -> Result<OrdersSummary, DomainError> {
        use futures_util::StreamExt;

        let mut stream = self.store.stream_all(Order::COLLECTION).await?;
        let mut orders = Vec::new();
        let mut total_amount = Money::zero();
        while let Some(doc) = stream.next().await {
            let order: Order = serde_json::from_value(doc?)?;
            total_amount += order.total_price;
            orders.push(order);
        }

        Ok(OrdersSummary {
            orders,
            total_amount,
        })
    }

    /// Cancels the caller's own order.
    ///
    /// Only the owner may cancel, and only while the order is still
    /// `Processing`. Cancellation adds every line's quantity back to stock.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, user_id: UserId, id: OrderId) -> Result<Order, DomainError> {
        let mut order = self.get(id).await?;

        if order.user_id != user_id {
            return Err(OrderError::NotOwner.into());
        }
        if !order.status.can_cancel() {
            return Err(OrderError::CannotCancel {
                status: order.status,
            }
            .into());
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = Utc::now();

        for item in &order.items {
            adjust_stock(
                &self.store,
                item.product_id,
                item.quantity,
                StockDirection::Restore,
            )
            .await?;
        }
        self.store.put_doc(&order).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        Ok(order)
    }

    /// Moves an order to the next status. Admin operation.
    ///
    /// Transitions are validated by the state machine; reaching `Delivered`
    /// stamps `delivered_at`. Setting `Cancelled` through this path is a
    /// pure status change and does not touch stock.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, DomainError> {
        let mut order = self.get(id).await?;

        if order.status == OrderStatus::Delivered {
            return Err(OrderError::AlreadyDelivered.into());
        }
        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            }
            .into());
        }

        order.status = next;
        if next == OrderStatus::Delivered {
            order.delivered_at = Some(Utc::now());
        }
        order.updated_at = Utc::now();

        self.store.put_doc(&order).await?;
        Ok(order)
    }

    /// Deletes an order outright. Admin escape hatch.
    ///
    /// Stock is restored for every line regardless of the order's status,
    /// mirroring cancellation's effect, before the record is removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<Order, DomainError> {
        let order = self.get(id).await?;

        for item in &order.items {
            adjust_stock(
                &self.store,
                item.product_id,
                item.quantity,
                StockDirection::Restore,
            )
            .await?;
        }

        self.store.delete_doc::<Order>(id.as_uuid()).await?;
        Ok(order)
    }
}
