//! Order persistence.
//!
//! The order store is an external collaborator: the service creates a
//! `Pending` record, flips it to `Paid` once, and reads it back for the
//! order history page. MongoDB backs production; the in-memory store
//! serves local development and tests.

use crate::models::{Order, OrderStatus};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use futures::TryStreamExt;
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{bson::doc, Collection, Database, IndexModel};

/// Outcome of attempting the `Pending -> Paid` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentTransition {
    /// The order was `Pending` and is now `Paid`.
    Marked,
    /// The order had already left `Pending`; nothing was written.
    AlreadySettled(OrderStatus),
    NotFound,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<()>;

    async fn find(&self, order_id: &str) -> Result<Option<Order>>;

    async fn find_by_idempotency_key(&self, user_id: &str, key: &str) -> Result<Option<Order>>;

    /// Atomically move a `Pending` order to `Paid`, recording the payment id.
    async fn mark_paid(&self, order_id: &str, gateway_payment_id: &str) -> Result<PaymentTransition>;

    /// A user's orders, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>>;
}

#[derive(Clone)]
pub struct MongoOrderStore {
    orders: Collection<Order>,
}

impl MongoOrderStore {
    pub fn new(db: &Database) -> Self {
        Self {
            orders: db.collection("orders"),
        }
    }

    pub async fn init_indexes(&self) -> Result<()> {
        let user_history_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_order_history_idx".to_string())
                    .build(),
            )
            .build();

        let gateway_order_index = IndexModel::builder()
            .keys(doc! { "gateway_order_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("gateway_order_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        // One order per (user, idempotency key); orders without a key are unconstrained.
        let idempotency_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "idempotency_key": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_idempotency_key_idx".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "idempotency_key": { "$exists": true } })
                    .build(),
            )
            .build();

        self.orders
            .create_indexes(
                [user_history_index, gateway_order_index, idempotency_index],
                None,
            )
            .await?;

        tracing::info!("Order store indexes initialized");
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MongoOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.orders.insert_one(order, None).await?;
        Ok(())
    }

    async fn find(&self, order_id: &str) -> Result<Option<Order>> {
        let order = self.orders.find_one(doc! { "_id": order_id }, None).await?;
        Ok(order)
    }

    async fn find_by_idempotency_key(&self, user_id: &str, key: &str) -> Result<Option<Order>> {
        let filter = doc! { "user_id": user_id, "idempotency_key": key };
        let order = self.orders.find_one(filter, None).await?;
        Ok(order)
    }

    async fn mark_paid(&self, order_id: &str, gateway_payment_id: &str) -> Result<PaymentTransition> {
        let filter = doc! {
            "_id": order_id,
            "status": OrderStatus::Pending.as_str(),
        };
        let update = doc! {
            "$set": {
                "status": OrderStatus::Paid.as_str(),
                "gateway_payment_id": gateway_payment_id,
            }
        };

        let result = self.orders.update_one(filter, update, None).await?;
        if result.matched_count == 1 {
            return Ok(PaymentTransition::Marked);
        }

        Ok(match self.find(order_id).await? {
            Some(order) => PaymentTransition::AlreadySettled(order.status),
            None => PaymentTransition::NotFound,
        })
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .orders
            .find(doc! { "user_id": user_id }, Some(options))
            .await?;

        Ok(cursor.try_collect().await?)
    }
}

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<String, Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        if let Some(key) = &order.idempotency_key {
            if self.find_by_idempotency_key(&order.user_id, key).await?.is_some() {
                anyhow::bail!("duplicate idempotency key for user {}", order.user_id);
            }
        }
        if self.orders.contains_key(&order.id) {
            anyhow::bail!("duplicate order id {}", order.id);
        }
        self.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find(&self, order_id: &str) -> Result<Option<Order>> {
        Ok(self.orders.get(order_id).map(|entry| entry.value().clone()))
    }

    async fn find_by_idempotency_key(&self, user_id: &str, key: &str) -> Result<Option<Order>> {
        Ok(self
            .orders
            .iter()
            .find(|entry| {
                entry.user_id == user_id && entry.idempotency_key.as_deref() == Some(key)
            })
            .map(|entry| entry.value().clone()))
    }

    async fn mark_paid(&self, order_id: &str, gateway_payment_id: &str) -> Result<PaymentTransition> {
        let Some(mut order) = self.orders.get_mut(order_id) else {
            return Ok(PaymentTransition::NotFound);
        };

        if order.status != OrderStatus::Pending {
            return Ok(PaymentTransition::AlreadySettled(order.status));
        }

        order.status = OrderStatus::Paid;
        order.gateway_payment_id = Some(gateway_payment_id.to_string());
        Ok(PaymentTransition::Marked)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderItem;
    use chrono::{Duration, Utc};

    fn order(id: &str, user_id: &str) -> Order {
        Order {
            id: id.to_string(),
            user_id: user_id.to_string(),
            items: vec![OrderItem {
                book_id: "1".into(),
                title: "How to Find Guru".into(),
                price: 5900,
                quantity: 1,
            }],
            total_amount: 5900,
            currency: "INR".into(),
            shipping_name: "Radha".into(),
            shipping_address: "12 Temple Road".into(),
            shipping_pincode: "110001".into(),
            gateway_order_id: format!("order_{}", id),
            gateway_payment_id: None,
            status: OrderStatus::Pending,
            idempotency_key: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn mark_paid_is_one_shot() {
        let store = InMemoryOrderStore::new();
        store.insert(&order("o1", "u1")).await.unwrap();

        assert_eq!(
            store.mark_paid("o1", "pay_1").await.unwrap(),
            PaymentTransition::Marked
        );
        assert_eq!(
            store.mark_paid("o1", "pay_2").await.unwrap(),
            PaymentTransition::AlreadySettled(OrderStatus::Paid)
        );

        let stored = store.find("o1").await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(stored.gateway_payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn mark_paid_unknown_order() {
        let store = InMemoryOrderStore::new();
        assert_eq!(
            store.mark_paid("missing", "pay_1").await.unwrap(),
            PaymentTransition::NotFound
        );
    }

    #[tokio::test]
    async fn idempotency_key_is_unique_per_user() {
        let store = InMemoryOrderStore::new();
        let mut first = order("o1", "u1");
        first.idempotency_key = Some("key-1".into());
        store.insert(&first).await.unwrap();

        let mut duplicate = order("o2", "u1");
        duplicate.idempotency_key = Some("key-1".into());
        assert!(store.insert(&duplicate).await.is_err());

        let mut other_user = order("o3", "u2");
        other_user.idempotency_key = Some("key-1".into());
        store.insert(&other_user).await.unwrap();

        let found = store.find_by_idempotency_key("u1", "key-1").await.unwrap().unwrap();
        assert_eq!(found.id, "o1");
    }

    #[tokio::test]
    async fn lists_user_orders_newest_first() {
        let store = InMemoryOrderStore::new();
        let mut older = order("old", "u1");
        older.created_at = Utc::now() - Duration::hours(1);
        store.insert(&older).await.unwrap();
        store.insert(&order("new", "u1")).await.unwrap();
        store.insert(&order("other", "u2")).await.unwrap();

        let ids: Vec<_> = store
            .list_for_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }
}
