//! Order creation.
//!
//! A request is checked in full before anything leaves the process:
//! required fields, catalog prices, the amount total, the shipping form and
//! delivery serviceability. Only then is a gateway order opened, and only
//! after the gateway succeeds is the internal `Pending` order written, so a
//! gateway failure never leaves an orphaned record behind.

use crate::dtos::CreateOrderRequest;
use crate::models::{Order, OrderItem, OrderStatus};
use crate::services::catalog::BookCatalog;
use crate::services::gateway::{GatewayError, GatewayOrderRequest, PaymentGateway};
use crate::services::metrics;
use crate::services::order_store::OrderStore;
use crate::services::pincode::{PincodeResolver, UNAVAILABLE_MESSAGE};
use crate::utils::{validate_checkout_form, CheckoutFormData};
use chrono::Utc;
use service_core::error::{AppError, FieldErrors};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

pub const INITIATE_FAILED_MESSAGE: &str = "Unable to initiate payment, please try again";

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Missing required fields: {0}")]
    MissingFields(#[from] validator::ValidationErrors),

    #[error("Invalid shipping details")]
    InvalidShipping(FieldErrors),

    #[error("Unknown book: {0}")]
    UnknownBook(String),

    #[error("Price for book {book_id} is {expected}, got {actual}")]
    PriceMismatch {
        book_id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Amount {actual} does not match item total {expected}")]
    AmountMismatch { expected: u64, actual: u64 },

    #[error("Delivery not available for this pincode")]
    Unserviceable,

    #[error("Idempotency key already used for a different amount")]
    IdempotencyConflict,

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Order store error: {0:#}")]
    Store(anyhow::Error),

    #[error("Catalog error: {0:#}")]
    Catalog(anyhow::Error),

    #[error("Delivery zone lookup error: {0:#}")]
    Zones(anyhow::Error),
}

impl OrderError {
    fn reason(&self) -> &'static str {
        match self {
            OrderError::MissingFields(_) => "missing_fields",
            OrderError::InvalidShipping(_) => "invalid_shipping",
            OrderError::UnknownBook(_) => "unknown_book",
            OrderError::PriceMismatch { .. } => "price_mismatch",
            OrderError::AmountMismatch { .. } => "amount_mismatch",
            OrderError::Unserviceable => "unserviceable",
            OrderError::IdempotencyConflict => "idempotency_conflict",
            OrderError::Gateway(_) => "gateway",
            OrderError::Store(_) => "store",
            OrderError::Catalog(_) => "catalog",
            OrderError::Zones(_) => "zones",
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::MissingFields(errors) => AppError::ValidationError(errors),
            OrderError::InvalidShipping(fields) => AppError::InvalidFields {
                message: "Invalid shipping details".to_string(),
                fields,
            },
            OrderError::Unserviceable => AppError::BadRequest(UNAVAILABLE_MESSAGE.to_string()),
            err @ (OrderError::UnknownBook(_)
            | OrderError::PriceMismatch { .. }
            | OrderError::AmountMismatch { .. }) => AppError::BadRequest(err.to_string()),
            OrderError::IdempotencyConflict => AppError::Conflict(anyhow::anyhow!(
                "Idempotency key already used for a different order"
            )),
            OrderError::Gateway(source) => AppError::upstream(INITIATE_FAILED_MESSAGE, source),
            OrderError::Store(source)
            | OrderError::Catalog(source)
            | OrderError::Zones(source) => AppError::upstream(INITIATE_FAILED_MESSAGE, source),
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn BookCatalog>,
    pincodes: PincodeResolver,
    currency: String,
}

impl OrderService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn BookCatalog>,
        pincodes: PincodeResolver,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            store,
            catalog,
            pincodes,
            currency: currency.into(),
        }
    }

    pub fn key_id(&self) -> &str {
        self.gateway.key_id()
    }

    /// Open a gateway order and record it as `Pending`.
    ///
    /// With an `idempotency_key`, a repeat of an earlier request for the same
    /// user returns the order already created instead of opening another.
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let result = self.try_create_order(request).await;
        match &result {
            Ok(order) => metrics::record_order_created(&order.currency, order.total_amount),
            Err(err) => {
                metrics::record_order_failure(err.reason());
                tracing::warn!(reason = err.reason(), error = %err, "Order creation rejected");
            }
        }
        result
    }

    async fn try_create_order(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        request.validate()?;

        let items = self.check_items(&request).await?;
        self.check_shipping(&request).await?;

        if let Some(key) = &request.idempotency_key {
            if let Some(existing) = self.replay(&request.user_id, key, request.amount).await? {
                return Ok(existing);
            }
        }

        let order_id = Uuid::new_v4().to_string();
        let gateway_request = GatewayOrderRequest {
            amount: request.amount,
            currency: self.currency.clone(),
            receipt: format!("order_{}", Utc::now().timestamp_millis()),
            notes: Some(serde_json::json!({
                "order_id": order_id,
                "user_id": request.user_id,
            })),
        };

        let gateway_order = self.gateway.create_order(&gateway_request).await?;

        let order = Order {
            id: order_id,
            user_id: request.user_id,
            items,
            total_amount: request.amount,
            currency: self.currency.clone(),
            shipping_name: request.shipping_name.trim().to_string(),
            shipping_address: request.shipping_address.trim().to_string(),
            shipping_pincode: request.shipping_pincode,
            gateway_order_id: gateway_order.id,
            gateway_payment_id: None,
            status: OrderStatus::Pending,
            idempotency_key: request.idempotency_key,
            created_at: Utc::now(),
        };

        if let Err(err) = self.store.insert(&order).await {
            // A concurrent request with the same key may have inserted first.
            if let Some(key) = &order.idempotency_key {
                if let Some(existing) = self.replay(&order.user_id, key, order.total_amount).await? {
                    tracing::warn!(
                        gateway_order_id = %order.gateway_order_id,
                        "Discarding duplicate gateway order for idempotent retry"
                    );
                    return Ok(existing);
                }
            }
            tracing::error!(
                gateway_order_id = %order.gateway_order_id,
                error = %err,
                "Gateway order opened but internal order not recorded"
            );
            return Err(OrderError::Store(err));
        }

        tracing::info!(
            order_id = %order.id,
            gateway_order_id = %order.gateway_order_id,
            user_id = %order.user_id,
            amount = order.total_amount,
            "Order created"
        );

        Ok(order)
    }

    /// Every line must name a catalog book at its catalog price, and the
    /// amount must be the exact sum of the lines.
    async fn check_items(&self, request: &CreateOrderRequest) -> Result<Vec<OrderItem>, OrderError> {
        let mut total: u64 = 0;
        let mut items = Vec::with_capacity(request.items.len());

        for line in &request.items {
            let book = self
                .catalog
                .find(&line.book_id)
                .await
                .map_err(OrderError::Catalog)?
                .ok_or_else(|| OrderError::UnknownBook(line.book_id.clone()))?;

            if book.price != line.price {
                return Err(OrderError::PriceMismatch {
                    book_id: book.id,
                    expected: book.price,
                    actual: line.price,
                });
            }

            let item = OrderItem::from(line.clone());
            total = total.saturating_add(item.line_total());
            items.push(item);
        }

        if total != request.amount {
            return Err(OrderError::AmountMismatch {
                expected: total,
                actual: request.amount,
            });
        }

        Ok(items)
    }

    async fn check_shipping(&self, request: &CreateOrderRequest) -> Result<(), OrderError> {
        let form = CheckoutFormData {
            name: request.shipping_name.clone(),
            address: request.shipping_address.clone(),
            pincode: request.shipping_pincode.clone(),
        };
        let result = validate_checkout_form(&form);
        if !result.is_valid() {
            return Err(OrderError::InvalidShipping(result.errors));
        }

        let serviceability = self
            .pincodes
            .lookup(&request.shipping_pincode)
            .await
            .map_err(OrderError::Zones)?;
        if !serviceability.available {
            return Err(OrderError::Unserviceable);
        }

        Ok(())
    }

    async fn replay(&self, user_id: &str, key: &str, amount: u64) -> Result<Option<Order>, OrderError> {
        let Some(existing) = self
            .store
            .find_by_idempotency_key(user_id, key)
            .await
            .map_err(OrderError::Store)?
        else {
            return Ok(None);
        };

        if existing.total_amount != amount {
            return Err(OrderError::IdempotencyConflict);
        }

        tracing::info!(
            order_id = %existing.id,
            gateway_order_id = %existing.gateway_order_id,
            "Returning existing order for idempotency key"
        );
        Ok(Some(existing))
    }

    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, AppError> {
        self.store
            .list_for_user(user_id)
            .await
            .map_err(|e| AppError::upstream("Unable to load orders", e))
    }
}
