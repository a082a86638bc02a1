//! Request and response bodies of the checkout HTTP surface.
//!
//! String fields default to empty so that an absent field and an empty one
//! are both reported by `validator` as missing, rather than as a JSON
//! decoding failure.

use crate::models::{Order, OrderItem, OrderStatus};
use crate::services::pincode::Serviceability;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "book_id is required"))]
    pub book_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
}

impl From<OrderItemRequest> for OrderItem {
    fn from(item: OrderItemRequest) -> Self {
        OrderItem {
            book_id: item.book_id,
            title: item.title,
            price: item.price,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    /// Minor currency unit (paise).
    #[serde(default)]
    #[validate(range(min = 1, message = "amount must be greater than zero"))]
    pub amount: u64,
    #[serde(default)]
    #[validate(length(min = 1, message = "items must not be empty"), nested)]
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    #[validate(length(min = 1, message = "shipping_name is required"))]
    pub shipping_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "shipping_address is required"))]
    pub shipping_address: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "shipping_pincode is required"))]
    pub shipping_pincode: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub gateway_order_id: String,
    pub amount: u64,
    pub currency: String,
    /// Public key the browser checkout widget is opened with.
    pub key_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "gateway_order_id is required"))]
    pub gateway_order_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "gateway_payment_id is required"))]
    pub gateway_payment_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "signature is required"))]
    pub signature: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "order_id is required"))]
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PincodeQuery {
    #[serde(default)]
    pub pincode: String,
}

/// `GET /pincode` body; identical to the resolver's answer.
pub type PincodeResponse = Serviceability;

/// Row of the order history page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: u64,
    pub shipping_name: String,
    pub shipping_address: String,
    pub shipping_pincode: String,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        OrderSummary {
            id: order.id,
            items: order.items,
            total_amount: order.total_amount,
            shipping_name: order.shipping_name,
            shipping_address: order.shipping_address,
            shipping_pincode: order.shipping_pincode,
            gateway_order_id: order.gateway_order_id,
            gateway_payment_id: order.gateway_payment_id,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendOtpResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fail_validation() {
        let request: CreateOrderRequest = serde_json::from_str(r#"{"amount": 5900}"#).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("items"));
        assert!(fields.contains_key("shipping_name"));
        assert!(fields.contains_key("user_id"));
        assert!(!fields.contains_key("amount"));
    }

    #[test]
    fn zero_quantity_line_is_rejected() {
        let request = CreateOrderRequest {
            amount: 5900,
            items: vec![OrderItemRequest {
                book_id: "1".into(),
                title: "How to Find Guru".into(),
                price: 5900,
                quantity: 0,
            }],
            shipping_name: "Radha".into(),
            shipping_address: "12 Temple Road".into(),
            shipping_pincode: "110001".into(),
            user_id: "user-1".into(),
            idempotency_key: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn verify_request_requires_every_field() {
        let request: VerifyPaymentRequest =
            serde_json::from_str(r#"{"gateway_order_id": "order_1", "signature": ""}"#).unwrap();
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("gateway_payment_id"));
        assert!(fields.contains_key("signature"));
        assert!(fields.contains_key("order_id"));
    }
}
