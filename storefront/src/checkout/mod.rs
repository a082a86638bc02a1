//! Checkout page orchestration.
//!
//! [`CheckoutFlow`] drives one submission from the shipping form to a
//! verified payment:
//!
//! 1. validate the form locally, reporting every bad field;
//! 2. confirm the pincode is serviceable;
//! 3. make sure the gateway's payment widget can be opened;
//! 4. create the order on checkout-service;
//! 5. hand the gateway order to the widget and wait for the customer;
//! 6. relay the signed result for verification, clearing the cart on success.
//!
//! Any failure lands in [`CheckoutStatus::Error`] with a customer-facing
//! message. The cart is only touched after a verified payment.

use crate::cart::{CartItem, CartStore};
use crate::services::CheckoutApi;
use async_trait::async_trait;
use checkout_service::dtos::{CreateOrderRequest, OrderItemRequest, VerifyPaymentRequest};
use checkout_service::utils::validation::{validate_checkout_form, CheckoutFormData};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub const EMPTY_CART_MESSAGE: &str = "Add some books before checking out.";
pub const UNSERVICEABLE_MESSAGE: &str = "Delivery is not available for this pincode.";
pub const PAYMENT_UNAVAILABLE_MESSAGE: &str = "Payment service is temporarily unavailable.";
pub const INITIATE_FAILED_MESSAGE: &str = "Unable to initiate payment, please try again.";
pub const PAYMENT_CANCELLED_MESSAGE: &str =
    "Payment was cancelled. Your cart items are still saved.";
pub const VERIFICATION_FAILED_MESSAGE: &str = "Payment verification failed.";

const PAYMENT_DESCRIPTION: &str = "Book Purchase";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CheckoutStatus {
    #[default]
    Idle,
    Processing,
    Success,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Address,
    Pincode,
}

impl FormField {
    pub fn key(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Address => "address",
            FormField::Pincode => "pincode",
        }
    }
}

/// What the payment widget is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub key_id: String,
    pub gateway_order_id: String,
    pub amount: u64,
    pub currency: String,
    pub description: String,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The customer paid; the widget returns the gateway's signed receipt.
    Completed {
        gateway_order_id: String,
        gateway_payment_id: String,
        signature: String,
    },
    /// The widget was closed before paying.
    Dismissed,
}

#[derive(Debug, Error)]
#[error("Payment widget could not be loaded")]
pub struct ModalUnavailable;

/// The gateway's hosted payment widget.
#[async_trait]
pub trait PaymentModal: Send + Sync {
    async fn load(&self) -> Result<(), ModalUnavailable>;

    async fn open(&self, request: &PaymentRequest) -> PaymentOutcome;
}

#[derive(Debug, Default)]
pub struct CheckoutFlow {
    form: CheckoutFormData,
    form_errors: BTreeMap<String, String>,
    status: CheckoutStatus,
    contact: Option<String>,
    // Kept across retries of the same form and cart; cleared by any edit
    // and by a verified payment.
    idempotency_key: Option<(String, Arc<Vec<CartItem>>)>,
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phone number prefilled into the payment widget.
    pub fn with_contact(mut self, phone: &str) -> Self {
        self.contact = Some(phone.to_string());
        self
    }

    pub fn form(&self) -> &CheckoutFormData {
        &self.form
    }

    pub fn form_errors(&self) -> &BTreeMap<String, String> {
        &self.form_errors
    }

    pub fn field_error(&self, field: FormField) -> Option<&str> {
        self.form_errors.get(field.key()).map(String::as_str)
    }

    pub fn status(&self) -> &CheckoutStatus {
        &self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            CheckoutStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    /// The pay button is disabled while a submission is in flight.
    pub fn can_submit(&self) -> bool {
        self.status != CheckoutStatus::Processing
    }

    /// Record a keystroke. Pincode input keeps only its first six digits.
    pub fn edit_field(&mut self, field: FormField, value: &str) {
        match field {
            FormField::Name => self.form.name = value.to_string(),
            FormField::Address => self.form.address = value.to_string(),
            FormField::Pincode => {
                self.form.pincode = value.chars().filter(char::is_ascii_digit).take(6).collect()
            }
        }

        self.form_errors.remove(field.key());
        self.idempotency_key = None;
        if matches!(self.status, CheckoutStatus::Error(_)) {
            self.status = CheckoutStatus::Idle;
        }
    }

    pub async fn submit(
        &mut self,
        cart: &mut CartStore,
        user_id: &str,
        api: &dyn CheckoutApi,
        modal: &dyn PaymentModal,
    ) -> &CheckoutStatus {
        if !self.can_submit() {
            return &self.status;
        }

        self.form_errors.clear();

        if cart.is_empty() {
            return self.fail(EMPTY_CART_MESSAGE);
        }

        let validation = validate_checkout_form(&self.form);
        if !validation.is_valid() {
            self.form_errors = validation.errors;
            return &self.status;
        }

        self.status = CheckoutStatus::Processing;
        tracing::debug!(user_id = %user_id, lines = cart.items().len(), "Checkout submitted");

        let pincode = self.form.pincode.trim().to_string();
        match api.check_pincode(&pincode).await {
            Ok(serviceability) if serviceability.available => {}
            Ok(_) => return self.fail(UNSERVICEABLE_MESSAGE),
            Err(e) => {
                tracing::warn!("Pincode check failed: {}", e);
                return self.fail(UNSERVICEABLE_MESSAGE);
            }
        }

        if modal.load().await.is_err() {
            return self.fail(PAYMENT_UNAVAILABLE_MESSAGE);
        }

        let request = self.order_request(cart, user_id);
        let order = match api.create_order(&request).await {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!("Order creation failed: {}", e);
                return self.fail(INITIATE_FAILED_MESSAGE);
            }
        };

        let outcome = modal
            .open(&PaymentRequest {
                key_id: order.key_id.clone(),
                gateway_order_id: order.gateway_order_id.clone(),
                amount: order.amount,
                currency: order.currency.clone(),
                description: PAYMENT_DESCRIPTION.to_string(),
                contact: self.contact.clone(),
            })
            .await;

        let PaymentOutcome::Completed {
            gateway_order_id,
            gateway_payment_id,
            signature,
        } = outcome
        else {
            tracing::info!(order_id = %order.order_id, "Payment widget dismissed");
            return self.fail(PAYMENT_CANCELLED_MESSAGE);
        };

        let verification = VerifyPaymentRequest {
            gateway_order_id,
            gateway_payment_id,
            signature,
            order_id: order.order_id.clone(),
        };

        if let Err(e) = api.verify_payment(&verification).await {
            tracing::warn!(order_id = %order.order_id, "Payment verification failed: {}", e);
            return self.fail(VERIFICATION_FAILED_MESSAGE);
        }

        tracing::info!(order_id = %order.order_id, "Order paid");
        cart.clear();
        self.idempotency_key = None;
        self.status = CheckoutStatus::Success;
        &self.status
    }

    fn order_request(&mut self, cart: &CartStore, user_id: &str) -> CreateOrderRequest {
        let snapshot = cart.snapshot();
        let reusable = match &self.idempotency_key {
            Some((key, items)) if Arc::ptr_eq(items, &snapshot) => Some(key.clone()),
            _ => None,
        };
        let idempotency_key = match reusable {
            Some(key) => key,
            None => {
                let key = uuid::Uuid::new_v4().to_string();
                self.idempotency_key = Some((key.clone(), snapshot));
                key
            }
        };

        CreateOrderRequest {
            amount: cart.total_amount(),
            items: cart
                .items()
                .iter()
                .map(|item| OrderItemRequest {
                    book_id: item.book.id.clone(),
                    title: item.book.title.clone(),
                    price: item.book.price,
                    quantity: item.quantity,
                })
                .collect(),
            shipping_name: self.form.name.trim().to_string(),
            shipping_address: self.form.address.trim().to_string(),
            shipping_pincode: self.form.pincode.trim().to_string(),
            user_id: user_id.to_string(),
            idempotency_key: Some(idempotency_key),
        }
    }

    fn fail(&mut self, message: &str) -> &CheckoutStatus {
        self.status = CheckoutStatus::Error(message.to_string());
        &self.status
    }
}
