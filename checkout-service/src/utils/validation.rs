//! Input validation for checkout and login forms.
//!
//! Validators never fail fast: every invalid field is reported in one pass
//! so a form can surface all of its problems at once.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use service_core::error::{AppError, FieldErrors};
use validator::Validate;

/// Raw shipping details as typed by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutFormData {
    pub name: String,
    pub address: String,
    pub pincode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: FieldErrors,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn reject(mut self, field: &str, message: &str) -> Self {
        self.errors.insert(field.to_string(), message.to_string());
        self
    }

    /// Convert into the 400 response shape used by the HTTP handlers.
    pub fn into_app_result(self, message: &str) -> Result<(), AppError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(AppError::InvalidFields {
                message: message.to_string(),
                fields: self.errors,
            })
        }
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

/// Exactly 10 ASCII digits: no separators, no country code.
pub fn validate_phone_number(phone: &str) -> ValidationResult {
    let result = ValidationResult::default();
    if is_digits(phone, 10) {
        result
    } else {
        result.reject("phone", "Phone number must be exactly 10 digits")
    }
}

/// Exactly 6 ASCII digits.
pub fn validate_pincode(pincode: &str) -> ValidationResult {
    let result = ValidationResult::default();
    if is_digits(pincode, 6) {
        result
    } else {
        result.reject("pincode", "Pincode must be exactly 6 digits")
    }
}

pub fn validate_checkout_form(data: &CheckoutFormData) -> ValidationResult {
    let mut result = ValidationResult::default();

    if data.name.trim().is_empty() {
        result = result.reject("name", "Name is required");
    }

    if data.address.trim().is_empty() {
        result = result.reject("address", "Address is required");
    }

    if data.pincode.trim().is_empty() {
        result = result.reject("pincode", "Pincode is required");
    } else {
        let pincode = validate_pincode(&data.pincode);
        result.errors.extend(pincode.errors);
    }

    result
}

/// JSON body extractor that runs `validator` rules and reports every
/// rejection as a JSON `AppError` instead of axum's plain-text default.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}
