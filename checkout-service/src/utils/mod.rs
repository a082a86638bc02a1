pub mod validation;

pub use validation::{
    validate_checkout_form, validate_phone_number, validate_pincode, CheckoutFormData,
    ValidatedJson, ValidationResult,
};
