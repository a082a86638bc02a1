pub mod catalog;
pub mod gateway;
pub mod metrics;
pub mod order_store;
pub mod orders;
pub mod otp;
pub mod payments;
pub mod pincode;
pub mod razorpay;
pub mod signatures;

pub use catalog::{BookCatalog, StaticCatalog};
pub use gateway::{GatewayError, GatewayOrder, GatewayOrderRequest, PaymentGateway};
pub use metrics::{get_metrics, init_metrics};
pub use order_store::{InMemoryOrderStore, MongoOrderStore, OrderStore, PaymentTransition};
pub use orders::{OrderError, OrderService};
pub use otp::{AuthError, AuthSession, MockOtpAuthenticator, OtpAuthenticator, SupabaseOtpAuthenticator};
pub use payments::{PaymentVerifier, VerificationError};
pub use pincode::{PincodeResolver, Serviceability, StaticZoneDirectory, ZoneDirectory};
pub use razorpay::{generate_signature, verify_signature, RazorpayClient};
pub use signatures::ClientSignatures;
