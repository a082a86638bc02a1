use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const ORDERS_CREATED: &str = "checkout_orders_created_total";
pub const ORDER_FAILURES: &str = "checkout_order_failures_total";
pub const PAYMENT_VERIFICATIONS: &str = "checkout_payment_verifications_total";
pub const PINCODE_LOOKUPS: &str = "checkout_pincode_lookups_total";

/// Install the Prometheus recorder. A second call is a no-op.
pub fn init_metrics() -> anyhow::Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!(ORDERS_CREATED, "Orders opened with the payment gateway");
    metrics::describe_counter!(ORDER_FAILURES, "Rejected or failed order creations by reason");
    metrics::describe_counter!(PAYMENT_VERIFICATIONS, "Payment signature checks by outcome");
    metrics::describe_counter!(PINCODE_LOOKUPS, "Pincode serviceability lookups");

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("metrics handle already initialized"))
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

pub fn record_order_created(currency: &str, amount: u64) {
    metrics::counter!(ORDERS_CREATED, "currency" => currency.to_string()).increment(1);
    metrics::counter!("checkout_order_amount_total", "currency" => currency.to_string())
        .increment(amount);
}

pub fn record_order_failure(reason: &'static str) {
    metrics::counter!(ORDER_FAILURES, "reason" => reason).increment(1);
}

pub fn record_payment_verification(outcome: &'static str) {
    metrics::counter!(PAYMENT_VERIFICATIONS, "outcome" => outcome).increment(1);
}

pub fn record_pincode_lookup(available: bool) {
    metrics::counter!(PINCODE_LOOKUPS, "available" => available.to_string()).increment(1);
}
