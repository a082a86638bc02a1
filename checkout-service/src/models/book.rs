use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable catalog entry. Prices are in the minor currency unit (paise).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: u64,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
}

/// Render a minor-unit amount for display, e.g. `29900` -> `₹299.00`.
pub fn format_price(amount: u64) -> String {
    format!("₹{}.{:02}", amount / 100, amount % 100)
}
