//! Pincode serviceability.
//!
//! A pincode is serviceable when it falls inside one of the configured
//! inclusive ranges; the first matching range wins. Format checks (six
//! digits) belong to the validators, not here.

use crate::models::{DeliveryZone, Zone};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const UNAVAILABLE_MESSAGE: &str = "Delivery not available for this pincode";

#[async_trait]
pub trait ZoneDirectory: Send + Sync {
    async fn zones(&self) -> anyhow::Result<Vec<DeliveryZone>>;
}

/// Curated zone table. Ranges are expected not to overlap; this is not checked.
pub struct StaticZoneDirectory {
    zones: Vec<DeliveryZone>,
}

impl StaticZoneDirectory {
    pub fn new(zones: Vec<DeliveryZone>) -> Self {
        Self { zones }
    }

    /// One fast (3 day) and one standard (5-7 day) bucket per region.
    pub fn seeded() -> Self {
        let fast = |start, end| DeliveryZone::new(start, end, "3 days", Zone::Fast);
        let standard = |start, end| DeliveryZone::new(start, end, "5-7 days", Zone::Standard);

        Self::new(vec![
            fast(110001, 110099),
            fast(400001, 400099),
            fast(560001, 560099),
            fast(700001, 700099),
            standard(600001, 600099),
            standard(500001, 500099),
            standard(302001, 302099),
            standard(380001, 380099),
        ])
    }
}

#[async_trait]
impl ZoneDirectory for StaticZoneDirectory {
    async fn zones(&self) -> anyhow::Result<Vec<DeliveryZone>> {
        Ok(self.zones.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Serviceability {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_days: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<Zone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Serviceability {
    pub fn unavailable(message: &str) -> Self {
        Self {
            available: false,
            delivery_days: None,
            zone: None,
            message: Some(message.to_string()),
        }
    }
}

/// Leading-integer parse: optional surrounding whitespace, then digits.
/// Trailing garbage is ignored; no digits at all yields `None`.
fn parse_pincode(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// First zone whose inclusive range contains the pincode.
pub fn resolve(zones: &[DeliveryZone], pincode: &str) -> Serviceability {
    let matched = parse_pincode(pincode)
        .and_then(|value| zones.iter().find(|zone| zone.contains(value)));

    match matched {
        Some(zone) => Serviceability {
            available: true,
            delivery_days: Some(zone.delivery_days.clone()),
            zone: Some(zone.zone),
            message: None,
        },
        None => Serviceability::unavailable(UNAVAILABLE_MESSAGE),
    }
}

#[derive(Clone)]
pub struct PincodeResolver {
    directory: Arc<dyn ZoneDirectory>,
}

impl PincodeResolver {
    pub fn new(directory: Arc<dyn ZoneDirectory>) -> Self {
        Self { directory }
    }

    pub async fn lookup(&self, pincode: &str) -> anyhow::Result<Serviceability> {
        let zones = self.directory.zones().await?;
        let result = resolve(&zones, pincode);

        tracing::debug!(
            pincode = %pincode,
            available = result.available,
            zone = ?result.zone,
            "Pincode lookup"
        );

        Ok(result)
    }
}
