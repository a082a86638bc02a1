use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Fast,
    Standard,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Fast => f.write_str("fast"),
            Zone::Standard => f.write_str("standard"),
        }
    }
}

/// Inclusive pincode range served by one delivery bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub pincode_start: u32,
    pub pincode_end: u32,
    pub delivery_days: String,
    pub zone: Zone,
}

impl DeliveryZone {
    pub fn new(start: u32, end: u32, delivery_days: &str, zone: Zone) -> Self {
        Self {
            pincode_start: start,
            pincode_end: end,
            delivery_days: delivery_days.to_string(),
            zone,
        }
    }

    pub fn contains(&self, pincode: u32) -> bool {
        (self.pincode_start..=self.pincode_end).contains(&pincode)
    }
}
