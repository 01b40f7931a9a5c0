use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Carrier {
    Dhl,
    Aramex,
}

impl Carrier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Dhl => "dhl",
            Carrier::Aramex => "aramex",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Carrier::Dhl => "DHL",
            Carrier::Aramex => "Aramex",
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Carrier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dhl" => Ok(Carrier::Dhl),
            "aramex" => Ok(Carrier::Aramex),
            other => Err(AppError::not_found("Carrier", other)),
        }
    }
}

/// A shipment recorded once, when the carrier confirms creation
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Shipment {
    pub id: String,
    pub carrier: String,
    pub tracking_number: String,
    pub shipper_name: String,
    pub recipient_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Shipment {
    pub fn created(
        carrier: Carrier,
        tracking_number: impl Into<String>,
        shipper_name: impl Into<String>,
        recipient_name: impl Into<String>,
    ) -> Self {
        Self {
            id: super::new_id(),
            carrier: carrier.as_str().to_string(),
            tracking_number: tracking_number.into(),
            shipper_name: shipper_name.into(),
            recipient_name: recipient_name.into(),
            status: "created".to_string(),
            created_at: super::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_parses_case_insensitively() {
        assert_eq!("DHL".parse::<Carrier>().unwrap(), Carrier::Dhl);
        assert_eq!("aramex".parse::<Carrier>().unwrap(), Carrier::Aramex);
        assert!("fedex".parse::<Carrier>().is_err());
    }

    #[test]
    fn test_shipment_is_created_status() {
        let shipment = Shipment::created(Carrier::Aramex, "3000123", "Store", "Sara");
        assert_eq!(shipment.status, "created");
        assert_eq!(shipment.carrier, "aramex");
    }
}
