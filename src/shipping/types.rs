//! Carrier-neutral shipping types

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

fn default_origin_country() -> String {
    "SA".to_string()
}

fn default_origin_city() -> String {
    "Riyadh".to_string()
}

fn default_weight() -> f64 {
    0.5
}

fn default_dimension() -> f64 {
    10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// ISO 3166-1 alpha-2
    pub country_code: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            country_code: default_origin_country(),
            city: default_origin_city(),
            postal_code: None,
        }
    }
}

/// Package measured in kilograms and centimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Package {
    #[serde(default = "default_weight")]
    pub weight_kg: f64,
    #[serde(default = "default_dimension")]
    pub length_cm: f64,
    #[serde(default = "default_dimension")]
    pub width_cm: f64,
    #[serde(default = "default_dimension")]
    pub height_cm: f64,
}

impl Default for Package {
    fn default() -> Self {
        Self {
            weight_kg: default_weight(),
            length_cm: default_dimension(),
            width_cm: default_dimension(),
            height_cm: default_dimension(),
        }
    }
}

impl Package {
    fn validate(&self) -> AppResult<()> {
        let values = [self.weight_kg, self.length_cm, self.width_cm, self.height_cm];
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(AppError::validation(
                "Package weight and dimensions must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRequest {
    #[serde(default)]
    pub origin: Location,
    pub destination: Location,
    #[serde(default)]
    pub package: Package,
    /// Defaults to tomorrow
    #[serde(default)]
    pub planned_shipping_date: Option<NaiveDate>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl RateRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.destination.country_code.trim().len() != 2 {
            return Err(AppError::validation(
                "Destination country must be a two-letter code",
            ));
        }
        self.package.validate()
    }

    pub fn shipping_date(&self) -> NaiveDate {
        self.planned_shipping_date
            .unwrap_or_else(|| (Utc::now() + Duration::days(1)).date_naive())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    pub carrier: String,
    pub product_code: String,
    pub product_name: String,
    pub cost: f64,
    pub currency: String,
    /// Carrier's delivery estimate, as sent
    pub transit_estimate: Option<String>,
}

/// Shipper or recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    pub country_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub shipper: Party,
    pub recipient: Party,
    pub packages: Vec<Package>,
    #[serde(default)]
    pub description: Option<String>,
    /// Carrier product code (DHL `P`, `N`...); carrier default when unset
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub planned_shipping_date: Option<NaiveDate>,
}

impl ShipmentRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.packages.is_empty() {
            return Err(AppError::validation("Shipment needs at least one package"));
        }
        for party in [&self.shipper, &self.recipient] {
            if party.name.trim().is_empty() || party.country_code.trim().len() != 2 {
                return Err(AppError::validation(
                    "Shipper and recipient need a name and a two-letter country code",
                ));
            }
        }
        self.packages.iter().try_for_each(Package::validate)
    }

    pub fn total_weight(&self) -> f64 {
        self.packages.iter().map(|p| p.weight_kg).sum()
    }

    pub fn shipping_date(&self) -> NaiveDate {
        self.planned_shipping_date
            .unwrap_or_else(|| (Utc::now() + Duration::days(1)).date_naive())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShippingLabel {
    /// `PDF`, `ZPL`...
    pub format: Option<String>,
    /// Base64 document content
    pub content: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipmentConfirmation {
    pub tracking_number: String,
    pub label: Option<ShippingLabel>,
}
