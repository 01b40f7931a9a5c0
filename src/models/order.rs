use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// Flat VAT applied to every order subtotal
pub const VAT_RATE: f64 = 0.15;

/// Flat shipping charge applied at checkout
pub const SHIPPING_FLAT: f64 = 0.0;

/// Rounds a currency amount to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One cart line as submitted by the storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub postcode: Option<String>,
    /// ISO 3166-1 alpha-2
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub shipping: f64,
    pub total: f64,
}

impl OrderTotals {
    pub fn from_items(items: &[LineItem]) -> Self {
        Self::from_subtotal(items.iter().map(LineItem::line_total).sum())
    }

    pub fn from_subtotal(subtotal: f64) -> Self {
        let subtotal = round2(subtotal);
        let tax = round2(subtotal * VAT_RATE);
        let shipping = SHIPPING_FLAT;
        Self {
            subtotal,
            tax,
            shipping,
            total: round2(subtotal + tax + shipping),
        }
    }
}

/// Checks the cart before anything is sent to a provider
pub fn validate_items(items: &[LineItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::validation("Cart must contain at least one item"));
    }
    for item in items {
        if item.quantity == 0 {
            return Err(AppError::validation(format!(
                "Quantity for '{}' must be at least 1",
                item.name
            )));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(AppError::validation(format!(
                "Price for '{}' must be a non-negative number",
                item.name
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub items: Json<Vec<LineItem>>,
    pub shipping_address: Option<Json<ShippingAddress>>,
    pub discount_code: Option<String>,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping: f64,
    pub total: f64,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a pending order with totals computed from the cart
    pub fn new(
        user_id: Option<String>,
        items: Vec<LineItem>,
        shipping_address: Option<ShippingAddress>,
        discount_code: Option<String>,
        currency: &str,
    ) -> Self {
        let totals = OrderTotals::from_items(&items);
        let now = super::now();
        Self {
            id: super::new_id(),
            user_id,
            session_id: None,
            items: Json(items),
            shipping_address: shipping_address.map(Json),
            discount_code,
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping: totals.shipping,
            total: totals.total,
            currency: currency.to_string(),
            status: "pending".to_string(),
            payment_status: "initiated".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            tax: self.tax,
            shipping: self.shipping,
            total: self.total,
        }
    }

    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

// Storefront catalogues send numeric ids, Shopify sends GID strings
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}
