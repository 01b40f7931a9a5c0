//! DHL Express integration (MyDHL API REST)

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::optional_env;
use crate::error::{AppError, AppResult};
use crate::http_client::{self, Upstream};
use crate::models::Carrier;
use crate::shipping::traits::ShippingCarrier;
use crate::shipping::types::{
    Party, RateQuote, RateRequest, ShipmentConfirmation, ShipmentRequest, ShippingLabel,
};

const CARRIER: &str = "DHL";

const PRODUCTION_URL: &str = "https://express.api.dhl.com/mydhlapi";
const TEST_URL: &str = "https://express.api.dhl.com/mydhlapi/test";

/// DHL Express worldwide
const DEFAULT_PRODUCT_CODE: &str = "P";

/// Statuses MyDHL uses for success; 207 carries partial results
const ACCEPTED_STATUSES: [u16; 3] = [200, 201, 207];

#[derive(Debug, Clone)]
pub struct DhlConfig {
    /// Site ID
    pub username: Option<String>,
    pub password: Option<String>,
    /// Shipper account number
    pub account_number: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for DhlConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            account_number: None,
            base_url: TEST_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl DhlConfig {
    /// Uses the production endpoint only when `production` is set
    pub fn from_env(timeout_secs: u64, production: bool) -> Self {
        let default_url = if production { PRODUCTION_URL } else { TEST_URL };
        Self {
            username: optional_env("DHL_USERNAME"),
            password: optional_env("DHL_PASSWORD"),
            account_number: optional_env("DHL_ACCOUNT_NUMBER"),
            base_url: optional_env("DHL_BASE_URL").unwrap_or_else(|| default_url.to_string()),
            timeout_secs,
        }
    }
}

pub struct DhlCarrier {
    config: DhlConfig,
    client: Client,
}

impl DhlCarrier {
    pub fn new(config: DhlConfig) -> AppResult<Self> {
        let client = http_client::build_client(CARRIER, config.timeout_secs)?;
        Ok(Self { config, client })
    }

    fn auth_header(&self) -> AppResult<String> {
        match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) => Ok(format!(
                "Basic {}",
                STANDARD.encode(format!("{}:{}", user, pass))
            )),
            _ => Err(AppError::configuration(
                "DHL credentials not configured (DHL_USERNAME, DHL_PASSWORD)",
            )),
        }
    }

    fn account_number(&self) -> AppResult<&str> {
        self.config
            .account_number
            .as_deref()
            .ok_or_else(|| AppError::configuration("DHL_ACCOUNT_NUMBER not configured"))
    }

    /// Sends the request and returns the body of an accepted response
    async fn execute(&self, request: reqwest::RequestBuilder, operation: &str) -> AppResult<String> {
        let response = request
            .header("Authorization", self.auth_header()?)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                http_client::transport_error(Upstream::Shipping, CARRIER, self.config.timeout_secs, e)
            })?;
        let (status, body) =
            http_client::read_body(Upstream::Shipping, CARRIER, self.config.timeout_secs, response)
                .await?;

        if ACCEPTED_STATUSES.contains(&status) {
            return Ok(body);
        }

        if (400..500).contains(&status) {
            let detail = serde_json::from_str::<DhlProblem>(&body)
                .ok()
                .and_then(|p| p.detail.or(p.title))
                .unwrap_or_else(|| body.clone());
            warn!("DHL {} rejected: HTTP {}: {}", operation, status, body);
            return Err(AppError::provider_rejected(
                CARRIER,
                Some(status.to_string()),
                detail,
            ));
        }

        error!("DHL {} failed: HTTP {}: {}", operation, status, body);
        Err(AppError::shipping_provider(
            CARRIER,
            format!("HTTP {}: {}", status, body),
        ))
    }

    fn rate_query(&self, request: &RateRequest, account: &str) -> Vec<(String, String)> {
        let package = &request.package;
        vec![
            ("accountNumber".to_string(), account.to_string()),
            ("originCountryCode".to_string(), request.origin.country_code.clone()),
            ("originCityName".to_string(), request.origin.city.clone()),
            (
                "destinationCountryCode".to_string(),
                request.destination.country_code.clone(),
            ),
            ("destinationCityName".to_string(), request.destination.city.clone()),
            ("weight".to_string(), package.weight_kg.to_string()),
            ("length".to_string(), package.length_cm.to_string()),
            ("width".to_string(), package.width_cm.to_string()),
            ("height".to_string(), package.height_cm.to_string()),
            (
                "plannedShippingDate".to_string(),
                request.shipping_date().format("%Y-%m-%d").to_string(),
            ),
            ("isCustomsDeclarable".to_string(), "false".to_string()),
            ("unitOfMeasurement".to_string(), "metric".to_string()),
        ]
    }

    fn party_details(party: &Party) -> serde_json::Value {
        json!({
            "postalAddress": {
                "addressLine1": party.street,
                "cityName": party.city,
                "postalCode": party.postal_code.clone().unwrap_or_default(),
                "countryCode": party.country_code,
            },
            "contactInformation": {
                "fullName": party.name,
                "companyName": party.company.clone().unwrap_or_else(|| party.name.clone()),
                "phone": party.phone,
                "email": party.email,
            }
        })
    }

    fn shipment_body(request: &ShipmentRequest, account: &str) -> serde_json::Value {
        let international = request.shipper.country_code != request.recipient.country_code;
        let packages: Vec<serde_json::Value> = request
            .packages
            .iter()
            .map(|p| {
                json!({
                    "weight": p.weight_kg,
                    "dimensions": {
                        "length": p.length_cm,
                        "width": p.width_cm,
                        "height": p.height_cm,
                    }
                })
            })
            .collect();

        json!({
            "plannedShippingDateAndTime": format!(
                "{}T10:00:00 GMT+03:00",
                request.shipping_date().format("%Y-%m-%d")
            ),
            "pickup": { "isRequested": false },
            "productCode": request
                .product_code
                .clone()
                .unwrap_or_else(|| DEFAULT_PRODUCT_CODE.to_string()),
            "accounts": [{ "typeCode": "shipper", "number": account }],
            "customerReferences": request
                .reference
                .as_ref()
                .map(|r| vec![json!({ "value": r, "typeCode": "CU" })])
                .unwrap_or_default(),
            "customerDetails": {
                "shipperDetails": Self::party_details(&request.shipper),
                "receiverDetails": Self::party_details(&request.recipient),
            },
            "content": {
                "packages": packages,
                "isCustomsDeclarable": false,
                "description": request
                    .description
                    .clone()
                    .unwrap_or_else(|| "Apparel".to_string()),
                "incoterm": if international { "DAP" } else { "DDP" },
                "unitOfMeasurement": "metric",
            }
        })
    }
}

#[async_trait]
impl ShippingCarrier for DhlCarrier {
    fn carrier(&self) -> Carrier {
        Carrier::Dhl
    }

    async fn rate(&self, request: &RateRequest) -> AppResult<Vec<RateQuote>> {
        let account = self.account_number()?;
        info!(
            "Requesting DHL rates: {} -> {} ({}kg)",
            request.origin.country_code, request.destination.country_code, request.package.weight_kg
        );

        let query = http_client::form_body(&self.rate_query(request, account))?;
        let body = self
            .execute(
                self.client
                    .get(format!("{}/rates?{}", self.config.base_url, query)),
                "rates",
            )
            .await?;

        let parsed: DhlRatesResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::shipping_provider(CARRIER, format!("Invalid rates response: {}: {}", e, body))
        })?;

        let quotes = parsed
            .products
            .into_iter()
            .filter_map(|product| {
                let price = product.total_price.first()?;
                Some(RateQuote {
                    carrier: CARRIER.to_string(),
                    product_code: product.product_code,
                    product_name: product.product_name,
                    cost: price.price?,
                    currency: price
                        .price_currency
                        .clone()
                        .or_else(|| price.currency_type.clone())
                        .unwrap_or_default(),
                    transit_estimate: product
                        .delivery_capabilities
                        .and_then(|d| d.estimated_delivery_date_and_time),
                })
            })
            .collect::<Vec<_>>();

        info!("DHL returned {} rate(s)", quotes.len());
        Ok(quotes)
    }

    async fn create_shipment(&self, request: &ShipmentRequest) -> AppResult<ShipmentConfirmation> {
        let account = self.account_number()?;
        info!(
            "Creating DHL shipment: {} -> {} ({} package(s))",
            request.shipper.country_code,
            request.recipient.country_code,
            request.packages.len()
        );

        let body = self
            .execute(
                self.client
                    .post(format!("{}/shipments", self.config.base_url))
                    .json(&Self::shipment_body(request, account)),
                "shipment",
            )
            .await?;

        let parsed: DhlShipmentResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::shipping_provider(
                CARRIER,
                format!("Invalid shipment response: {}: {}", e, body),
            )
        })?;

        let label = parsed
            .documents
            .into_iter()
            .find(|d| d.type_code.as_deref() == Some("label"))
            .map(|d| ShippingLabel {
                format: d.image_format,
                content: d.content,
                url: None,
            });

        info!(
            "DHL shipment created: tracking_number={}",
            parsed.shipment_tracking_number
        );

        Ok(ShipmentConfirmation {
            tracking_number: parsed.shipment_tracking_number,
            label,
        })
    }

    async fn track(&self, tracking_number: &str) -> AppResult<serde_json::Value> {
        let tracking_number = http_client::reference_segment("tracking number", tracking_number)?;
        info!("Tracking DHL shipment {}", tracking_number);
        let url = http_client::endpoint(
            &self.config.base_url,
            &["shipments", tracking_number, "tracking"],
        )?;
        let body = self.execute(self.client.get(url), "tracking").await?;

        serde_json::from_str(&body).map_err(|e| {
            AppError::shipping_provider(CARRIER, format!("Invalid tracking response: {}", e))
        })
    }
}

#[derive(Debug, Deserialize)]
struct DhlProblem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DhlRatesResponse {
    #[serde(default)]
    products: Vec<DhlProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlProduct {
    product_code: String,
    #[serde(default)]
    product_name: String,
    #[serde(default)]
    total_price: Vec<DhlPrice>,
    #[serde(default)]
    delivery_capabilities: Option<DhlDeliveryCapabilities>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlPrice {
    #[serde(default)]
    currency_type: Option<String>,
    #[serde(default)]
    price_currency: Option<String>,
    #[serde(default)]
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlDeliveryCapabilities {
    #[serde(default)]
    estimated_delivery_date_and_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlShipmentResponse {
    shipment_tracking_number: String,
    #[serde(default)]
    documents: Vec<DhlDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DhlDocument {
    #[serde(default)]
    image_format: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    type_code: Option<String>,
}
