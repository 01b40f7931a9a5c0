//! Aramex integration (Shipping Services API, JSON endpoints)
//!
//! Aramex reports business failures inside a 200 response: every reply carries
//! `HasErrors` and a list of `Notifications`, and both must be checked.

use async_trait::async_trait;
use chrono::{NaiveTime, TimeZone, Utc};
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
    Package, Party, RateQuote, RateRequest, ShipmentConfirmation, ShipmentRequest, ShippingLabel,
};

const CARRIER: &str = "Aramex";

const RATE_PATH: &str = "RateCalculator/Service_1_0.svc/json/CalculateRate";
const SHIPMENT_PATH: &str = "Shipping/Service_1_0.svc/json/CreateShipments";
const TRACKING_PATH: &str = "Tracking/Service_1_0.svc/json/TrackShipments";

#[derive(Debug, Clone)]
pub struct AramexConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub account_number: Option<String>,
    pub account_pin: Option<String>,
    /// Aramex entity code, e.g. `RUH`
    pub account_entity: Option<String>,
    pub account_country_code: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for AramexConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            account_number: None,
            account_pin: None,
            account_entity: None,
            account_country_code: "SA".to_string(),
            base_url: "https://ws.dev.aramex.net/ShippingAPI.V2".to_string(),
            timeout_secs: 30,
        }
    }
}

impl AramexConfig {
    pub fn from_env(timeout_secs: u64) -> Self {
        let defaults = Self::default();
        Self {
            username: optional_env("ARAMEX_USERNAME"),
            password: optional_env("ARAMEX_PASSWORD"),
            account_number: optional_env("ARAMEX_ACCOUNT_NUMBER"),
            account_pin: optional_env("ARAMEX_ACCOUNT_PIN"),
            account_entity: optional_env("ARAMEX_ACCOUNT_ENTITY"),
            account_country_code: optional_env("ARAMEX_ACCOUNT_COUNTRY_CODE")
                .unwrap_or(defaults.account_country_code),
            base_url: optional_env("ARAMEX_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs,
        }
    }
}

pub struct AramexCarrier {
    config: AramexConfig,
    client: Client,
}

impl AramexCarrier {
    pub fn new(config: AramexConfig) -> AppResult<Self> {
        let client = http_client::build_client(CARRIER, config.timeout_secs)?;
        Ok(Self { config, client })
    }

    fn client_info(&self) -> AppResult<serde_json::Value> {
        let c = &self.config;
        match (&c.username, &c.password, &c.account_number, &c.account_pin) {
            (Some(user), Some(pass), Some(number), Some(pin)) => Ok(json!({
                "UserName": user,
                "Password": pass,
                "Version": "v1.0",
                "AccountNumber": number,
                "AccountPin": pin,
                "AccountEntity": c.account_entity.clone().unwrap_or_default(),
                "AccountCountryCode": c.account_country_code,
                "Source": 24,
            })),
            _ => Err(AppError::configuration(
                "Aramex credentials not configured (ARAMEX_USERNAME, ARAMEX_PASSWORD, \
                 ARAMEX_ACCOUNT_NUMBER, ARAMEX_ACCOUNT_PIN)",
            )),
        }
    }

    /// Posts to an Aramex endpoint and checks both failure channels
    async fn call<T>(&self, path: &str, body: serde_json::Value) -> AppResult<T>
    where
        T: for<'de> Deserialize<'de> + HasNotifications,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.config.base_url, path))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                http_client::transport_error(Upstream::Shipping, CARRIER, self.config.timeout_secs, e)
            })?;
        let (status, text) =
            http_client::read_body(Upstream::Shipping, CARRIER, self.config.timeout_secs, response)
                .await?;

        if (400..500).contains(&status) {
            warn!("Aramex rejected {}: HTTP {}: {}", path, status, text);
            return Err(AppError::provider_rejected(
                CARRIER,
                Some(status.to_string()),
                text,
            ));
        }
        if !(200..300).contains(&status) {
            error!("Aramex {} failed: HTTP {}: {}", path, status, text);
            return Err(AppError::shipping_provider(
                CARRIER,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let parsed: T = serde_json::from_str(&text).map_err(|e| {
            AppError::shipping_provider(CARRIER, format!("Invalid response: {}: {}", e, text))
        })?;

        if parsed.has_errors() {
            let detail = parsed.notification_summary();
            warn!("Aramex reported errors for {}: {}", path, detail);
            return Err(AppError::provider_rejected(CARRIER, None, detail));
        }

        Ok(parsed)
    }

    /// Domestic express inside one country, priority parcel otherwise
    fn product(origin_country: &str, destination_country: &str) -> (&'static str, &'static str) {
        if origin_country.eq_ignore_ascii_case(destination_country) {
            ("DOM", "ONP")
        } else {
            ("EXP", "PPX")
        }
    }

    fn dimensions(package: &Package) -> serde_json::Value {
        json!({
            "Length": package.length_cm,
            "Width": package.width_cm,
            "Height": package.height_cm,
            "Unit": "CM",
        })
    }

    fn party(party: &Party, account_number: Option<&str>, reference: Option<&str>) -> serde_json::Value {
        json!({
            "Reference1": reference.unwrap_or_default(),
            "AccountNumber": account_number.unwrap_or_default(),
            "PartyAddress": {
                "Line1": party.street,
                "City": party.city,
                "PostCode": party.postal_code.clone().unwrap_or_default(),
                "CountryCode": party.country_code,
            },
            "Contact": {
                "PersonName": party.name,
                "CompanyName": party.company.clone().unwrap_or_else(|| party.name.clone()),
                "PhoneNumber1": party.phone,
                "CellPhone": party.phone,
                "EmailAddress": party.email.clone().unwrap_or_default(),
            }
        })
    }

    /// WCF JSON date literal
    fn wcf_date(request: &ShipmentRequest) -> String {
        let noon = request
            .shipping_date()
            .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default());
        format!("/Date({})/", Utc.from_utc_datetime(&noon).timestamp_millis())
    }
}

#[async_trait]
impl ShippingCarrier for AramexCarrier {
    fn carrier(&self) -> Carrier {
        Carrier::Aramex
    }

    async fn rate(&self, request: &RateRequest) -> AppResult<Vec<RateQuote>> {
        let client_info = self.client_info()?;
        let (group, product_type) =
            Self::product(&request.origin.country_code, &request.destination.country_code);
        info!(
            "Requesting Aramex rate: {} -> {} ({}kg, {})",
            request.origin.country_code,
            request.destination.country_code,
            request.package.weight_kg,
            group
        );

        let weight = json!({ "Unit": "KG", "Value": request.package.weight_kg });
        let body = json!({
            "ClientInfo": client_info,
            "Transaction": { "Reference1": "" },
            "OriginAddress": {
                "City": request.origin.city,
                "CountryCode": request.origin.country_code,
                "PostCode": request.origin.postal_code.clone().unwrap_or_default(),
            },
            "DestinationAddress": {
                "City": request.destination.city,
                "CountryCode": request.destination.country_code,
                "PostCode": request.destination.postal_code.clone().unwrap_or_default(),
            },
            "ShipmentDetails": {
                "PaymentType": "P",
                "ProductGroup": group,
                "ProductType": product_type,
                "ActualWeight": weight,
                "ChargeableWeight": weight,
                "NumberOfPieces": 1,
                "Dimensions": Self::dimensions(&request.package),
            },
            "PreferredCurrencyCode": request
                .currency
                .clone()
                .unwrap_or_else(|| "SAR".to_string())
                .to_uppercase(),
        });

        let parsed: AramexRateResponse = self.call(RATE_PATH, body).await?;
        let total = parsed.total_amount.ok_or_else(|| {
            AppError::shipping_provider(CARRIER, "Rate response has no TotalAmount")
        })?;

        Ok(vec![RateQuote {
            carrier: CARRIER.to_string(),
            product_code: product_type.to_string(),
            product_name: format!("Aramex {}", if group == "DOM" { "Domestic" } else { "Express" }),
            cost: total.value,
            currency: total.currency_code,
            transit_estimate: None,
        }])
    }

    async fn create_shipment(&self, request: &ShipmentRequest) -> AppResult<ShipmentConfirmation> {
        let client_info = self.client_info()?;
        let (group, product_type) =
            Self::product(&request.shipper.country_code, &request.recipient.country_code);
        info!(
            "Creating Aramex shipment: {} -> {} ({} package(s))",
            request.shipper.country_code,
            request.recipient.country_code,
            request.packages.len()
        );

        let weight = json!({ "Unit": "KG", "Value": request.total_weight() });
        let first_package = request.packages.first().copied().unwrap_or_default();
        let date = Self::wcf_date(request);
        let reference = request.reference.as_deref();

        let body = json!({
            "ClientInfo": client_info,
            "LabelInfo": { "ReportID": 9201, "ReportType": "URL" },
            "Shipments": [{
                "Reference1": reference.unwrap_or_default(),
                "Shipper": Self::party(
                    &request.shipper,
                    self.config.account_number.as_deref(),
                    reference,
                ),
                "Consignee": Self::party(&request.recipient, None, None),
                "ShippingDateTime": date,
                "DueDate": date,
                "Details": {
                    "Dimensions": Self::dimensions(&first_package),
                    "ActualWeight": weight,
                    "ChargeableWeight": weight,
                    "NumberOfPieces": request.packages.len(),
                    "ProductGroup": group,
                    "ProductType": request.product_code.clone().unwrap_or_else(|| product_type.to_string()),
                    "PaymentType": "P",
                    "DescriptionOfGoods": request.description.clone().unwrap_or_else(|| "Apparel".to_string()),
                    "GoodsOriginCountry": request.shipper.country_code,
                },
            }],
            "Transaction": { "Reference1": reference.unwrap_or_default() },
        });

        let parsed: AramexShipmentResponse = self.call(SHIPMENT_PATH, body).await?;
        let shipment = parsed.shipments.into_iter().next().ok_or_else(|| {
            AppError::shipping_provider(CARRIER, "Shipment response contained no shipments")
        })?;

        if shipment.has_errors {
            let detail = join_notifications(&shipment.notifications);
            warn!("Aramex rejected shipment: {}", detail);
            return Err(AppError::provider_rejected(CARRIER, None, detail));
        }

        info!("Aramex shipment created: tracking_number={}", shipment.id);

        Ok(ShipmentConfirmation {
            tracking_number: shipment.id,
            label: shipment.shipment_label.map(|l| ShippingLabel {
                format: Some("PDF".to_string()),
                content: l.label_file_contents,
                url: l.label_url,
            }),
        })
    }

    async fn track(&self, tracking_number: &str) -> AppResult<serde_json::Value> {
        let client_info = self.client_info()?;
        info!("Tracking Aramex shipment {}", tracking_number);

        let body = json!({
            "ClientInfo": client_info,
            "Shipments": [tracking_number],
            "GetLastTrackingUpdateOnly": false,
            "Transaction": { "Reference1": "" },
        });

        let parsed: AramexTrackingResponse = self.call(TRACKING_PATH, body).await?;
        Ok(serde_json::Value::Object(parsed.rest))
    }
}

/// Common `HasErrors` / `Notifications` envelope
pub trait HasNotifications {
    fn has_errors(&self) -> bool;
    fn notifications(&self) -> &[AramexNotification];

    fn notification_summary(&self) -> String {
        let joined = join_notifications(self.notifications());
        if joined.is_empty() {
            "Aramex reported an error without details".to_string()
        } else {
            joined
        }
    }
}

fn join_notifications(notifications: &[AramexNotification]) -> String {
    notifications
        .iter()
        .map(|n| match &n.code {
            Some(code) => format!("{}: {}", code, n.message),
            None => n.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AramexNotification {
    #[serde(rename = "Code", default)]
    pub code: Option<String>,
    #[serde(rename = "Message", default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct AramexAmount {
    #[serde(rename = "CurrencyCode", default)]
    currency_code: String,
    #[serde(rename = "Value")]
    value: f64,
}

#[derive(Debug, Deserialize)]
struct AramexRateResponse {
    #[serde(rename = "HasErrors", default)]
    has_errors: bool,
    #[serde(rename = "Notifications", default)]
    notifications: Vec<AramexNotification>,
    #[serde(rename = "TotalAmount", default)]
    total_amount: Option<AramexAmount>,
}

#[derive(Debug, Deserialize)]
struct AramexShipmentResponse {
    #[serde(rename = "HasErrors", default)]
    has_errors: bool,
    #[serde(rename = "Notifications", default)]
    notifications: Vec<AramexNotification>,
    #[serde(rename = "Shipments", default)]
    shipments: Vec<AramexProcessedShipment>,
}

#[derive(Debug, Deserialize)]
struct AramexProcessedShipment {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "HasErrors", default)]
    has_errors: bool,
    #[serde(rename = "Notifications", default)]
    notifications: Vec<AramexNotification>,
    #[serde(rename = "ShipmentLabel", default)]
    shipment_label: Option<AramexLabel>,
}

#[derive(Debug, Deserialize)]
struct AramexLabel {
    #[serde(rename = "LabelURL", default)]
    label_url: Option<String>,
    #[serde(rename = "LabelFileContents", default)]
    label_file_contents: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AramexTrackingResponse {
    #[serde(rename = "HasErrors", default)]
    has_errors: bool,
    #[serde(rename = "Notifications", default)]
    notifications: Vec<AramexNotification>,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

macro_rules! impl_has_notifications {
    ($($ty:ty),*) => {
        $(impl HasNotifications for $ty {
            fn has_errors(&self) -> bool {
                self.has_errors
            }

            fn notifications(&self) -> &[AramexNotification] {
                &self.notifications
            }
        })*
    };
}

impl_has_notifications!(AramexRateResponse, AramexShipmentResponse, AramexTrackingResponse);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shipping::types::Location;
    use http::StatusCode;

    fn carrier(base_url: &str) -> AramexCarrier {
        AramexCarrier::new(AramexConfig {
            username: Some("api@store.sa".to_string()),
            password: Some("pw".to_string()),
            account_number: Some("20016".to_string()),
            account_pin: Some("331421".to_string()),
            account_entity: Some("RUH".to_string()),
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..AramexConfig::default()
        })
        .unwrap()
    }

    fn rate_request(country: &str) -> RateRequest {
        RateRequest {
            origin: Location::default(),
            destination: Location {
                country_code: country.to_string(),
                city: "Jeddah".to_string(),
                postal_code: None,
            },
            package: Package::default(),
            planned_shipping_date: None,
            currency: None,
        }
    }

    #[test]
    fn test_product_group_follows_route() {
        assert_eq!(AramexCarrier::product("SA", "sa"), ("DOM", "ONP"));
        assert_eq!(AramexCarrier::product("SA", "AE"), ("EXP", "PPX"));
    }

    #[tokio::test]
    async fn test_rate_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", format!("/{}", RATE_PATH).as_str())
            .match_body(mockito::Matcher::PartialJson(json!({
                "ClientInfo": { "AccountNumber": "20016", "Source": 24 },
                "ShipmentDetails": { "ProductGroup": "DOM" }
            })))
            .with_status(200)
            .with_body(
                r#"{"HasErrors":false,"Notifications":[],"TotalAmount":{"CurrencyCode":"SAR","Value":27.0}}"#,
            )
            .create_async()
            .await;

        let quotes = carrier(&server.url()).rate(&rate_request("SA")).await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].cost, 27.0);
        assert_eq!(quotes[0].currency, "SAR");
    }

    #[tokio::test]
    async fn test_has_errors_in_ok_response_is_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", format!("/{}", RATE_PATH).as_str())
            .with_status(200)
            .with_body(
                r#"{"HasErrors":true,"Notifications":[{"Code":"ERR01","Message":"Invalid destination city"}],"TotalAmount":null}"#,
            )
            .create_async()
            .await;

        let err = carrier(&server.url())
            .rate(&rate_request("SA"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("ERR01: Invalid destination city"));
    }

    #[tokio::test]
    async fn test_server_error_is_bad_gateway() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", format!("/{}", TRACKING_PATH).as_str())
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let err = carrier(&server.url()).track("3000123").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_create_shipment_returns_tracking_and_label() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", format!("/{}", SHIPMENT_PATH).as_str())
            .with_status(200)
            .with_body(
                r#"{"HasErrors":false,"Notifications":[],"Shipments":[{"ID":"44012345678","HasErrors":false,"Notifications":[],"ShipmentLabel":{"LabelURL":"https://ws.aramex.net/label/44012345678.pdf","LabelFileContents":null}}]}"#,
            )
            .create_async()
            .await;

        let party = Party {
            name: "Store".to_string(),
            company: None,
            phone: "+966500000000".to_string(),
            email: None,
            street: "Olaya St".to_string(),
            city: "Riyadh".to_string(),
            postal_code: None,
            country_code: "SA".to_string(),
        };
        let request = ShipmentRequest {
            shipper: party.clone(),
            recipient: Party {
                name: "Sara".to_string(),
                ..party
            },
            packages: vec![Package::default()],
            description: None,
            product_code: None,
            reference: Some("ord_1".to_string()),
            planned_shipping_date: None,
        };

        let confirmation = carrier(&server.url())
            .create_shipment(&request)
            .await
            .unwrap();
        assert_eq!(confirmation.tracking_number, "44012345678");
        assert!(confirmation.label.unwrap().url.unwrap().ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_tracking_passes_body_through() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", format!("/{}", TRACKING_PATH).as_str())
            .with_status(200)
            .with_body(
                r#"{"HasErrors":false,"Notifications":[],"TrackingResults":[{"Key":"3000123","Value":[{"UpdateDescription":"Delivered"}]}]}"#,
            )
            .create_async()
            .await;

        let body = carrier(&server.url()).track("3000123").await.unwrap();
        assert_eq!(body["TrackingResults"][0]["Key"], "3000123");
    }
}
