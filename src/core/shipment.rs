//! Shipment input model
//!
//! `ShipmentRecord` and `LabelOptions` are the two caller-supplied inputs of a
//! label generation. Both deserialize from the camelCase JSON the order
//! dashboard already produces, and both are treated as immutable once built.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Order identifier
///
/// Accepts a JSON number or a non-empty JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        OrderId(id.to_string())
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        OrderId(id.trim().to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        OrderId::from(id.as_str())
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Unsigned(u64),
            Signed(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Unsigned(n) => Ok(OrderId(n.to_string())),
            Raw::Signed(n) => Ok(OrderId(n.to_string())),
            Raw::Text(s) if s.trim().is_empty() => {
                Err(D::Error::custom("orderId cannot be empty"))
            }
            Raw::Text(s) => Ok(OrderId::from(s)),
        }
    }
}

/// Parse a shipment timestamp down to its calendar date
///
/// Accepts `YYYY-MM-DD`, RFC 3339 (the date is taken in the timestamp's own
/// offset), and naive `YYYY-MM-DDTHH:MM:SS[.fff]`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use parcel_slip::core::shipment::parse_ship_date;
///
/// let d = NaiveDate::from_ymd_opt(2024, 1, 28).unwrap();
/// assert_eq!(parse_ship_date("2024-01-28"), Some(d));
/// assert_eq!(parse_ship_date("2024-01-28T23:10:00+05:00"), Some(d));
/// assert_eq!(parse_ship_date("yesterday"), None);
/// ```
pub fn parse_ship_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(ts.date());
        }
    }

    None
}

fn deserialize_ship_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_ship_date(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unrecognized date '{}'", raw))),
    }
}

/// One shipment, as handed over by the order dashboard
///
/// # Examples
///
/// ```
/// use parcel_slip::core::shipment::ShipmentRecord;
///
/// let record: ShipmentRecord = serde_json::from_str(r#"{
///     "orderId": 42,
///     "createdAt": "2024-01-28",
///     "deliveryType": "remote",
///     "customerName": "Jane Doe",
///     "customerAddress": "12 Palm St"
/// }"#).unwrap();
///
/// assert_eq!(record.order_id.as_str(), "42");
/// assert!(record.tracking_id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRecord {
    pub order_id: OrderId,

    /// Carrier-issued tracking id; derived from the order id when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_provider: Option<String>,

    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[serde(default, alias = "address", skip_serializing_if = "Option::is_none")]
    pub customer_address: Option<String>,

    #[serde(default, alias = "phone", skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,

    /// Delivery zone classification ("local" or anything else)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_type: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_ship_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<NaiveDate>,

    #[serde(
        default,
        deserialize_with = "deserialize_ship_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<NaiveDate>,
}

impl ShipmentRecord {
    /// Create a record with only the order id set
    pub fn new(order_id: impl Into<OrderId>) -> Self {
        ShipmentRecord {
            order_id: order_id.into(),
            tracking_id: None,
            shipping_provider: None,
            customer_name: None,
            customer_address: None,
            customer_phone: None,
            delivery_type: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_tracking_id(mut self, id: impl Into<String>) -> Self {
        self.tracking_id = Some(id.into());
        self
    }

    pub fn with_shipping_provider(mut self, provider: impl Into<String>) -> Self {
        self.shipping_provider = Some(provider.into());
        self
    }

    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_customer_address(mut self, address: impl Into<String>) -> Self {
        self.customer_address = Some(address.into());
        self
    }

    pub fn with_customer_phone(mut self, phone: impl Into<String>) -> Self {
        self.customer_phone = Some(phone.into());
        self
    }

    pub fn with_delivery_type(mut self, zone: impl Into<String>) -> Self {
        self.delivery_type = Some(zone.into());
        self
    }

    pub fn with_created_at(mut self, date: NaiveDate) -> Self {
        self.created_at = Some(date);
        self
    }

    pub fn with_updated_at(mut self, date: NaiveDate) -> Self {
        self.updated_at = Some(date);
        self
    }
}

/// Per-label presentation options
///
/// The logo is raw PNG or JPEG bytes that the caller has already fetched;
/// it never travels through JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    #[serde(skip)]
    pub company_logo: Option<Vec<u8>>,

    /// Explicit tracking site override (first in the base URL chain)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_page_url: Option<String>,

    /// Company custom domain (second in the base URL chain)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_terms: Option<String>,
}

impl LabelOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    pub fn with_company_logo(mut self, logo: Vec<u8>) -> Self {
        self.company_logo = Some(logo);
        self
    }

    pub fn with_tracking_page_url(mut self, url: impl Into<String>) -> Self {
        self.tracking_page_url = Some(url.into());
        self
    }

    pub fn with_company_domain(mut self, domain: impl Into<String>) -> Self {
        self.company_domain = Some(domain.into());
        self
    }

    pub fn with_company_terms(mut self, terms: impl Into<String>) -> Self {
        self.company_terms = Some(terms.into());
        self
    }
}

/// Trimmed, non-empty view of an optional text field
pub(crate) fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}
