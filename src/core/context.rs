//! Shipment context resolution
//!
//! Turns a loosely populated `ShipmentRecord` plus `LabelOptions` into the
//! fully resolved values the label prints: tracking id, tracking URL,
//! courier and recipient identities, and the delivery estimate.
//!
//! Tracking base URL precedence:
//!
//! ```text
//! options.tracking_page_url → options.company_domain
//!     → config.deployment_base_url → config.runtime_origin
//! ```
//!
//! Blank candidates are skipped. The first non-blank one wins and must be an
//! absolute http(s) URL.

use crate::config::LabelConfig;
use crate::delivery::estimated_delivery_for;
use crate::error::{LabelError, Result};
use crate::shipment::{non_blank, LabelOptions, OrderId, ShipmentRecord};
use crate::validation::TrackingId;
use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;
use url::Url;

/// Printed in place of a missing recipient name or address
pub const NOT_AVAILABLE: &str = "N/A";

/// Path of the public tracking page, relative to the base URL
pub const TRACK_ORDER_PATH: &str = "/track-order";

/// Bytes left unescaped by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Everything the label prints, fully resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    pub order_id: OrderId,
    pub tracking_id: TrackingId,
    pub tracking_url: String,
    pub company_name: String,
    pub courier_name: String,
    pub client_name: String,
    pub client_address: String,
    /// Omitted entirely when the record has no phone
    pub client_phone: Option<String>,
    /// Formatted `DD MMM YYYY`
    pub estimated_delivery: String,
    pub terms: String,
}

/// Resolves shipment context against configuration captured at construction
#[derive(Debug, Clone)]
pub struct ContextResolver {
    tracking_prefix: String,
    default_company_name: String,
    default_terms: String,
    deployment_base_url: Option<String>,
    runtime_origin: Option<String>,
}

impl ContextResolver {
    pub fn new(config: &LabelConfig) -> Self {
        ContextResolver {
            tracking_prefix: config.tracking_prefix.clone(),
            default_company_name: config.default_company_name.clone(),
            default_terms: config.default_terms.clone(),
            deployment_base_url: config.deployment_base_url.clone(),
            runtime_origin: config.runtime_origin.clone(),
        }
    }

    /// Resolve all label values
    ///
    /// `today` stands in for the ship date when the record carries no date.
    pub fn resolve(
        &self,
        record: &ShipmentRecord,
        options: &LabelOptions,
        today: NaiveDate,
    ) -> Result<ResolvedContext> {
        let tracking_id = self.tracking_id(record)?;
        let base = self.base_url(options)?;
        let tracking_url = tracking_url(&base, &tracking_id);
        debug!("Resolved tracking URL {}", tracking_url);

        let company_name = non_blank(options.company_name.as_ref())
            .unwrap_or(&self.default_company_name)
            .to_string();
        let courier_name = non_blank(record.shipping_provider.as_ref())
            .map(str::to_string)
            .unwrap_or_else(|| company_name.clone());
        let terms = non_blank(options.company_terms.as_ref())
            .unwrap_or(&self.default_terms)
            .to_string();

        Ok(ResolvedContext {
            order_id: record.order_id.clone(),
            tracking_id,
            tracking_url,
            company_name,
            courier_name,
            client_name: non_blank(record.customer_name.as_ref())
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
            client_address: non_blank(record.customer_address.as_ref())
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
            client_phone: non_blank(record.customer_phone.as_ref()).map(str::to_string),
            estimated_delivery: estimated_delivery_for(record, today),
            terms,
        })
    }

    /// The record's tracking id, or `<prefix>-<order id>` when it has none
    ///
    /// Derivation depends only on the order id, so repeated generations for
    /// one order always print the same id.
    pub fn tracking_id(&self, record: &ShipmentRecord) -> Result<TrackingId> {
        match non_blank(record.tracking_id.as_ref()) {
            Some(id) => TrackingId::new(id),
            None => TrackingId::new(format!("{}-{}", self.tracking_prefix, record.order_id)),
        }
    }

    /// Pick the tracking site base URL, trailing slashes removed
    pub fn base_url(&self, options: &LabelOptions) -> Result<String> {
        let candidates = [
            (
                "tracking page URL",
                non_blank(options.tracking_page_url.as_ref()).map(str::to_string),
            ),
            (
                "company domain",
                non_blank(options.company_domain.as_ref()).map(with_scheme),
            ),
            (
                "deployment base URL",
                non_blank(self.deployment_base_url.as_ref()).map(str::to_string),
            ),
            (
                "runtime origin",
                non_blank(self.runtime_origin.as_ref()).map(str::to_string),
            ),
        ];

        let (source, base) = candidates
            .into_iter()
            .find_map(|(source, value)| value.map(|v| (source, v)))
            .ok_or_else(|| {
                LabelError::Configuration(
                    "no tracking base URL: set a tracking page URL, company domain, \
                     or deployment base URL"
                        .to_string(),
                )
            })?;

        let parsed = Url::parse(&base).map_err(|e| {
            LabelError::Configuration(format!("{} '{}' is not a valid URL: {}", source, base, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(LabelError::Configuration(format!(
                "{} '{}' must be an absolute http(s) URL",
                source, base
            )));
        }

        debug!("Tracking base URL from {}: {}", source, base);
        Ok(base.trim_end_matches('/').to_string())
    }
}

/// `https://` is assumed for bare domains
fn with_scheme(domain: &str) -> String {
    if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}

/// Build the public tracking URL for an id
///
/// # Examples
///
/// ```
/// use parcel_slip::core::context::tracking_url;
/// use parcel_slip::core::validation::TrackingId;
///
/// let id = TrackingId::new("SC 42/7").unwrap();
/// assert_eq!(
///     tracking_url("https://shop.example.com/", &id),
///     "https://shop.example.com/track-order?trackingId=SC%2042%2F7"
/// );
/// ```
pub fn tracking_url(base: &str, tracking_id: &TrackingId) -> String {
    format!(
        "{}{}?trackingId={}",
        base.trim_end_matches('/'),
        TRACK_ORDER_PATH,
        utf8_percent_encode(tracking_id.as_str(), URI_COMPONENT)
    )
}
