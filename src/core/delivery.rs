//! Delivery date estimation
//!
//! Pure calendar arithmetic: ship date plus a zone lead time. Unknown zones
//! get the longer lead time so the label never under-promises.

use crate::shipment::ShipmentRecord;
use chrono::{Days, NaiveDate};

/// Lead time for the local zone, in calendar days
pub const LOCAL_LEAD_DAYS: u64 = 3;

/// Lead time for every other zone, in calendar days
pub const STANDARD_LEAD_DAYS: u64 = 5;

/// Format printed on the label, e.g. `02 Feb 2024`
pub const DELIVERY_DATE_FORMAT: &str = "%d %b %Y";

/// Delivery zone classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryZone {
    /// Same-city delivery
    Local,
    /// Everything else, including unrecognized values
    Standard,
}

impl DeliveryZone {
    /// Classify a raw `deliveryType` value
    ///
    /// Only `local` (trimmed, case-insensitive) maps to `Local`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(zone) if zone == "local" => Self::Local,
            _ => Self::Standard,
        }
    }

    pub fn lead_days(self) -> u64 {
        match self {
            Self::Local => LOCAL_LEAD_DAYS,
            Self::Standard => STANDARD_LEAD_DAYS,
        }
    }
}

/// Date the parcel leaves: `updated_at`, else `created_at`, else `today`
pub fn ship_date(record: &ShipmentRecord, today: NaiveDate) -> NaiveDate {
    record.updated_at.or(record.created_at).unwrap_or(today)
}

/// Ship date plus the zone lead time
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use parcel_slip::core::delivery::{estimate_delivery, DeliveryZone};
///
/// let shipped = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
/// assert_eq!(
///     estimate_delivery(shipped, DeliveryZone::Standard),
///     NaiveDate::from_ymd_opt(2024, 2, 4).unwrap()
/// );
/// ```
pub fn estimate_delivery(ship_date: NaiveDate, zone: DeliveryZone) -> NaiveDate {
    ship_date
        .checked_add_days(Days::new(zone.lead_days()))
        .unwrap_or(NaiveDate::MAX)
}

pub fn format_delivery_date(date: NaiveDate) -> String {
    date.format(DELIVERY_DATE_FORMAT).to_string()
}

/// Estimated delivery date for a record, formatted for the label
pub fn estimated_delivery_for(record: &ShipmentRecord, today: NaiveDate) -> String {
    let zone = DeliveryZone::parse(record.delivery_type.as_deref());
    format_delivery_date(estimate_delivery(ship_date(record, today), zone))
}
