//! Property-based tests for the code encoders and delivery arithmetic
//!
//! Uses proptest to verify round trips and date invariants across many random inputs

use chrono::{Days, NaiveDate};
use image::GrayImage;
use parcel_slip::core::barcode::decode_code128;
use parcel_slip::core::delivery::{estimate_delivery, DeliveryZone};
use parcel_slip::core::layout::LayoutCursor;
use parcel_slip::{
    BarcodeEncoder, ContextResolver, LabelConfig, LabelError, MatrixEncoder, ShipmentRecord,
    TrackingId,
};
use proptest::prelude::*;

fn decode_qr(image: &GrayImage) -> Option<String> {
    let pad = 32;
    let (w, h) = (image.width() as usize, image.height() as usize);
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(w + 2 * pad, h + 2 * pad, |x, y| {
            if x < pad || y < pad || x >= w + pad || y >= h + pad {
                255
            } else {
                image.get_pixel((x - pad) as u32, (y - pad) as u32).0[0]
            }
        });
    let grids = prepared.detect_grids();
    grids.first().and_then(|g| g.decode().ok()).map(|(_, content)| content)
}

proptest! {
    #[test]
    fn prop_barcode_round_trip(id in "[ -~]{1,40}") {
        let tracking_id = TrackingId::new(id.clone()).unwrap();
        let artifact = BarcodeEncoder::default().encode(&tracking_id).unwrap();
        prop_assert_eq!(decode_code128(&artifact.image).unwrap(), id);
    }

    #[test]
    fn prop_barcode_round_trip_with_control_chars(id in "[\\x00-\\x7f]{1,24}") {
        let tracking_id = TrackingId::new(id.clone()).unwrap();
        let artifact = BarcodeEncoder::default().encode(&tracking_id).unwrap();
        prop_assert_eq!(decode_code128(&artifact.image).unwrap(), id);
    }

    #[test]
    fn prop_non_ascii_is_rejected(prefix in "[A-Z0-9]{0,8}", ch in "[\\x{80}-\\x{10FFFF}]") {
        let id = format!("{}{}", prefix, ch);
        let result = TrackingId::new(id);
        let is_invalid_symbol = matches!(result, Err(LabelError::InvalidSymbol { .. }));
        prop_assert!(is_invalid_symbol);
    }

    #[test]
    fn prop_local_delivery_adds_three_days(days in 0u64..40_000) {
        let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let shipped = base.checked_add_days(Days::new(days)).unwrap();
        let delivered = estimate_delivery(shipped, DeliveryZone::parse(Some("local")));
        prop_assert_eq!((delivered - shipped).num_days(), 3);
    }

    #[test]
    fn prop_other_zones_add_five_days(days in 0u64..40_000, zone in "[a-z ]{0,12}") {
        prop_assume!(zone.trim() != "local");
        let base = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let shipped = base.checked_add_days(Days::new(days)).unwrap();
        let delivered = estimate_delivery(shipped, DeliveryZone::parse(Some(&zone)));
        prop_assert_eq!((delivered - shipped).num_days(), 5);
    }

    #[test]
    fn prop_derived_tracking_id_is_stable(order in 0u64..u64::MAX) {
        let resolver = ContextResolver::new(&LabelConfig::default());
        let record = ShipmentRecord::new(order);
        let first = resolver.tracking_id(&record).unwrap();
        let second = resolver.tracking_id(&record).unwrap();
        prop_assert_eq!(first.as_str(), format!("SC-{}", order));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_cursor_never_moves_up(
        steps in prop::collection::vec((-10.0f32..40.0, -5.0f32..10.0), 1..20)
    ) {
        let mut cursor = LayoutCursor::new(5.0, 145.0);
        let mut previous_bottom = cursor.y();
        for (height, gap) in steps {
            let (rect, next) = cursor.place(5.0, 90.0, height);
            prop_assert!(rect.y >= previous_bottom);
            prop_assert!(next.y() >= rect.bottom());
            previous_bottom = rect.bottom();
            cursor = next.advance(gap);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_matrix_round_trip(path in "[a-zA-Z0-9/_-]{1,60}", id in "[A-Z]{2}-[0-9]{1,9}") {
        let url = format!("https://shop.example.com/{}?trackingId={}", path, id);
        let artifact = MatrixEncoder::default().encode(&url).unwrap();
        prop_assert_eq!(decode_qr(&artifact.image), Some(url));
    }
}

#[test]
fn test_matrix_far_beyond_capacity() {
    let url = format!("https://shop.example.com/{}", "z".repeat(5000));
    let result = MatrixEncoder::default().encode(&url);
    assert!(matches!(result, Err(LabelError::Encoding(_))));
}
