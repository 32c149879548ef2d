//! End-to-end label generation tests

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
use parcel_slip::core::barcode::decode_code128;
use parcel_slip::{
    LabelConfig, LabelError, LabelGenerator, LabelOptions, RegionKind, Result, ShipmentRecord,
    TrackingId,
};
use std::io::Cursor;

const BASE: &str = "https://shop.example.com";

fn generator() -> LabelGenerator {
    LabelGenerator::builder()
        .deployment_base_url(BASE)
        .build()
        .unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 30, 8, 15, 0).unwrap()
}

fn example_record() -> ShipmentRecord {
    ShipmentRecord::new(42u64)
        .with_created_at(NaiveDate::from_ymd_opt(2024, 1, 28).unwrap())
        .with_delivery_type("remote")
        .with_customer_name("Jane Doe")
        .with_customer_address("12 Palm St")
}

fn decode_qr(image: &GrayImage) -> String {
    // Extra quiet zone for the detector
    let pad = 32;
    let (w, h) = (image.width() as usize, image.height() as usize);
    let (pw, ph) = (w + 2 * pad, h + 2 * pad);
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(pw, ph, |x, y| {
        if x < pad || y < pad || x >= w + pad || y >= h + pad {
            255
        } else {
            image.get_pixel((x - pad) as u32, (y - pad) as u32).0[0]
        }
    });
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR symbol");
    let (_meta, content) = grids[0].decode().unwrap();
    content
}

fn png_logo() -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 32, Rgb([20, 90, 200])))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn test_example_shipment() -> Result<()> {
    let generator = generator();
    let record = example_record();
    let options = LabelOptions::new();

    let page = generator.compose_at(&record, &options, now())?;
    assert_eq!(
        page.lines(RegionKind::Delivery),
        vec!["Estimated delivery: 02 Feb 2024"]
    );
    assert_eq!(page.lines(RegionKind::Barcode), vec!["SC-42"]);
    assert_eq!(
        decode_qr(&page.matrix),
        "https://shop.example.com/track-order?trackingId=SC-42"
    );
    assert_eq!(decode_code128(&page.barcode)?, "SC-42");

    let label = generator.generate_at(&record, &options, now())?;
    assert_eq!(label.tracking_id.as_str(), "SC-42");
    assert_eq!(label.file_name, "Parcel_Slip_SC-42_2024-01-30.pdf");

    let doc = lopdf::Document::load_mem(&label.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    Ok(())
}

#[test]
fn test_example_from_json() -> Result<()> {
    let record: ShipmentRecord = serde_json::from_str(
        r#"{
            "orderId": 42,
            "createdAt": "2024-01-28T10:00:00Z",
            "deliveryType": "remote",
            "customerName": "Jane Doe",
            "customerAddress": "12 Palm St"
        }"#,
    )
    .unwrap();

    let from_json = generator().generate_at(&record, &LabelOptions::new(), now())?;
    let from_builder = generator().generate_at(&example_record(), &LabelOptions::new(), now())?;
    assert_eq!(from_json.bytes, from_builder.bytes);

    Ok(())
}

#[test]
fn test_identical_input_identical_bytes() -> Result<()> {
    let generator = generator();
    let options = LabelOptions::new().with_company_logo(png_logo());

    let a = generator.generate_at(&example_record(), &options, now())?;
    let b = generator.generate_at(&example_record(), &options, now())?;
    assert_eq!(a.bytes, b.bytes);
    assert_eq!(a.digest(), b.digest());

    Ok(())
}

#[test]
fn test_clock_only_changes_file_name() -> Result<()> {
    let generator = generator();
    let later = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 0).unwrap();

    let a = generator.generate_at(&example_record(), &LabelOptions::new(), now())?;
    let b = generator.generate_at(&example_record(), &LabelOptions::new(), later)?;

    assert_eq!(a.bytes, b.bytes);
    assert_eq!(b.file_name, "Parcel_Slip_SC-42_2024-03-01.pdf");

    Ok(())
}

#[test]
fn test_derived_tracking_id_is_stable() -> Result<()> {
    let generator = generator();
    let record = ShipmentRecord::new("A-100");

    let first = generator.generate_at(&record, &LabelOptions::new(), now())?;
    let second = generator.generate_at(&record, &LabelOptions::new(), now())?;
    assert_eq!(first.tracking_id.as_str(), "SC-A-100");
    assert_eq!(first.tracking_id, second.tracking_id);

    let explicit = record.with_tracking_id("DHL-7781");
    let label = generator.generate_at(&explicit, &LabelOptions::new(), now())?;
    assert_eq!(label.tracking_id.as_str(), "DHL-7781");
    assert_eq!(
        label.tracking_url,
        "https://shop.example.com/track-order?trackingId=DHL-7781"
    );

    Ok(())
}

#[test]
fn test_invalid_logo_never_fails() -> Result<()> {
    let generator = generator();
    let options = LabelOptions::new()
        .with_company_name("Acme Parcels")
        .with_company_logo(b"\x89PNG but truncated".to_vec());

    let page = generator.compose_at(&example_record(), &options, now())?;
    let header = page.region(RegionKind::Header).unwrap();
    assert!(header.images().is_empty());
    assert_eq!(header.lines()[0], "Acme Parcels");
    assert!(page.logo.is_none());

    assert!(generator.generate_at(&example_record(), &options, now()).is_ok());
    Ok(())
}

#[test]
fn test_valid_logo_is_embedded() -> Result<()> {
    let options = LabelOptions::new().with_company_logo(png_logo());
    let page = generator().compose_at(&example_record(), &options, now())?;

    assert!(page.logo.is_some());
    let header = page.region(RegionKind::Header).unwrap();
    assert_eq!(header.images().len(), 1);
    assert_eq!(header.lines()[0], "SwiftCart");

    Ok(())
}

#[test]
fn test_missing_recipient_prints_not_available() -> Result<()> {
    let page = generator().compose_at(&ShipmentRecord::new(9u64), &LabelOptions::new(), now())?;
    assert_eq!(
        page.lines(RegionKind::Address),
        vec!["Ship to:", "N/A", "N/A"]
    );
    Ok(())
}

#[test]
fn test_phone_adds_one_address_line() -> Result<()> {
    let generator = generator();
    let without = generator.compose_at(&example_record(), &LabelOptions::new(), now())?;
    let with = generator.compose_at(
        &example_record().with_customer_phone("+1 555 0100"),
        &LabelOptions::new(),
        now(),
    )?;

    let without = without.lines(RegionKind::Address);
    let with = with.lines(RegionKind::Address);
    assert_eq!(with.len(), without.len() + 1);
    assert_eq!(*with.last().unwrap(), "Phone: +1 555 0100");

    Ok(())
}

#[test]
fn test_courier_defaults_to_company() -> Result<()> {
    let generator = generator();
    let page = generator.compose_at(&example_record(), &LabelOptions::new(), now())?;
    assert!(page
        .lines(RegionKind::Header)
        .contains(&"Courier: SwiftCart"));

    let record = example_record().with_shipping_provider("FastFreight");
    let page = generator.compose_at(&record, &LabelOptions::new(), now())?;
    assert!(page
        .lines(RegionKind::Header)
        .contains(&"Courier: FastFreight"));

    Ok(())
}

#[test]
fn test_base_url_precedence() -> Result<()> {
    let generator = generator();
    let record = example_record();

    let options = LabelOptions::new()
        .with_tracking_page_url("https://track.acme.test/")
        .with_company_domain("acme.test");
    let label = generator.generate_at(&record, &options, now())?;
    assert_eq!(
        label.tracking_url,
        "https://track.acme.test/track-order?trackingId=SC-42"
    );

    let options = LabelOptions::new().with_company_domain("acme.test");
    let label = generator.generate_at(&record, &options, now())?;
    assert_eq!(
        label.tracking_url,
        "https://acme.test/track-order?trackingId=SC-42"
    );

    Ok(())
}

#[test]
fn test_missing_base_url_is_configuration_error() {
    let generator = LabelGenerator::new().unwrap();
    let result = generator.generate_at(&example_record(), &LabelOptions::new(), now());
    assert!(matches!(result, Err(LabelError::Configuration(_))));

    let result = generator.generate_at(
        &example_record(),
        &LabelOptions::new().with_tracking_page_url("ftp://files.example.com"),
        now(),
    );
    assert!(matches!(result, Err(LabelError::Configuration(_))));
}

#[test]
fn test_runtime_origin_is_last_resort() -> Result<()> {
    let generator = LabelGenerator::builder()
        .runtime_origin("http://localhost:3000")
        .build()?;
    let label = generator.generate_at(&example_record(), &LabelOptions::new(), now())?;
    assert_eq!(
        label.tracking_url,
        "http://localhost:3000/track-order?trackingId=SC-42"
    );
    Ok(())
}

#[test]
fn test_unencodable_tracking_id() {
    let record = example_record().with_tracking_id("SC-42é");
    let result = generator().generate_at(&record, &LabelOptions::new(), now());
    assert!(matches!(
        result,
        Err(LabelError::InvalidSymbol { ch: 'é', position: 5, .. })
    ));
}

#[test]
fn test_oversized_tracking_url() {
    let options =
        LabelOptions::new().with_tracking_page_url(format!("https://a.test/{}", "p".repeat(3000)));
    let result = generator().generate_at(&example_record(), &options, now());
    assert!(matches!(result, Err(LabelError::Encoding(_))));
}

#[test]
fn test_configured_prefix() -> Result<()> {
    let config = LabelConfig::from_toml_str(
        r#"
        tracking_prefix = "PX"
        default_company_name = "Parcel Express"
        deployment_base_url = "https://px.example.com"
        "#,
    )?;
    let generator = LabelGenerator::with_config(config)?;
    let label = generator.generate_at(&example_record(), &LabelOptions::new(), now())?;

    assert_eq!(label.tracking_id.as_str(), "PX-42");
    assert_eq!(label.file_name, "Parcel_Slip_PX-42_2024-01-30.pdf");
    Ok(())
}

#[test]
fn test_long_inputs_stay_on_page() -> Result<()> {
    let record = example_record()
        .with_customer_address("Apartment 12B, Riverside Towers, 44 Long Road, ".repeat(20))
        .with_customer_phone("+1 555 0100");
    let options = LabelOptions::new()
        .with_company_name("The Extraordinarily Long Named Parcel Company Limited")
        .with_company_terms("Claims must be filed within 48 hours of delivery. ".repeat(30));

    let page = generator().compose_at(&record, &options, now())?;
    assert!(page.is_non_overlapping());
    assert!(page.lines(RegionKind::Header)[0].ends_with("..."));

    let label = generator().generate_at(&record, &options, now())?;
    assert!(!label.is_complete());
    assert_eq!(label.truncated, page.truncated());
    assert_eq!(label.truncated[0], RegionKind::Header);

    Ok(())
}

#[test]
fn test_long_address_printed_in_full() -> Result<()> {
    let address = "Block C, Road 12, House 7, ".repeat(22);
    let record = example_record()
        .with_customer_address(address.clone())
        .with_customer_phone("+1 555 0100");

    let options = LabelOptions::new().with_company_terms("No returns on perishables.");

    let label = generator().generate_at(&record, &options, now())?;
    assert!(label.is_complete());

    let page = generator().compose_at(&record, &options, now())?;
    let printed = page.lines(RegionKind::Address).join(" ");
    for word in address.split_whitespace() {
        assert!(printed.contains(word), "missing '{}'", word);
    }
    assert_eq!(
        printed.split_whitespace().filter(|w| *w == "Block").count(),
        22
    );
    assert!(printed.ends_with("Phone: +1 555 0100"));

    Ok(())
}

#[test]
fn test_longest_tracking_id_printed_in_full() -> Result<()> {
    let id = "W".repeat(TrackingId::MAX_LENGTH);
    let record = example_record().with_tracking_id(id.clone());

    let page = generator().compose_at(&record, &LabelOptions::new(), now())?;
    assert_eq!(page.lines(RegionKind::Barcode), vec![id.as_str()]);
    assert_eq!(decode_code128(&page.barcode)?, id);
    assert!(page.is_non_overlapping());

    let too_long = example_record().with_tracking_id("W".repeat(TrackingId::MAX_LENGTH + 1));
    let result = generator().generate_at(&too_long, &LabelOptions::new(), now());
    assert!(matches!(result, Err(LabelError::Encoding(_))));

    Ok(())
}
