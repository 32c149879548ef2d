#![no_main]
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use parcel_slip::{LabelGenerator, LabelOptions, ShipmentRecord};

// Any logo bytes degrade to a text header at worst
fuzz_target!(|data: &[u8]| {
    let generator = LabelGenerator::builder()
        .deployment_base_url("https://shop.example.com")
        .build()
        .unwrap();

    let now = Utc.with_ymd_and_hms(2024, 1, 30, 12, 0, 0).unwrap();
    let options = LabelOptions::new().with_company_logo(data.to_vec());
    let record = ShipmentRecord::new(42u64);

    assert!(generator.generate_at(&record, &options, now).is_ok());
});
