#![no_main]
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use parcel_slip::{LabelGenerator, LabelOptions, ShipmentRecord};

// Arbitrary shipment JSON may be rejected but must never panic
fuzz_target!(|data: &[u8]| {
    let record: ShipmentRecord = match serde_json::from_slice(data) {
        Ok(r) => r,
        Err(_) => return,
    };

    let generator = match LabelGenerator::builder()
        .deployment_base_url("https://shop.example.com")
        .build()
    {
        Ok(g) => g,
        Err(_) => return,
    };

    let now = Utc.with_ymd_and_hms(2024, 1, 30, 12, 0, 0).unwrap();
    if let Ok(label) = generator.generate_at(&record, &LabelOptions::new(), now) {
        assert!(label.bytes.starts_with(b"%PDF-"));
    }
});
