//! # parcel-slip - Deterministic Parcel Shipping Labels
//!
//! `parcel-slip` turns a shipment record into a printable 100 x 150 mm PDF
//! label. Every label carries:
//!
//! - **A QR code** of the public tracking URL, for recipients
//! - **A Code 128 barcode** of the tracking id, for warehouse scanners
//! - **Recipient, courier and delivery estimate** laid out for thermal printers
//!
//! Identical input always produces byte-identical output.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use parcel_slip::{LabelGenerator, LabelOptions, Result, ShipmentRecord};
//!
//! # fn main() -> Result<()> {
//! let generator = LabelGenerator::builder()
//!     .deployment_base_url("https://shop.example.com")
//!     .build()?;
//!
//! let record = ShipmentRecord::new(42u64)
//!     .with_customer_name("Jane Doe")
//!     .with_customer_address("12 Palm St");
//!
//! let now = Utc.with_ymd_and_hms(2024, 1, 30, 9, 0, 0).unwrap();
//! let label = generator.generate_at(&record, &LabelOptions::new(), now)?;
//!
//! assert_eq!(label.tracking_id.as_str(), "SC-42");
//! assert_eq!(label.file_name, "Parcel_Slip_SC-42_2024-01-30.pdf");
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust,no_run
//! use parcel_slip::{LabelConfig, LabelGenerator};
//!
//! # fn main() -> parcel_slip::Result<()> {
//! let config = LabelConfig::from_file("parcel-slip.toml")?;
//! let generator = LabelGenerator::with_config(config)?;
//! # Ok(())
//! # }
//! ```

// Label pipeline implementation
pub mod core;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use crate::core::{
    artifact, barcode, compositor, config, context, delivery, emitter, error, layout, matrix,
    shipment, text, validation,
};

// Re-export core types that users need
pub use crate::core::{
    artifact::{ArtifactKind, EncodedArtifact},
    barcode::{BarcodeEncoder, BarcodeParams},
    compositor::Compositor,
    config::LabelConfig,
    context::{ContextResolver, ResolvedContext},
    delivery::DeliveryZone,
    emitter::{slip_file_name, PdfEmitter},
    error::{LabelError, Result},
    layout::{ComposedPage, RegionKind},
    matrix::{MatrixEncoder, MatrixParams},
    shipment::{LabelOptions, OrderId, ShipmentRecord},
    validation::TrackingId,
};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// A generated label
///
/// # Examples
///
/// ```rust
/// # use chrono::{TimeZone, Utc};
/// # use parcel_slip::{LabelGenerator, LabelOptions, ShipmentRecord};
/// # let generator = LabelGenerator::builder()
/// #     .deployment_base_url("https://shop.example.com")
/// #     .build()?;
/// # let now = Utc.with_ymd_and_hms(2024, 1, 30, 9, 0, 0).unwrap();
/// let label = generator.generate_at(&ShipmentRecord::new(7u64), &LabelOptions::new(), now)?;
///
/// assert!(label.bytes.starts_with(b"%PDF"));
/// assert_eq!(label.digest().len(), 64);
/// # Ok::<(), parcel_slip::LabelError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Complete PDF document
    pub bytes: Vec<u8>,

    /// Suggested file name (`Parcel_Slip_<id>_<YYYY-MM-DD>.pdf`)
    pub file_name: String,

    /// Id encoded in the barcode
    pub tracking_id: TrackingId,

    /// URL encoded in the QR code
    pub tracking_url: String,

    /// Regions whose text was cut to stay on the page; empty when the
    /// label carries every input in full
    pub truncated: Vec<RegionKind>,
}

impl Label {
    /// SHA-256 of the PDF bytes, lowercase hex
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when no text had to be cut
    pub fn is_complete(&self) -> bool {
        self.truncated.is_empty()
    }
}

/// Generates shipping labels
///
/// Immutable once built; share one instance across threads freely.
#[derive(Debug, Clone)]
pub struct LabelGenerator {
    config: LabelConfig,
    resolver: ContextResolver,
    matrix: MatrixEncoder,
    barcode: BarcodeEncoder,
    compositor: Compositor,
    emitter: PdfEmitter,
}

impl LabelGenerator {
    /// Create a generator with the built-in configuration
    ///
    /// Labels need a tracking base URL, so without one configured every
    /// record must come with `tracking_page_url` or `company_domain` options.
    pub fn new() -> Result<Self> {
        LabelGeneratorBuilder::new().build()
    }

    /// Create a generator from a loaded configuration
    pub fn with_config(config: LabelConfig) -> Result<Self> {
        LabelGeneratorBuilder::new().config(config).build()
    }

    pub fn builder() -> LabelGeneratorBuilder {
        LabelGeneratorBuilder::new()
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    /// Generate a label, reading the clock once
    pub fn generate(&self, record: &ShipmentRecord, options: &LabelOptions) -> Result<Label> {
        self.generate_at(record, options, Utc::now())
    }

    /// Generate a label as of `now`
    ///
    /// `now` only affects the file name and, for records without a date,
    /// the ship date.
    ///
    /// # Errors
    ///
    /// - `Configuration` when no valid tracking base URL is available
    /// - `InvalidSymbol` / `Encoding` when the id or URL cannot be encoded
    /// - `Generation` when the PDF cannot be serialized
    pub fn generate_at(
        &self,
        record: &ShipmentRecord,
        options: &LabelOptions,
        now: DateTime<Utc>,
    ) -> Result<Label> {
        let (page, context) = self.compose_with_context(record, options, now)?;
        let bytes = self.emitter.emit(&page)?;
        let file_name = slip_file_name(&context.tracking_id, now.date_naive());
        let truncated = page.truncated();
        if !truncated.is_empty() {
            warn!(
                "Label {} does not show every input in full: {:?} truncated",
                file_name, truncated
            );
        }

        info!(
            "Generated label {} for order {} ({} bytes)",
            file_name,
            context.order_id,
            bytes.len()
        );

        Ok(Label {
            bytes,
            file_name,
            tracking_id: context.tracking_id,
            tracking_url: context.tracking_url,
            truncated,
        })
    }

    /// Lay out a label without serializing it
    pub fn compose_at(
        &self,
        record: &ShipmentRecord,
        options: &LabelOptions,
        now: DateTime<Utc>,
    ) -> Result<ComposedPage> {
        self.compose_with_context(record, options, now)
            .map(|(page, _)| page)
    }

    fn compose_with_context(
        &self,
        record: &ShipmentRecord,
        options: &LabelOptions,
        now: DateTime<Utc>,
    ) -> Result<(ComposedPage, ResolvedContext)> {
        let context = self.resolver.resolve(record, options, now.date_naive())?;
        let matrix = self.matrix.encode(&context.tracking_url)?;
        let barcode = self.barcode.encode(&context.tracking_id)?;
        debug!(
            "Encoded {}: matrix {}x{} px, barcode {}x{} px",
            context.tracking_id,
            matrix.width(),
            matrix.height(),
            barcode.width(),
            barcode.height()
        );

        let page = self.compositor.compose(
            &context,
            matrix,
            barcode,
            options.company_logo.as_deref(),
        );
        Ok((page, context))
    }
}

/// Builder for LabelGenerator
///
/// # Examples
///
/// ```rust
/// use parcel_slip::{LabelConfig, LabelGeneratorBuilder};
///
/// # fn main() -> parcel_slip::Result<()> {
/// let generator = LabelGeneratorBuilder::new()
///     .config(LabelConfig::default().with_tracking_prefix("PX"))
///     .deployment_base_url("https://parcels.example.com")
///     .build()?;
///
/// assert_eq!(generator.config().tracking_prefix, "PX");
/// # Ok(())
/// # }
/// ```
pub struct LabelGeneratorBuilder {
    config: LabelConfig,
    deployment_base_url: Option<String>,
    runtime_origin: Option<String>,
    matrix_params: MatrixParams,
    barcode_params: BarcodeParams,
}

impl LabelGeneratorBuilder {
    /// Create a new LabelGeneratorBuilder with default settings
    pub fn new() -> Self {
        LabelGeneratorBuilder {
            config: LabelConfig::default(),
            deployment_base_url: None,
            runtime_origin: None,
            matrix_params: MatrixParams::default(),
            barcode_params: BarcodeParams::default(),
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: LabelConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the configured deployment base URL
    pub fn deployment_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.deployment_base_url = Some(url.into());
        self
    }

    /// Set the hosting runtime's origin, last in the base URL chain
    pub fn runtime_origin<S: Into<String>>(mut self, origin: S) -> Self {
        self.runtime_origin = Some(origin.into());
        self
    }

    pub fn matrix_params(mut self, params: MatrixParams) -> Self {
        self.matrix_params = params;
        self
    }

    pub fn barcode_params(mut self, params: BarcodeParams) -> Self {
        self.barcode_params = params;
        self
    }

    /// Validate the configuration and build the generator
    pub fn build(self) -> Result<LabelGenerator> {
        let mut config = self.config;
        if let Some(url) = self.deployment_base_url {
            config = config.with_deployment_base_url(url);
        }
        if let Some(origin) = self.runtime_origin {
            config = config.with_runtime_origin(origin);
        }
        config.validate()?;

        info!(
            "Building label generator with prefix '{}', company '{}'",
            config.tracking_prefix, config.default_company_name
        );

        Ok(LabelGenerator {
            resolver: ContextResolver::new(&config),
            config,
            matrix: MatrixEncoder::new(self.matrix_params),
            barcode: BarcodeEncoder::new(self.barcode_params),
            compositor: Compositor::default(),
            emitter: PdfEmitter::new(),
        })
    }
}

impl Default for LabelGeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn generator() -> Result<LabelGenerator> {
        LabelGenerator::builder()
            .deployment_base_url("https://shop.example.com")
            .build()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 30, 12, 0, 0).unwrap()
    }

    fn record() -> ShipmentRecord {
        ShipmentRecord::new(42u64)
            .with_customer_name("Jane Doe")
            .with_customer_address("12 Palm St")
            .with_delivery_type("remote")
            .with_created_at(NaiveDate::from_ymd_opt(2024, 1, 28).unwrap())
    }

    #[test]
    fn test_generate() -> Result<()> {
        let label = generator()?.generate_at(&record(), &LabelOptions::new(), now())?;

        assert_eq!(label.tracking_id.as_str(), "SC-42");
        assert_eq!(
            label.tracking_url,
            "https://shop.example.com/track-order?trackingId=SC-42"
        );
        assert_eq!(label.file_name, "Parcel_Slip_SC-42_2024-01-30.pdf");
        assert!(!label.is_empty());
        assert!(label.is_complete());
        Ok(())
    }

    #[test]
    fn test_compose_matches_generate() -> Result<()> {
        let generator = generator()?;
        let page = generator.compose_at(&record(), &LabelOptions::new(), now())?;

        assert_eq!(
            page.lines(RegionKind::Delivery),
            vec!["Estimated delivery: 02 Feb 2024"]
        );
        assert_eq!(page.title, "Parcel Slip SC-42");
        Ok(())
    }

    #[test]
    fn test_digest_is_stable() -> Result<()> {
        let generator = generator()?;
        let a = generator.generate_at(&record(), &LabelOptions::new(), now())?;
        let b = generator.generate_at(&record(), &LabelOptions::new(), now())?;

        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
        assert!(a.digest().chars().all(|c| c.is_ascii_hexdigit()));
        Ok(())
    }

    #[test]
    fn test_builder_rejects_bad_config() {
        let result = LabelGenerator::builder()
            .config(LabelConfig::default().with_tracking_prefix("S C"))
            .build();
        assert!(matches!(result, Err(LabelError::Configuration(_))));

        let result = LabelGenerator::builder()
            .deployment_base_url("not a url")
            .build();
        assert!(matches!(result, Err(LabelError::ConfigValidation(_))));
    }

    #[test]
    fn test_builder_overrides_config_urls() -> Result<()> {
        let config = LabelConfig::default().with_deployment_base_url("https://old.example.com");
        let generator = LabelGenerator::builder()
            .config(config)
            .deployment_base_url("https://new.example.com")
            .build()?;

        assert_eq!(
            generator.config().deployment_base_url.as_deref(),
            Some("https://new.example.com")
        );
        Ok(())
    }

    #[test]
    fn test_generator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LabelGenerator>();
    }
}
