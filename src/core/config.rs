//! Label generator configuration
//!
//! Holds the read-only constants every label generation shares: the tracking
//! id prefix, the fallback company name and policy text, and the base URL
//! sources used when a caller does not supply one per label.
//!
//! The base URL sources are injected here at construction time instead of
//! being read from the environment at call time.

use crate::error::{LabelError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Company name printed when the caller provides none
pub const DEFAULT_COMPANY_NAME: &str = "SwiftCart";

/// Prefix for tracking ids derived from the order id
pub const DEFAULT_TRACKING_PREFIX: &str = "SC";

/// Policy text printed when the caller provides none
pub const DEFAULT_TERMS: &str = "Please inspect the parcel on delivery. Report damaged or missing \
items within 48 hours of receipt. Returns are accepted within 7 days for unused items in their \
original packaging. Perishable and personal care goods are non-returnable.";

/// Label generator configuration
///
/// Usually loaded from a TOML file:
///
/// ```toml
/// tracking_prefix = "SC"
/// default_company_name = "SwiftCart"
/// deployment_base_url = "https://shop.example.com"
/// ```
///
/// # Examples
///
/// ```
/// use parcel_slip::core::config::LabelConfig;
///
/// let config = LabelConfig::from_toml_str(r#"
///     tracking_prefix = "PX"
///     deployment_base_url = "https://parcels.example.com"
/// "#).unwrap();
///
/// assert_eq!(config.tracking_prefix, "PX");
/// assert_eq!(config.default_company_name, "SwiftCart");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LabelConfig {
    /// Prefix of derived tracking ids (`<prefix>-<order id>`)
    #[validate(length(min = 1, max = 16))]
    pub tracking_prefix: String,

    /// Company display name used when the label options carry none
    #[validate(length(min = 1, max = 120))]
    pub default_company_name: String,

    /// Policy text used when the label options carry none
    #[validate(length(min = 1))]
    pub default_terms: String,

    /// Deployment-wide default tracking site (third in the base URL chain)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub deployment_base_url: Option<String>,

    /// Origin of the hosting runtime, if there is one (last in the chain)
    ///
    /// Headless callers normally leave this unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub runtime_origin: Option<String>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig {
            tracking_prefix: DEFAULT_TRACKING_PREFIX.to_string(),
            default_company_name: DEFAULT_COMPANY_NAME.to_string(),
            default_terms: DEFAULT_TERMS.to_string(),
            deployment_base_url: None,
            runtime_origin: None,
        }
    }
}

impl LabelConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: LabelConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Validate all fields
    ///
    /// Checks:
    /// - Field lengths and URL syntax
    /// - The tracking prefix is ASCII alphanumeric, so derived ids stay
    ///   inside the Code 128 character set
    pub fn validate(&self) -> Result<()> {
        <Self as Validate>::validate(self)?;

        if !self
            .tracking_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric())
        {
            return Err(LabelError::Configuration(format!(
                "tracking prefix '{}' must be ASCII letters and digits only",
                self.tracking_prefix
            )));
        }

        Ok(())
    }

    /// Set the deployment default base URL
    pub fn with_deployment_base_url(mut self, url: impl Into<String>) -> Self {
        self.deployment_base_url = Some(url.into());
        self
    }

    /// Set the runtime origin
    pub fn with_runtime_origin(mut self, origin: impl Into<String>) -> Self {
        self.runtime_origin = Some(origin.into());
        self
    }

    /// Set the tracking id prefix
    pub fn with_tracking_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tracking_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() -> Result<()> {
        let config = LabelConfig::default();
        config.validate()?;

        assert_eq!(config.tracking_prefix, "SC");
        assert_eq!(config.default_company_name, DEFAULT_COMPANY_NAME);
        assert!(config.deployment_base_url.is_none());
        assert!(config.runtime_origin.is_none());

        Ok(())
    }

    #[test]
    fn test_from_toml_partial() -> Result<()> {
        let config = LabelConfig::from_toml_str(
            r#"
            default_company_name = "Acme Parcels"
            deployment_base_url = "https://acme.example.com/"
            "#,
        )?;

        assert_eq!(config.default_company_name, "Acme Parcels");
        assert_eq!(config.tracking_prefix, "SC");
        assert_eq!(
            config.deployment_base_url.as_deref(),
            Some("https://acme.example.com/")
        );

        Ok(())
    }

    #[test]
    fn test_rejects_bad_url() {
        let result = LabelConfig::from_toml_str(r#"deployment_base_url = "not a url""#);
        assert!(matches!(result, Err(LabelError::ConfigValidation(_))));
    }

    #[test]
    fn test_rejects_bad_prefix() {
        let result = LabelConfig::from_toml_str(r#"tracking_prefix = "S C""#);
        assert!(matches!(result, Err(LabelError::Configuration(_))));

        let result = LabelConfig::from_toml_str(r#"tracking_prefix = """#);
        assert!(matches!(result, Err(LabelError::ConfigValidation(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = LabelConfig::from_toml_str("tracking_prefix = ");
        assert!(matches!(result, Err(LabelError::ConfigParse(_))));
    }

    #[test]
    fn test_builder_methods() {
        let config = LabelConfig::default()
            .with_tracking_prefix("PX")
            .with_deployment_base_url("https://a.example.com")
            .with_runtime_origin("http://localhost:3000");

        assert_eq!(config.tracking_prefix, "PX");
        assert_eq!(
            config.runtime_origin.as_deref(),
            Some("http://localhost:3000")
        );
        assert!(config.validate().is_ok());
    }
}
