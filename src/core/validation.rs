//! Validation for tracking identifiers and label file names
//!
//! The tracking id is printed as a Code 128 barcode that drives inventory
//! deduction when scanned, so every id is checked against the symbology's
//! character set before any encoder sees it.

use crate::error::{LabelError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Characters that may appear verbatim in a suggested file name
static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static file-name pattern"));

/// A tracking identifier that Code 128 can represent
///
/// # Rules
/// - ASCII only (code points 0-127, the full Code 128 range)
/// - Not empty
/// - Length: at most 40 characters (the bars and the printed id both fit a
///   100 mm label at a scannable module width)
///
/// # Examples
///
/// Valid ids:
/// - "SC-42"
/// - "DHL 0001/7"
///
/// Invalid ids:
/// - "" (empty)
/// - "SC-42é" (non-ASCII)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingId(String);

impl TrackingId {
    /// Maximum length accepted on a label
    pub const MAX_LENGTH: usize = 40;

    /// Create a new validated tracking id
    ///
    /// # Errors
    ///
    /// Returns `InvalidSymbol` for the first character Code 128 cannot encode,
    /// and `Encoding` for empty or oversized ids.
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_slip::core::validation::TrackingId;
    ///
    /// let id = TrackingId::new("SC-42").unwrap();
    /// assert_eq!(id.as_str(), "SC-42");
    ///
    /// assert!(TrackingId::new("SC-42é").is_err());
    /// assert!(TrackingId::new("").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(TrackingId(id))
    }

    fn validate(id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(LabelError::Encoding(
                "tracking id cannot be empty".to_string(),
            ));
        }

        if let Some((position, ch)) = id.chars().enumerate().find(|(_, c)| !c.is_ascii()) {
            return Err(LabelError::InvalidSymbol {
                ch,
                position,
                id: id.to_string(),
            });
        }

        if id.len() > Self::MAX_LENGTH {
            return Err(LabelError::Encoding(format!(
                "tracking id too long ({} characters, max {})",
                id.len(),
                Self::MAX_LENGTH
            )));
        }

        Ok(())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for TrackingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Make a string safe to embed in a file name
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_`.
///
/// # Examples
///
/// ```
/// use parcel_slip::core::validation::sanitize_file_component;
///
/// assert_eq!(sanitize_file_component("SC-42"), "SC-42");
/// assert_eq!(sanitize_file_component("DHL 01/7"), "DHL_01_7");
/// ```
pub fn sanitize_file_component(raw: &str) -> String {
    UNSAFE_FILE_CHARS.replace_all(raw, "_").into_owned()
}
