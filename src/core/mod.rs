//! Label pipeline internals
//!
//! ```text
//! ShipmentRecord + LabelOptions
//!         │ context (delivery)
//!         ▼
//!   ResolvedContext ──► matrix  (tracking URL → QR raster)
//!         │         ──► barcode (tracking id  → Code 128 raster)
//!         ▼
//!     compositor (layout, text) ──► ComposedPage ──► emitter ──► PDF bytes
//! ```
//!
//! Every stage is a pure function of its inputs. The only clock read happens
//! in the public facade, which passes "today" down explicitly.

pub mod artifact;
pub mod barcode;
pub mod compositor;
pub mod config;
pub mod context;
pub mod delivery;
pub mod emitter;
pub mod error;
pub mod layout;
pub mod matrix;
pub mod shipment;
pub mod text;
pub mod validation;
