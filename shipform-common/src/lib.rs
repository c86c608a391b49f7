//! # Shipform Common Library
//!
//! Shared code for the shipform crates including:
//! - Wire data model (address and package-dimension records)
//! - Session event types and the EventBus
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod models;

pub use error::{Error, Result};
pub use models::{AddressRecord, DimensionRecord, Extraction, UiPhase};
