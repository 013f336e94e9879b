//! Upstream weather providers for wxstream.
//!
//! Builds provider-specific requests from normalized subscriber settings and
//! parses the two structurally different success payloads into one
//! normalized reading.

pub mod client;
pub mod error;
pub mod icon;
pub mod types;

pub use client::WeatherClient;
pub use error::FetchError;
pub use types::{resolve_defaults, ConditionCode, PartialSettings, Settings, WeatherReading};
