//! Car-rental booking core.
//!
//! Models a rental booking record (lifecycle status, time window, pricing,
//! pickup/drop-off locations) and the rules that keep those fields
//! consistent: field and temporal validation, price normalization, geocoding
//! enrichment of location fields, and deletion guards with counter-cache
//! bookkeeping on the owning users.
//!
//! Persistence goes through sea-orm against a connection the caller
//! provides; geocoding and time are injected capabilities
//! ([`services::Geocoder`], [`services::Clock`]) so the core stays testable
//! without a live provider.

pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod models;
pub mod services;

pub use config::{load_config, AppConfig};
pub use db::{establish_connection, DbPool};
pub use errors::ServiceError;
pub use models::{Rental, RentalStatus, ValidationMode};
pub use services::{CarService, RentalService};
