use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A latitude/longitude pair resolved from a free-text location.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Injected geocoding capability.
///
/// `locate` returns `None` both for "address not found" and for provider
/// failures: lookup problems never block a save, they just leave the
/// coordinate fields as they were. Implementations wrap whatever provider the
/// surrounding application uses; the core only depends on this trait.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn locate(&self, query: &str) -> Option<Coordinates>;
}

/// Geocoder for deployments without a provider: every lookup misses, so
/// rentals keep whatever coordinates they already had.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullGeocoder;

#[async_trait]
impl Geocoder for NullGeocoder {
    async fn locate(&self, query: &str) -> Option<Coordinates> {
        debug!(query, "Geocoding disabled, skipping lookup");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_geocoder_never_resolves() {
        let geocoder = NullGeocoder;
        assert_eq!(geocoder.locate("123 Maple Street").await, None);
    }
}
