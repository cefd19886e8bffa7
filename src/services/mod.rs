// Rental save/destroy pipelines
pub mod rentals;

// Car-side deletion guard capability
pub mod cars;

// Injected collaborators
pub mod clock;
pub mod geocoding;

pub use cars::CarService;
pub use clock::{Clock, FixedOffsetClock, SystemClock};
pub use geocoding::{Coordinates, Geocoder, NullGeocoder};
pub use rentals::RentalService;
