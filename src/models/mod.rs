pub mod car;
pub mod rental;
pub mod rental_status;
pub mod user;

pub use rental::{Model as Rental, ValidationMode};
pub use rental_status::RentalStatus;
