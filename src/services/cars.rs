use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    db::DbPool,
    errors::ServiceError,
    models::rental::{self, Entity as RentalEntity},
};

/// Builds the veto message for a car that rentals still reference.
pub fn car_in_use_message(count: u64) -> String {
    let (noun, pronoun) = if count == 1 {
        ("rental", "it")
    } else {
        ("rentals", "them")
    };
    format!(
        "This car is used in {} other {}. You must first delete {} before you can delete this car",
        count, noun, pronoun
    )
}

/// Car-side guard capability.
///
/// `can_delete_car` is provided for the car management layer to invoke before
/// destroying a car; it is deliberately not wired into any automatic destroy
/// hook here.
#[derive(Clone)]
pub struct CarService {
    db_pool: Arc<DbPool>,
}

impl CarService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Counts the rentals that reference a car.
    #[instrument(skip(self), fields(car_id = car_id))]
    pub async fn rental_count_for_car(&self, car_id: i32) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;
        let count = RentalEntity::find()
            .filter(rental::Column::CarId.eq(car_id))
            .count(db)
            .await?;
        Ok(count)
    }

    /// Allows deletion only when no rentals reference the car; otherwise
    /// vetoes with a message naming the exact dependent count.
    #[instrument(skip(self), fields(car_id = car_id))]
    pub async fn can_delete_car(&self, car_id: i32) -> Result<(), ServiceError> {
        let count = self.rental_count_for_car(car_id).await?;
        if count == 0 {
            info!(car_id, "Car has no dependent rentals");
            Ok(())
        } else {
            Err(ServiceError::LifecycleViolation(car_in_use_message(count)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_message_for_one_dependent_rental() {
        let message = car_in_use_message(1);
        assert!(message.contains("1 other rental."));
        assert!(message.contains("delete it before"));
    }

    #[test]
    fn plural_message_names_the_exact_count() {
        let message = car_in_use_message(2);
        assert!(message.contains("2 other rentals"));
        assert!(message.contains("delete them before"));

        assert!(car_in_use_message(5).contains("5 other rentals"));
    }
}
