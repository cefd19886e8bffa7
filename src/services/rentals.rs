use chrono::{NaiveDateTime, TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::{
    db::DbPool,
    errors::ServiceError,
    models::{
        rental::{
            self, ActiveModel as RentalActiveModel, Entity as RentalEntity, Model as RentalModel,
            ValidationMode,
        },
        rental_status::RentalStatus,
        user::{self, Entity as UserEntity},
    },
    services::{clock::Clock, geocoding::Geocoder},
};

/// Fixed message returned when a destroy attempt hits an in-progress rental.
pub const IN_PROGRESS_DELETE_MESSAGE: &str =
    "This rental is currently in progress and cannot be deleted until it is complete";

/// Caller input for creating a rental. Times are caller-local wall times;
/// the save pipeline converts them to UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRentalRequest {
    pub user_id: i32,
    pub car_id: i32,
    pub status: i32,
    pub start_location: String,
    pub end_location: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub price: String,
    pub terms: Option<String>,
    pub renter_id: Option<i32>,
}

/// Caller input for updating a rental; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRentalRequest {
    pub status: Option<i32>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub price: Option<String>,
    pub terms: Option<String>,
}

/// Which location fields changed since the rental was loaded. Geocoding
/// enrichment runs only for changed fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocationChanges {
    pub start: bool,
    pub end: bool,
}

impl LocationChanges {
    /// Both locations count as changed, as on first save.
    pub fn both() -> Self {
        Self {
            start: true,
            end: true,
        }
    }
}

/// Caller-local wall times awaiting conversion to UTC. Absent fields keep
/// the rental's current times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LocalWindow {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl LocalWindow {
    /// A full window, as on first save.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

/// Pre-destroy check: an in-progress rental cannot be deleted. Any other
/// status allows.
pub fn deletion_guard(rental: &RentalModel) -> Result<(), ServiceError> {
    if rental.status == RentalStatus::InProgress.code() {
        Err(ServiceError::LifecycleViolation(
            IN_PROGRESS_DELETE_MESSAGE.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Resolves changed location fields through the geocoder and writes back the
/// coordinates. A missed lookup leaves the prior coordinates untouched; this
/// stage never fails the save.
pub async fn enrich_coordinates(
    rental: &mut RentalModel,
    geocoder: &dyn Geocoder,
    changes: LocationChanges,
) {
    if changes.start {
        match geocoder.locate(&rental.start_location).await {
            Some(coords) => {
                rental.start_latitude = Some(coords.latitude);
                rental.start_longitude = Some(coords.longitude);
            }
            None => warn!(
                location = %rental.start_location,
                "Geocoding returned no result for start location"
            ),
        }
    }
    if changes.end {
        match geocoder.locate(&rental.end_location).await {
            Some(coords) => {
                rental.end_latitude = Some(coords.latitude);
                rental.end_longitude = Some(coords.longitude);
            }
            None => warn!(
                location = %rental.end_location,
                "Geocoding returned no result for end location"
            ),
        }
    }
}

/// Converts the caller-local wall times in `window` to UTC through the clock
/// and writes them onto the rental. Fields absent from the window are left
/// as they are.
pub fn normalize_times(rental: &mut RentalModel, window: LocalWindow, clock: &dyn Clock) {
    if let Some(start) = window.start {
        rental.start_time = clock.local_to_utc(start);
    }
    if let Some(end) = window.end {
        rental.end_time = clock.local_to_utc(end);
    }
}

/// The pre-persist save pipeline, in order: price normalization, local-to-UTC
/// time conversion, field and temporal validation, then geocoding enrichment.
/// Validation failure stops the pipeline before any enrichment runs.
pub async fn prepare_for_save(
    rental: &mut RentalModel,
    window: LocalWindow,
    clock: &dyn Clock,
    geocoder: &dyn Geocoder,
    mode: ValidationMode,
    changes: LocationChanges,
) -> Result<(), ServiceError> {
    rental.normalize_price();

    normalize_times(rental, window, clock);

    rental
        .validate_for_save(clock.now(), mode)
        .map_err(ServiceError::ValidationError)?;

    enrich_coordinates(rental, geocoder, changes).await;

    Ok(())
}

/// Service running the rental save and destroy pipelines against the
/// database, with the geocoder and clock injected.
#[derive(Clone)]
pub struct RentalService {
    db_pool: Arc<DbPool>,
    geocoder: Arc<dyn Geocoder>,
    clock: Arc<dyn Clock>,
}

impl RentalService {
    pub fn new(db_pool: Arc<DbPool>, geocoder: Arc<dyn Geocoder>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db_pool,
            geocoder,
            clock,
        }
    }

    /// Creates a rental: runs the save pipeline, inserts the row, and bumps
    /// the owner's (and, when already claimed, the renter's) counter cache in
    /// the same transaction.
    #[instrument(skip(self, request), fields(user_id = request.user_id, car_id = request.car_id))]
    pub async fn create_rental(
        &self,
        request: CreateRentalRequest,
        mode: ValidationMode,
    ) -> Result<RentalModel, ServiceError> {
        let window = LocalWindow::new(request.start_time, request.end_time);

        // Wall times go in as-is; the pipeline's time stage rewrites them
        // through the clock.
        let mut rental = RentalModel::new(
            request.user_id,
            request.car_id,
            request.status,
            request.start_location,
            request.end_location,
            Utc.from_utc_datetime(&request.start_time),
            Utc.from_utc_datetime(&request.end_time),
            request.price,
            request.terms,
            request.renter_id,
        );

        prepare_for_save(
            &mut rental,
            window,
            self.clock.as_ref(),
            self.geocoder.as_ref(),
            mode,
            LocationChanges::both(),
        )
        .await?;

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for rental creation");
            ServiceError::DatabaseError(e)
        })?;

        let now = self.clock.now();
        let active = RentalActiveModel {
            id: NotSet,
            user_id: Set(rental.user_id),
            car_id: Set(rental.car_id),
            status: Set(rental.status),
            start_location: Set(rental.start_location),
            end_location: Set(rental.end_location),
            start_latitude: Set(rental.start_latitude),
            start_longitude: Set(rental.start_longitude),
            end_latitude: Set(rental.end_latitude),
            end_longitude: Set(rental.end_longitude),
            start_time: Set(rental.start_time),
            end_time: Set(rental.end_time),
            price: Set(rental.price),
            terms: Set(rental.terms),
            renter_id: Set(rental.renter_id),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let saved = active.insert(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to insert rental");
            ServiceError::DatabaseError(e)
        })?;

        adjust_rentals_count(&txn, saved.user_id, 1).await?;
        if let Some(renter_id) = saved.renter_id {
            adjust_renter_rentals_count(&txn, renter_id, 1).await?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit rental creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(rental_id = saved.id, user_id = saved.user_id, "Rental created");

        Ok(saved)
    }

    /// Updates a rental: applies the changed fields, reruns the save
    /// pipeline (geocoding only the locations that actually changed), and
    /// writes the row back.
    #[instrument(skip(self, request), fields(rental_id = rental_id))]
    pub async fn update_rental(
        &self,
        rental_id: i32,
        request: UpdateRentalRequest,
        mode: ValidationMode,
    ) -> Result<RentalModel, ServiceError> {
        let db = &*self.db_pool;

        let mut rental = RentalEntity::find_by_id(rental_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Rental {} not found", rental_id)))?;

        let mut changes = LocationChanges::default();

        if let Some(status) = request.status {
            rental.status = status;
        }
        if let Some(location) = request.start_location {
            changes.start = location != rental.start_location;
            rental.start_location = location;
        }
        if let Some(location) = request.end_location {
            changes.end = location != rental.end_location;
            rental.end_location = location;
        }
        let window = LocalWindow {
            start: request.start_time,
            end: request.end_time,
        };

        if let Some(price) = request.price {
            rental.price = price;
        }
        if let Some(terms) = request.terms {
            rental.terms = Some(terms);
        }

        prepare_for_save(
            &mut rental,
            window,
            self.clock.as_ref(),
            self.geocoder.as_ref(),
            mode,
            changes,
        )
        .await?;

        let active = RentalActiveModel {
            id: Set(rental.id),
            user_id: Set(rental.user_id),
            car_id: Set(rental.car_id),
            status: Set(rental.status),
            start_location: Set(rental.start_location),
            end_location: Set(rental.end_location),
            start_latitude: Set(rental.start_latitude),
            start_longitude: Set(rental.start_longitude),
            end_latitude: Set(rental.end_latitude),
            end_longitude: Set(rental.end_longitude),
            start_time: Set(rental.start_time),
            end_time: Set(rental.end_time),
            price: Set(rental.price),
            terms: Set(rental.terms),
            renter_id: Set(rental.renter_id),
            created_at: NotSet,
            updated_at: Set(Some(self.clock.now())),
        };

        let saved = active.update(db).await.map_err(|e| {
            error!(error = %e, rental_id, "Failed to update rental");
            ServiceError::DatabaseError(e)
        })?;

        info!(rental_id = saved.id, "Rental updated");

        Ok(saved)
    }

    /// Retrieves a rental by id.
    #[instrument(skip(self), fields(rental_id = rental_id))]
    pub async fn get_rental(&self, rental_id: i32) -> Result<Option<RentalModel>, ServiceError> {
        let db = &*self.db_pool;
        let rental = RentalEntity::find_by_id(rental_id).one(db).await?;
        Ok(rental)
    }

    /// Lists a user's owned rentals, newest first.
    #[instrument(skip(self), fields(user_id = user_id))]
    pub async fn list_rentals_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<RentalModel>, ServiceError> {
        let db = &*self.db_pool;
        let rentals = RentalEntity::find()
            .filter(rental::Column::UserId.eq(user_id))
            .order_by_desc(rental::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(rentals)
    }

    /// Claims an unclaimed rental for a renter and bumps that user's renter
    /// counter cache in the same transaction.
    #[instrument(skip(self), fields(rental_id = rental_id, renter_id = renter_id))]
    pub async fn claim_rental(
        &self,
        rental_id: i32,
        renter_id: i32,
    ) -> Result<RentalModel, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for rental claim");
            ServiceError::DatabaseError(e)
        })?;

        let rental = RentalEntity::find_by_id(rental_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Rental {} not found", rental_id)))?;

        if rental.renter_id.is_some() {
            return Err(ServiceError::InvalidOperation(format!(
                "Rental {} is already claimed",
                rental_id
            )));
        }

        let mut active: RentalActiveModel = rental.into();
        active.renter_id = Set(Some(renter_id));
        active.updated_at = Set(Some(self.clock.now()));

        let saved = active.update(&txn).await.map_err(|e| {
            error!(error = %e, rental_id, "Failed to claim rental");
            ServiceError::DatabaseError(e)
        })?;

        adjust_renter_rentals_count(&txn, renter_id, 1).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit rental claim");
            ServiceError::DatabaseError(e)
        })?;

        info!(rental_id = saved.id, renter_id, "Rental claimed");

        Ok(saved)
    }

    /// Destroys a rental. The deletion guard runs first and aborts the whole
    /// operation, leaving state unchanged; on success the row is deleted and
    /// the owner's (and, when claimed, the renter's) counter cache is
    /// decremented in the same transaction as the delete.
    #[instrument(skip(self), fields(rental_id = rental_id))]
    pub async fn delete_rental(&self, rental_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let rental = RentalEntity::find_by_id(rental_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Rental {} not found", rental_id)))?;

        deletion_guard(&rental)?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for rental deletion");
            ServiceError::DatabaseError(e)
        })?;

        RentalEntity::delete_by_id(rental.id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, rental_id, "Failed to delete rental");
                ServiceError::DatabaseError(e)
            })?;

        if let Some(renter_id) = rental.renter_id {
            adjust_renter_rentals_count(&txn, renter_id, -1).await?;
        }
        adjust_rentals_count(&txn, rental.user_id, -1).await?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit rental deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(rental_id, "Rental deleted");

        Ok(())
    }
}

// Direct counter-column writes: no validation pass, no clamping. Keeping the
// counters consistent with concurrent edits is the database's concern.

async fn adjust_rentals_count<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    delta: i32,
) -> Result<(), ServiceError> {
    let owner = UserEntity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

    let count = owner.rentals_count;
    let mut active: user::ActiveModel = owner.into();
    active.rentals_count = Set(count + delta);
    active.update(conn).await?;

    Ok(())
}

async fn adjust_renter_rentals_count<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    delta: i32,
) -> Result<(), ServiceError> {
    let renter = UserEntity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

    let count = renter.renter_rentals_count;
    let mut active: user::ActiveModel = renter.into();
    active.renter_rentals_count = Set(count + delta);
    active.update(conn).await?;

    Ok(())
}
