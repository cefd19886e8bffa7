use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use super::rental_status::{badge_class_of, label_of};

lazy_static! {
    /// Letters, digits and the `#().,'- ` punctuation set.
    static ref VALID_LOCATION: Regex = Regex::new(r"^[A-Za-z0-9#().,' -]+$")
        .expect("location pattern is valid");
    /// A whole number of currency units with an optional one- or two-digit
    /// decimal part.
    static ref VALID_PRICE: Regex = Regex::new(r"^\d+(\.\d\d?)?$")
        .expect("price pattern is valid");
    /// Broad but whitelisted punctuation set for free-form rental terms.
    static ref VALID_TERMS: Regex =
        Regex::new(r#"^[\w\r\n`~!@#$%^&*()\-+=\[\]{}\\|:'",<.>/? ]*$"#)
            .expect("terms pattern is valid");
    /// Prices like `12.5` that need a trailing zero appended before save.
    static ref SINGLE_DECIMAL_PRICE: Regex =
        Regex::new(r"^\d+\.\d$").expect("single-decimal price pattern is valid");
}

/// Controls whether the temporal validation rules run.
///
/// `SkipTemporal` is a deliberate escape hatch for bulk/seed construction,
/// where historical rentals with past or overlapping time windows are
/// expected. The format, length and range rules always run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationMode {
    Full,
    SkipTemporal,
}

/// The `rentals` table: one car booked by one owner over a time window.
///
/// Coordinates are derived by geocoding the location fields during the save
/// pipeline and are never accepted from caller input. Times are stored in
/// UTC.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "rentals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owner of the rental.
    #[validate(range(min = 1, message = "must reference a user"))]
    pub user_id: i32,

    /// Car being rented.
    #[validate(range(min = 1, message = "must reference a car"))]
    pub car_id: i32,

    /// Lifecycle stage, see `RentalStatus`.
    #[validate(range(min = 0, max = 4, message = "must be between 0 and 4"))]
    pub status: i32,

    #[validate(
        length(min = 3, max = 64, message = "must be between 3 and 64 characters"),
        regex(path = "VALID_LOCATION", message = "contains unsupported characters")
    )]
    pub start_location: String,

    #[validate(
        length(min = 3, max = 64, message = "must be between 3 and 64 characters"),
        regex(path = "VALID_LOCATION", message = "contains unsupported characters")
    )]
    pub end_location: String,

    /// Derived from `start_location`, not user-set.
    pub start_latitude: Option<f64>,
    pub start_longitude: Option<f64>,

    /// Derived from `end_location`, not user-set.
    pub end_latitude: Option<f64>,
    pub end_longitude: Option<f64>,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// Decimal price as entered by the caller; single-decimal values are
    /// zero-padded to two decimals before save.
    #[validate(
        length(min = 1, max = 8, message = "must be between 1 and 8 characters"),
        regex(path = "VALID_PRICE", message = "is not a valid price")
    )]
    pub price: String,

    #[validate(
        length(max = 256, message = "must be at most 256 characters"),
        regex(path = "VALID_TERMS", message = "contains unsupported characters")
    )]
    pub terms: Option<String>,

    /// Set when a renter claims the rental.
    pub renter_id: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A rental belongs to its owning user.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    /// A rental may belong to a claiming renter.
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RenterId",
        to = "super::user::Column::Id"
    )]
    Renter,

    /// A rental belongs to the car it books.
    #[sea_orm(
        belongs_to = "super::car::Entity",
        from = "Column::CarId",
        to = "super::car::Column::Id"
    )]
    Car,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Car.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Creates a new rental from caller input. Coordinates start unset; they
    /// are filled in by geocoding enrichment during the save pipeline.
    pub fn new(
        user_id: i32,
        car_id: i32,
        status: i32,
        start_location: String,
        end_location: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        price: String,
        terms: Option<String>,
        renter_id: Option<i32>,
    ) -> Self {
        Self {
            id: 0,
            user_id,
            car_id,
            status,
            start_location,
            end_location,
            start_latitude: None,
            start_longitude: None,
            end_latitude: None,
            end_longitude: None,
            start_time,
            end_time,
            price,
            terms,
            renter_id,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Zero-pads a single-decimal price (`12.5` becomes `12.50`). Prices with
    /// no decimal point or two decimals are left unchanged.
    pub fn normalize_price(&mut self) {
        if SINGLE_DECIMAL_PRICE.is_match(&self.price) {
            self.price.push('0');
        }
    }

    /// Runs every validation rule and collects all violations, keyed by field
    /// name (or the `start_and_end_time` pseudo-field for the equality rule).
    ///
    /// The temporal rules are evaluated against the injected `now` and are
    /// skipped entirely under `ValidationMode::SkipTemporal`.
    pub fn validate_for_save(
        &self,
        now: DateTime<Utc>,
        mode: ValidationMode,
    ) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        if mode == ValidationMode::Full {
            self.times_cannot_be_in_the_past(now, &mut errors);
            self.times_cannot_be_the_same(&mut errors);
            self.start_time_cannot_be_after_end_time(&mut errors);
            self.end_time_cannot_be_before_start_time(&mut errors);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Human-readable label for this rental's status.
    pub fn status_label(&self) -> &'static str {
        label_of(self.status)
    }

    /// Presentation badge class for this rental's status.
    pub fn status_badge_class(&self) -> &'static str {
        badge_class_of(self.status)
    }

    // Only one of the two past-time checks fires per validation pass: the
    // end_time branch is reached only when the start_time condition is false.
    // A rental with status > 2 and both times in the past reports only
    // start_time.
    fn times_cannot_be_in_the_past(&self, now: DateTime<Utc>, errors: &mut ValidationErrors) {
        if self.start_time < now && self.status > 1 {
            errors.add("start_time", field_error("past", "cannot be in the past"));
        } else if self.end_time < now && self.status > 2 {
            errors.add("end_time", field_error("past", "cannot be in the past"));
        }
    }

    fn times_cannot_be_the_same(&self, errors: &mut ValidationErrors) {
        if self.start_time == self.end_time {
            errors.add(
                "start_and_end_time",
                field_error("same", "cannot be the same"),
            );
        }
    }

    fn start_time_cannot_be_after_end_time(&self, errors: &mut ValidationErrors) {
        if self.end_time < self.start_time {
            errors.add(
                "start_time",
                field_error("window", "cannot be after the end time"),
            );
        }
    }

    fn end_time_cannot_be_before_start_time(&self, errors: &mut ValidationErrors) {
        if self.end_time < self.start_time {
            errors.add(
                "end_time",
                field_error("window", "cannot be before the start time"),
            );
        }
    }
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn valid_rental() -> Model {
        let now = Utc::now();
        Model::new(
            1,
            1,
            0,
            "123 Maple Street, Springfield".to_string(),
            "456 Oak Avenue, Metropolis".to_string(),
            now + Duration::days(1),
            now + Duration::days(2),
            "25.00".to_string(),
            None,
            None,
        )
    }

    fn field_names(errors: &ValidationErrors) -> Vec<&'static str> {
        let mut names: Vec<_> = errors.field_errors().keys().copied().collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn valid_rental_passes() {
        let rental = valid_rental();
        assert!(rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .is_ok());
    }

    #[test]
    fn missing_owner_and_car_are_rejected() {
        let mut rental = valid_rental();
        rental.user_id = 0;
        rental.car_id = 0;
        let errors = rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .unwrap_err();
        assert!(errors.field_errors().contains_key("user_id"));
        assert!(errors.field_errors().contains_key("car_id"));
    }

    #[test]
    fn status_out_of_range_is_rejected() {
        let mut rental = valid_rental();
        rental.status = 5;
        let errors = rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .unwrap_err();
        assert!(errors.field_errors().contains_key("status"));

        rental.status = -1;
        assert!(rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .is_err());
    }

    #[test]
    fn location_format_and_length_are_enforced() {
        let mut rental = valid_rental();
        rental.start_location = "12".to_string();
        let errors = rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .unwrap_err();
        assert!(errors.field_errors().contains_key("start_location"));

        let mut rental = valid_rental();
        rental.end_location = "Bad;Location!".to_string();
        let errors = rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .unwrap_err();
        assert!(errors.field_errors().contains_key("end_location"));

        let mut rental = valid_rental();
        rental.start_location = "a".repeat(65);
        assert!(rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .is_err());
    }

    #[test]
    fn location_allows_whitelisted_punctuation() {
        let mut rental = valid_rental();
        rental.start_location = "Apt #4 (rear), O'Malley's St. - Unit 2".to_string();
        assert!(rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .is_ok());
    }

    #[test]
    fn price_format_is_enforced() {
        for bad in ["abc", "12.", "12.345", ".50", "12,50", "123456789"] {
            let mut rental = valid_rental();
            rental.price = bad.to_string();
            let errors = rental
                .validate_for_save(Utc::now(), ValidationMode::Full)
                .unwrap_err();
            assert!(
                errors.field_errors().contains_key("price"),
                "expected {:?} to be rejected",
                bad
            );
        }

        for good in ["0", "12", "12.5", "12.50", "99999.99"] {
            let mut rental = valid_rental();
            rental.price = good.to_string();
            assert!(
                rental
                    .validate_for_save(Utc::now(), ValidationMode::Full)
                    .is_ok(),
                "expected {:?} to be accepted",
                good
            );
        }
    }

    #[test]
    fn single_decimal_price_is_zero_padded() {
        let mut rental = valid_rental();
        rental.price = "12.5".to_string();
        rental.normalize_price();
        assert_eq!(rental.price, "12.50");
    }

    #[test]
    fn two_decimal_and_whole_prices_are_unchanged() {
        let mut rental = valid_rental();
        rental.price = "12.50".to_string();
        rental.normalize_price();
        assert_eq!(rental.price, "12.50");

        rental.price = "12".to_string();
        rental.normalize_price();
        assert_eq!(rental.price, "12");
    }

    #[test]
    fn terms_are_optional_but_bounded() {
        let mut rental = valid_rental();
        rental.terms = Some("No smoking. Return with a full tank [or pay $20].".to_string());
        assert!(rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .is_ok());

        rental.terms = Some("x".repeat(257));
        let errors = rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .unwrap_err();
        assert!(errors.field_errors().contains_key("terms"));

        rental.terms = Some("no semicolons;".to_string());
        assert!(rental
            .validate_for_save(Utc::now(), ValidationMode::Full)
            .is_err());
    }

    #[test]
    fn equal_times_are_rejected_regardless_of_status() {
        for status in [0, 4] {
            let mut rental = valid_rental();
            rental.status = status;
            rental.end_time = rental.start_time;
            let errors = rental
                .validate_for_save(Utc::now(), ValidationMode::Full)
                .unwrap_err();
            assert!(errors.field_errors().contains_key("start_and_end_time"));
        }
    }

    #[test]
    fn reversed_window_reports_both_fields() {
        let now = Utc::now();
        let mut rental = valid_rental();
        rental.start_time = now + Duration::days(2);
        rental.end_time = now + Duration::days(1);
        let errors = rental
            .validate_for_save(now, ValidationMode::Full)
            .unwrap_err();
        assert_eq!(field_names(&errors), vec!["end_time", "start_time"]);
    }

    #[test]
    fn past_start_time_only_matters_once_upcoming() {
        let now = Utc::now();
        let mut rental = valid_rental();
        rental.status = 1;
        rental.start_time = now - Duration::hours(2);
        rental.end_time = now + Duration::days(1);
        assert!(rental
            .validate_for_save(now, ValidationMode::Full)
            .is_ok());

        rental.status = 2;
        let errors = rental
            .validate_for_save(now, ValidationMode::Full)
            .unwrap_err();
        assert_eq!(field_names(&errors), vec!["start_time"]);
    }

    #[test]
    fn past_end_time_only_matters_once_in_progress() {
        let now = Utc::now();
        let mut rental = valid_rental();
        rental.status = 2;
        rental.start_time = now + Duration::hours(1);
        rental.end_time = now - Duration::hours(1);
        // Past end time is tolerated at status 2; the reversed window still
        // reports both window fields.
        let errors = rental
            .validate_for_save(now, ValidationMode::Full)
            .unwrap_err();
        assert_eq!(field_names(&errors), vec!["end_time", "start_time"]);

        rental.status = 3;
        let errors = rental
            .validate_for_save(now, ValidationMode::Full)
            .unwrap_err();
        // Now the past-time pair fires too, on end_time: start_time is in the
        // future, so the else branch is reached.
        let field_errors = errors.field_errors();
        assert!(field_errors["end_time"].iter().any(|e| e.code == "past"));
    }

    #[test]
    fn both_times_past_reports_only_start_time() {
        // Documented behavior of the if/else-if pair: with status > 2 and
        // both times in the past, only start_time gets the past error.
        let now = Utc::now();
        let mut rental = valid_rental();
        rental.status = 3;
        rental.start_time = now - Duration::days(3);
        rental.end_time = now - Duration::days(1);
        let errors = rental
            .validate_for_save(now, ValidationMode::Full)
            .unwrap_err();
        assert_eq!(field_names(&errors), vec!["start_time"]);
        let field_errors = errors.field_errors();
        assert!(field_errors["start_time"].iter().any(|e| e.code == "past"));
    }

    #[test]
    fn skip_temporal_mode_bypasses_all_four_temporal_rules() {
        let now = Utc::now();

        let mut rental = valid_rental();
        rental.status = 3;
        rental.start_time = now - Duration::days(3);
        rental.end_time = now - Duration::days(5); // reversed and in the past
        assert!(rental
            .validate_for_save(now, ValidationMode::SkipTemporal)
            .is_ok());

        rental.end_time = rental.start_time; // equal
        assert!(rental
            .validate_for_save(now, ValidationMode::SkipTemporal)
            .is_ok());
    }

    #[test]
    fn skip_temporal_mode_still_enforces_formats() {
        let mut rental = valid_rental();
        rental.price = "abc".to_string();
        assert!(rental
            .validate_for_save(Utc::now(), ValidationMode::SkipTemporal)
            .is_err());
    }

    #[test]
    fn format_and_temporal_violations_are_collected_together() {
        let now = Utc::now();
        let mut rental = valid_rental();
        rental.price = "abc".to_string();
        rental.end_time = rental.start_time;
        let errors = rental
            .validate_for_save(now, ValidationMode::Full)
            .unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
        assert!(errors.field_errors().contains_key("start_and_end_time"));
    }

    #[test]
    fn status_presentation_helpers() {
        let mut rental = valid_rental();
        rental.status = 2;
        assert_eq!(rental.status_label(), "In Progress");
        assert_eq!(rental.status_badge_class(), "badge-dark");

        rental.status = 9;
        assert_eq!(rental.status_label(), "Error: Invalid Status");
        assert_eq!(rental.status_badge_class(), "");
    }
}
