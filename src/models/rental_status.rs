use serde::{Deserialize, Serialize};
use strum::EnumIter;

/// Sentinel label returned for status codes outside the valid range.
pub const INVALID_STATUS_LABEL: &str = "Error: Invalid Status";

/// Sentinel code returned for unrecognized status labels.
pub const INVALID_STATUS_CODE: i32 = -1;

/// Lifecycle stage of a rental booking.
///
/// Stored as an integer in the 0-4 range; rentals are created `Available` and
/// move forward through the enumeration as the surrounding system updates
/// them. The enum itself does not enforce transitions, only the closed set of
/// stages and their presentation metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, Serialize, Deserialize, strum::Display)]
pub enum RentalStatus {
    #[strum(serialize = "Available")]
    Available,
    #[strum(serialize = "Upcoming")]
    Upcoming,
    #[strum(serialize = "In Progress")]
    InProgress,
    #[strum(serialize = "Completed")]
    Completed,
    #[strum(serialize = "Canceled")]
    Canceled,
}

impl RentalStatus {
    /// Highest valid status code.
    pub const MAX_CODE: i32 = 4;

    /// The integer code stored on the rental row.
    pub fn code(&self) -> i32 {
        match self {
            RentalStatus::Available => 0,
            RentalStatus::Upcoming => 1,
            RentalStatus::InProgress => 2,
            RentalStatus::Completed => 3,
            RentalStatus::Canceled => 4,
        }
    }

    /// Human-readable label for this status.
    pub fn label(&self) -> &'static str {
        match self {
            RentalStatus::Available => "Available",
            RentalStatus::Upcoming => "Upcoming",
            RentalStatus::InProgress => "In Progress",
            RentalStatus::Completed => "Completed",
            RentalStatus::Canceled => "Canceled",
        }
    }

    /// Presentation-tier badge class for this status.
    pub fn badge_class(&self) -> &'static str {
        match self {
            RentalStatus::Available => "badge-primary",
            RentalStatus::Upcoming => "badge-info",
            RentalStatus::InProgress => "badge-dark",
            RentalStatus::Completed => "badge-success",
            RentalStatus::Canceled => "badge-danger",
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(RentalStatus::Available),
            1 => Some(RentalStatus::Upcoming),
            2 => Some(RentalStatus::InProgress),
            3 => Some(RentalStatus::Completed),
            4 => Some(RentalStatus::Canceled),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Available" => Some(RentalStatus::Available),
            "Upcoming" => Some(RentalStatus::Upcoming),
            "In Progress" => Some(RentalStatus::InProgress),
            "Completed" => Some(RentalStatus::Completed),
            "Canceled" => Some(RentalStatus::Canceled),
            _ => None,
        }
    }
}

/// Maps a raw status code to its label. Total: out-of-range codes return the
/// invalid-status sentinel rather than failing.
pub fn label_of(code: i32) -> &'static str {
    RentalStatus::from_code(code)
        .map(|status| status.label())
        .unwrap_or(INVALID_STATUS_LABEL)
}

/// Maps a label back to its status code, or `-1` for unrecognized labels.
pub fn code_of(label: &str) -> i32 {
    RentalStatus::from_label(label)
        .map(|status| status.code())
        .unwrap_or(INVALID_STATUS_CODE)
}

/// Maps a raw status code to its badge class, or the empty string when the
/// code is out of range.
pub fn badge_class_of(code: i32) -> &'static str {
    RentalStatus::from_code(code)
        .map(|status| status.badge_class())
        .unwrap_or("")
}
