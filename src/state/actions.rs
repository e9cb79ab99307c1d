//! Role-based action availability for booking and ride cards.
//!
//! DESIGN
//! ======
//! Cards only render what these functions return, so every rule about who
//! may do what to a booking or ride lives here rather than in the front end.

#[cfg(test)]
#[path = "actions_test.rs"]
mod actions_test;

use serde::Serialize;
use time::PrimitiveDateTime;

use crate::net::types::{Booking, BookingStatus, Ride, RideStatus};

/// Which side of a booking the viewer is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Driver,
    Passenger,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BookingAction {
    View,
    Confirm,
    Reject,
    Cancel,
    Contact,
    Rate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RideAction {
    View,
    Edit,
    Delete,
    MarkCompleted,
    Cancel,
    Reactivate,
}

impl BookingAction {
    /// Status the booking moves to when the action succeeds.
    #[must_use]
    pub fn target_status(self) -> Option<BookingStatus> {
        match self {
            Self::Confirm => Some(BookingStatus::Confirmed),
            Self::Reject | Self::Cancel => Some(BookingStatus::Cancelled),
            Self::View | Self::Contact | Self::Rate => None,
        }
    }
}

impl RideAction {
    /// Status the ride moves to when the action succeeds.
    #[must_use]
    pub fn target_status(self) -> Option<RideStatus> {
        match self {
            Self::MarkCompleted => Some(RideStatus::Completed),
            Self::Cancel => Some(RideStatus::Cancelled),
            Self::Reactivate => Some(RideStatus::Active),
            Self::View | Self::Edit | Self::Delete => None,
        }
    }
}

/// Actions a booking card offers to `role`.
///
/// Contact needs a phone number for the other party; the passenger side
/// always offers it since the driver's number is revealed on the ride.
#[must_use]
pub fn booking_actions(booking: &Booking, role: Role) -> Vec<BookingAction> {
    let mut actions = vec![BookingAction::View];
    match role {
        Role::Passenger => {
            if matches!(booking.status, BookingStatus::Pending | BookingStatus::Confirmed) {
                actions.push(BookingAction::Cancel);
            }
            actions.push(BookingAction::Contact);
        }
        Role::Driver => {
            if booking.status == BookingStatus::Pending {
                actions.push(BookingAction::Confirm);
                actions.push(BookingAction::Reject);
            }
            let has_phone = booking.passenger.as_ref().and_then(|p| p.phone.as_deref()).is_some_and(|p| !p.is_empty());
            if has_phone {
                actions.push(BookingAction::Contact);
            }
        }
    }
    if booking.status == BookingStatus::Completed {
        actions.push(BookingAction::Rate);
    }
    actions
}

/// Actions a ride card offers to its driver at `now`.
#[must_use]
pub fn ride_actions(ride: &Ride, now: PrimitiveDateTime) -> Vec<RideAction> {
    let mut actions = vec![RideAction::View, RideAction::Edit, RideAction::Delete];
    match ride.status {
        RideStatus::Active => {
            actions.push(RideAction::MarkCompleted);
            actions.push(RideAction::Cancel);
        }
        RideStatus::Cancelled if !ride.has_departed(now) => actions.push(RideAction::Reactivate),
        RideStatus::Cancelled | RideStatus::Completed => {}
    }
    actions
}
