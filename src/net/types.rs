//! Wire DTOs for the carpool REST backend.
//!
//! DESIGN
//! ======
//! Field names mirror the backend's camelCase JSON. Status enums accept any
//! letter case on input because the backend and older clients disagree on
//! it, and always serialize upper-case.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

// =============================================================================
// STATUS ENUMS
// =============================================================================

/// A status string that matched none of the known variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status: {value}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `Display`, `FromStr` and string serde for a status enum given
/// its `(Variant, "WIRE")` table.
macro_rules! wire_status {
    ($ty:ident, $kind:literal, [$(($variant:ident, $wire:literal)),+ $(,)?]) => {
        impl $ty {
            /// Upper-case wire name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownStatus;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let upper = raw.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(UnknownStatus { kind: $kind, value: raw.to_owned() }),
                }
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Lifecycle of a passenger's reservation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    /// Requested, awaiting the driver. A booking without a status is pending.
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

wire_status!(BookingStatus, "booking", [
    (Pending, "PENDING"),
    (Confirmed, "CONFIRMED"),
    (Completed, "COMPLETED"),
    (Cancelled, "CANCELLED"),
]);

impl BookingStatus {
    /// Completed and cancelled bookings never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// PENDING → {CONFIRMED, CANCELLED}; CONFIRMED → {COMPLETED, CANCELLED}.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled) | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }
}

/// Lifecycle of a driver's offered ride.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RideStatus {
    /// Open for bookings. A ride without a status is active.
    #[default]
    Active,
    Completed,
    Cancelled,
}

wire_status!(RideStatus, "ride", [
    (Active, "ACTIVE"),
    (Completed, "COMPLETED"),
    (Cancelled, "CANCELLED"),
]);

impl RideStatus {
    /// ACTIVE → {COMPLETED, CANCELLED}; CANCELLED → ACTIVE (reactivation).
    ///
    /// Reactivation is additionally limited to rides that have not departed;
    /// that check needs a clock and lives with the caller.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Completed | Self::Cancelled) | (Self::Cancelled, Self::Active)
        )
    }

    /// Booking status that related bookings settle into when a ride reaches
    /// `self`, given the booking's current status. `None` leaves the booking alone.
    #[must_use]
    pub const fn cascade_to(self, booking: BookingStatus) -> Option<BookingStatus> {
        match (self, booking) {
            (Self::Completed, BookingStatus::Confirmed) => Some(BookingStatus::Completed),
            (Self::Completed | Self::Cancelled, BookingStatus::Pending)
            | (Self::Cancelled, BookingStatus::Confirmed) => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

wire_status!(PaymentStatus, "payment", [
    (Pending, "PENDING"),
    (Completed, "COMPLETED"),
    (Failed, "FAILED"),
    (Refunded, "REFUNDED"),
]);

/// Backend DTOs send `null` for unset fields; treat it like a missing one.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// USERS
// =============================================================================

/// A registered user as returned by auth and profile endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Average rating received, if any ratings exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rides: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email_verified: bool,
}

impl User {
    /// `name`, else `first last`, else the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(self.name.as_deref(), self.first_name.as_deref(), self.last_name.as_deref())
            .unwrap_or_else(|| self.email.clone())
    }
}

/// Compact user summary embedded in rides and bookings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub total_trips: Option<u32>,
}

impl PartyInfo {
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        display_name(self.name.as_deref(), self.first_name.as_deref(), self.last_name.as_deref())
    }
}

fn display_name(name: Option<&str>, first: Option<&str>, last: Option<&str>) -> Option<String> {
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        return Some(name.to_owned());
    }
    let joined = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}

// =============================================================================
// RIDES
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub from: String,
    pub to: String,
}

/// A passenger riding along, as listed on the driver's ride details.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RidePassenger {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub seats_booked: Option<u32>,
}

/// A driver-offered trip with seats for sale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: i64,
    #[serde(default)]
    pub driver: Option<PartyInfo>,
    pub route: RouteInfo,
    /// ISO date, e.g. `2025-03-14`.
    pub departure_date: String,
    /// ISO time, e.g. `08:30` or `08:30:00`.
    pub departure_time: String,
    #[serde(default)]
    pub car_model: Option<String>,
    #[serde(default)]
    pub car_number: Option<String>,
    pub total_seats: u32,
    pub available_seats: u32,
    pub price_per_seat: f64,
    #[serde(default)]
    pub additional_info: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RideStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instant_booking: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub passengers: Vec<RidePassenger>,
}

impl Ride {
    /// Departure as a naive local timestamp; `None` when the backend sent
    /// something unparseable.
    #[must_use]
    pub fn departure_at(&self) -> Option<PrimitiveDateTime> {
        parse_departure(&self.departure_date, &self.departure_time)
    }

    /// Whether the ride departed before `now`. Unparseable dates count as upcoming.
    #[must_use]
    pub fn has_departed(&self, now: PrimitiveDateTime) -> bool {
        self.departure_at().is_some_and(|at| at < now)
    }
}

/// Parse a backend date plus time into a timestamp.
///
/// Accepts `YYYY-MM-DD` with a separate `HH:MM[:SS[.fff]]` time, or an ISO
/// datetime in the date field (`YYYY-MM-DDTHH:MM[:SS]`), in which case the
/// time argument is ignored.
pub(crate) fn parse_departure(date: &str, time: &str) -> Option<PrimitiveDateTime> {
    let (date_part, time_part) = match date.split_once('T') {
        Some((d, t)) => (d, t),
        None => (date, time),
    };
    let date = Date::parse(date_part.trim(), format_description!("[year]-[month]-[day]")).ok()?;

    let time_part = time_part.trim().trim_end_matches('Z');
    let time_part = time_part.split('.').next().unwrap_or(time_part);
    let time = Time::parse(time_part, format_description!("[hour]:[minute]:[second]"))
        .or_else(|_| Time::parse(time_part, format_description!("[hour]:[minute]")))
        .ok()?;

    Some(PrimitiveDateTime::new(date, time))
}

// =============================================================================
// BOOKINGS
// =============================================================================

/// Ride summary embedded in a booking.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRide {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub departure_date: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub price_per_seat: Option<f64>,
    #[serde(default)]
    pub car_model: Option<String>,
    #[serde(default)]
    pub car_number: Option<String>,
}

/// A passenger's reservation against a ride.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub ride_id: i64,
    pub passenger_id: i64,
    pub seats_booked: u32,
    pub total_amount: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: BookingStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub ride: Option<BookingRide>,
    #[serde(default)]
    pub driver: Option<PartyInfo>,
    #[serde(default)]
    pub passenger: Option<PartyInfo>,
}

// =============================================================================
// RATINGS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: i64,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub rater_name: Option<String>,
    #[serde(default)]
    pub ratee_name: Option<String>,
    #[serde(default)]
    pub ride_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Payload for `POST /rides/offer`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideOffer {
    pub from: String,
    pub to: String,
    pub departure_date: String,
    pub departure_time: String,
    /// Seats offered.
    pub passengers: u32,
    pub price_per_seat: f64,
    pub car_model: String,
    pub car_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    pub instant_booking: bool,
}

/// Payload for `PUT /rides/{id}/update`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideUpdate {
    pub from: String,
    pub to: String,
    pub departure_date: String,
    pub departure_time: String,
    pub car_model: String,
    pub car_number: String,
    pub total_seats: u32,
    pub price_per_seat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    pub instant_booking: bool,
}

impl RideUpdate {
    /// Copy the edited fields onto a locally held ride.
    ///
    /// Available seats shrink or grow with the total, never below zero.
    pub fn apply_to(&self, ride: &mut Ride) {
        let booked = ride.total_seats.saturating_sub(ride.available_seats);
        ride.route = RouteInfo { from: self.from.clone(), to: self.to.clone() };
        ride.departure_date.clone_from(&self.departure_date);
        ride.departure_time.clone_from(&self.departure_time);
        ride.car_model = Some(self.car_model.clone());
        ride.car_number = Some(self.car_number.clone());
        ride.total_seats = self.total_seats;
        ride.available_seats = self.total_seats.saturating_sub(booked);
        ride.price_per_seat = self.price_per_seat;
        ride.additional_info.clone_from(&self.additional_info);
        ride.instant_booking = self.instant_booking;
    }
}

/// Query for `GET /rides/search`.
#[derive(Clone, Debug, PartialEq)]
pub struct RideSearch {
    pub from: String,
    pub to: String,
    pub date: String,
    pub passengers: u32,
    pub time: Option<String>,
    pub max_price: Option<f64>,
}

impl RideSearch {
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("from", self.from.trim().to_owned()),
            ("to", self.to.trim().to_owned()),
            ("date", self.date.clone()),
            ("passengers", self.passengers.to_string()),
        ];
        if let Some(time) = &self.time {
            pairs.push(("time", time.clone()));
        }
        if let Some(max_price) = self.max_price {
            pairs.push(("maxPrice", max_price.to_string()));
        }
        pairs
    }
}

/// Query for `GET /rides/filter`. Every criterion is optional.
#[derive(Clone, Debug, PartialEq)]
pub struct RideFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_seats: Option<u32>,
    pub page: u32,
    pub size: u32,
}

impl Default for RideFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            start_date: None,
            end_date: None,
            min_price: None,
            max_price: None,
            min_seats: None,
            page: 0,
            size: 10,
        }
    }
}

impl RideFilter {
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let optional = [
            ("from", self.from.clone()),
            ("to", self.to.clone()),
            ("startDate", self.start_date.clone()),
            ("endDate", self.end_date.clone()),
            ("minPrice", self.min_price.map(|v| v.to_string())),
            ("maxPrice", self.max_price.map(|v| v.to_string())),
            ("minSeats", self.min_seats.map(|v| v.to_string())),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                pairs.push((key, value));
            }
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("size", self.size.to_string()));
        pairs
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub seats_requested: u32,
}

impl Default for BookingRequest {
    fn default() -> Self {
        Self { seats_requested: 1 }
    }
}

/// Partial profile edit; absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    /// Merge the present fields into `user`.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(first) = &self.first_name {
            user.first_name = Some(first.clone());
        }
        if let Some(last) = &self.last_name {
            user.last_name = Some(last.clone());
        }
        if self.first_name.is_some() || self.last_name.is_some() {
            user.name = display_name(None, user.first_name.as_deref(), user.last_name.as_deref());
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(location) = &self.location {
            user.location = Some(location.clone());
        }
        if let Some(bio) = &self.bio {
            user.bio = Some(bio.clone());
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub rating: u8,
    pub comment: Option<String>,
    pub ride_id: i64,
    pub ratee_id: i64,
}

// =============================================================================
// RESPONSES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// `POST /auth/register` either signs the user straight in or only creates
/// the account, depending on the backend build.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RegisterOutcome {
    SignedIn(LoginResponse),
    Created(User),
}
