//! Dashboard state: rides offered, bookings made, bookings received.
//!
//! SYSTEM CONTEXT
//! ==============
//! The three collections are fetched independently; one failing does not
//! block the others. Mutations check the transition locally, issue exactly
//! one mutating call and, when it succeeds, patch the local lists instead of
//! re-fetching. A failed call leaves every list untouched.
//!
//! CASCADE
//! =======
//! A ride reaching COMPLETED or CANCELLED settles its related bookings in
//! both booking lists (see [`RideStatus::cascade_to`]). This is a local
//! projection of what the backend does, not a transaction: the next `load`
//! replaces it with the server's view.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use time::PrimitiveDateTime;

use crate::net::api::CarpoolApi;
use crate::net::envelope::ApiResponse;
use crate::net::error::ApiError;
use crate::net::types::{Booking, BookingRequest, BookingStatus, Ride, RideOffer, RideStatus, RideUpdate};
use crate::util::validation::{validate_booking, validate_ride_offer};

use super::StateError;

#[derive(Clone, Debug, Default)]
pub struct DashboardState {
    /// Rides the user offers as a driver.
    pub rides: Vec<Ride>,
    /// Bookings the user made as a passenger.
    pub bookings: Vec<Booking>,
    /// Bookings other users made on the user's rides.
    pub received: Vec<Booking>,
    pub loading: bool,
    /// Banner text from the last failed operation; cleared by the next success.
    pub error: Option<String>,
}

fn collection<T>(response: ApiResponse<Vec<T>>, fallback: &str, errors: &mut Vec<String>) -> Vec<T> {
    match response.into_result_or_default() {
        Ok(items) => items,
        Err(e) => {
            let message = e.user_message(fallback);
            tracing::warn!(error = %message, "dashboard fetch failed");
            errors.push(message);
            Vec::new()
        }
    }
}

impl DashboardState {
    /// Fetch all three collections. A failed fetch empties its collection and
    /// contributes to `error`.
    pub async fn load(&mut self, api: &dyn CarpoolApi) {
        self.loading = true;
        let mut errors = Vec::new();

        self.rides = collection(api.my_rides().await, "Failed to load your rides", &mut errors);
        self.bookings = collection(api.my_bookings().await, "Failed to load your bookings", &mut errors);
        self.received = collection(api.my_ride_bookings().await, "Failed to load ride bookings", &mut errors);

        self.error = (!errors.is_empty()).then(|| errors.join("; "));
        self.loading = false;
        tracing::debug!(
            rides = self.rides.len(),
            bookings = self.bookings.len(),
            received = self.received.len(),
            "dashboard loaded"
        );
    }

    #[must_use]
    pub fn ride(&self, ride_id: i64) -> Option<&Ride> {
        self.rides.iter().find(|r| r.id == ride_id)
    }

    /// Bookings received for one of the user's rides.
    pub fn bookings_for_ride(&self, ride_id: i64) -> impl Iterator<Item = &Booking> {
        self.received.iter().filter(move |b| b.ride_id == ride_id)
    }

    // =========================================================================
    // BOOKINGS
    // =========================================================================

    /// Driver accepts a pending booking on one of their rides.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::BookingNotFound`], an invalid transition, or the
    /// API failure message.
    pub async fn confirm_booking(&mut self, api: &dyn CarpoolApi, booking_id: i64) -> Result<(), StateError> {
        let result = self.try_confirm_booking(api, booking_id).await;
        self.record(result)
    }

    async fn try_confirm_booking(&mut self, api: &dyn CarpoolApi, booking_id: i64) -> Result<(), StateError> {
        let booking = find_booking(&self.received, booking_id)?;
        check_booking_transition(booking, BookingStatus::Confirmed)?;

        api.confirm_booking(booking_id)
            .await
            .into_ack()
            .map_err(|e| StateError::api(&e, "Failed to confirm booking"))?;

        set_booking_status(&mut self.received, booking_id, BookingStatus::Confirmed);
        tracing::info!(booking_id, "booking confirmed");
        Ok(())
    }

    /// Driver declines a pending booking. Uses the cancel endpoint; the
    /// booked seats return to the ride.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::BookingNotFound`], an invalid transition, or the
    /// API failure message.
    pub async fn reject_booking(&mut self, api: &dyn CarpoolApi, booking_id: i64) -> Result<(), StateError> {
        let result = self.try_reject_booking(api, booking_id).await;
        self.record(result)
    }

    async fn try_reject_booking(&mut self, api: &dyn CarpoolApi, booking_id: i64) -> Result<(), StateError> {
        let booking = find_booking(&self.received, booking_id)?;
        if booking.status != BookingStatus::Pending {
            return Err(StateError::InvalidBookingTransition {
                id: booking_id,
                from: booking.status,
                to: BookingStatus::Cancelled,
            });
        }
        let (ride_id, seats) = (booking.ride_id, booking.seats_booked);

        api.cancel_booking(booking_id)
            .await
            .into_ack()
            .map_err(|e| StateError::api(&e, "Failed to reject booking"))?;

        set_booking_status(&mut self.received, booking_id, BookingStatus::Cancelled);
        if let Some(ride) = self.rides.iter_mut().find(|r| r.id == ride_id) {
            ride.available_seats = ride.available_seats.saturating_add(seats).min(ride.total_seats);
        }
        tracing::info!(booking_id, ride_id, "booking rejected");
        Ok(())
    }

    /// Passenger cancels one of their own bookings.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::BookingNotFound`], an invalid transition, or the
    /// API failure message.
    pub async fn cancel_booking(&mut self, api: &dyn CarpoolApi, booking_id: i64) -> Result<(), StateError> {
        let result = self.try_cancel_booking(api, booking_id).await;
        self.record(result)
    }

    async fn try_cancel_booking(&mut self, api: &dyn CarpoolApi, booking_id: i64) -> Result<(), StateError> {
        let booking = find_booking(&self.bookings, booking_id)?;
        check_booking_transition(booking, BookingStatus::Cancelled)?;

        api.cancel_booking(booking_id)
            .await
            .into_ack()
            .map_err(|e| StateError::api(&e, "Failed to cancel booking"))?;

        set_booking_status(&mut self.bookings, booking_id, BookingStatus::Cancelled);
        tracing::info!(booking_id, "booking cancelled");
        Ok(())
    }

    /// Passenger books seats on `ride`; the new booking joins `bookings`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Validation`] when the seat count does not fit,
    /// or the API failure message.
    pub async fn book_ride(&mut self, api: &dyn CarpoolApi, ride: &Ride, seats: u32) -> Result<Booking, StateError> {
        let result = self.try_book_ride(api, ride, seats).await;
        self.record(result)
    }

    async fn try_book_ride(&mut self, api: &dyn CarpoolApi, ride: &Ride, seats: u32) -> Result<Booking, StateError> {
        validate_booking(seats, ride.available_seats)?;

        let booking = api
            .book_ride(ride.id, BookingRequest { seats_requested: seats })
            .await
            .into_result()
            .map_err(|e| StateError::api(&e, "Failed to book ride"))?;

        self.bookings.push(booking.clone());
        tracing::info!(ride_id = ride.id, booking_id = booking.id, seats, "ride booked");
        Ok(booking)
    }

    // =========================================================================
    // RIDES
    // =========================================================================

    /// Publish a new ride; it joins `rides` as returned by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Validation`] for an incomplete offer, or the API
    /// failure message.
    pub async fn offer_ride(&mut self, api: &dyn CarpoolApi, offer: &RideOffer) -> Result<Ride, StateError> {
        let result = self.try_offer_ride(api, offer).await;
        self.record(result)
    }

    async fn try_offer_ride(&mut self, api: &dyn CarpoolApi, offer: &RideOffer) -> Result<Ride, StateError> {
        validate_ride_offer(offer)?;

        let ride = api
            .offer_ride(offer)
            .await
            .into_result()
            .map_err(|e| StateError::api(&e, "Failed to offer ride"))?;

        self.rides.push(ride.clone());
        tracing::info!(ride_id = ride.id, "ride offered");
        Ok(ride)
    }

    /// Move one of the user's rides to `to`, cascading to its bookings.
    /// Reactivating a cancelled ride is refused once it has departed.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::RideNotFound`], an invalid transition,
    /// [`StateError::RideDeparted`], or the API failure message.
    pub async fn change_ride_status(
        &mut self,
        api: &dyn CarpoolApi,
        ride_id: i64,
        to: RideStatus,
        now: PrimitiveDateTime,
    ) -> Result<(), StateError> {
        let result = self.try_change_ride_status(api, ride_id, to, now).await;
        self.record(result)
    }

    async fn try_change_ride_status(
        &mut self,
        api: &dyn CarpoolApi,
        ride_id: i64,
        to: RideStatus,
        now: PrimitiveDateTime,
    ) -> Result<(), StateError> {
        let ride = self.ride(ride_id).ok_or(StateError::RideNotFound(ride_id))?;
        check_ride_transition(ride, to)?;
        if to == RideStatus::Active && ride.has_departed(now) {
            return Err(StateError::RideDeparted(ride_id));
        }

        api.update_ride_status(ride_id, to)
            .await
            .into_ack()
            .map_err(|e| StateError::api(&e, "Failed to update ride status"))?;

        self.apply_ride_status(ride_id, to);
        tracing::info!(ride_id, status = %to, "ride status changed");
        Ok(())
    }

    /// Cancel an active ride through the dedicated cancel endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::RideNotFound`], an invalid transition, or the
    /// API failure message.
    pub async fn cancel_ride(&mut self, api: &dyn CarpoolApi, ride_id: i64) -> Result<(), StateError> {
        let result = self.try_cancel_ride(api, ride_id).await;
        self.record(result)
    }

    async fn try_cancel_ride(&mut self, api: &dyn CarpoolApi, ride_id: i64) -> Result<(), StateError> {
        let ride = self.ride(ride_id).ok_or(StateError::RideNotFound(ride_id))?;
        check_ride_transition(ride, RideStatus::Cancelled)?;

        api.cancel_ride(ride_id)
            .await
            .into_ack()
            .map_err(|e| StateError::api(&e, "Failed to cancel ride"))?;

        self.apply_ride_status(ride_id, RideStatus::Cancelled);
        tracing::info!(ride_id, "ride cancelled");
        Ok(())
    }

    /// Delete a ride along with the bookings received for it.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::RideNotFound`] or the API failure message.
    pub async fn delete_ride(&mut self, api: &dyn CarpoolApi, ride_id: i64) -> Result<(), StateError> {
        let result = self.try_delete_ride(api, ride_id).await;
        self.record(result)
    }

    async fn try_delete_ride(&mut self, api: &dyn CarpoolApi, ride_id: i64) -> Result<(), StateError> {
        self.ride(ride_id).ok_or(StateError::RideNotFound(ride_id))?;

        api.delete_ride(ride_id)
            .await
            .into_ack()
            .map_err(|e| StateError::api(&e, "Failed to delete ride"))?;

        self.rides.retain(|r| r.id != ride_id);
        self.received.retain(|b| b.ride_id != ride_id);
        tracing::info!(ride_id, "ride deleted");
        Ok(())
    }

    /// Save an edit to one of the user's rides. The server's copy wins when
    /// it returns one; otherwise the edit is applied locally.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::RideNotFound`] or the API failure message.
    pub async fn update_ride(
        &mut self,
        api: &dyn CarpoolApi,
        ride_id: i64,
        update: &RideUpdate,
    ) -> Result<(), StateError> {
        let result = self.try_update_ride(api, ride_id, update).await;
        self.record(result)
    }

    async fn try_update_ride(&mut self, api: &dyn CarpoolApi, ride_id: i64, update: &RideUpdate) -> Result<(), StateError> {
        self.ride(ride_id).ok_or(StateError::RideNotFound(ride_id))?;

        let response = api.update_ride(ride_id, update).await;
        if !response.success {
            return Err(StateError::api(&ApiError::Rejected(response.message), "Failed to update ride"));
        }

        if let Some(ride) = self.rides.iter_mut().find(|r| r.id == ride_id) {
            match response.data {
                Some(server) => *ride = server,
                None => update.apply_to(ride),
            }
        }
        tracing::info!(ride_id, "ride updated");
        Ok(())
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn apply_ride_status(&mut self, ride_id: i64, status: RideStatus) {
        if let Some(ride) = self.rides.iter_mut().find(|r| r.id == ride_id) {
            ride.status = status;
        }
        self.cascade(ride_id, status);
    }

    /// Settle bookings of `ride_id` after the ride reached `status`.
    fn cascade(&mut self, ride_id: i64, status: RideStatus) {
        for booking in self.received.iter_mut().chain(self.bookings.iter_mut()) {
            if booking.ride_id != ride_id {
                continue;
            }
            if let Some(next) = status.cascade_to(booking.status)
                && booking.status.can_transition_to(next)
            {
                booking.status = next;
            }
        }
    }

    fn record<T>(&mut self, result: Result<T, StateError>) -> Result<T, StateError> {
        match &result {
            Ok(_) => self.error = None,
            Err(e) => {
                tracing::warn!(error = %e, "dashboard action failed");
                self.error = Some(e.to_string());
            }
        }
        result
    }
}

fn find_booking(bookings: &[Booking], booking_id: i64) -> Result<&Booking, StateError> {
    bookings.iter().find(|b| b.id == booking_id).ok_or(StateError::BookingNotFound(booking_id))
}

fn check_booking_transition(booking: &Booking, to: BookingStatus) -> Result<(), StateError> {
    if booking.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(StateError::InvalidBookingTransition { id: booking.id, from: booking.status, to })
    }
}

fn check_ride_transition(ride: &Ride, to: RideStatus) -> Result<(), StateError> {
    if ride.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(StateError::InvalidRideTransition { id: ride.id, from: ride.status, to })
    }
}

fn set_booking_status(bookings: &mut [Booking], booking_id: i64, status: BookingStatus) {
    if let Some(booking) = bookings.iter_mut().find(|b| b.id == booking_id) {
        booking.status = status;
    }
}
