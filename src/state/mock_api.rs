//! In-memory [`CarpoolApi`] for state-store tests.

use std::sync::Mutex;

use serde_json::{Value, json};

use crate::net::api::CarpoolApi;
use crate::net::envelope::ApiResponse;
use crate::net::types::{
    Booking, BookingRequest, BookingStatus, LoginRequest, LoginResponse, PaymentStatus, ProfileUpdate, Rating,
    RatingRequest, RegisterOutcome, RegisterRequest, Ride, RideFilter, RideOffer, RideSearch, RideStatus, RideUpdate,
    RouteInfo, User,
};

/// Canned replies plus a log of every call, e.g. `"confirm_booking 5"`.
/// Operations named in `failing` answer with `"<op> failed"`.
#[derive(Default)]
pub(crate) struct MockApi {
    pub calls: Mutex<Vec<String>>,
    pub failing: Vec<&'static str>,
    pub login: Option<LoginResponse>,
    pub register: Option<RegisterOutcome>,
    pub refreshed: Option<LoginResponse>,
    pub rides: Vec<Ride>,
    pub bookings: Vec<Booking>,
    pub received: Vec<Booking>,
    pub booked: Option<Booking>,
    pub profile: Option<User>,
}

impl MockApi {
    pub fn failing(mut self, ops: &[&'static str]) -> Self {
        self.failing.extend_from_slice(ops);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn reply<T>(&self, call: String, data: Option<T>) -> ApiResponse<T> {
        let op = call.split(' ').next().unwrap_or_default().to_owned();
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(&op.as_str()) {
            return ApiResponse::failure(format!("{op} failed"));
        }
        ApiResponse { success: true, data, message: "Success".to_owned() }
    }

    fn ack(&self, call: String) -> ApiResponse<Value> {
        self.reply(call, Some(json!({})))
    }
}

#[async_trait::async_trait]
impl CarpoolApi for MockApi {
    async fn login(&self, credentials: &LoginRequest) -> ApiResponse<LoginResponse> {
        self.reply(format!("login {}", credentials.email), self.login.clone())
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResponse<RegisterOutcome> {
        self.reply(format!("register {}", request.email), self.register.clone())
    }

    async fn logout(&self) -> ApiResponse<Value> {
        self.ack("logout".to_owned())
    }

    async fn refresh_token(&self, refresh_token: &str) -> ApiResponse<LoginResponse> {
        self.reply(format!("refresh_token {refresh_token}"), self.refreshed.clone())
    }

    async fn verify_email(&self, token: &str) -> ApiResponse<Value> {
        self.ack(format!("verify_email {token}"))
    }

    async fn forgot_password(&self, email: &str) -> ApiResponse<Value> {
        self.ack(format!("forgot_password {email}"))
    }

    async fn reset_password(&self, token: &str, _new_password: &str) -> ApiResponse<Value> {
        self.ack(format!("reset_password {token}"))
    }

    async fn offer_ride(&self, offer: &RideOffer) -> ApiResponse<Ride> {
        let ride = Ride {
            id: 100,
            route: RouteInfo { from: offer.from.clone(), to: offer.to.clone() },
            total_seats: offer.passengers,
            available_seats: offer.passengers,
            price_per_seat: offer.price_per_seat,
            ..Ride::default()
        };
        self.reply(format!("offer_ride {}", offer.from), Some(ride))
    }

    async fn search_rides(&self, search: &RideSearch) -> ApiResponse<Vec<Ride>> {
        self.reply(format!("search_rides {}", search.from), Some(self.rides.clone()))
    }

    async fn filter_rides(&self, _filter: &RideFilter) -> ApiResponse<Vec<Ride>> {
        self.reply("filter_rides".to_owned(), Some(self.rides.clone()))
    }

    async fn my_rides(&self) -> ApiResponse<Vec<Ride>> {
        self.reply("my_rides".to_owned(), Some(self.rides.clone()))
    }

    async fn ride_details(&self, ride_id: i64) -> ApiResponse<Ride> {
        let ride = self.rides.iter().find(|r| r.id == ride_id).cloned();
        self.reply(format!("ride_details {ride_id}"), ride)
    }

    async fn update_ride(&self, ride_id: i64, _update: &RideUpdate) -> ApiResponse<Ride> {
        self.reply(format!("update_ride {ride_id}"), None)
    }

    async fn delete_ride(&self, ride_id: i64) -> ApiResponse<Value> {
        self.ack(format!("delete_ride {ride_id}"))
    }

    async fn cancel_ride(&self, ride_id: i64) -> ApiResponse<Value> {
        self.ack(format!("cancel_ride {ride_id}"))
    }

    async fn update_ride_status(&self, ride_id: i64, status: RideStatus) -> ApiResponse<Value> {
        self.ack(format!("update_ride_status {ride_id} {status}"))
    }

    async fn from_locations(&self) -> ApiResponse<Vec<String>> {
        self.reply("from_locations".to_owned(), Some(vec!["Pune".to_owned()]))
    }

    async fn to_locations(&self) -> ApiResponse<Vec<String>> {
        self.reply("to_locations".to_owned(), Some(vec!["Mumbai".to_owned()]))
    }

    async fn book_ride(&self, ride_id: i64, request: BookingRequest) -> ApiResponse<Booking> {
        self.reply(format!("book_ride {ride_id} {}", request.seats_requested), self.booked.clone())
    }

    async fn my_bookings(&self) -> ApiResponse<Vec<Booking>> {
        self.reply("my_bookings".to_owned(), Some(self.bookings.clone()))
    }

    async fn my_ride_bookings(&self) -> ApiResponse<Vec<Booking>> {
        self.reply("my_ride_bookings".to_owned(), Some(self.received.clone()))
    }

    async fn cancel_booking(&self, booking_id: i64) -> ApiResponse<Value> {
        self.ack(format!("cancel_booking {booking_id}"))
    }

    async fn confirm_booking(&self, booking_id: i64) -> ApiResponse<Value> {
        self.ack(format!("confirm_booking {booking_id}"))
    }

    async fn user_profile(&self) -> ApiResponse<User> {
        self.reply("user_profile".to_owned(), self.profile.clone())
    }

    async fn update_user_profile(&self, _update: &ProfileUpdate) -> ApiResponse<User> {
        self.reply("update_user_profile".to_owned(), self.profile.clone())
    }

    async fn create_rating(&self, rating: &RatingRequest) -> ApiResponse<Rating> {
        let created = Rating { id: 1, rating: rating.rating, ride_id: Some(rating.ride_id), ..Rating::default() };
        self.reply(format!("create_rating {}", rating.ratee_id), Some(created))
    }

    async fn user_ratings(&self, user_id: i64) -> ApiResponse<Vec<Rating>> {
        self.reply(format!("user_ratings {user_id}"), Some(Vec::new()))
    }

    async fn recent_user_ratings(&self, user_id: i64, limit: u32) -> ApiResponse<Vec<Rating>> {
        self.reply(format!("recent_user_ratings {user_id} {limit}"), Some(Vec::new()))
    }

    async fn update_user_stats(&self, user_id: i64) -> ApiResponse<Value> {
        self.ack(format!("update_user_stats {user_id}"))
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

pub(crate) fn user(id: i64) -> User {
    User {
        id,
        first_name: Some("Asha".to_owned()),
        last_name: Some("Rao".to_owned()),
        email: "asha@example.in".to_owned(),
        phone: Some("9876543210".to_owned()),
        ..User::default()
    }
}

pub(crate) fn ride(id: i64, status: RideStatus) -> Ride {
    Ride {
        id,
        route: RouteInfo { from: "Pune".to_owned(), to: "Mumbai".to_owned() },
        departure_date: "2030-01-15".to_owned(),
        departure_time: "08:30".to_owned(),
        total_seats: 4,
        available_seats: 2,
        price_per_seat: 450.0,
        status,
        ..Ride::default()
    }
}

pub(crate) fn booking(id: i64, ride_id: i64, status: BookingStatus) -> Booking {
    Booking {
        id,
        ride_id,
        passenger_id: 7,
        seats_booked: 1,
        total_amount: 450.0,
        status,
        payment_status: PaymentStatus::Pending,
        ..Booking::default()
    }
}
