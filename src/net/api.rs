//! REST API client for the carpool backend.
//!
//! ERROR HANDLING
//! ==============
//! Every operation returns an [`ApiResponse`] and never panics or errors:
//! transport failures, non-2xx replies and undecodable payloads all become a
//! failed envelope whose message is fit for an inline banner. Callers that
//! want `Result` use [`ApiResponse::into_result`].
//!
//! An HTTP 401 additionally clears the stored session and sends the user to
//! the sign-in screen through the configured [`Navigator`]. There are no
//! retries, no backoff and no de-duplication of in-flight calls.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{Map, Value};

use super::envelope::{ApiResponse, normalize};
use super::error::ApiError;
use super::session::SessionStore;
use super::types::{
    Booking, BookingRequest, LoginRequest, LoginResponse, ProfileUpdate, Rating, RatingRequest, RegisterOutcome,
    RegisterRequest, Ride, RideFilter, RideOffer, RideSearch, RideStatus, RideUpdate, User,
};
use crate::config::ClientConfig;

/// Route the user is sent to after the backend rejects the session.
pub const SIGN_IN_PATH: &str = "/signin";

/// Default number of ratings requested by [`CarpoolApi::recent_user_ratings`].
pub const DEFAULT_RECENT_RATINGS: u32 = 5;

// =============================================================================
// NAVIGATION HOOK
// =============================================================================

/// Receives redirect requests from the API layer (e.g. sign-in after a 401).
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect(&self, path: &str) {
        self(path);
    }
}

/// Default navigator: there is no screen to switch, so only log it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, path: &str) {
        tracing::info!(path, "redirect requested");
    }
}

// =============================================================================
// API SURFACE
// =============================================================================

/// Every backend operation the client and state stores use.
///
/// Implemented over HTTP by [`ApiClient`]; tests substitute in-memory fakes.
#[async_trait::async_trait]
pub trait CarpoolApi: Send + Sync {
    // Auth
    async fn login(&self, credentials: &LoginRequest) -> ApiResponse<LoginResponse>;
    async fn register(&self, request: &RegisterRequest) -> ApiResponse<RegisterOutcome>;
    async fn logout(&self) -> ApiResponse<Value>;
    /// Exchange a refresh token (sent as the bearer) for a fresh session.
    async fn refresh_token(&self, refresh_token: &str) -> ApiResponse<LoginResponse>;
    async fn verify_email(&self, token: &str) -> ApiResponse<Value>;
    async fn forgot_password(&self, email: &str) -> ApiResponse<Value>;
    async fn reset_password(&self, token: &str, new_password: &str) -> ApiResponse<Value>;

    // Rides
    async fn offer_ride(&self, offer: &RideOffer) -> ApiResponse<Ride>;
    async fn search_rides(&self, search: &RideSearch) -> ApiResponse<Vec<Ride>>;
    async fn filter_rides(&self, filter: &RideFilter) -> ApiResponse<Vec<Ride>>;
    async fn my_rides(&self) -> ApiResponse<Vec<Ride>>;
    async fn ride_details(&self, ride_id: i64) -> ApiResponse<Ride>;
    async fn update_ride(&self, ride_id: i64, update: &RideUpdate) -> ApiResponse<Ride>;
    async fn delete_ride(&self, ride_id: i64) -> ApiResponse<Value>;
    async fn cancel_ride(&self, ride_id: i64) -> ApiResponse<Value>;
    async fn update_ride_status(&self, ride_id: i64, status: RideStatus) -> ApiResponse<Value>;
    async fn from_locations(&self) -> ApiResponse<Vec<String>>;
    async fn to_locations(&self) -> ApiResponse<Vec<String>>;

    // Bookings
    async fn book_ride(&self, ride_id: i64, request: BookingRequest) -> ApiResponse<Booking>;
    async fn my_bookings(&self) -> ApiResponse<Vec<Booking>>;
    async fn my_ride_bookings(&self) -> ApiResponse<Vec<Booking>>;
    async fn cancel_booking(&self, booking_id: i64) -> ApiResponse<Value>;
    async fn confirm_booking(&self, booking_id: i64) -> ApiResponse<Value>;

    // Profile
    async fn user_profile(&self) -> ApiResponse<User>;
    async fn update_user_profile(&self, update: &ProfileUpdate) -> ApiResponse<User>;

    // Ratings
    async fn create_rating(&self, rating: &RatingRequest) -> ApiResponse<Rating>;
    async fn user_ratings(&self, user_id: i64) -> ApiResponse<Vec<Rating>>;
    async fn recent_user_ratings(&self, user_id: i64, limit: u32) -> ApiResponse<Vec<Rating>>;
    async fn update_user_stats(&self, user_id: i64) -> ApiResponse<Value>;
}

// =============================================================================
// ENDPOINTS
// =============================================================================

fn with_query(path: &str, pairs: &[(&str, String)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    if query.is_empty() { path.to_owned() } else { format!("{path}?{query}") }
}

fn ride_endpoint(ride_id: i64) -> String {
    format!("/rides/{ride_id}")
}

fn ride_status_endpoint(ride_id: i64, status: RideStatus) -> String {
    with_query(&format!("/rides/{ride_id}/status"), &[("status", status.as_str().to_owned())])
}

fn search_endpoint(search: &RideSearch) -> String {
    with_query("/rides/search", &search.query_pairs())
}

fn filter_endpoint(filter: &RideFilter) -> String {
    with_query("/rides/filter", &filter.query_pairs())
}

fn booking_action_endpoint(booking_id: i64, action: &str) -> String {
    format!("/bookings/{booking_id}/{action}")
}

fn recent_ratings_endpoint(user_id: i64, limit: u32) -> String {
    with_query(&format!("/ratings/user/{user_id}/recent"), &[("limit", limit.to_string())])
}

fn reset_password_endpoint(token: &str, new_password: &str) -> String {
    with_query(
        "/auth/reset-password",
        &[("token", token.to_owned()), ("newPassword", new_password.to_owned())],
    )
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// HTTP implementation of [`CarpoolApi`]. Cheap to clone; clones share the
/// connection pool, session store and navigator.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client for `config.api_url` reading tokens from `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client fails to build.
    pub fn new(config: &ClientConfig, session: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let base_url = crate::config::normalize_api_url(&config.api_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url, session, navigator: Arc::new(LogNavigator) })
    }

    /// Replace the navigator that receives the sign-in redirect on 401.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> ApiResponse<T> {
        self.request(Method::GET, endpoint, None, None).await.decode()
    }

    async fn send<T, B>(&self, method: Method, endpoint: &str, body: Option<&B>) -> ApiResponse<T>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let body = match body.map(serde_json::to_value).transpose() {
            Ok(body) => body,
            Err(e) => return ApiResponse::failure(format!("failed to encode request: {e}")),
        };
        self.request(method, endpoint, body, None).await.decode()
    }

    async fn send_empty<T: serde::de::DeserializeOwned>(&self, method: Method, endpoint: &str) -> ApiResponse<T> {
        self.request(method, endpoint, None, None).await.decode()
    }

    /// Issue one HTTP call and fold the outcome into an envelope.
    ///
    /// `bearer` overrides the stored session token (used for token refresh).
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> ApiResponse<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut req = self.http.request(method.clone(), &url).header(CONTENT_TYPE, "application/json");

        let token = bearer.map(str::to_owned).or_else(|| self.session.token());
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = &body {
            req = req.json(body);
        }

        tracing::debug!(%method, endpoint, "api request");
        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, endpoint, error = %e, "api request failed");
                return ApiResponse::failure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        if status == 401 {
            self.handle_unauthorized();
        }
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%method, endpoint, status, error = %e, "api response unreadable");
                return ApiResponse::failure(e.to_string());
            }
        };
        let body = match parse_body(is_json, &bytes) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(%method, endpoint, status, error = %e, "api response is not valid JSON");
                return ApiResponse::failure(format!("error decoding response body: {e}"));
            }
        };

        let envelope = normalize(status, body);
        if !envelope.success {
            tracing::warn!(%method, endpoint, status, message = %envelope.message, "api call unsuccessful");
        }
        envelope
    }

    fn handle_unauthorized(&self) {
        tracing::warn!("session rejected by backend; signing out");
        if let Err(e) = self.session.clear() {
            tracing::error!(error = %e, "failed to clear stored session");
        }
        self.navigator.redirect(SIGN_IN_PATH);
    }
}

/// Response body as JSON. Non-JSON and empty bodies read as `{}`.
fn parse_body(is_json: bool, bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if !is_json || bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
}

#[async_trait::async_trait]
impl CarpoolApi for ApiClient {
    async fn login(&self, credentials: &LoginRequest) -> ApiResponse<LoginResponse> {
        self.send(Method::POST, "/auth/login", Some(credentials)).await
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResponse<RegisterOutcome> {
        self.send(Method::POST, "/auth/register", Some(request)).await
    }

    async fn logout(&self) -> ApiResponse<Value> {
        self.send_empty(Method::POST, "/auth/logout").await
    }

    async fn refresh_token(&self, refresh_token: &str) -> ApiResponse<LoginResponse> {
        self.request(Method::POST, "/auth/refresh-token", None, Some(refresh_token))
            .await
            .decode()
    }

    async fn verify_email(&self, token: &str) -> ApiResponse<Value> {
        self.get(&with_query("/auth/verify-email", &[("token", token.to_owned())])).await
    }

    async fn forgot_password(&self, email: &str) -> ApiResponse<Value> {
        let endpoint = with_query("/auth/forgot-password", &[("email", email.to_owned())]);
        self.send_empty(Method::POST, &endpoint).await
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> ApiResponse<Value> {
        self.send_empty(Method::POST, &reset_password_endpoint(token, new_password)).await
    }

    async fn offer_ride(&self, offer: &RideOffer) -> ApiResponse<Ride> {
        self.send(Method::POST, "/rides/offer", Some(offer)).await
    }

    async fn search_rides(&self, search: &RideSearch) -> ApiResponse<Vec<Ride>> {
        self.get(&search_endpoint(search)).await
    }

    async fn filter_rides(&self, filter: &RideFilter) -> ApiResponse<Vec<Ride>> {
        self.get(&filter_endpoint(filter)).await
    }

    async fn my_rides(&self) -> ApiResponse<Vec<Ride>> {
        self.get("/rides/my-rides").await
    }

    async fn ride_details(&self, ride_id: i64) -> ApiResponse<Ride> {
        self.get(&ride_endpoint(ride_id)).await
    }

    async fn update_ride(&self, ride_id: i64, update: &RideUpdate) -> ApiResponse<Ride> {
        self.send(Method::PUT, &format!("/rides/{ride_id}/update"), Some(update)).await
    }

    async fn delete_ride(&self, ride_id: i64) -> ApiResponse<Value> {
        self.send_empty(Method::DELETE, &ride_endpoint(ride_id)).await
    }

    async fn cancel_ride(&self, ride_id: i64) -> ApiResponse<Value> {
        self.send_empty(Method::DELETE, &format!("/rides/{ride_id}/cancel")).await
    }

    async fn update_ride_status(&self, ride_id: i64, status: RideStatus) -> ApiResponse<Value> {
        self.send_empty(Method::PUT, &ride_status_endpoint(ride_id, status)).await
    }

    async fn from_locations(&self) -> ApiResponse<Vec<String>> {
        self.get("/rides/locations/from").await
    }

    async fn to_locations(&self) -> ApiResponse<Vec<String>> {
        self.get("/rides/locations/to").await
    }

    async fn book_ride(&self, ride_id: i64, request: BookingRequest) -> ApiResponse<Booking> {
        self.send(Method::POST, &format!("/rides/{ride_id}/book"), Some(&request)).await
    }

    async fn my_bookings(&self) -> ApiResponse<Vec<Booking>> {
        self.get("/bookings/my-bookings").await
    }

    async fn my_ride_bookings(&self) -> ApiResponse<Vec<Booking>> {
        self.get("/bookings/my-ride-bookings").await
    }

    async fn cancel_booking(&self, booking_id: i64) -> ApiResponse<Value> {
        self.send_empty(Method::PUT, &booking_action_endpoint(booking_id, "cancel")).await
    }

    async fn confirm_booking(&self, booking_id: i64) -> ApiResponse<Value> {
        self.send_empty(Method::PUT, &booking_action_endpoint(booking_id, "confirm")).await
    }

    async fn user_profile(&self) -> ApiResponse<User> {
        self.get("/users/profile").await
    }

    async fn update_user_profile(&self, update: &ProfileUpdate) -> ApiResponse<User> {
        self.send(Method::PUT, "/users/profile", Some(update)).await
    }

    async fn create_rating(&self, rating: &RatingRequest) -> ApiResponse<Rating> {
        self.send(Method::POST, "/ratings", Some(rating)).await
    }

    async fn user_ratings(&self, user_id: i64) -> ApiResponse<Vec<Rating>> {
        self.get(&format!("/ratings/user/{user_id}")).await
    }

    async fn recent_user_ratings(&self, user_id: i64, limit: u32) -> ApiResponse<Vec<Rating>> {
        self.get(&recent_ratings_endpoint(user_id, limit)).await
    }

    async fn update_user_stats(&self, user_id: i64) -> ApiResponse<Value> {
        self.send_empty(Method::POST, &format!("/ratings/user/{user_id}/update-stats")).await
    }
}
