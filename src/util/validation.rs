//! Client-side form validation.
//!
//! DESIGN
//! ======
//! Each validator checks every field and reports all problems at once, keyed
//! by the camelCase field name the backend uses, so a caller can show them
//! next to the matching input. Validation passing does not mean the backend
//! will accept the request; it only filters out obvious mistakes before a
//! network call.

#[cfg(test)]
#[path = "validation_test.rs"]
mod validation_test;

use std::fmt;

use crate::net::types::{ProfileUpdate, RatingRequest, RegisterRequest, RideOffer, RideSearch};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_BIO_LEN: usize = 500;

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// All problems found in one form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message for `field`, if it was rejected.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(error.message)?;
        }
        Ok(())
    }
}

// =============================================================================
// FIELD RULES
// =============================================================================

/// Loose `x@y.z` shape check: somewhere in the input a non-blank run holds
/// an `@` with text before it and a dotted domain after it.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    email.split_whitespace().any(|token| {
        token.match_indices('@').any(|(at, _)| {
            let domain = &token[at + 1..];
            at > 0 && domain.char_indices().any(|(dot, c)| c == '.' && dot > 0 && dot + 1 < domain.len())
        })
    })
}

/// Ten digits starting with 6-9.
#[must_use]
pub fn is_indian_mobile(phone: &str) -> bool {
    phone.len() == 10
        && phone.bytes().all(|b| b.is_ascii_digit())
        && matches!(phone.as_bytes().first(), Some(b'6'..=b'9'))
}

/// [`is_indian_mobile`], optionally prefixed with `91` or `+91`.
#[must_use]
pub fn is_indian_mobile_with_code(phone: &str) -> bool {
    let local = phone.strip_prefix('+').unwrap_or(phone);
    is_indian_mobile(phone) || local.strip_prefix("91").is_some_and(is_indian_mobile)
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.is_empty() {
        errors.push("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.push("email", "Please enter a valid email address");
    }
}

fn check_password(errors: &mut FieldErrors, password: &str) {
    if password.is_empty() {
        errors.push("password", "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("password", "Password must be at least 6 characters");
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

// =============================================================================
// FORMS
// =============================================================================

/// # Errors
///
/// Returns every rejected field of the sign-in form.
pub fn validate_sign_in(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    errors.into_result()
}

/// # Errors
///
/// Returns every rejected field of the sign-up form.
pub fn validate_sign_up(request: &RegisterRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if is_blank(&request.first_name) {
        errors.push("firstName", "First name is required");
    }
    if is_blank(&request.last_name) {
        errors.push("lastName", "Last name is required");
    }
    check_email(&mut errors, &request.email);
    if request.phone.is_empty() {
        errors.push("phone", "Phone number is required");
    } else if !is_indian_mobile(&request.phone) {
        errors.push("phone", "Phone must be a valid Indian mobile number (10 digits starting with 6-9)");
    }
    check_password(&mut errors, &request.password);
    errors.into_result()
}

/// # Errors
///
/// Returns every rejected field of the offer-ride form.
pub fn validate_ride_offer(offer: &RideOffer) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if is_blank(&offer.from) {
        errors.push("from", "Starting location is required");
    }
    if is_blank(&offer.to) {
        errors.push("to", "Destination is required");
    }
    if is_blank(&offer.departure_date) {
        errors.push("departureDate", "Departure date is required");
    }
    if is_blank(&offer.departure_time) {
        errors.push("departureTime", "Departure time is required");
    }
    if offer.passengers == 0 {
        errors.push("passengers", "Number of passengers must be positive");
    }
    if !(offer.price_per_seat.is_finite() && offer.price_per_seat > 0.0) {
        errors.push("pricePerSeat", "Please enter a valid price per seat");
    }
    if is_blank(&offer.car_model) {
        errors.push("carModel", "Car model is required");
    }
    if is_blank(&offer.car_number) {
        errors.push("carNumber", "Car number is required");
    }
    errors.into_result()
}

/// # Errors
///
/// Returns every rejected field of the ride search form.
pub fn validate_ride_search(search: &RideSearch) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if is_blank(&search.from) {
        errors.push("from", "Starting location is required");
    }
    if is_blank(&search.to) {
        errors.push("to", "Destination is required");
    }
    if is_blank(&search.date) {
        errors.push("date", "Travel date is required");
    }
    if search.passengers == 0 {
        errors.push("passengers", "At least one passenger is required");
    }
    if search.max_price.is_some_and(|p| !(p.is_finite() && p > 0.0)) {
        errors.push("maxPrice", "Maximum price must be positive");
    }
    errors.into_result()
}

/// Seats requested must be at least one and no more than the ride has left.
///
/// # Errors
///
/// Returns the rejected `seatsRequested` field.
pub fn validate_booking(seats_requested: u32, available_seats: u32) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if seats_requested == 0 {
        errors.push("seatsRequested", "Please select at least one seat");
    } else if seats_requested > available_seats {
        errors.push("seatsRequested", "Not enough seats available");
    }
    errors.into_result()
}

/// # Errors
///
/// Returns the rejected `rating` field when the score is outside 1..=5.
pub fn validate_rating(request: &RatingRequest) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if !(1..=5).contains(&request.rating) {
        errors.push("rating", "Please select a rating");
    }
    errors.into_result()
}

/// # Errors
///
/// Returns every rejected field of the profile form. Absent fields are not checked.
pub fn validate_profile(update: &ProfileUpdate) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if update.first_name.as_deref().is_some_and(|n| n.chars().count() > MAX_NAME_LEN) {
        errors.push("firstName", "First name must not exceed 100 characters");
    }
    if update.last_name.as_deref().is_some_and(|n| n.chars().count() > MAX_NAME_LEN) {
        errors.push("lastName", "Last name must not exceed 100 characters");
    }
    if update.phone.as_deref().is_some_and(|p| !p.is_empty() && !is_indian_mobile_with_code(p)) {
        errors.push("phone", "Phone number must be a valid Indian mobile number (10 digits starting with 6-9)");
    }
    if update.bio.as_deref().is_some_and(|b| b.chars().count() > MAX_BIO_LEN) {
        errors.push("bio", "Bio must not exceed 500 characters");
    }
    errors.into_result()
}
