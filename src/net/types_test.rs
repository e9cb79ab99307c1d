use super::*;
use serde_json::json;

// =============================================================
// Helpers
// =============================================================

fn ride_json() -> serde_json::Value {
    json!({
        "id": 7,
        "driver": { "name": "Ravi", "phone": "9876543210", "rating": 4.6, "totalTrips": 31 },
        "route": { "from": "Koramangala", "to": "Whitefield" },
        "departureDate": "2025-03-14",
        "departureTime": "08:30:00",
        "carModel": "Swift",
        "carNumber": "KA01AB1234",
        "totalSeats": 4,
        "availableSeats": 3,
        "pricePerSeat": 150.0,
        "status": "active",
        "instantBooking": true,
        "passengers": [{ "name": "Asha", "seatsBooked": 1 }]
    })
}

fn at(date: &str, time: &str) -> PrimitiveDateTime {
    parse_departure(date, time).unwrap()
}

// =============================================================
// Status enums
// =============================================================

#[test]
fn booking_status_parses_any_case_and_serializes_upper() {
    assert_eq!("confirmed".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
    assert_eq!(" Pending ".parse::<BookingStatus>().unwrap(), BookingStatus::Pending);
    assert_eq!(serde_json::to_string(&BookingStatus::Cancelled).unwrap(), "\"CANCELLED\"");
    let parsed: BookingStatus = serde_json::from_str("\"completed\"").unwrap();
    assert_eq!(parsed, BookingStatus::Completed);
}

#[test]
fn unknown_status_is_rejected_with_kind() {
    let err = "archived".parse::<RideStatus>().unwrap_err();
    assert_eq!(err.to_string(), "unknown ride status: archived");
    assert!(serde_json::from_str::<PaymentStatus>("\"lost\"").is_err());
}

#[test]
fn booking_transitions_follow_lifecycle() {
    use BookingStatus::*;
    assert!(Pending.can_transition_to(Confirmed));
    assert!(Pending.can_transition_to(Cancelled));
    assert!(!Pending.can_transition_to(Completed));
    assert!(Confirmed.can_transition_to(Completed));
    assert!(Confirmed.can_transition_to(Cancelled));
    assert!(!Confirmed.can_transition_to(Pending));
    for terminal in [Completed, Cancelled] {
        assert!(terminal.is_terminal());
        for next in [Pending, Confirmed, Completed, Cancelled] {
            assert!(!terminal.can_transition_to(next), "{terminal} -> {next} must be rejected");
        }
    }
}

#[test]
fn ride_transitions_allow_reactivation_only_from_cancelled() {
    use RideStatus::*;
    assert!(Active.can_transition_to(Completed));
    assert!(Active.can_transition_to(Cancelled));
    assert!(Cancelled.can_transition_to(Active));
    assert!(!Completed.can_transition_to(Active));
    assert!(!Completed.can_transition_to(Cancelled));
    assert!(!Active.can_transition_to(Active));
}

#[test]
fn ride_cascade_targets() {
    use BookingStatus as B;
    assert_eq!(RideStatus::Completed.cascade_to(B::Confirmed), Some(B::Completed));
    assert_eq!(RideStatus::Completed.cascade_to(B::Pending), Some(B::Cancelled));
    assert_eq!(RideStatus::Cancelled.cascade_to(B::Pending), Some(B::Cancelled));
    assert_eq!(RideStatus::Cancelled.cascade_to(B::Confirmed), Some(B::Cancelled));
    assert_eq!(RideStatus::Cancelled.cascade_to(B::Completed), None);
    assert_eq!(RideStatus::Active.cascade_to(B::Pending), None);
}

// =============================================================
// Rides
// =============================================================

#[test]
fn ride_deserializes_backend_shape() {
    let ride: Ride = serde_json::from_value(ride_json()).unwrap();
    assert_eq!(ride.id, 7);
    assert_eq!(ride.route.from, "Koramangala");
    assert_eq!(ride.status, RideStatus::Active);
    assert_eq!(ride.driver.as_ref().and_then(PartyInfo::display_name).as_deref(), Some("Ravi"));
    assert_eq!(ride.passengers[0].seats_booked, Some(1));
}

#[test]
fn ride_without_status_defaults_to_active() {
    let mut value = ride_json();
    value.as_object_mut().unwrap().remove("status");
    let ride: Ride = serde_json::from_value(value).unwrap();
    assert_eq!(ride.status, RideStatus::Active);
}

#[test]
fn ride_tolerates_backend_nulls() {
    let value = json!({
        "id": 12,
        "driver": { "name": "Ravi Kumar", "phone": "9876543210", "rating": null, "totalTrips": 0 },
        "route": { "from": "Pune", "to": "Mumbai" },
        "departureDate": "2030-01-15",
        "departureTime": "08:30:00",
        "carModel": "Swift",
        "carNumber": "MH12AB1234",
        "totalSeats": 4,
        "availableSeats": 4,
        "pricePerSeat": 450.00,
        "additionalInfo": null,
        "status": null,
        "instantBooking": null,
        "passengers": null
    });
    let ride: Ride = serde_json::from_value(value.clone()).unwrap();
    assert!(ride.passengers.is_empty());
    assert_eq!(ride.status, RideStatus::Active);
    assert!(!ride.instant_booking);
    assert_eq!(ride.additional_info, None);

    let listed = crate::net::envelope::normalize(200, json!({ "success": true, "data": [value] })).decode::<Vec<Ride>>();
    assert!(listed.success, "{}", listed.message);
    assert_eq!(listed.data.map(|rides| rides.len()), Some(1));
}

#[test]
fn parse_departure_accepts_common_shapes() {
    let expected = at("2025-03-14", "08:30");
    assert_eq!(parse_departure("2025-03-14", "08:30:00"), Some(expected));
    assert_eq!(parse_departure("2025-03-14", "08:30:00.000"), Some(expected));
    assert_eq!(parse_departure("2025-03-14T08:30:00Z", "ignored"), Some(expected));
    assert_eq!(parse_departure("14/03/2025", "08:30"), None);
    assert_eq!(parse_departure("2025-03-14", "half past eight"), None);
}

#[test]
fn has_departed_compares_against_now() {
    let ride: Ride = serde_json::from_value(ride_json()).unwrap();
    assert!(ride.has_departed(at("2025-03-14", "09:00")));
    assert!(!ride.has_departed(at("2025-03-14", "08:00")));

    let unparseable = Ride { departure_date: "soon".to_owned(), ..ride };
    assert!(!unparseable.has_departed(at("2030-01-01", "00:00")));
}

#[test]
fn ride_update_keeps_booked_seats() {
    let mut ride: Ride = serde_json::from_value(ride_json()).unwrap();
    let update = RideUpdate {
        from: "HSR".to_owned(),
        to: "Whitefield".to_owned(),
        departure_date: "2025-03-15".to_owned(),
        departure_time: "09:00".to_owned(),
        car_model: "City".to_owned(),
        car_number: "KA02".to_owned(),
        total_seats: 6,
        price_per_seat: 120.0,
        additional_info: Some("No smoking".to_owned()),
        instant_booking: false,
    };
    update.apply_to(&mut ride);
    assert_eq!(ride.route.from, "HSR");
    assert_eq!(ride.total_seats, 6);
    assert_eq!(ride.available_seats, 5);
    assert_eq!(ride.car_model.as_deref(), Some("City"));

    let shrink = RideUpdate { total_seats: 0, ..update };
    shrink.apply_to(&mut ride);
    assert_eq!(ride.available_seats, 0);
}

// =============================================================
// Bookings and users
// =============================================================

#[test]
fn booking_defaults_missing_status_to_pending() {
    let booking: Booking = serde_json::from_value(json!({
        "id": 1,
        "rideId": 7,
        "passengerId": 3,
        "seatsBooked": 2,
        "totalAmount": 300.0,
        "ride": { "from": "A", "to": "B" }
    }))
    .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::Pending);
    assert_eq!(booking.ride.unwrap().to.as_deref(), Some("B"));
}

#[test]
fn booking_and_user_tolerate_null_flags() {
    let booking: Booking = serde_json::from_value(json!({
        "id": 1,
        "rideId": 7,
        "passengerId": 3,
        "seatsBooked": 1,
        "totalAmount": 450.0,
        "status": null,
        "paymentStatus": null,
        "paymentId": null
    }))
    .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::Pending);

    let user: User = serde_json::from_value(json!({ "id": 3, "email": "asha@example.com", "emailVerified": null })).unwrap();
    assert!(!user.email_verified);
}

#[test]
fn user_display_name_fallbacks() {
    let mut user = User { id: 1, email: "a@b.in".to_owned(), ..User::default() };
    assert_eq!(user.display_name(), "a@b.in");
    user.first_name = Some("Asha".to_owned());
    user.last_name = Some("Rao".to_owned());
    assert_eq!(user.display_name(), "Asha Rao");
    user.name = Some("  ".to_owned());
    assert_eq!(user.display_name(), "Asha Rao");
    user.name = Some("Asha R.".to_owned());
    assert_eq!(user.display_name(), "Asha R.");
}

#[test]
fn profile_update_merges_present_fields() {
    let mut user = User {
        id: 1,
        email: "a@b.in".to_owned(),
        first_name: Some("Asha".to_owned()),
        phone: Some("9876543210".to_owned()),
        ..User::default()
    };
    let patch = ProfileUpdate { last_name: Some("Rao".to_owned()), bio: Some("Hi".to_owned()), ..Default::default() };
    patch.apply_to(&mut user);
    assert_eq!(user.name.as_deref(), Some("Asha Rao"));
    assert_eq!(user.phone.as_deref(), Some("9876543210"));
    assert_eq!(user.bio.as_deref(), Some("Hi"));
    assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "lastName": "Rao", "bio": "Hi" }));
}

// =============================================================
// Requests and responses
// =============================================================

#[test]
fn ride_search_query_pairs_include_optional_filters() {
    let search = RideSearch {
        from: " Koramangala ".to_owned(),
        to: "Whitefield".to_owned(),
        date: "2025-03-14".to_owned(),
        passengers: 2,
        time: None,
        max_price: Some(200.0),
    };
    assert_eq!(
        search.query_pairs(),
        vec![
            ("from", "Koramangala".to_owned()),
            ("to", "Whitefield".to_owned()),
            ("date", "2025-03-14".to_owned()),
            ("passengers", "2".to_owned()),
            ("maxPrice", "200".to_owned()),
        ]
    );
}

#[test]
fn ride_filter_defaults_to_first_page_of_ten() {
    let filter = RideFilter { min_seats: Some(2), ..RideFilter::default() };
    assert_eq!(
        filter.query_pairs(),
        vec![("minSeats", "2".to_owned()), ("page", "0".to_owned()), ("size", "10".to_owned())]
    );
}

#[test]
fn rating_request_sends_null_comment() {
    let req = RatingRequest { rating: 5, comment: None, ride_id: 7, ratee_id: 9 };
    assert_eq!(
        serde_json::to_value(&req).unwrap(),
        json!({ "rating": 5, "comment": null, "rideId": 7, "rateeId": 9 })
    );
}

#[test]
fn register_outcome_distinguishes_session_from_account() {
    let signed_in: RegisterOutcome = serde_json::from_value(json!({
        "user": { "id": 1, "email": "a@b.in" },
        "token": "jwt",
        "refreshToken": "refresh"
    }))
    .unwrap();
    assert!(matches!(signed_in, RegisterOutcome::SignedIn(ref r) if r.token == "jwt"));

    let created: RegisterOutcome = serde_json::from_value(json!({ "id": 2, "email": "c@d.in" })).unwrap();
    assert!(matches!(created, RegisterOutcome::Created(ref u) if u.id == 2));
}
