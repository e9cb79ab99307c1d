use super::*;
use crate::net::types::{BookingStatus, RideStatus};
use crate::state::mock_api::{booking, ride, user};

#[test]
fn signed_out_empty_dashboard_is_zero() {
    let stats = DashboardStats::compute(None, &DashboardState::default());
    assert_eq!(stats, DashboardStats::default());
    assert_eq!(stats.to_string(), "rides offered: 0, bookings made: 0, rating: 0.0, total rides: 0");
}

#[test]
fn counts_collections_and_reads_user_totals() {
    let dashboard = DashboardState {
        rides: vec![ride(1, RideStatus::Active), ride(2, RideStatus::Completed)],
        bookings: vec![booking(5, 9, BookingStatus::Pending)],
        ..DashboardState::default()
    };
    let mut u = user(4);
    u.rating = Some(4.5);
    u.total_rides = Some(12);

    let stats = DashboardStats::compute(Some(&u), &dashboard);
    assert_eq!(stats.rides_offered, 2);
    assert_eq!(stats.bookings_made, 1);
    assert_eq!(stats.rating, 4.5);
    assert_eq!(stats.total_rides, 12);
}

#[test]
fn missing_user_totals_default_to_zero() {
    let stats = DashboardStats::compute(Some(&user(4)), &DashboardState::default());
    assert_eq!(stats.rating, 0.0);
    assert_eq!(stats.total_rides, 0);
}
