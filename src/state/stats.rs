//! Dashboard summary counters.

#[cfg(test)]
#[path = "stats_test.rs"]
mod stats_test;

use std::fmt;

use serde::Serialize;

use crate::net::types::User;

use super::dashboard::DashboardState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub rides_offered: usize,
    pub bookings_made: usize,
    /// Average rating received; `0.0` when the user has none yet.
    pub rating: f64,
    pub total_rides: u32,
}

impl DashboardStats {
    #[must_use]
    pub fn compute(user: Option<&User>, dashboard: &DashboardState) -> Self {
        Self {
            rides_offered: dashboard.rides.len(),
            bookings_made: dashboard.bookings.len(),
            rating: user.and_then(|u| u.rating).unwrap_or(0.0),
            total_rides: user.and_then(|u| u.total_rides).unwrap_or(0),
        }
    }
}

impl fmt::Display for DashboardStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rides offered: {}, bookings made: {}, rating: {:.1}, total rides: {}",
            self.rides_offered, self.bookings_made, self.rating, self.total_rides
        )
    }
}
