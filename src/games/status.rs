//! Lifecycle status derivation.
//!
//! A game's status follows from two instants: when it starts and when it
//! ends. Everything here is pure; `now` is always passed in so the rules
//! can be tested without waiting for the clock.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::errors::ServiceError;

/// applies when a game has no duration, or a non-positive one
pub const DEFAULT_DURATION_MINUTES: i64 = 120;

/// Where a game sits in its lifecycle.
///
/// Only moves forward: UPCOMING → ONGOING → COMPLETED. CANCELED can be
/// entered from UPCOMING or ONGOING and, like COMPLETED, is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    UPCOMING,
    ONGOING,
    COMPLETED,
    CANCELED,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        self == Status::COMPLETED || self == Status::CANCELED
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::str::FromStr for Status {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "UPCOMING" => Ok(Status::UPCOMING),
            "ONGOING" => Ok(Status::ONGOING),
            "COMPLETED" => Ok(Status::COMPLETED),
            "CANCELED" => Ok(Status::CANCELED),
            _ => Err(ServiceError::BadRequest(format!(
                "unknown game status '{}'",
                value
            ))),
        }
    }
}

/// A reconciliation result: the game moved from one status to another.
#[derive(Debug, Serialize)]
pub struct StatusChange {
    pub game_id: i64,
    pub title: String,
    pub from: Status,
    pub to: Status,
}

/// The stored date and time-of-day combined into one absolute instant,
/// interpreted in the system reference timezone (UTC).
pub fn starts_at(date: NaiveDate, start_time: NaiveTime) -> DateTime<Utc> {
    DateTime::from_utc(date.and_time(start_time), Utc)
}

pub fn ends_at(starts_at: DateTime<Utc>, duration_minutes: Option<i32>) -> DateTime<Utc> {
    let minutes = match duration_minutes {
        Some(minutes) if minutes > 0 => i64::from(minutes),
        _ => DEFAULT_DURATION_MINUTES,
    };

    starts_at + Duration::minutes(minutes)
}

/// The status a game should have at `now`, ignoring cancellation.
///
/// The window is half-open: a game exactly at its start instant is
/// ONGOING, a game exactly at its end instant is COMPLETED.
pub fn derive(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>, now: DateTime<Utc>) -> Status {
    if now >= ends_at {
        Status::COMPLETED
    } else if now >= starts_at {
        Status::ONGOING
    } else {
        Status::UPCOMING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(value: &str) -> DateTime<Utc> {
        format!("{}:00Z", value).parse().unwrap()
    }

    #[test]
    fn boundaries_are_half_open() {
        let start = instant("2024-01-01T10:00");
        let end = ends_at(start, Some(60));

        assert_eq!(derive(start, end, instant("2024-01-01T09:59")), Status::UPCOMING);
        assert_eq!(derive(start, end, instant("2024-01-01T10:00")), Status::ONGOING);
        assert_eq!(derive(start, end, instant("2024-01-01T10:59")), Status::ONGOING);
        assert_eq!(derive(start, end, instant("2024-01-01T11:00")), Status::COMPLETED);
    }

    #[test]
    fn missing_duration_defaults_to_two_hours() {
        let start = instant("2024-01-01T10:00");

        for duration in &[None, Some(0), Some(-30)] {
            let end = ends_at(start, *duration);
            assert_eq!(end, instant("2024-01-01T12:00"));
            assert_eq!(derive(start, end, instant("2024-01-01T11:30")), Status::ONGOING);
            assert_eq!(derive(start, end, instant("2024-01-01T12:01")), Status::COMPLETED);
        }
    }

    #[test]
    fn date_and_time_combine_in_utc() {
        let date = "2024-01-01".parse().unwrap();
        let time = "10:00:00".parse().unwrap();

        assert_eq!(starts_at(date, time), instant("2024-01-01T10:00"));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in &[
            Status::UPCOMING,
            Status::ONGOING,
            Status::COMPLETED,
            Status::CANCELED,
        ] {
            assert_eq!(status.to_string().parse::<Status>().unwrap(), *status);
        }

        assert!("POSTPONED".parse::<Status>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(Status::COMPLETED.is_terminal());
        assert!(Status::CANCELED.is_terminal());
        assert!(!Status::UPCOMING.is_terminal());
        assert!(!Status::ONGOING.is_terminal());
    }
}
