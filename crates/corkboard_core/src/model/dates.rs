//! Calendar-date (de)serialization helpers.
//!
//! # Responsibility
//! - Serialize calendar dates as `YYYY-MM-DD`.
//! - Accept legacy RFC 3339 datetimes on deserialization, truncating to the
//!   calendar date.

use chrono::{DateTime, NaiveDate};

pub const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date from `YYYY-MM-DD` or a full RFC 3339 datetime.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, CALENDAR_DATE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|datetime| datetime.date_naive())
        })
}

/// Serde adapter for required calendar-date fields.
pub mod calendar_date {
    use super::{parse_calendar_date, CALENDAR_DATE_FORMAT};
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(CALENDAR_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_calendar_date(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid calendar date `{raw}`")))
    }
}

/// Serde adapter for optional calendar-date fields.
pub mod calendar_date_opt {
    use super::{parse_calendar_date, CALENDAR_DATE_FORMAT};
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => {
                serializer.serialize_some(&date.format(CALENDAR_DATE_FORMAT).to_string())
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(raw) => parse_calendar_date(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid calendar date `{raw}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_calendar_date;
    use chrono::NaiveDate;

    #[test]
    fn parses_plain_calendar_dates() {
        assert_eq!(
            parse_calendar_date("2024-01-05"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn parses_legacy_rfc3339_datetimes() {
        assert_eq!(
            parse_calendar_date("2024-01-05T09:30:00.000Z"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_calendar_date("soon"), None);
    }
}
