use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ulid::Ulid;

static DATE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));
static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid regex"));

/// Calendar day in canonical `YYYY-MM-DD` form.
///
/// Always built from local calendar components. A [`DateKey`] never goes
/// through a UTC conversion, so a task created late in the evening stays on
/// the day the user saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's date on the local calendar.
    pub fn today() -> Self {
        Self::from_local(&Local::now())
    }

    pub fn from_local<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self(instant.date_naive())
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }

    pub fn offset(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    pub fn succ(&self) -> Self {
        self.offset(1)
    }

    pub fn pred(&self) -> Self {
        self.offset(-1)
    }

    /// Signed number of days from `self` to `other`.
    pub fn days_until(&self, other: DateKey) -> i64 {
        (other.0 - self.0).num_days()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn at(&self, time: TimeOfDay) -> NaiveDateTime {
        self.0.and_time(time.as_naive())
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !DATE_KEY_RE.is_match(trimmed) {
            return Err(anyhow!("Invalid date '{}': expected YYYY-MM-DD", s));
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| anyhow!("Invalid calendar date '{}'", s))
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Wall-clock time in `HH:MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TimeOfDay {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = TIME_OF_DAY_RE
            .captures(trimmed)
            .ok_or_else(|| anyhow!("Invalid time '{}': expected HH:MM", s))?;
        let hour: u32 = caps[1].parse()?;
        let minute: u32 = caps[2].parse()?;
        Self::from_hm(hour, minute).ok_or_else(|| anyhow!("Invalid time '{}'", s))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Declarative reminder request attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_before: Option<u32>,
}

impl NotificationRequest {
    pub fn minutes_before(minutes: u32) -> Self {
        Self {
            enabled: true,
            minutes_before: Some(minutes),
        }
    }

    /// Lead time when the request can actually produce a reminder.
    pub fn lead_minutes(&self) -> Option<u32> {
        if !self.enabled {
            return None;
        }
        self.minutes_before.filter(|minutes| *minutes > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub date: DateKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeOfDay>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationRequest>,
}

impl Task {
    /// Time and lead minutes when this task asks for a reminder that can fire.
    pub fn reminder_spec(&self) -> Option<(TimeOfDay, u32)> {
        let lead = self.notification.as_ref()?.lead_minutes()?;
        self.time.map(|time| (time, lead))
    }

    pub fn has_reminder(&self) -> bool {
        self.notification.map(|n| n.enabled).unwrap_or(false)
    }
}

/// A task as entered by the user, before it receives an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub text: String,
    pub date: DateKey,
    pub time: Option<TimeOfDay>,
    pub is_private: bool,
    pub voice_note: Option<String>,
    pub notification: Option<NotificationRequest>,
}

impl NewTask {
    pub fn new<T: Into<String>>(text: T, date: DateKey) -> Self {
        Self {
            text: text.into(),
            date,
            time: None,
            is_private: false,
            voice_note: None,
            notification: None,
        }
    }

    pub fn into_task(self) -> Task {
        Task {
            id: Ulid::new().to_string(),
            text: self.text,
            date: self.date,
            time: self.time,
            is_private: self.is_private,
            voice_note: self.voice_note,
            notification: self.notification,
        }
    }
}

impl From<&Task> for NewTask {
    fn from(task: &Task) -> Self {
        Self {
            text: task.text.clone(),
            date: task.date,
            time: task.time,
            is_private: task.is_private,
            voice_note: task.voice_note.clone(),
            notification: task.notification,
        }
    }
}

/// Which end of the date window to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum Direction {
    Before,
    After,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Before => "before",
            Direction::After => "after",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddOutcome {
    pub id: String,
    pub date: DateKey,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}

/// Result of a move or reorder request against the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Mutation {
    Moved {
        id: String,
        from: DateKey,
        to: DateKey,
    },
    Reordered {
        id: String,
        from: DateKey,
        to: DateKey,
        index: usize,
    },
    Unchanged,
}

impl Mutation {
    pub fn changed(&self) -> bool {
        !matches!(self, Mutation::Unchanged)
    }

    pub fn changed_date(&self) -> bool {
        match self {
            Mutation::Moved { from, to, .. } | Mutation::Reordered { from, to, .. } => from != to,
            Mutation::Unchanged => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn sample_task() -> Task {
        Task {
            id: "1".into(),
            text: "Standup".into(),
            date: "2024-03-04".parse().unwrap(),
            time: Some("09:00".parse().unwrap()),
            is_private: false,
            voice_note: None,
            notification: None,
        }
    }

    #[test]
    fn task_serializes_to_camel_case_shape() {
        let mut task = sample_task();
        task.notification = Some(NotificationRequest::minutes_before(15));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "1",
                "text": "Standup",
                "date": "2024-03-04",
                "time": "09:00",
                "isPrivate": false,
                "notification": {"enabled": true, "minutesBefore": 15}
            })
        );
    }

    #[test]
    fn task_deserializes_with_optional_fields_missing() {
        let raw = r#"{"id":"7","text":"Call","date":"2024-12-31","isPrivate":true}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.time, None);
        assert!(task.is_private);
        assert_eq!(task.date, DateKey::from_ymd(2024, 12, 31).unwrap());
    }

    #[rstest]
    #[case("2024-3-4")]
    #[case("2024-02-30")]
    #[case("04-03-2024")]
    #[case("2024-03-04T10:00:00Z")]
    fn date_key_rejects_non_canonical_input(#[case] raw: &str) {
        assert!(raw.parse::<DateKey>().is_err());
    }

    #[rstest]
    #[case("9:00")]
    #[case("24:00")]
    #[case("12:60")]
    #[case("noon")]
    fn time_of_day_rejects_bad_input(#[case] raw: &str) {
        assert!(raw.parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn date_key_uses_local_calendar_components() {
        let late_evening = chrono::FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 4, 23, 30, 0)
            .unwrap();
        assert_eq!(DateKey::from_local(&late_evening).to_string(), "2024-03-04");
    }

    #[test]
    fn date_key_arithmetic_crosses_month_boundaries() {
        let end_of_feb = DateKey::from_ymd(2024, 2, 28).unwrap();
        assert_eq!(end_of_feb.succ().to_string(), "2024-02-29");
        assert_eq!(end_of_feb.offset(2).to_string(), "2024-03-01");
        assert_eq!(end_of_feb.days_until(end_of_feb.offset(-10)), -10);
    }

    #[test]
    fn reminder_spec_requires_time_and_positive_lead() {
        let mut task = sample_task();
        assert_eq!(task.reminder_spec(), None);

        task.notification = Some(NotificationRequest {
            enabled: true,
            minutes_before: Some(0),
        });
        assert_eq!(task.reminder_spec(), None);

        task.notification = Some(NotificationRequest::minutes_before(10));
        assert_eq!(
            task.reminder_spec(),
            Some((TimeOfDay::from_hm(9, 0).unwrap(), 10))
        );

        task.time = None;
        assert_eq!(task.reminder_spec(), None);
    }

    #[test]
    fn mutation_reports_date_changes() {
        let from = DateKey::from_ymd(2024, 3, 4).unwrap();
        let moved = Mutation::Moved {
            id: "1".into(),
            from,
            to: from.succ(),
        };
        let same_day = Mutation::Reordered {
            id: "1".into(),
            from,
            to: from,
            index: 0,
        };
        assert!(moved.changed_date());
        assert!(same_day.changed());
        assert!(!same_day.changed_date());
        assert!(!Mutation::Unchanged.changed());
    }
}
