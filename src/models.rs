use crate::errors::TrackerError;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Self {
        Day::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Day::ALL
            .into_iter()
            .find(|day| day.as_str() == value)
            .ok_or_else(|| TrackerError::InvalidDay(value.to_string()))
    }
}

/// Per-day solved counts for one week. Always carries all seven days.
///
/// Serialized as a `{ "monday": n, ..., "sunday": n }` object. Deserializing
/// goes through [`WeekCounts::from_raw`], so a missing or unknown key, or a
/// value that is not a non-negative integer, is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "BTreeMap<String, Value>")]
pub struct WeekCounts {
    counts: [u64; 7],
}

impl WeekCounts {
    pub fn get(&self, day: Day) -> u64 {
        self.counts[day.index()]
    }

    pub fn set(&mut self, day: Day, count: u64) {
        self.counts[day.index()] = count;
    }

    pub fn apply_delta(&mut self, day: Day, delta: i64) -> u64 {
        let next = (i128::from(self.get(day)) + i128::from(delta)).max(0);
        let next = u64::try_from(next).unwrap_or(u64::MAX);
        self.set(day, next);
        next
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |sum, count| sum.saturating_add(*count))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Day, u64)> + '_ {
        Day::ALL.into_iter().map(|day| (day, self.get(day)))
    }

    pub fn is_zero(&self) -> bool {
        self.counts.iter().all(|count| *count == 0)
    }

    pub fn from_raw(raw: &BTreeMap<String, Value>) -> Result<Self, TrackerError> {
        let mut counts = WeekCounts::default();
        for key in raw.keys() {
            if key.parse::<Day>().is_err() {
                return Err(TrackerError::validation(format!("unexpected key '{key}'")));
            }
        }
        for day in Day::ALL {
            let value = raw
                .get(day.as_str())
                .ok_or_else(|| TrackerError::validation(format!("missing key '{day}'")))?;
            let count = value.as_u64().ok_or_else(|| {
                TrackerError::validation(format!("'{day}' must be a non-negative integer"))
            })?;
            counts.set(day, count);
        }
        Ok(counts)
    }
}

impl TryFrom<BTreeMap<String, Value>> for WeekCounts {
    type Error = TrackerError;

    fn try_from(raw: BTreeMap<String, Value>) -> Result<Self, Self::Error> {
        Self::from_raw(&raw)
    }
}

impl Serialize for WeekCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        for (day, count) in self.iter() {
            map.serialize_entry(day.as_str(), &count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekId(NaiveDate);

impl WeekId {
    /// Monday of the week containing `date`. Sunday belongs to the week that
    /// started six days earlier.
    pub fn containing(date: NaiveDate) -> Self {
        let since_monday = date.weekday().num_days_from_monday();
        WeekId(date - Duration::days(i64::from(since_monday)))
    }

    pub fn monday(&self) -> NaiveDate {
        self.0
    }

    pub fn sunday(&self) -> NaiveDate {
        self.0 + Duration::days(6)
    }

    pub fn backup_key(&self) -> String {
        format!("{BACKUP_KEY_PREFIX}{self}")
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for WeekId {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(WeekId)
            .map_err(|_| TrackerError::validation(format!("'{value}' is not a YYYY-MM-DD date")))
    }
}

impl TryFrom<String> for WeekId {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekId> for String {
    fn from(id: WeekId) -> Self {
        id.to_string()
    }
}

pub const WEEK_DATA_KEY: &str = "weekData";
pub const CURRENT_WEEK_KEY: &str = "currentWeek";
pub const INSTALL_DATE_KEY: &str = "installDate";
pub const BACKUP_KEY_PREFIX: &str = "weekData_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRecord {
    pub counts: WeekCounts,
    pub week_id: WeekId,
}

impl WeekRecord {
    pub fn empty(week_id: WeekId) -> Self {
        Self {
            counts: WeekCounts::default(),
            week_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekBackup {
    pub week_id: WeekId,
    /// Snapshot exactly as it was stored at rollover time.
    pub counts: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWeekData {
    pub counts: BTreeMap<String, Value>,
    pub week_id: String,
}

impl RawWeekData {
    pub fn validate(&self) -> Result<WeekRecord, TrackerError> {
        Ok(WeekRecord {
            counts: WeekCounts::from_raw(&self.counts)?,
            week_id: self.week_id.parse()?,
        })
    }
}

impl From<WeekRecord> for RawWeekData {
    fn from(record: WeekRecord) -> Self {
        Self {
            counts: record
                .counts
                .iter()
                .map(|(day, count)| (day.as_str().to_string(), Value::from(count)))
                .collect(),
            week_id: record.week_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayUpdate {
    pub day: Day,
    pub count: u64,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct DeltaRequest {
    pub delta: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDataResponse {
    pub counts: WeekCounts,
    pub week_id: WeekId,
    pub total: u64,
}

impl From<WeekRecord> for WeekDataResponse {
    fn from(record: WeekRecord) -> Self {
        Self {
            total: record.counts.total(),
            counts: record.counts,
            week_id: record.week_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub success: bool,
    pub counts: WeekCounts,
    pub week_id: WeekId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_id_is_monday_for_every_day_of_the_week() {
        // 2024-01-08 is a Monday.
        for offset in 0..7 {
            let day = date(2024, 1, 8) + Duration::days(offset);
            assert_eq!(WeekId::containing(day).to_string(), "2024-01-08", "{day}");
        }
    }

    #[test]
    fn sunday_stays_in_the_week_that_started_before_it() {
        let sunday = date(2024, 1, 14);
        assert_eq!(WeekId::containing(sunday).to_string(), "2024-01-08");
        assert_eq!(WeekId::containing(sunday + Duration::days(1)).to_string(), "2024-01-15");
    }

    #[test]
    fn week_id_crosses_year_boundary() {
        assert_eq!(WeekId::containing(date(2025, 1, 1)).to_string(), "2024-12-30");
    }

    #[test]
    fn week_id_round_trips_through_json_string() {
        let id: WeekId = serde_json::from_value(json!("2024-01-01")).unwrap();
        assert_eq!(serde_json::to_value(id).unwrap(), json!("2024-01-01"));
        assert_eq!(id.backup_key(), "weekData_2024-01-01");
        assert!(serde_json::from_value::<WeekId>(json!("01/01/2024")).is_err());
    }

    #[test]
    fn day_parses_lowercase_names_only() {
        assert_eq!("wednesday".parse::<Day>().unwrap(), Day::Wednesday);
        assert!(matches!("Funday".parse::<Day>(), Err(TrackerError::InvalidDay(_))));
        assert_eq!(Day::of(date(2024, 1, 14)), Day::Sunday);
    }

    #[test]
    fn counts_serialize_in_week_order() {
        let mut counts = WeekCounts::default();
        counts.set(Day::Friday, 2);
        let text = serde_json::to_string(&counts).unwrap();
        assert_eq!(
            text,
            r#"{"monday":0,"tuesday":0,"wednesday":0,"thursday":0,"friday":2,"saturday":0,"sunday":0}"#
        );
    }

    #[test]
    fn counts_reject_missing_extra_and_negative_entries() {
        let missing = json!({"monday": 1});
        assert!(serde_json::from_value::<WeekCounts>(missing).is_err());

        let mut full: serde_json::Map<String, Value> =
            Day::ALL.iter().map(|d| (d.as_str().to_string(), json!(0))).collect();
        full.insert("holiday".into(), json!(0));
        assert!(serde_json::from_value::<WeekCounts>(Value::Object(full.clone())).is_err());

        full.remove("holiday");
        full.insert("monday".into(), json!(-1));
        assert!(serde_json::from_value::<WeekCounts>(Value::Object(full)).is_err());
    }

    #[test]
    fn delta_clamps_at_zero() {
        let mut counts = WeekCounts::default();
        counts.set(Day::Monday, 3);
        assert_eq!(counts.apply_delta(Day::Monday, -100), 0);
        assert_eq!(counts.apply_delta(Day::Monday, 2), 2);
        assert_eq!(counts.total(), 2);
    }
}
