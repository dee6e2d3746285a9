use crate::models::{Day, WeekBackup, WeekCounts, WeekId, WeekRecord};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressTier {
    Building,
    Halfway,
    Strong,
    Complete,
}

impl ProgressTier {
    pub fn for_percent(percent: f64) -> Self {
        if percent >= 100.0 {
            Self::Complete
        } else if percent >= 75.0 {
            Self::Strong
        } else if percent >= 50.0 {
            Self::Halfway
        } else {
            Self::Building
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Halfway => "halfway",
            Self::Strong => "strong",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DayPoint {
    pub day: Day,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    pub week_id: WeekId,
    pub start_date: String,
    pub end_date: String,
    pub days: Vec<DayPoint>,
    pub total: u64,
    pub goal: u64,
    pub progress_percent: f64,
    pub tier: ProgressTier,
    pub best_day: Option<Day>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub week_id: WeekId,
    pub total: u64,
    pub daily_average: f64,
    pub counts: Value,
}

pub fn build_summary(record: &WeekRecord, goal: u64) -> WeekSummary {
    let total = record.counts.total();
    let progress_percent = progress_percent(total, goal);
    WeekSummary {
        week_id: record.week_id,
        start_date: record.week_id.monday().to_string(),
        end_date: record.week_id.sunday().to_string(),
        days: record
            .counts
            .iter()
            .map(|(day, count)| DayPoint { day, count })
            .collect(),
        total,
        goal,
        progress_percent,
        tier: ProgressTier::for_percent(progress_percent),
        best_day: best_day(&record.counts),
    }
}

pub fn progress_percent(total: u64, goal: u64) -> f64 {
    if goal == 0 {
        return 100.0;
    }
    (total as f64 * 100.0 / goal as f64).min(100.0)
}

fn best_day(counts: &WeekCounts) -> Option<Day> {
    counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .fold(None, |best: Option<(Day, u64)>, (day, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((day, count)),
        })
        .map(|(day, _)| day)
}

pub fn build_history(backups: &[WeekBackup]) -> Vec<HistoryPoint> {
    backups
        .iter()
        .map(|backup| {
            let total = Day::ALL
                .iter()
                .filter_map(|day| backup.counts.get(day.as_str()).and_then(Value::as_u64))
                .fold(0u64, u64::saturating_add);
            HistoryPoint {
                week_id: backup.week_id,
                total,
                daily_average: total as f64 / 7.0,
                counts: backup.counts.clone(),
            }
        })
        .collect()
}
