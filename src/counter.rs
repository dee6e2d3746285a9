use crate::clock::Clock;
use crate::errors::TrackerError;
use crate::models::{
    Day, DayUpdate, RawWeekData, WeekBackup, WeekCounts, WeekId, WeekRecord, BACKUP_KEY_PREFIX,
    CURRENT_WEEK_KEY, INSTALL_DATE_KEY, WEEK_DATA_KEY,
};
use crate::storage::{Entries, KeyValueStore};
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollover {
    Unchanged,
    Repaired,
    Started {
        previous: Option<WeekId>,
        archived: Option<WeekId>,
    },
}

pub struct WeekStore<S, C> {
    storage: S,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> WeekStore<S, C> {
    pub fn new(storage: S, clock: C) -> Self {
        Self { storage, clock }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn current_week_id(&self) -> WeekId {
        WeekId::containing(self.clock.today())
    }

    pub fn today(&self) -> Day {
        Day::of(self.clock.today())
    }

    pub async fn install(&self) -> Result<WeekRecord, TrackerError> {
        let stored = self
            .storage
            .get(&[CURRENT_WEEK_KEY, INSTALL_DATE_KEY])
            .await?;
        if stored.contains_key(CURRENT_WEEK_KEY) {
            debug!("install event on existing state, checking rollover");
            return self.load().await;
        }

        let record = WeekRecord::empty(self.current_week_id());
        let mut entries = record_entries(&record)?;
        if !stored.contains_key(INSTALL_DATE_KEY) {
            entries.insert(INSTALL_DATE_KEY.into(), Value::from(self.clock.timestamp()));
        }
        self.storage.set(entries).await?;
        info!(week = %record.week_id, "initialised weekly counter");
        Ok(record)
    }

    pub async fn load(&self) -> Result<WeekRecord, TrackerError> {
        self.reconcile().await.map(|(record, _)| record)
    }

    pub async fn check_rollover(&self) -> Result<Rollover, TrackerError> {
        self.reconcile().await.map(|(_, outcome)| outcome)
    }

    pub async fn set_day(&self, day: &str, delta: i64) -> Result<DayUpdate, TrackerError> {
        let day: Day = day.parse()?;
        let mut record = self.load().await?;
        let count = record.counts.apply_delta(day, delta);
        self.storage.set(record_entries(&record)?).await?;
        debug!(%day, delta, count, "updated day");
        Ok(DayUpdate {
            day,
            count,
            total: record.counts.total(),
        })
    }

    pub async fn set_day_count(&self, day: Day, count: u64) -> Result<DayUpdate, TrackerError> {
        let mut record = self.load().await?;
        record.counts.set(day, count);
        self.storage.set(record_entries(&record)?).await?;
        debug!(%day, count, "set day count");
        Ok(DayUpdate {
            day,
            count,
            total: record.counts.total(),
        })
    }

    pub async fn reset_week(&self) -> Result<WeekRecord, TrackerError> {
        let record = WeekRecord::empty(self.current_week_id());
        self.storage.set(record_entries(&record)?).await?;
        info!(week = %record.week_id, "week reset");
        Ok(record)
    }

    pub async fn replace_all(&self, raw: &RawWeekData) -> Result<WeekRecord, TrackerError> {
        let record = raw.validate()?;
        self.storage.set(record_entries(&record)?).await?;
        debug!(week = %record.week_id, total = record.counts.total(), "replaced week data");
        Ok(record)
    }

    pub async fn backups(&self) -> Result<Vec<WeekBackup>, TrackerError> {
        let keys = self.storage.keys().await?;
        let backup_keys: Vec<&str> = keys
            .iter()
            .map(String::as_str)
            .filter(|key| key.starts_with(BACKUP_KEY_PREFIX))
            .collect();
        let entries = self.storage.get(&backup_keys).await?;

        let mut backups: Vec<WeekBackup> = entries
            .into_iter()
            .filter_map(|(key, counts)| {
                let week_id = key[BACKUP_KEY_PREFIX.len()..].parse().ok()?;
                Some(WeekBackup { week_id, counts })
            })
            .collect();
        backups.sort_by(|a, b| b.week_id.cmp(&a.week_id));
        Ok(backups)
    }

    async fn reconcile(&self) -> Result<(WeekRecord, Rollover), TrackerError> {
        let current = self.current_week_id();
        let stored = self.storage.get(&[WEEK_DATA_KEY, CURRENT_WEEK_KEY]).await?;
        let stored_week = stored.get(CURRENT_WEEK_KEY).and_then(Value::as_str);
        let stored_counts = stored.get(WEEK_DATA_KEY);

        if stored_week == Some(current.to_string().as_str()) {
            if let Some(counts) = stored_counts.and_then(parse_counts) {
                return Ok((WeekRecord { counts, week_id: current }, Rollover::Unchanged));
            }
            warn!(week = %current, "stored counts missing or malformed, resetting to zero");
            let record = WeekRecord::empty(current);
            let mut entries = Entries::new();
            entries.insert(WEEK_DATA_KEY.into(), counts_value(&record.counts)?);
            self.storage.set(entries).await?;
            return Ok((record, Rollover::Repaired));
        }

        let previous = stored_week.and_then(|week| week.parse::<WeekId>().ok());
        let record = WeekRecord::empty(current);
        let mut entries = record_entries(&record)?;
        let mut archived = None;
        let stale_counts = stored_counts.filter(|counts| has_content(counts));
        if let (Some(previous), Some(counts)) = (previous, stale_counts) {
            let key = previous.backup_key();
            if self.storage.get(&[key.as_str()]).await?.contains_key(&key) {
                warn!(week = %previous, "backup already exists, keeping it");
            } else {
                info!(week = %previous, "backing up previous week");
                entries.insert(key, counts.clone());
                archived = Some(previous);
            }
        }
        self.storage.set(entries).await?;
        info!(
            week = %current,
            previous = stored_week.unwrap_or("none"),
            "started new week"
        );
        Ok((record, Rollover::Started { previous, archived }))
    }
}

fn parse_counts(value: &Value) -> Option<WeekCounts> {
    serde_json::from_value(value.clone()).ok()
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) if map.is_empty() => false,
        _ => !parse_counts(value).is_some_and(|counts| counts.is_zero()),
    }
}

fn record_entries(record: &WeekRecord) -> Result<Entries, TrackerError> {
    let mut entries = Entries::new();
    entries.insert(WEEK_DATA_KEY.into(), counts_value(&record.counts)?);
    entries.insert(CURRENT_WEEK_KEY.into(), Value::from(record.week_id.to_string()));
    Ok(entries)
}

fn counts_value(counts: &WeekCounts) -> Result<Value, TrackerError> {
    serde_json::to_value(counts).map_err(|err| TrackerError::Persistence(err.into()))
}
