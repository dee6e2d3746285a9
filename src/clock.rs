use chrono::{Local, NaiveDate, NaiveTime, SecondsFormat, TimeZone};
use std::sync::{Arc, Mutex};

pub trait Clock: Send + Sync + 'static {
    fn today(&self) -> NaiveDate;

    fn timestamp(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn timestamp(&self) -> String {
        Local::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    date: Arc<Mutex<NaiveDate>>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Arc::new(Mutex::new(date)),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        *self.date.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = date;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.date.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn timestamp(&self) -> String {
        let midnight = self.today().and_time(NaiveTime::MIN);
        match Local.from_local_datetime(&midnight).earliest() {
            Some(moment) => moment.to_rfc3339_opts(SecondsFormat::Millis, true),
            None => format!("{}T00:00:00", self.today()),
        }
    }
}
