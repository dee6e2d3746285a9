use crate::clock::Clock;
use crate::counter::{Rollover, WeekStore};
use crate::errors::TrackerError;
use crate::models::{DayUpdate, RawWeekData, WeekBackup, WeekRecord};
use crate::storage::KeyValueStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

const QUEUE_DEPTH: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, TrackerError>>;

enum Command {
    Install(Reply<WeekRecord>),
    Load(Reply<WeekRecord>),
    CheckRollover(Reply<Rollover>),
    SetDay {
        day: String,
        delta: i64,
        reply: Reply<DayUpdate>,
    },
    SetToday {
        count: u64,
        reply: Reply<DayUpdate>,
    },
    ResetWeek(Reply<WeekRecord>),
    ReplaceAll {
        data: RawWeekData,
        reply: Reply<WeekRecord>,
    },
    Backups(Reply<Vec<WeekBackup>>),
}

#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<Command>,
}

pub fn spawn<S, C>(store: WeekStore<S, C>) -> (StoreHandle, JoinHandle<()>)
where
    S: KeyValueStore,
    C: Clock,
{
    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    let task = tokio::spawn(run(store, rx));
    (StoreHandle { tx }, task)
}

async fn run<S: KeyValueStore, C: Clock>(store: WeekStore<S, C>, mut rx: mpsc::Receiver<Command>) {
    while let Some(command) = rx.recv().await {
        // A dropped receiver means the caller stopped waiting; the write
        // has still happened.
        match command {
            Command::Install(reply) => {
                let _ = reply.send(store.install().await);
            }
            Command::Load(reply) => {
                let _ = reply.send(store.load().await);
            }
            Command::CheckRollover(reply) => {
                let _ = reply.send(store.check_rollover().await);
            }
            Command::SetDay { day, delta, reply } => {
                let _ = reply.send(store.set_day(&day, delta).await);
            }
            Command::SetToday { count, reply } => {
                let today = store.today();
                let _ = reply.send(store.set_day_count(today, count).await);
            }
            Command::ResetWeek(reply) => {
                let _ = reply.send(store.reset_week().await);
            }
            Command::ReplaceAll { data, reply } => {
                let _ = reply.send(store.replace_all(&data).await);
            }
            Command::Backups(reply) => {
                let _ = reply.send(store.backups().await);
            }
        }
    }
    debug!("store queue closed");
}

impl StoreHandle {
    pub async fn install(&self) -> Result<WeekRecord, TrackerError> {
        self.request(Command::Install).await
    }

    pub async fn load(&self) -> Result<WeekRecord, TrackerError> {
        self.request(Command::Load).await
    }

    pub async fn check_rollover(&self) -> Result<Rollover, TrackerError> {
        self.request(Command::CheckRollover).await
    }

    pub async fn set_day(&self, day: &str, delta: i64) -> Result<DayUpdate, TrackerError> {
        let day = day.to_string();
        self.request(|reply| Command::SetDay { day, delta, reply }).await
    }

    pub async fn set_today(&self, count: u64) -> Result<DayUpdate, TrackerError> {
        self.request(|reply| Command::SetToday { count, reply }).await
    }

    pub async fn reset_week(&self) -> Result<WeekRecord, TrackerError> {
        self.request(Command::ResetWeek).await
    }

    pub async fn replace_all(&self, data: RawWeekData) -> Result<WeekRecord, TrackerError> {
        self.request(|reply| Command::ReplaceAll { data, reply }).await
    }

    pub async fn backups(&self) -> Result<Vec<WeekBackup>, TrackerError> {
        self.request(Command::Backups).await
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, TrackerError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| TrackerError::StoreClosed)?;
        response.await.map_err(|_| TrackerError::StoreClosed)?
    }
}
