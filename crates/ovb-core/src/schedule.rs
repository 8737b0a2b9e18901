//! Daily message scheduler.
//!
//! Each schedule is a tokio task that sleeps until the next local occurrence of
//! its "HH:MM" time, sends the fixed message, and goes back to sleep. A failed
//! send is logged and the job stays armed for the next day.

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Local, LocalResult};
use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    domain::ChatId,
    messaging::{port::MessagingPort, types::DedupToken},
    Error, Result,
};

/// A wall-clock time of day, parsed from "HH:MM".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyTime {
    hour: u32,
    minute: u32,
}

impl DailyTime {
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((h, m)) = raw.trim().split_once(':') else {
            return Err(Error::Config(format!("invalid time (expected HH:MM): {raw}")));
        };

        let hour: u32 = h
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid hour in time: {raw}")))?;
        let minute: u32 = m
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("invalid minute in time: {raw}")))?;

        if hour > 23 || minute > 59 {
            return Err(Error::Config(format!("time out of range: {raw}")));
        }

        Ok(Self { hour, minute })
    }

    /// Next occurrence strictly after `now`, in local time.
    ///
    /// Skips forward over DST gaps where the time does not exist.
    pub fn next_after(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        let mut date = now.date_naive();
        for _ in 0..3 {
            if let Some(naive) = date.and_hms_opt(self.hour, self.minute, 0) {
                match naive.and_local_timezone(Local) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) if dt > now => {
                        return Some(dt)
                    }
                    _ => {}
                }
            }
            date = date.succ_opt()?;
        }
        None
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Owns the scheduled jobs; dropping or stopping cancels them.
pub struct DailyScheduler {
    messenger: Arc<dyn MessagingPort>,
    jobs: tokio::sync::Mutex<Vec<Job>>,
}

struct Job {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl DailyScheduler {
    pub fn new(messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            messenger,
            jobs: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Arm a daily send of `message` to `chat` at `at`.
    pub async fn schedule(&self, name: &str, at: DailyTime, message: &str, chat: ChatId) {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(job_loop(
            self.messenger.clone(),
            name.to_string(),
            at,
            message.to_string(),
            chat,
            cancel.clone(),
        ));

        info!("scheduled job {name}: daily at {at} for chat {chat}");
        self.jobs.lock().await.push(Job { cancel, handle });
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn stop(&self) {
        let mut jobs = self.jobs.lock().await;
        for job in jobs.drain(..) {
            job.cancel.cancel();
            job.handle.abort();
        }
    }
}

async fn job_loop(
    messenger: Arc<dyn MessagingPort>,
    name: String,
    at: DailyTime,
    message: String,
    chat: ChatId,
    cancel: CancellationToken,
) {
    loop {
        let now = Local::now();
        let Some(next) = at.next_after(now) else {
            error!("job {name} has no next occurrence (stopping)");
            break;
        };
        let dur = match (next - now).to_std() {
            Ok(d) => d,
            Err(_) => Duration::from_secs(0),
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(dur) => {
                match messenger.send_to_chat(chat, &message, DedupToken::now()).await {
                    Ok(()) => info!("message \"{message}\" sent to chat {chat} at {at}"),
                    Err(e) => error!("error sending scheduled message for job {name}: {e}"),
                }
            }
        }
    }
}
