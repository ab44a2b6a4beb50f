//! Daily Scheduler
//!
//! Fires one health check per day at a fixed UTC time, always in `auto`
//! mode, for a repository and scenario fixed at registration.
//!
//! Each run is spawned on its own task so a slow run never delays the next
//! trigger. There is no guard against overlapping runs for the same
//! repository; the last save wins.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use sdk::errors::EngineError;
use sdk::types::{Mode, RepoId, Scenario};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::agent::{HealthAgent, HealthCheckRequest};
use crate::config::Config;

/// Next trigger strictly after `now`
pub fn next_fire_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Next trigger after both `now` and the previous trigger
///
/// A wall clock that stepped backwards past `last_fired` must not
/// produce a second trigger for the same day.
pub fn next_trigger(
    now: DateTime<Utc>,
    last_fired: Option<DateTime<Utc>>,
    at: NaiveTime,
) -> DateTime<Utc> {
    let base = last_fired.map_or(now, |last| last.max(now));
    next_fire_after(base, at)
}

/// Daily trigger for one repository
pub struct Scheduler {
    agent: Arc<HealthAgent>,
    repo: RepoId,
    scenario: Scenario,
    at: NaiveTime,
}

impl Scheduler {
    /// # Errors
    ///
    /// Returns `EngineError::Config` if `hour`/`minute` are not a valid time of day.
    pub fn new(
        agent: Arc<HealthAgent>,
        repo: RepoId,
        scenario: Scenario,
        hour: u32,
        minute: u32,
    ) -> Result<Self, EngineError> {
        let at = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
            EngineError::Config(format!("Invalid schedule time {:02}:{:02} UTC", hour, minute))
        })?;

        Ok(Self {
            agent,
            repo,
            scenario,
            at,
        })
    }

    /// Build the scheduler described by `[schedule]`, if enabled
    pub fn from_config(
        config: &Config,
        agent: Arc<HealthAgent>,
    ) -> Result<Option<Self>, EngineError> {
        let Some(repo) = config.scheduled_repo()? else {
            return Ok(None);
        };

        Self::new(
            agent,
            repo,
            config.schedule.scenario,
            config.schedule.hour_utc,
            config.schedule.minute_utc,
        )
        .map(Some)
    }

    /// Request issued on every trigger
    pub fn request(&self) -> HealthCheckRequest {
        HealthCheckRequest::new(self.repo.to_string())
            .mode(Mode::Auto)
            .scenario(self.scenario)
    }

    /// Run the trigger loop in the background
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        info!(
            repo = %self.repo,
            scenario = %self.scenario,
            at = %self.at,
            "Daily schedule registered"
        );

        let mut last_fired = None;
        loop {
            let now = Utc::now();
            let next = next_trigger(now, last_fired, self.at);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(repo = %self.repo, next = %next, "Next scheduled run");

            tokio::time::sleep(wait).await;
            last_fired = Some(next);
            self.fire();
        }
    }

    /// Start one scheduled run on its own task
    ///
    /// A failed run is logged and never stops later triggers.
    pub fn fire(&self) -> JoinHandle<()> {
        let agent = self.agent.clone();
        let request = self.request();
        let repo = self.repo.clone();

        tokio::spawn(async move {
            match agent.check(request).await {
                Ok(report) => info!(repo = %repo, score = ?report.score, "Scheduled run finished"),
                Err(e) => error!(repo = %repo, "Scheduled run failed: {}", e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_fires_later_today() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 8, 30, 0).unwrap();
        assert_eq!(
            next_fire_after(now, at(9, 0)),
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_fires_tomorrow_once_passed() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        assert_eq!(
            next_fire_after(now, at(9, 0)),
            Utc.with_ymd_and_hms(2026, 3, 15, 9, 0, 0).unwrap()
        );

        let late = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 30).unwrap();
        assert_eq!(
            next_fire_after(late, at(0, 0)),
            Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_clock_stepping_back_does_not_refire() {
        let fired = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let stepped_back = fired - Duration::milliseconds(10);

        assert_eq!(next_fire_after(stepped_back, at(9, 0)), fired);
        assert_eq!(
            next_trigger(stepped_back, Some(fired), at(9, 0)),
            Utc.with_ymd_and_hms(2026, 3, 15, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_trigger_without_history_follows_clock() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 8, 30, 0).unwrap();
        assert_eq!(next_trigger(now, None, at(9, 0)), next_fire_after(now, at(9, 0)));

        let yesterday = Utc.with_ymd_and_hms(2026, 3, 13, 9, 0, 0).unwrap();
        assert_eq!(
            next_trigger(now, Some(yesterday), at(9, 0)),
            Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_next_fire_is_within_a_day() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 17, 42, 11).unwrap();
        for hour in 0..24 {
            let next = next_fire_after(now, at(hour, 15));
            assert!(next > now);
            assert!(next - now <= Duration::days(1));
        }
    }
}
