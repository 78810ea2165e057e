mod notify;

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Local, NaiveDate, NaiveDateTime};
use companion_core::reminder::ReminderSchedule;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Clock;

pub use notify::{FanoutNotifier, LogNotifier, Notifier, WebhookNotifier};

/// How often the wall clock is checked.
pub const DEFAULT_TICK: Duration = Duration::from_secs(30);

pub const SUHOOR_TITLE: &str = "Suhoor Reminder";
pub const SUHOOR_MESSAGE: &str = "Time for Suhoor! Don't forget your intention for fasting.";

/// Fires a daily reminder at most once per calendar day.
pub struct ReminderService {
    clock: Clock,
    schedule: ReminderSchedule,
    tick: Duration,
    offset: Option<FixedOffset>,
    notifier: Arc<dyn Notifier>,
    title: String,
    message: String,
}

impl ReminderService {
    #[must_use]
    pub fn new(clock: Clock, schedule: ReminderSchedule, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            clock,
            schedule,
            tick: DEFAULT_TICK,
            offset: None,
            notifier,
            title: SUHOOR_TITLE.to_owned(),
            message: SUHOOR_MESSAGE.to_owned(),
        }
    }

    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Evaluate the schedule in a fixed offset instead of the system time zone.
    #[must_use]
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_message(mut self, title: impl Into<String>, message: impl Into<String>) -> Self {
        self.title = title.into();
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn schedule(&self) -> &ReminderSchedule {
        &self.schedule
    }

    fn local_now(&self) -> NaiveDateTime {
        let now = self.clock.now();
        match self.offset {
            Some(offset) => now.with_timezone(&offset).naive_local(),
            None => now.with_timezone(&Local).naive_local(),
        }
    }

    /// Check the clock once and notify if due. Returns whether it fired.
    ///
    /// A failed delivery still counts as the day's firing.
    pub async fn check(&mut self) -> bool {
        let now = self.local_now();
        if !self.schedule.fire_if_due(now) {
            return false;
        }
        info!(at = %now, "reminder due");
        if let Err(err) = self.notifier.notify(&self.title, &self.message).await {
            warn!(error = %err, "reminder not delivered");
        }
        true
    }

    /// Run the check loop on the current runtime until cancelled.
    #[must_use]
    pub fn spawn(mut self) -> ReminderHandle {
        let token = CancellationToken::new();
        let child = token.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = child.cancelled() => break,
                    _ = interval.tick() => {
                        self.check().await;
                    }
                }
            }
            debug!("reminder loop stopped");
            self.schedule.last_fired()
        });
        ReminderHandle { token, task }
    }
}

/// Owner of a running reminder loop.
pub struct ReminderHandle {
    token: CancellationToken,
    task: JoinHandle<Option<NaiveDate>>,
}

impl ReminderHandle {
    /// Token that stops the loop when cancelled; hand it to shutdown wiring.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop the loop and wait for it. Returns the last date a reminder fired.
    pub async fn shutdown(self) -> Option<NaiveDate> {
        self.token.cancel();
        match self.task.await {
            Ok(last_fired) => last_fired,
            Err(err) => {
                warn!(error = %err, "reminder task ended abnormally");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveTime;
    use companion_core::time::fixed_clock;

    use crate::error::NotifyError;

    #[derive(Default)]
    struct CountingNotifier {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(&self, _title: &str, _message: &str) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NotifyError::Partial { failed: 1, total: 1 });
            }
            Ok(())
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    // fixed clock reads 2023-11-14 22:13 UTC
    fn service(at: (u32, u32), notifier: Arc<CountingNotifier>) -> ReminderService {
        let schedule = ReminderSchedule::daily(NaiveTime::from_hms_opt(at.0, at.1, 0).unwrap());
        ReminderService::new(fixed_clock(), schedule, notifier).with_offset(utc())
    }

    #[tokio::test]
    async fn check_fires_once() {
        let notifier = Arc::new(CountingNotifier::default());
        let mut svc = service((22, 0), notifier.clone());

        assert!(svc.check().await);
        assert!(!svc.check().await);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(svc.schedule().last_fired(), NaiveDate::from_ymd_opt(2023, 11, 14));
    }

    #[tokio::test]
    async fn check_respects_offset() {
        let notifier = Arc::new(CountingNotifier::default());
        let schedule = ReminderSchedule::daily(NaiveTime::from_hms_opt(3, 0, 0).unwrap());
        // 22:13 UTC is 03:13 the next day at +05:00
        let mut svc = ReminderService::new(fixed_clock(), schedule, notifier.clone())
            .with_offset(FixedOffset::east_opt(5 * 3600).unwrap());

        assert!(svc.check().await);
        assert_eq!(svc.schedule().last_fired(), NaiveDate::from_ymd_opt(2023, 11, 15));
    }

    #[tokio::test]
    async fn failed_delivery_still_counts_as_fired() {
        let notifier = Arc::new(CountingNotifier {
            fail: true,
            ..CountingNotifier::default()
        });
        let mut svc = service((22, 0), notifier.clone());

        assert!(svc.check().await);
        assert!(!svc.check().await);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn spawned_loop_fires_at_most_once_and_shuts_down() {
        let notifier = Arc::new(CountingNotifier::default());
        let handle = service((22, 0), notifier.clone())
            .with_tick(Duration::from_millis(5))
            .spawn();

        tokio::time::sleep(Duration::from_millis(60)).await;
        let last = handle.shutdown().await;

        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 11, 14));
    }

    #[tokio::test]
    async fn spawned_loop_stays_quiet_outside_window() {
        let notifier = Arc::new(CountingNotifier::default());
        let handle = service((3, 0), notifier.clone())
            .with_tick(Duration::from_millis(5))
            .spawn();

        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.cancellation_token().cancel();
        assert_eq!(handle.shutdown().await, None);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fanout_reports_partial_failure() {
        let ok = Arc::new(CountingNotifier::default());
        let bad = Arc::new(CountingNotifier {
            fail: true,
            ..CountingNotifier::default()
        });
        let fanout = FanoutNotifier::new(vec![
            ok.clone() as Arc<dyn Notifier>,
            bad.clone() as Arc<dyn Notifier>,
        ]);

        let err = fanout.notify("t", "m").await.unwrap_err();
        assert!(matches!(err, NotifyError::Partial { failed: 1, total: 2 }));
        assert_eq!(ok.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bad.calls.load(Ordering::SeqCst), 1);
    }
}
