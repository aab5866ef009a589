//! Remaining-time display and the one-second ticker that drives it.
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use trustvote_interface::{derive_status, Clock, ElectionId, ElectionStatus, Timestamp};

/// Shown instead of a countdown before voting opens.
pub const NOT_STARTED_LABEL: &str = "Not Started";

const TICK: Duration = Duration::from_secs(1);

/// Returned by [`CountdownTicker::retarget`] when no tokio runtime is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the countdown ticker must be started from within a tokio runtime")]
pub struct NoRuntime;

/// Formats a number of seconds as `HH:MM:SS`.
///
/// Hours wrap at 24; whole days are not shown.
pub fn format_remaining(secs: u64) -> String {
    let hours = (secs / 3600) % 24;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Seconds left until `end`, never negative.
pub fn remaining_secs(end: Timestamp, now: Timestamp) -> u64 {
    now.saturating_secs_until(end)
}

/// The countdown shown on ballot and result pages.
pub fn countdown_label(start: Timestamp, end: Timestamp, now: Timestamp) -> String {
    match derive_status(start, end, now) {
        ElectionStatus::Inactive => NOT_STARTED_LABEL.to_string(),
        ElectionStatus::Active => format_remaining(remaining_secs(end, now)),
        ElectionStatus::Finished => format_remaining(0),
    }
}

/// The countdown column of dashboard lists, where closed elections show their status.
pub fn dashboard_label(start: Timestamp, end: Timestamp, now: Timestamp) -> String {
    match derive_status(start, end, now) {
        ElectionStatus::Finished => ElectionStatus::Finished.to_string(),
        _ => countdown_label(start, end, now),
    }
}

/// A countdown target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    /// Election being counted down.
    pub election: ElectionId,
    /// When voting opens.
    pub start: Timestamp,
    /// When voting closes.
    pub end: Timestamp,
}

/// One countdown as of the last tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    /// Election being counted down.
    pub election: ElectionId,
    /// Status at the last tick.
    pub status: ElectionStatus,
    /// Seconds left until the end time.
    pub remaining_secs: u64,
}

impl Countdown {
    fn compute(target: &Target, now: Timestamp) -> Self {
        Self {
            election: target.election,
            status: derive_status(target.start, target.end, now),
            remaining_secs: remaining_secs(target.end, now),
        }
    }

    /// `HH:MM:SS`, or [`NOT_STARTED_LABEL`] before voting opens.
    pub fn label(&self) -> String {
        match self.status {
            ElectionStatus::Inactive => NOT_STARTED_LABEL.to_string(),
            _ => format_remaining(self.remaining_secs),
        }
    }
}

/// Whether a [`CountdownTicker`] has a timer running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerState {
    /// No targets, no timer.
    Idle,
    /// A one-second timer is recomputing every target.
    Running,
}

/// Recomputes every target's countdown once per second.
///
/// The timer task is aborted when the targets change, on [`CountdownTicker::stop`]
/// and when the ticker is dropped.
pub struct CountdownTicker {
    clock: Arc<dyn Clock>,
    snapshot: Arc<watch::Sender<Vec<Countdown>>>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for CountdownTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountdownTicker")
            .field("state", &self.state())
            .field("snapshot", &*self.snapshot.borrow())
            .finish()
    }
}

impl CountdownTicker {
    /// Creates an idle ticker reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (snapshot, _) = watch::channel(Vec::new());
        Self {
            clock,
            snapshot: Arc::new(snapshot),
            task: None,
        }
    }

    /// Replaces the targets. An empty set leaves the ticker idle.
    ///
    /// Starting the timer needs a tokio runtime; without one the ticker is
    /// left untouched and [`NoRuntime`] is returned.
    pub fn retarget(&mut self, targets: Vec<Target>) -> Result<(), NoRuntime> {
        let runtime = if targets.is_empty() {
            None
        } else {
            Some(Handle::try_current().map_err(|_| NoRuntime)?)
        };
        self.abort();
        let now = self.clock.now();
        self.snapshot
            .send_replace(targets.iter().map(|t| Countdown::compute(t, now)).collect());
        let Some(runtime) = runtime else {
            return Ok(());
        };

        let clock = self.clock.clone();
        let snapshot = self.snapshot.clone();
        self.task = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately and was computed above.
            interval.tick().await;
            loop {
                interval.tick().await;
                let now = clock.now();
                snapshot.send_replace(targets.iter().map(|t| Countdown::compute(t, now)).collect());
            }
        }));
        tracing::debug!("Countdown ticker started");
        Ok(())
    }

    /// Stops the timer and clears the countdowns.
    pub fn stop(&mut self) {
        self.abort();
        self.snapshot.send_replace(Vec::new());
    }

    /// Current state.
    pub fn state(&self) -> TickerState {
        match &self.task {
            Some(task) if !task.is_finished() => TickerState::Running,
            _ => TickerState::Idle,
        }
    }

    /// The countdowns as of the last tick.
    pub fn snapshot(&self) -> Vec<Countdown> {
        self.snapshot.borrow().clone()
    }

    /// Notified on every tick.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Countdown>> {
        self.snapshot.subscribe()
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Countdown ticker stopped");
        }
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use trustvote_interface::ManualClock;

    use super::*;

    const NOW: Timestamp = Timestamp::from_secs(1_700_000_000);

    fn target(id: u64, start_offset: i64, end_offset: i64) -> Target {
        let at = |offset: i64| {
            if offset >= 0 {
                NOW.saturating_add_secs(offset as u64)
            } else {
                NOW.saturating_sub_secs(offset.unsigned_abs())
            }
        };
        Target {
            election: ElectionId(id),
            start: at(start_offset),
            end: at(end_offset),
        }
    }

    #[test]
    fn formats_hours_modulo_a_day() {
        assert_eq!(format_remaining(0), "00:00:00");
        assert_eq!(format_remaining(3600), "01:00:00");
        assert_eq!(format_remaining(3661), "01:01:01");
        assert_eq!(format_remaining(86_400 + 125), "00:02:05");
    }

    #[test]
    fn labels_by_status() {
        let start = NOW.saturating_add_secs(3600);
        let end = NOW.saturating_add_secs(7200);
        assert_eq!(countdown_label(start, end, NOW), NOT_STARTED_LABEL);
        assert_eq!(countdown_label(start, end, start), "01:00:00");
        assert_eq!(countdown_label(start, end, end), "00:00:00");
        assert_eq!(
            countdown_label(start, end, end.saturating_add_secs(10)),
            "00:00:00"
        );
        assert_eq!(
            dashboard_label(start, end, end.saturating_add_secs(10)),
            "Finished"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_every_second() {
        let clock = ManualClock::new(NOW);
        let mut ticker = CountdownTicker::new(Arc::new(clock.clone()));
        assert_eq!(ticker.state(), TickerState::Idle);

        ticker.retarget(vec![target(1, -3600, 3600), target(2, 3600, 7200)]).unwrap();
        assert_eq!(ticker.state(), TickerState::Running);
        let snapshot = ticker.snapshot();
        assert_eq!(snapshot[0].label(), "01:00:00");
        assert_eq!(snapshot[1].label(), NOT_STARTED_LABEL);

        let mut rx = ticker.subscribe();
        clock.advance(1);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update()[0].label(), "00:59:59");

        clock.advance(1);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update()[0].remaining_secs, 3598);
    }

    #[tokio::test(start_paused = true)]
    async fn clamps_at_zero_and_keeps_ticking() {
        let clock = ManualClock::new(NOW);
        let mut ticker = CountdownTicker::new(Arc::new(clock.clone()));
        ticker.retarget(vec![target(1, -10, 1)]).unwrap();

        let mut rx = ticker.subscribe();
        for _ in 0..3 {
            clock.advance(1);
            rx.changed().await.unwrap();
        }
        let countdown = rx.borrow_and_update()[0].clone();
        assert_eq!(countdown.status, ElectionStatus::Finished);
        assert_eq!(countdown.label(), "00:00:00");

        clock.advance(1);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow()[0].label(), "00:00:00");
    }

    #[tokio::test(start_paused = true)]
    async fn retarget_and_stop_release_the_timer() {
        let clock = ManualClock::new(NOW);
        let mut ticker = CountdownTicker::new(Arc::new(clock));
        ticker.retarget(vec![target(1, -10, 100)]).unwrap();
        ticker.retarget(vec![target(2, -10, 50)]).unwrap();
        assert_eq!(ticker.snapshot()[0].election, ElectionId(2));

        ticker.retarget(Vec::new()).unwrap();
        assert_eq!(ticker.state(), TickerState::Idle);

        ticker.retarget(vec![target(3, -10, 50)]).unwrap();
        ticker.stop();
        assert_eq!(ticker.state(), TickerState::Idle);
        assert!(ticker.snapshot().is_empty());
    }

    #[test]
    fn retarget_outside_a_runtime_is_an_error() {
        let clock = ManualClock::new(NOW);
        let mut ticker = CountdownTicker::new(Arc::new(clock));
        assert_eq!(ticker.retarget(vec![target(1, -10, 100)]), Err(NoRuntime));
        assert_eq!(ticker.state(), TickerState::Idle);
        assert!(ticker.snapshot().is_empty());
        assert_eq!(ticker.retarget(Vec::new()), Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_ticker_aborts_the_task() {
        let clock = ManualClock::new(NOW);
        let mut ticker = CountdownTicker::new(Arc::new(clock));
        ticker.retarget(vec![target(1, -10, 100)]).unwrap();
        let mut rx = ticker.subscribe();
        drop(ticker);
        // The aborted task releases the last sender.
        assert!(rx.changed().await.is_err());
    }

    proptest! {
        #[test]
        fn remaining_is_never_negative(end in any::<u64>(), now in any::<u64>()) {
            let secs = remaining_secs(Timestamp::from_secs(end), Timestamp::from_secs(now));
            prop_assert_eq!(secs, end.saturating_sub(now));
            let label = format_remaining(secs);
            prop_assert_eq!(label.len(), 8);
            let hours: u64 = label[..2].parse().unwrap();
            prop_assert!(hours < 24);
        }
    }
}
