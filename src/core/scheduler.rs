use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use vidgrab_core::core::events::{SchedulePhase, ScheduleStatus};
use vidgrab_core::models::media::{DownloadOptions, DownloadResult};
use vidgrab_core::DownloadError;

use crate::core::clock::{Clock, SystemClock};
use crate::core::dispatcher::Dispatcher;

/// Upper bound on occurrences skipped after a missed wake-up.
const MAX_SKIPPED_OCCURRENCES: usize = 10_000;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Recurrence {
    Once,
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRule {
    /// First run, local time.
    pub at: NaiveDateTime,
    pub recurrence: Recurrence,
    /// Weekly only; empty means every seven days.
    pub days: Vec<Weekday>,
    /// Monthly only; defaults to the day of `at`.
    pub day_of_month: Option<u32>,
    pub end_date: Option<NaiveDateTime>,
}

impl ScheduleRule {
    pub fn once(at: NaiveDateTime) -> Self {
        Self {
            at,
            recurrence: Recurrence::Once,
            days: Vec::new(),
            day_of_month: None,
            end_date: None,
        }
    }

    pub fn daily(at: NaiveDateTime) -> Self {
        Self {
            recurrence: Recurrence::Daily,
            ..Self::once(at)
        }
    }

    pub fn weekly(at: NaiveDateTime, days: Vec<Weekday>) -> Self {
        Self {
            recurrence: Recurrence::Weekly,
            days,
            ..Self::once(at)
        }
    }

    pub fn monthly(at: NaiveDateTime, day_of_month: Option<u32>) -> Self {
        Self {
            recurrence: Recurrence::Monthly,
            day_of_month,
            ..Self::once(at)
        }
    }

    pub fn until(mut self, end_date: NaiveDateTime) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn validate(&self, now: NaiveDateTime) -> Result<(), DownloadError> {
        if self.recurrence == Recurrence::Once && self.at < now {
            return Err(DownloadError::InvalidSchedule(format!(
                "{} is in the past",
                self.at.format("%Y-%m-%d %H:%M")
            )));
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(DownloadError::InvalidSchedule(format!(
                    "day of month {} is outside 1..=31",
                    day
                )));
            }
        }
        if let Some(end) = self.end_date {
            if end < self.at {
                return Err(DownloadError::InvalidSchedule(
                    "end date precedes the first run".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt().map(|d| d.day())
}

/// Same time of day, one month later, on `day` clamped to the month's length.
fn add_month_clamped(prev: NaiveDateTime, day: u32) -> Option<NaiveDateTime> {
    let (year, month) = if prev.month() == 12 {
        (prev.year() + 1, 1)
    } else {
        (prev.year(), prev.month() + 1)
    };
    let day = day.min(last_day_of_month(year, month)?);
    Some(NaiveDate::from_ymd_opt(year, month, day)?.and_time(prev.time()))
}

/// The occurrence after `prev` (a nominal run time), or `None` when the rule
/// has no further runs.
pub fn next_occurrence(prev: NaiveDateTime, rule: &ScheduleRule) -> Option<NaiveDateTime> {
    let next = match rule.recurrence {
        Recurrence::Once => return None,
        Recurrence::Daily => prev.checked_add_days(Days::new(1))?,
        Recurrence::Weekly if rule.days.is_empty() => prev.checked_add_days(Days::new(7))?,
        Recurrence::Weekly => (1..=7)
            .filter_map(|n| prev.checked_add_days(Days::new(n)))
            .find(|d| rule.days.contains(&d.weekday()))?,
        Recurrence::Monthly => {
            add_month_clamped(prev, rule.day_of_month.unwrap_or(rule.at.day()))?
        }
    };
    match rule.end_date {
        Some(end) if next > end => None,
        _ => Some(next),
    }
}

pub type ResultCallback = Arc<dyn Fn(DownloadResult) + Send + Sync>;

#[derive(Clone, Default)]
pub struct ScheduleCallbacks {
    pub on_complete: Option<ResultCallback>,
    pub on_error: Option<ResultCallback>,
}

struct ScheduleState {
    next_run: NaiveDateTime,
    paused: bool,
    /// The timer fired while paused; nothing is armed until `resume`.
    stalled: bool,
    phase: SchedulePhase,
    runs: u32,
}

struct Shared {
    state: Mutex<ScheduleState>,
    wake: Notify,
    cancel: CancellationToken,
    done: CancellationToken,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ScheduleState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Live handle on one schedule. Clones share the same schedule.
#[derive(Clone)]
pub struct ScheduledDownloadControl {
    id: String,
    url: String,
    shared: Arc<Shared>,
}

impl ScheduledDownloadControl {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stops the schedule for good. A pending timer or in-flight run is
    /// abandoned without invoking callbacks.
    pub fn cancel(&self) {
        {
            let mut state = self.shared.lock();
            if matches!(state.phase, SchedulePhase::Scheduled | SchedulePhase::Running) {
                state.phase = SchedulePhase::Cancelled;
                tracing::info!("[scheduler] {} cancelled", self.id);
            }
        }
        self.shared.cancel.cancel();
    }

    /// Suppresses firing; the pending timer stays armed.
    pub fn pause(&self) {
        let mut state = self.shared.lock();
        if matches!(state.phase, SchedulePhase::Scheduled | SchedulePhase::Running) {
            state.paused = true;
        }
    }

    pub fn resume(&self) {
        {
            let mut state = self.shared.lock();
            if !state.paused {
                return;
            }
            state.paused = false;
            state.stalled = false;
        }
        self.shared.wake.notify_one();
    }

    pub fn status(&self) -> ScheduleStatus {
        let state = self.shared.lock();
        ScheduleStatus {
            id: self.id.clone(),
            url: self.url.clone(),
            next_run: state.next_run,
            is_paused: state.paused,
            phase: state.phase,
            runs: state.runs,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.shared.done.is_cancelled()
    }

    /// Resolves once the schedule is terminal or cancelled.
    pub async fn finished(&self) {
        self.shared.done.cancelled().await
    }
}

pub struct Scheduler {
    dispatcher: Arc<Dispatcher>,
    clock: Arc<dyn Clock>,
}

fn schedule_id() -> String {
    use rand::RngExt;

    let charset = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect();
    format!("schedule_{}_{}", Utc::now().timestamp_millis(), suffix)
}

impl Scheduler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self::with_clock(dispatcher, Arc::new(SystemClock))
    }

    pub fn with_clock(dispatcher: Arc<Dispatcher>, clock: Arc<dyn Clock>) -> Self {
        Self { dispatcher, clock }
    }

    /// Registers a schedule and spawns its timer task. Must be called inside a tokio runtime.
    pub fn schedule(
        &self,
        url: &str,
        opts: DownloadOptions,
        rule: ScheduleRule,
        callbacks: ScheduleCallbacks,
    ) -> Result<ScheduledDownloadControl, DownloadError> {
        rule.validate(self.clock.now())?;
        if !self.dispatcher.is_supported(url) {
            tracing::warn!("[scheduler] {} is not supported; runs will fail", url);
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(ScheduleState {
                next_run: rule.at,
                paused: false,
                stalled: false,
                phase: SchedulePhase::Scheduled,
                runs: 0,
            }),
            wake: Notify::new(),
            cancel: CancellationToken::new(),
            done: CancellationToken::new(),
        });
        let control = ScheduledDownloadControl {
            id: schedule_id(),
            url: url.trim().to_string(),
            shared: shared.clone(),
        };
        tracing::info!(
            "[scheduler] {} armed for {} ({})",
            control.id,
            rule.at,
            rule.recurrence
        );

        let task = ScheduleTask {
            id: control.id.clone(),
            url: control.url.clone(),
            opts,
            rule,
            callbacks,
            shared,
            dispatcher: self.dispatcher.clone(),
            clock: self.clock.clone(),
        };
        tokio::spawn(task.run());

        Ok(control)
    }
}

struct ScheduleTask {
    id: String,
    url: String,
    opts: DownloadOptions,
    rule: ScheduleRule,
    callbacks: ScheduleCallbacks,
    shared: Arc<Shared>,
    dispatcher: Arc<Dispatcher>,
    clock: Arc<dyn Clock>,
}

enum RunOutcome {
    Rearmed,
    Terminal,
    Cancelled,
}

enum Armed {
    At(NaiveDateTime),
    Stalled,
    Finished,
}

impl ScheduleTask {
    async fn run(self) {
        let _done = self.shared.done.clone().drop_guard();

        loop {
            if !self.wait_for_fire().await {
                return;
            }

            {
                let mut state = self.shared.lock();
                if state.phase != SchedulePhase::Scheduled {
                    return;
                }
                if state.paused {
                    tracing::debug!("[scheduler] {} fired while paused", self.id);
                    state.stalled = true;
                    continue;
                }
                if self.clock.now() < state.next_run {
                    continue;
                }
                state.phase = SchedulePhase::Running;
            }

            tracing::info!("[scheduler] {} running {}", self.id, self.url);
            let result = tokio::select! {
                biased;
                _ = self.shared.cancel.cancelled() => return,
                r = self.dispatcher.download(&self.url, &self.opts) => r,
            };

            match self.finish_run(&result) {
                RunOutcome::Rearmed => self.notify(result),
                RunOutcome::Terminal => {
                    self.notify(result);
                    return;
                }
                RunOutcome::Cancelled => return,
            }
        }
    }

    /// Waits until the armed timer elapses. Returns `false` once the schedule is over.
    async fn wait_for_fire(&self) -> bool {
        loop {
            let armed = {
                let state = self.shared.lock();
                match state.phase {
                    SchedulePhase::Scheduled if state.stalled => Armed::Stalled,
                    SchedulePhase::Scheduled => Armed::At(state.next_run),
                    _ => Armed::Finished,
                }
            };

            match armed {
                Armed::Finished => return false,
                Armed::Stalled => {
                    tokio::select! {
                        biased;
                        _ = self.shared.cancel.cancelled() => return false,
                        _ = self.shared.wake.notified() => continue,
                    }
                }
                Armed::At(next_run) => {
                    let delay = (next_run - self.clock.now())
                        .to_std()
                        .unwrap_or(Duration::ZERO);
                    tokio::select! {
                        biased;
                        _ = self.shared.cancel.cancelled() => return false,
                        _ = self.shared.wake.notified() => continue,
                        _ = tokio::time::sleep(delay) => return true,
                    }
                }
            }
        }
    }

    /// Records the run and arms the next occurrence, skipping any already missed.
    fn finish_run(&self, result: &DownloadResult) -> RunOutcome {
        let mut state = self.shared.lock();
        if state.phase == SchedulePhase::Cancelled {
            return RunOutcome::Cancelled;
        }
        state.runs += 1;
        if !result.success {
            tracing::warn!("[scheduler] {} run {} failed: {}", self.id, state.runs, result.message);
        }

        let now = self.clock.now();
        let mut next = next_occurrence(state.next_run, &self.rule);
        let mut skipped = 0;
        while let Some(candidate) = next {
            if candidate > now || skipped >= MAX_SKIPPED_OCCURRENCES {
                break;
            }
            skipped += 1;
            next = next_occurrence(candidate, &self.rule);
        }
        if skipped > 0 {
            tracing::warn!("[scheduler] {} skipped {} missed occurrences", self.id, skipped);
        }

        match next {
            Some(next_run) => {
                state.next_run = next_run;
                state.phase = SchedulePhase::Scheduled;
                tracing::info!("[scheduler] {} next run at {}", self.id, next_run);
                RunOutcome::Rearmed
            }
            None => {
                state.phase = SchedulePhase::Terminal;
                tracing::info!("[scheduler] {} finished after {} runs", self.id, state.runs);
                RunOutcome::Terminal
            }
        }
    }

    fn notify(&self, result: DownloadResult) {
        if self.shared.lock().phase == SchedulePhase::Cancelled {
            return;
        }
        let callback = if result.success {
            &self.callbacks.on_complete
        } else {
            &self.callbacks.on_error
        };
        if let Some(cb) = callback {
            cb(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::MonotonicClock;
    use crate::core::test_support::{MockBackend, FAILING_VIDEO, VIDEO_URL};
    use chrono::TimeDelta;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use vidgrab_core::PlatformDownloader;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    /// Tuesday.
    fn start() -> NaiveDateTime {
        dt(2026, 10, 20, 9, 0)
    }

    struct Counters {
        complete: Arc<AtomicUsize>,
        error: Arc<AtomicUsize>,
    }

    fn counting_callbacks() -> (ScheduleCallbacks, Counters) {
        let complete = Arc::new(AtomicUsize::new(0));
        let error = Arc::new(AtomicUsize::new(0));
        let (c, e) = (complete.clone(), error.clone());
        let callbacks = ScheduleCallbacks {
            on_complete: Some(Arc::new(move |_: DownloadResult| {
                c.fetch_add(1, Ordering::SeqCst);
            })),
            on_error: Some(Arc::new(move |_: DownloadResult| {
                e.fetch_add(1, Ordering::SeqCst);
            })),
        };
        (callbacks, Counters { complete, error })
    }

    fn scheduler_with(clock: Arc<dyn Clock>) -> Scheduler {
        let backend: Arc<dyn PlatformDownloader> = Arc::new(MockBackend::youtube());
        Scheduler::with_clock(Arc::new(Dispatcher::new(vec![backend])), clock)
    }

    fn scheduler() -> Scheduler {
        scheduler_with(Arc::new(MonotonicClock::starting_at(start())))
    }

    async fn sleep_secs(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    const HOUR: u64 = 3600;
    const DAY: u64 = 24 * HOUR;

    #[test]
    fn weekly_scans_to_next_configured_day() {
        let days = vec![Weekday::Mon, Weekday::Wed];
        let tuesday = start();
        let rule = ScheduleRule::weekly(tuesday, days);
        assert_eq!(next_occurrence(tuesday, &rule), Some(dt(2026, 10, 21, 9, 0)));

        let thursday = dt(2026, 10, 22, 9, 0);
        assert_eq!(next_occurrence(thursday, &rule), Some(dt(2026, 10, 26, 9, 0)));
    }

    #[test]
    fn weekly_without_days_adds_a_week() {
        let rule = ScheduleRule::weekly(start(), Vec::new());
        assert_eq!(next_occurrence(start(), &rule), Some(dt(2026, 10, 27, 9, 0)));
    }

    #[test]
    fn daily_keeps_time_of_day() {
        let at = dt(2026, 12, 31, 23, 30);
        let rule = ScheduleRule::daily(at);
        assert_eq!(next_occurrence(at, &rule), Some(dt(2027, 1, 1, 23, 30)));
    }

    #[test]
    fn monthly_clamps_to_last_day_per_month() {
        let at = dt(2027, 1, 31, 8, 0);
        let rule = ScheduleRule::monthly(at, Some(31));
        let feb = next_occurrence(at, &rule).unwrap();
        assert_eq!(feb, dt(2027, 2, 28, 8, 0));
        let mar = next_occurrence(feb, &rule).unwrap();
        assert_eq!(mar, dt(2027, 3, 31, 8, 0));
        let apr = next_occurrence(mar, &rule).unwrap();
        assert_eq!(apr, dt(2027, 4, 30, 8, 0));

        let leap = next_occurrence(dt(2028, 1, 31, 8, 0), &rule).unwrap();
        assert_eq!(leap, dt(2028, 2, 29, 8, 0));
    }

    #[test]
    fn monthly_defaults_to_first_run_day() {
        let at = dt(2026, 11, 15, 12, 0);
        let rule = ScheduleRule::monthly(at, None);
        assert_eq!(next_occurrence(at, &rule), Some(dt(2026, 12, 15, 12, 0)));
    }

    #[test]
    fn end_date_and_once_stop_the_chain() {
        let rule = ScheduleRule::daily(start()).until(start() + TimeDelta::hours(12));
        assert_eq!(next_occurrence(start(), &rule), None);
        assert_eq!(next_occurrence(start(), &ScheduleRule::once(start())), None);
    }

    #[test]
    fn validation_rejects_bad_rules() {
        let now = start();
        let past = now - TimeDelta::minutes(1);
        assert!(ScheduleRule::once(past).validate(now).is_err());
        assert!(ScheduleRule::daily(past).validate(now).is_ok());
        assert!(ScheduleRule::monthly(now, Some(0)).validate(now).is_err());
        assert!(ScheduleRule::monthly(now, Some(32)).validate(now).is_err());
        assert!(ScheduleRule::daily(now)
            .until(now - TimeDelta::days(1))
            .validate(now)
            .is_err());
    }

    #[test]
    fn recurrence_names() {
        assert_eq!("weekly".parse::<Recurrence>().ok(), Some(Recurrence::Weekly));
        assert_eq!(Recurrence::Monthly.to_string(), "monthly");
    }

    #[tokio::test(start_paused = true)]
    async fn past_one_shot_is_invalid() {
        let s = scheduler();
        let err = s
            .schedule(
                VIDEO_URL,
                DownloadOptions::default(),
                ScheduleRule::once(start() - TimeDelta::hours(1)),
                ScheduleCallbacks::default(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, DownloadError::InvalidSchedule(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_once_then_terminates() {
        let s = scheduler();
        let (callbacks, counters) = counting_callbacks();
        let at = start() + TimeDelta::hours(1);
        let control = s
            .schedule(VIDEO_URL, DownloadOptions::default(), ScheduleRule::once(at), callbacks)
            .unwrap();

        assert!(control.id().starts_with("schedule_"));
        sleep_secs(HOUR - 1).await;
        assert_eq!(counters.complete.load(Ordering::SeqCst), 0);

        control.finished().await;
        let status = control.status();
        assert_eq!(counters.complete.load(Ordering::SeqCst), 1);
        assert_eq!(status.phase, SchedulePhase::Terminal);
        assert_eq!(status.runs, 1);
        assert_eq!(status.next_run, at);
    }

    #[tokio::test(start_paused = true)]
    async fn daily_schedule_repeats() {
        let s = scheduler();
        let (callbacks, counters) = counting_callbacks();
        let at = start() + TimeDelta::minutes(1);
        let control = s
            .schedule(VIDEO_URL, DownloadOptions::default(), ScheduleRule::daily(at), callbacks)
            .unwrap();

        sleep_secs(2 * DAY + 120).await;
        assert_eq!(counters.complete.load(Ordering::SeqCst), 3);
        let status = control.status();
        assert_eq!(status.runs, 3);
        assert_eq!(status.next_run, at + TimeDelta::days(3));
        assert_eq!(status.phase, SchedulePhase::Scheduled);
        control.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn failures_still_reschedule() {
        let s = scheduler();
        let (callbacks, counters) = counting_callbacks();
        let control = s
            .schedule(
                FAILING_VIDEO,
                DownloadOptions::default(),
                ScheduleRule::daily(start()),
                callbacks,
            )
            .unwrap();

        sleep_secs(DAY + 60).await;
        assert_eq!(counters.error.load(Ordering::SeqCst), 2);
        assert_eq!(counters.complete.load(Ordering::SeqCst), 0);
        assert_eq!(control.status().phase, SchedulePhase::Scheduled);
        control.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn end_date_makes_schedule_terminal() {
        let s = scheduler();
        let (callbacks, counters) = counting_callbacks();
        let at = start() + TimeDelta::minutes(5);
        let rule = ScheduleRule::daily(at).until(at + TimeDelta::days(1) + TimeDelta::hours(1));
        let control = s
            .schedule(VIDEO_URL, DownloadOptions::default(), rule, callbacks)
            .unwrap();

        control.finished().await;
        let status = control.status();
        assert_eq!(counters.complete.load(Ordering::SeqCst), 2);
        assert_eq!(status.phase, SchedulePhase::Terminal);
        assert_eq!(status.next_run, at + TimeDelta::days(1));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_before_deadline_keeps_timer() {
        let s = scheduler();
        let (callbacks, counters) = counting_callbacks();
        let control = s
            .schedule(
                VIDEO_URL,
                DownloadOptions::default(),
                ScheduleRule::once(start() + TimeDelta::hours(1)),
                callbacks,
            )
            .unwrap();

        control.pause();
        assert!(control.status().is_paused);
        sleep_secs(30 * 60).await;
        control.resume();
        assert!(!control.status().is_paused);

        sleep_secs(29 * 60).await;
        assert_eq!(counters.complete.load(Ordering::SeqCst), 0);
        sleep_secs(2 * 60).await;
        assert_eq!(counters.complete.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_through_deadline_stalls_until_resume() {
        let s = scheduler();
        let (callbacks, counters) = counting_callbacks();
        let at = start() + TimeDelta::hours(1);
        let control = s
            .schedule(VIDEO_URL, DownloadOptions::default(), ScheduleRule::daily(at), callbacks)
            .unwrap();

        control.pause();
        sleep_secs(3 * HOUR).await;
        let status = control.status();
        assert_eq!(counters.complete.load(Ordering::SeqCst), 0);
        assert_eq!(status.next_run, at);
        assert_eq!(status.runs, 0);
        assert!(status.is_paused);

        control.resume();
        sleep_secs(1).await;
        assert_eq!(counters.complete.load(Ordering::SeqCst), 1);
        assert_eq!(control.status().next_run, at + TimeDelta::days(1));
        control.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_final_and_idempotent() {
        let s = scheduler();
        let (callbacks, counters) = counting_callbacks();
        let control = s
            .schedule(
                VIDEO_URL,
                DownloadOptions::default(),
                ScheduleRule::daily(start() + TimeDelta::hours(1)),
                callbacks,
            )
            .unwrap();

        control.cancel();
        control.cancel();
        control.resume();
        control.finished().await;
        sleep_secs(2 * DAY).await;

        assert!(control.is_finished());
        assert_eq!(control.status().phase, SchedulePhase::Cancelled);
        assert_eq!(counters.complete.load(Ordering::SeqCst), 0);
        assert_eq!(counters.error.load(Ordering::SeqCst), 0);
    }

    /// Monotonic clock that can be shifted by whole seconds.
    struct ShiftedClock {
        inner: MonotonicClock,
        offset_secs: AtomicI64,
    }

    impl Clock for ShiftedClock {
        fn now(&self) -> NaiveDateTime {
            self.inner.now() + TimeDelta::seconds(self.offset_secs.load(Ordering::SeqCst))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn early_timer_rearms() {
        let clock = Arc::new(ShiftedClock {
            inner: MonotonicClock::starting_at(start()),
            offset_secs: AtomicI64::new(0),
        });
        let s = scheduler_with(clock.clone());
        let (callbacks, counters) = counting_callbacks();
        let control = s
            .schedule(
                VIDEO_URL,
                DownloadOptions::default(),
                ScheduleRule::once(start() + TimeDelta::hours(1)),
                callbacks,
            )
            .unwrap();

        sleep_secs(60).await;
        clock.offset_secs.store(-600, Ordering::SeqCst);

        sleep_secs(HOUR).await;
        assert_eq!(counters.complete.load(Ordering::SeqCst), 0);
        assert_eq!(control.status().phase, SchedulePhase::Scheduled);

        sleep_secs(600).await;
        assert_eq!(counters.complete.load(Ordering::SeqCst), 1);
    }
}
