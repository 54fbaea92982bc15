//! Per-question countdown.
//!
//! `Countdown` is a plain value advanced by `tick()`, so its behavior can be
//! checked by counting ticks. `QuestionTimer` drives one from a tokio task at one
//! tick per second and reports expiry on an mpsc channel.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::debug;
use uuid::Uuid;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running; nothing changed.
    Inactive,
    Remaining(u32),
    /// Reached zero on this tick. Returned at most once per run.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    limit: u32,
    remaining: u32,
    state: TimerState,
}

impl Countdown {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            remaining: limit,
            state: TimerState::Idle,
        }
    }

    /// Countdown for `limit` that has already been partly used.
    pub fn with_remaining(limit: u32, remaining: u32) -> Self {
        Self {
            limit,
            remaining: remaining.min(limit),
            state: TimerState::Idle,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn elapsed(&self) -> u32 {
        self.limit.saturating_sub(self.remaining)
    }

    /// Begins (or restarts) ticking from the current remaining value.
    pub fn start(&mut self) {
        self.state = TimerState::Running;
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    /// Continues from the frozen value. A countdown with nothing left stays put.
    pub fn resume(&mut self) {
        if self.state == TimerState::Paused && self.remaining > 0 {
            self.state = TimerState::Running;
        }
    }

    /// Sets remaining to `value` (or the original limit) and stops ticking.
    pub fn reset(&mut self, value: Option<u32>) {
        self.remaining = value.unwrap_or(self.limit);
        self.state = TimerState::Idle;
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Idle;
    }

    pub fn tick(&mut self) -> Tick {
        if self.state != TimerState::Running {
            return Tick::Inactive;
        }
        if self.remaining <= 1 {
            self.remaining = 0;
            self.state = TimerState::Expired;
            return Tick::Expired;
        }
        self.remaining -= 1;
        Tick::Remaining(self.remaining)
    }
}

/// Renders seconds as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerExpired {
    pub candidate_id: Uuid,
    pub question_index: usize,
}

/// A running countdown for one question of one candidate.
///
/// `stop` freezes it where it is. Dropping the timer aborts its task as well, so
/// no expiry is delivered after either.
pub struct QuestionTimer {
    question_index: usize,
    countdown: Arc<Mutex<Countdown>>,
    task: JoinHandle<()>,
}

impl QuestionTimer {
    /// Starts ticking `countdown` immediately.
    pub fn start(
        candidate_id: Uuid,
        question_index: usize,
        mut countdown: Countdown,
        expired_tx: UnboundedSender<TimerExpired>,
    ) -> Self {
        countdown.start();
        let countdown = Arc::new(Mutex::new(countdown));
        let event = TimerExpired {
            candidate_id,
            question_index,
        };
        let task = tokio::spawn(drive(Arc::clone(&countdown), event, expired_tx));
        Self {
            question_index,
            countdown,
            task,
        }
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn remaining(&self) -> u32 {
        self.lock().remaining()
    }

    pub fn pause(&self) -> u32 {
        let mut countdown = self.lock();
        countdown.pause();
        countdown.remaining()
    }

    /// Returns whether the countdown is running afterwards. An expired countdown
    /// cannot be resumed; its task has already finished.
    pub fn resume(&self) -> bool {
        let mut countdown = self.lock();
        countdown.resume();
        countdown.state() == TimerState::Running
    }

    /// Halts the countdown for good and returns the seconds it ran.
    pub fn stop(&self) -> u32 {
        self.task.abort();
        let mut countdown = self.lock();
        countdown.stop();
        countdown.elapsed()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Countdown> {
        self.countdown.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drive(
    countdown: Arc<Mutex<Countdown>>,
    event: TimerExpired,
    expired_tx: UnboundedSender<TimerExpired>,
) {
    let mut ticks = interval_at(Instant::now() + TICK, TICK);
    loop {
        ticks.tick().await;
        let tick = countdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tick();
        if tick == Tick::Expired {
            debug!(
                "Question {} timer expired for candidate {}",
                event.question_index, event.candidate_id
            );
            // Receiver gone means the service is shutting down.
            let _ = expired_tx.send(event);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn run_ticks(countdown: &mut Countdown, n: usize) -> Vec<Tick> {
        (0..n).map(|_| countdown.tick()).collect()
    }

    #[test]
    fn test_idle_countdown_does_not_tick() {
        let mut c = Countdown::new(5);
        assert_eq!(c.tick(), Tick::Inactive);
        assert_eq!(c.remaining(), 5);
    }

    #[test]
    fn test_expires_exactly_once() {
        let mut c = Countdown::new(3);
        c.start();
        let ticks = run_ticks(&mut c, 6);
        assert_eq!(
            ticks,
            vec![
                Tick::Remaining(2),
                Tick::Remaining(1),
                Tick::Expired,
                Tick::Inactive,
                Tick::Inactive,
                Tick::Inactive,
            ]
        );
        assert_eq!(c.state(), TimerState::Expired);
        assert_eq!(c.elapsed(), 3);
    }

    #[test]
    fn test_pause_resume_without_ticks_keeps_remaining() {
        let mut c = Countdown::new(120);
        c.start();
        c.tick();
        c.pause();
        c.resume();
        assert_eq!(c.remaining(), 119);
        assert_eq!(c.state(), TimerState::Running);
    }

    #[test]
    fn test_ticks_while_paused_are_ignored() {
        let mut c = Countdown::new(10);
        c.start();
        run_ticks(&mut c, 4);
        c.pause();
        assert!(run_ticks(&mut c, 100).iter().all(|t| *t == Tick::Inactive));
        assert_eq!(c.remaining(), 6);
        c.resume();
        assert_eq!(c.tick(), Tick::Remaining(5));
    }

    #[test]
    fn test_resume_requires_time_left() {
        let mut c = Countdown::with_remaining(10, 0);
        c.start();
        c.pause();
        c.resume();
        assert_eq!(c.state(), TimerState::Paused);
    }

    #[test]
    fn test_reset_stops_and_restores() {
        let mut c = Countdown::new(90);
        c.start();
        run_ticks(&mut c, 10);
        c.reset(None);
        assert_eq!(c.remaining(), 90);
        assert_eq!(c.tick(), Tick::Inactive);

        c.reset(Some(30));
        assert_eq!(c.remaining(), 30);
        assert_eq!(c.state(), TimerState::Idle);
    }

    #[test]
    fn test_stop_before_expiry_prevents_firing() {
        let mut c = Countdown::new(2);
        c.start();
        c.tick();
        c.stop();
        assert_eq!(c.tick(), Tick::Inactive);
        assert_eq!(c.remaining(), 1);
    }

    #[test]
    fn test_with_remaining_is_capped_at_limit() {
        let c = Countdown::with_remaining(60, 500);
        assert_eq!(c.remaining(), 60);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(360), "6:00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_question_timer_reports_expiry_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let started = Instant::now();
        let _timer = QuestionTimer::start(id, 2, Countdown::new(3), tx);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            TimerExpired {
                candidate_id: id,
                question_index: 2
            }
        );
        assert_eq!(started.elapsed(), Duration::from_secs(3));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_question_timer_pause_freezes_countdown() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = QuestionTimer::start(Uuid::new_v4(), 0, Countdown::new(10), tx);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(timer.pause(), 7);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(timer.remaining(), 7);
        assert!(rx.try_recv().is_err());

        assert!(timer.resume());
        assert!(rx.recv().await.is_some());
        assert_eq!(timer.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_timer_cannot_resume() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = QuestionTimer::start(Uuid::new_v4(), 0, Countdown::new(2), tx);
        assert!(rx.recv().await.is_some());

        assert_eq!(timer.pause(), 0);
        assert!(!timer.resume());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_timer_reports_elapsed_and_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = QuestionTimer::start(Uuid::new_v4(), 1, Countdown::new(5), tx);
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(timer.stop(), 3);
        assert!(!timer.resume());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(timer.remaining(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = QuestionTimer::start(Uuid::new_v4(), 0, Countdown::new(2), tx.clone());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        drop(timer);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        drop(tx);
    }
}
