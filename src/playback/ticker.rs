// One-second progress ticker
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Identifies one playback session. Ticks carry it so the controller can
/// drop ticks that belong to a session that no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Counter moved forward to this many seconds
    Advanced(u64),
    /// Counter had already reached the target; the session is over
    Completed,
}

/// Cancels the repeating timer when dropped.
pub struct TickerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TickerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with no timer behind it; ticks are delivered by hand
    pub fn manual() -> Self {
        Self { cancel: None }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Starts the repeating timer that feeds [`ProgressTicker::tick`].
pub trait TickScheduler {
    fn start(&self, session: SessionId) -> TickerHandle;
}

/// Elapsed-second counter for one session, capped at the session's length.
pub struct ProgressTicker {
    session: SessionId,
    elapsed: u64,
    target: u64,
    _timer: TickerHandle,
}

impl ProgressTicker {
    pub fn new(session: SessionId, target: u64, timer: TickerHandle) -> Self {
        Self {
            session,
            elapsed: 0,
            target,
            _timer: timer,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.elapsed < self.target {
            self.elapsed += 1;
            TickOutcome::Advanced(self.elapsed)
        } else {
            TickOutcome::Completed
        }
    }
}

/// Ticks once per second on a tokio runtime until the handle is dropped or
/// `on_tick` returns false.
pub struct TokioTickScheduler {
    runtime: Handle,
    period: Duration,
    on_tick: Arc<dyn Fn(SessionId) -> bool + Send + Sync>,
}

impl TokioTickScheduler {
    pub fn new(runtime: Handle, on_tick: impl Fn(SessionId) -> bool + Send + Sync + 'static) -> Self {
        Self {
            runtime,
            period: Duration::from_secs(1),
            on_tick: Arc::new(on_tick),
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }
}

impl TickScheduler for TokioTickScheduler {
    fn start(&self, session: SessionId) -> TickerHandle {
        let period = self.period;
        let on_tick = Arc::clone(&self.on_tick);

        let task = self.runtime.spawn(async move {
            // First tick lands one period after start, not immediately
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                timer.tick().await;
                if !on_tick(session) {
                    break;
                }
            }
        });

        let abort = task.abort_handle();
        TickerHandle::new(move || {
            debug!("Cancelling ticker for session {}", session);
            abort.abort();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    #[test]
    fn counts_up_to_target_then_completes() {
        let mut ticker = ProgressTicker::new(SessionId(1), 2, TickerHandle::manual());
        assert_eq!(ticker.tick(), TickOutcome::Advanced(1));
        assert_eq!(ticker.tick(), TickOutcome::Advanced(2));
        assert_eq!(ticker.tick(), TickOutcome::Completed);
        assert_eq!(ticker.elapsed(), 2);
    }

    #[test]
    fn zero_length_session_completes_on_first_tick() {
        let mut ticker = ProgressTicker::new(SessionId(7), 0, TickerHandle::manual());
        assert_eq!(ticker.tick(), TickOutcome::Completed);
    }

    #[test]
    fn dropping_the_ticker_cancels_its_timer() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let ticker = ProgressTicker::new(
            SessionId(3),
            10,
            TickerHandle::new(move || flag.store(true, Ordering::SeqCst)),
        );
        assert!(!cancelled.load(Ordering::SeqCst));
        drop(ticker);
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tokio_scheduler_stops_after_handle_drop() {
        let ticks = Arc::new(AtomicU64::new(0));
        let counter = ticks.clone();
        let scheduler = TokioTickScheduler::new(Handle::current(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .with_period(Duration::from_millis(10));

        let handle = scheduler.start(SessionId(1));
        tokio::time::sleep(Duration::from_millis(80)).await;
        drop(handle);
        let after_cancel = ticks.load(Ordering::SeqCst);
        assert!(after_cancel > 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(ticks.load(Ordering::SeqCst) <= after_cancel + 1);
    }
}
