use std::{sync::Arc, time::Duration};

use shared::domain::{format_elapsed, Notification, NotificationKind};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod notifications;
pub use notifications::{NotificationHandler, NotificationHub, SubscriptionId};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
/// Amount added to `elapsed` per tick, independent of the tick interval.
const TICK_INCREMENT: Duration = Duration::from_secs(1);

pub const STARTED_MESSAGE: &str = "Stopwatch Started!";
pub const ALREADY_RUNNING_MESSAGE: &str = "Stopwatch is already running.";
pub const NOT_RUNNING_MESSAGE: &str = "Stopwatch is not running.";
pub const RESET_MESSAGE: &str = "Stopwatch Reset!";

pub fn stopped_message(elapsed: Duration) -> String {
    format!(
        "Stopwatch Stopped! Total Time Elapsed: {}",
        format_elapsed(elapsed)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopwatchSnapshot {
    pub elapsed: Duration,
    pub running: bool,
}

struct Ticker {
    token: CancellationToken,
    task: JoinHandle<()>,
}

struct StopwatchState {
    elapsed: Duration,
    running: bool,
    /// Present exactly while `running` is true.
    ticker: Option<Ticker>,
}

pub struct Stopwatch {
    tick_interval: Duration,
    state: Arc<Mutex<StopwatchState>>,
    /// Serializes Start/Stop/Reset end to end, including the tick loop join
    /// and the notifications, so observers see transitions in state order.
    /// Never held by the tick loop. Observers run while it is held, so they
    /// must not call back into Start/Stop/Reset.
    commands: Mutex<()>,
    notifications: NotificationHub,
    /// Parent of every tick loop token; cancelled on drop.
    lifetime: CancellationToken,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::with_tick_interval(DEFAULT_TICK_INTERVAL)
    }

    /// Each tick still adds exactly one second; only the real wait changes.
    /// A zero interval is clamped to one millisecond.
    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        Self {
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            state: Arc::new(Mutex::new(StopwatchState {
                elapsed: Duration::ZERO,
                running: false,
                ticker: None,
            })),
            commands: Mutex::new(()),
            notifications: NotificationHub::new(),
            lifetime: CancellationToken::new(),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn notifications(&self) -> &NotificationHub {
        &self.notifications
    }

    pub fn on_started<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.notifications.subscribe(NotificationKind::Started, handler)
    }

    pub fn on_stopped<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.notifications.subscribe(NotificationKind::Stopped, handler)
    }

    pub fn on_reset<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.notifications.subscribe(NotificationKind::Reset, handler)
    }

    pub async fn time_elapsed(&self) -> Duration {
        self.state.lock().await.elapsed
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    /// Reads `elapsed` and `running` under a single lock acquisition.
    pub async fn snapshot(&self) -> StopwatchSnapshot {
        let state = self.state.lock().await;
        StopwatchSnapshot {
            elapsed: state.elapsed,
            running: state.running,
        }
    }

    /// Must be called from within a tokio runtime.
    pub async fn start(&self) {
        let _command = self.commands.lock().await;
        let notification = {
            let mut state = self.state.lock().await;
            if state.running {
                debug!("start ignored: already running");
                Notification::new(
                    NotificationKind::Started,
                    ALREADY_RUNNING_MESSAGE,
                    state.elapsed,
                )
            } else {
                let token = self.lifetime.child_token();
                state.running = true;
                let task = self.spawn_tick_loop(token.clone());
                state.ticker = Some(Ticker { token, task });
                info!(elapsed_secs = state.elapsed.as_secs(), "stopwatch started");
                Notification::new(NotificationKind::Started, STARTED_MESSAGE, state.elapsed)
            }
        };
        self.notifications.emit(&notification);
    }

    pub async fn stop(&self) {
        let _command = self.commands.lock().await;
        let (notification, task) = {
            let mut state = self.state.lock().await;
            if state.running {
                let task = halt(&mut state);
                let elapsed = state.elapsed;
                (
                    Notification::new(NotificationKind::Stopped, stopped_message(elapsed), elapsed),
                    task,
                )
            } else {
                debug!("stop ignored: not running");
                (
                    Notification::new(
                        NotificationKind::Stopped,
                        NOT_RUNNING_MESSAGE,
                        state.elapsed,
                    ),
                    None,
                )
            }
        };

        if let Some(task) = task {
            join_tick_loop(task).await;
        }
        self.notifications.emit(&notification);
    }

    /// Stops (with its Stopped notification) when running, then zeroes
    /// `elapsed`. Never leaves the stopwatch running.
    pub async fn reset(&self) {
        let _command = self.commands.lock().await;
        let (stopped, task) = {
            let mut state = self.state.lock().await;
            let stopped = if state.running {
                let task = halt(&mut state);
                let elapsed = state.elapsed;
                let notification =
                    Notification::new(NotificationKind::Stopped, stopped_message(elapsed), elapsed);
                (Some(notification), task)
            } else {
                (None, None)
            };
            state.elapsed = Duration::ZERO;
            info!("stopwatch reset");
            stopped
        };

        if let Some(task) = task {
            join_tick_loop(task).await;
        }
        if let Some(notification) = stopped {
            self.notifications.emit(&notification);
        }
        self.notifications.emit(&Notification::new(
            NotificationKind::Reset,
            RESET_MESSAGE,
            Duration::ZERO,
        ));
    }

    fn spawn_tick_loop(&self, token: CancellationToken) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let period = self.tick_interval;
        let first_tick = time::Instant::now() + period;
        tokio::spawn(async move {
            let mut ticks = time::interval_at(first_tick, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {}
                }

                let mut guard = state.lock().await;
                // Stop cancels while holding the lock, so this check makes
                // the increment and the cancellation mutually exclusive.
                if token.is_cancelled() {
                    break;
                }
                guard.elapsed += TICK_INCREMENT;
                debug!(elapsed_secs = guard.elapsed.as_secs(), "tick");
            }
            debug!("tick loop exited");
        })
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

/// Cancels the active tick loop and clears `running`, in that order.
fn halt(state: &mut StopwatchState) -> Option<JoinHandle<()>> {
    let task = state.ticker.take().map(|ticker| {
        ticker.token.cancel();
        ticker.task
    });
    state.running = false;
    info!(elapsed_secs = state.elapsed.as_secs(), "stopwatch stopped");
    task
}

async fn join_tick_loop(task: JoinHandle<()>) {
    if let Err(err) = task.await {
        if !err.is_cancelled() {
            warn!("tick loop terminated abnormally: {err}");
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
