use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use shared::domain::NotificationKind;
use stopwatch_core::{Stopwatch, RESET_MESSAGE};

#[tokio::test(start_paused = true)]
async fn start_wait_stop_reports_three_seconds() {
    let stopwatch = Stopwatch::new();
    let stopped = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&stopped);
    stopwatch.on_stopped(move |n| sink.lock().expect("lock").push(n.clone()));

    stopwatch.start().await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    stopwatch.stop().await;

    let stopped = stopped.lock().expect("lock");
    assert_eq!(stopped.len(), 1);
    let secs = stopped[0].elapsed.as_secs();
    assert!((2..=4).contains(&secs), "elapsed {secs}s outside tolerance");
}

#[tokio::test(start_paused = true)]
async fn start_then_reset_without_stop_ends_idle_at_zero() {
    let stopwatch = Stopwatch::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    stopwatch
        .notifications()
        .subscribe_all(move |n| sink.lock().expect("lock").push((n.kind, n.message.clone())));

    stopwatch.start().await;
    tokio::time::sleep(Duration::from_millis(1_200)).await;
    stopwatch.reset().await;

    let seen = seen.lock().expect("lock");
    let stopped_count = seen
        .iter()
        .filter(|(kind, _)| *kind == NotificationKind::Stopped)
        .count();
    assert_eq!(stopped_count, 1);
    assert_eq!(
        seen.last(),
        Some(&(NotificationKind::Reset, RESET_MESSAGE.to_string()))
    );
    assert!(!stopwatch.is_running().await);
    assert_eq!(stopwatch.time_elapsed().await, Duration::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_starts_spawn_a_single_tick_loop() {
    let stopwatch = Arc::new(Stopwatch::with_tick_interval(Duration::from_millis(20)));
    let started = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&started);
    stopwatch.on_started(move |n| {
        if n.message == stopwatch_core::STARTED_MESSAGE {
            *sink.lock().expect("lock") += 1;
        }
    });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let stopwatch = Arc::clone(&stopwatch);
            tokio::spawn(async move { stopwatch.start().await })
        })
        .collect();
    for handle in handles {
        handle.await.expect("start task");
    }

    assert_eq!(*started.lock().expect("lock"), 1);
    stopwatch.stop().await;
    assert!(!stopwatch.is_running().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_stop_and_start_notify_in_state_order() {
    let stopwatch = Arc::new(Stopwatch::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    stopwatch
        .notifications()
        .subscribe_all(move |n| sink.lock().expect("lock").push(n.kind));

    for round in 0..500 {
        stopwatch.start().await;
        seen.lock().expect("lock").clear();

        let stopper = {
            let stopwatch = Arc::clone(&stopwatch);
            tokio::spawn(async move { stopwatch.stop().await })
        };
        let starter = {
            let stopwatch = Arc::clone(&stopwatch);
            tokio::spawn(async move { stopwatch.start().await })
        };
        stopper.await.expect("stop task");
        starter.await.expect("start task");

        let running = stopwatch.is_running().await;
        let last = *seen.lock().expect("lock").last().expect("notifications");
        let expected = if running {
            NotificationKind::Started
        } else {
            NotificationKind::Stopped
        };
        assert_eq!(last, expected, "round {round}: running={running}");

        stopwatch.stop().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_reset_and_start_never_report_reset_after_start() {
    let stopwatch = Arc::new(Stopwatch::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    stopwatch
        .notifications()
        .subscribe_all(move |n| sink.lock().expect("lock").push(n.kind));

    for round in 0..500 {
        stopwatch.start().await;
        seen.lock().expect("lock").clear();

        let resetter = {
            let stopwatch = Arc::clone(&stopwatch);
            tokio::spawn(async move { stopwatch.reset().await })
        };
        let starter = {
            let stopwatch = Arc::clone(&stopwatch);
            tokio::spawn(async move { stopwatch.start().await })
        };
        resetter.await.expect("reset task");
        starter.await.expect("start task");

        let running = stopwatch.is_running().await;
        let last = *seen.lock().expect("lock").last().expect("notifications");
        if running {
            assert_eq!(last, NotificationKind::Started, "round {round}");
        } else {
            assert_eq!(last, NotificationKind::Reset, "round {round}");
        }

        stopwatch.stop().await;
    }
}
