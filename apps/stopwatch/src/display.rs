//! Screen text and the periodic redraw task.

use std::{sync::Arc, time::Duration};

use shared::{domain::format_elapsed, protocol::Command};
use stopwatch_core::Stopwatch;
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::console::Console;

pub const RULE: &str = "====================================================";
pub const TITLE: &str = "                Console Stopwatch                   ";
pub const INVALID_COMMAND: &str = "Invalid command. Please try again.";
pub const FAREWELL: &str = "Thank you for using the Stopwatch. Goodbye!";

pub fn prompt() -> String {
    let keys: Vec<String> = Command::ALL.iter().map(|c| c.key().to_string()).collect();
    format!("Enter command ({}): ", keys.join("/"))
}

/// Banner and command legend printed once at startup.
pub fn welcome_lines() -> Vec<String> {
    let mut lines = vec![RULE.to_string(), TITLE.to_string(), RULE.to_string()];
    lines.push("Commands:".to_string());
    lines.extend(
        Command::ALL
            .iter()
            .map(|c| format!(" {} - {}", c.key(), c.label())),
    );
    lines.push(RULE.to_string());
    lines
}

pub fn frame_lines(elapsed: Duration) -> Vec<String> {
    let legend: Vec<String> = Command::ALL
        .iter()
        .map(|c| format!("{} - {}", c.key(), c.label()))
        .collect();
    vec![
        RULE.to_string(),
        TITLE.to_string(),
        RULE.to_string(),
        format!("Current Time Elapsed: {}", format_elapsed(elapsed)),
        RULE.to_string(),
        "Commands:".to_string(),
        format!(" {}", legend.join(" | ")),
        RULE.to_string(),
    ]
}

pub fn notification_line(message: &str) -> String {
    format!("[INFO]: {message}")
}

/// Redraws the elapsed time every `refresh` while the stopwatch runs.
/// Idle periods leave the screen untouched. Exits when `token` is
/// cancelled or the console can no longer be written.
pub fn spawn_display(
    stopwatch: Arc<Stopwatch>,
    console: Console,
    refresh: Duration,
    clear_screen: bool,
    token: CancellationToken,
) -> JoinHandle<()> {
    let first_refresh = time::Instant::now() + refresh;
    tokio::spawn(async move {
        let mut ticks = time::interval_at(first_refresh, refresh);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let prompt = prompt();
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticks.tick() => {}
            }

            let snapshot = stopwatch.snapshot().await;
            if !snapshot.running {
                continue;
            }
            if let Err(err) = console.redraw(&frame_lines(snapshot.elapsed), &prompt, clear_screen)
            {
                warn!("display redraw failed: {err}");
                break;
            }
        }
        debug!("display task exited");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_command_key() {
        assert_eq!(prompt(), "Enter command (S/T/R/Q): ");
    }

    #[test]
    fn welcome_has_banner_and_legend() {
        let lines = welcome_lines();
        assert_eq!(lines[1], TITLE);
        assert!(lines.contains(&" S - Start".to_string()));
        assert!(lines.contains(&" T - Stop".to_string()));
        assert!(lines.contains(&" R - Reset".to_string()));
        assert!(lines.contains(&" Q - Quit".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some(RULE));
    }

    #[test]
    fn frame_shows_formatted_elapsed_and_compact_legend() {
        let lines = frame_lines(Duration::from_secs(65));
        assert!(lines.contains(&"Current Time Elapsed: 00:01:05".to_string()));
        assert!(lines.contains(&" S - Start | T - Stop | R - Reset | Q - Quit".to_string()));
    }

    #[test]
    fn notification_lines_are_tagged() {
        assert_eq!(notification_line("hi"), "[INFO]: hi");
    }
}
