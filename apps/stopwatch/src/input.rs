//! Keypress input for the command loop.

use std::{
    io::{self, BufRead},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tracing::debug;

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(50); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 64;
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Single keypresses read through crossterm in raw mode.
    Raw,
    /// One command per stdin line; the first non-blank character is the key.
    Lines,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(char),
    /// A key with no character, such as Enter or an arrow.
    Other,
    Closed,
    Error(String),
}

pub struct InputPump {
    rx: mpsc::Receiver<InputEvent>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    /// Raw mode reads on a blocking task that polls `stop`. Line mode reads
    /// on a detached thread, since a blocked stdin read cannot be
    /// interrupted and would otherwise hold up runtime shutdown.
    pub fn spawn(mode: InputMode) -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));

        let join = match mode {
            InputMode::Raw => {
                let stop = Arc::clone(&stop);
                Some(tokio::task::spawn_blocking(move || raw_input_loop(stop, tx)))
            }
            InputMode::Lines => {
                let stop = Arc::clone(&stop);
                std::thread::spawn(move || line_input_loop(stop, tx));
                None
            }
        };

        Self { rx, stop, join }
    }

    #[cfg(test)]
    pub fn from_receiver(rx: mpsc::Receiver<InputEvent>) -> Self {
        Self {
            rx,
            stop: Arc::new(AtomicBool::new(false)),
            join: None,
        }
    }

    /// Returns `Closed` once every sender is gone.
    pub async fn next(&mut self) -> InputEvent {
        self.rx.recv().await.unwrap_or(InputEvent::Closed)
    }

    pub async fn shutdown(&mut self) {
        self.rx.close();
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, join).await;
        }
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn raw_input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputEvent>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    let Some(input) = map_terminal_event(&ev) else {
                        continue;
                    };
                    if tx.blocking_send(input).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputEvent::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputEvent::Error(e.to_string()));
                break;
            }
        }
    }
    debug!("raw input loop exited");
}

fn line_input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputEvent>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        if stop.load(Ordering::Acquire) {
            return;
        }
        let input = match line {
            Ok(line) => match map_line(&line) {
                Some(input) => input,
                None => continue,
            },
            Err(e) => InputEvent::Error(e.to_string()),
        };
        let failed = matches!(input, InputEvent::Error(_));
        if tx.blocking_send(input).is_err() || failed {
            return;
        }
    }
    let _ = tx.blocking_send(InputEvent::Closed);
}

/// Only key presses count; releases and repeats (reported on some
/// platforms) and non-key events are dropped. Ctrl+C quits, since raw mode
/// swallows the interrupt signal.
fn map_terminal_event(event: &Event) -> Option<InputEvent> {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        ..
    }) = event
    else {
        return None;
    };

    match code {
        KeyCode::Char('c') | KeyCode::Char('C') if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Key('Q'))
        }
        KeyCode::Char(c) => Some(InputEvent::Key(*c)),
        KeyCode::Modifier(_) => None,
        _ => Some(InputEvent::Other),
    }
}

fn map_line(line: &str) -> Option<InputEvent> {
    line.trim_start().chars().next().map(InputEvent::Key)
}
