use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use shared::{error::CommandError, protocol::Command};
use stopwatch_core::Stopwatch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    console::Console,
    display::{self, FAREWELL, INVALID_COMMAND, RULE},
    input::{InputEvent, InputMode, InputPump},
};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub refresh_interval: Duration,
    pub clear_screen: bool,
    /// Echo each key after the prompt; raw mode does not echo input.
    pub echo_keys: bool,
}

impl SessionOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            refresh_interval: settings.refresh_interval,
            clear_screen: settings.clear_screen,
            echo_keys: settings.input_mode == InputMode::Raw,
        }
    }
}

/// Runs the interactive session until Quit, end of input, or an I/O error.
///
/// The stopwatch is never left running and the display task is joined
/// before this returns, whichever way the loop ends.
pub async fn run(
    stopwatch: Arc<Stopwatch>,
    console: Console,
    input: &mut InputPump,
    options: &SessionOptions,
) -> Result<()> {
    console
        .print_lines(display::welcome_lines())
        .context("failed to print banner")?;

    let subscriptions = {
        let console = console.clone();
        stopwatch.notifications().subscribe_all(move |notification| {
            if let Err(err) = console.print_lines([display::notification_line(&notification.message)])
            {
                warn!("failed to print notification: {err}");
            }
        })
    };

    let display_token = CancellationToken::new();
    let display_task = display::spawn_display(
        Arc::clone(&stopwatch),
        console.clone(),
        options.refresh_interval,
        options.clear_screen,
        display_token.clone(),
    );

    let result = command_loop(&stopwatch, &console, input, options.echo_keys).await;
    if result.is_err() && stopwatch.is_running().await {
        stopwatch.stop().await;
    }

    display_token.cancel();
    if let Err(err) = display_task.await {
        warn!("display task terminated abnormally: {err}");
    }
    for id in subscriptions {
        stopwatch.notifications().unsubscribe(id);
    }
    info!("session ended");
    result
}

async fn command_loop(
    stopwatch: &Stopwatch,
    console: &Console,
    input: &mut InputPump,
    echo_keys: bool,
) -> Result<()> {
    let prompt = display::prompt();
    loop {
        console.print(&prompt)?;
        let event = input.next().await;
        if echo_keys {
            if let InputEvent::Key(key) = &event {
                console.print(&key.to_string())?;
            }
            console.end_line()?;
        }

        let command = match event {
            InputEvent::Key(key) => Command::from_key(key),
            InputEvent::Other => Err(CommandError::NonCharacterKey),
            InputEvent::Closed => {
                debug!("input closed; quitting");
                Ok(Command::Quit)
            }
            InputEvent::Error(message) => bail!("failed to read input: {message}"),
        };

        let command = match command {
            Ok(command) => command,
            Err(err) => {
                debug!(%err, "rejected command");
                console.print_lines([INVALID_COMMAND])?;
                continue;
            }
        };

        debug!(command = command.label(), "dispatching command");
        match command {
            Command::Start => stopwatch.start().await,
            Command::Stop => stopwatch.stop().await,
            Command::Reset => stopwatch.reset().await,
            Command::Quit => {
                stopwatch.stop().await;
                console.print_lines([FAREWELL, RULE])?;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
