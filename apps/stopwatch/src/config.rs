use std::time::Duration;

use clap::Parser;
use shared::error::SettingsError;
use tracing_subscriber::EnvFilter;

use crate::input::InputMode;

#[derive(Parser, Debug)]
#[command(version, about = "Console stopwatch (S start, T stop, R reset, Q quit)")]
pub struct Args {
    /// Display refresh cadence in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub refresh_ms: u64,
    /// Real wait between ticks; every tick still adds one second.
    #[arg(long, default_value_t = 1000, hide = true)]
    pub tick_ms: u64,
    /// tracing filter directive, e.g. `info` or `stopwatch_core=debug`.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
    /// Redraw below the previous frame instead of clearing the screen.
    #[arg(long)]
    pub no_clear: bool,
    /// Read one command per line from stdin instead of single keypresses.
    #[arg(long)]
    pub line_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub refresh_interval: Duration,
    pub tick_interval: Duration,
    pub log_filter: String,
    pub clear_screen: bool,
    pub input_mode: InputMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(500),
            tick_interval: stopwatch_core::DEFAULT_TICK_INTERVAL,
            log_filter: "warn".into(),
            clear_screen: true,
            input_mode: InputMode::Raw,
        }
    }
}

impl Settings {
    /// Line mode is forced when stdin is not a terminal, since raw
    /// keypresses cannot be read from a pipe.
    pub fn from_args(args: Args, stdin_is_terminal: bool) -> Result<Self, SettingsError> {
        if args.refresh_ms == 0 {
            return Err(SettingsError::ZeroInterval { name: "refresh-ms" });
        }
        if args.tick_ms == 0 {
            return Err(SettingsError::ZeroInterval { name: "tick-ms" });
        }

        let log_filter = args.log_level.trim().to_string();
        EnvFilter::try_new(&log_filter).map_err(|err| SettingsError::InvalidLogFilter {
            filter: log_filter.clone(),
            message: err.to_string(),
        })?;

        let input_mode = if args.line_mode || !stdin_is_terminal {
            InputMode::Lines
        } else {
            InputMode::Raw
        };

        Ok(Self {
            refresh_interval: Duration::from_millis(args.refresh_ms),
            tick_interval: Duration::from_millis(args.tick_ms),
            log_filter,
            clear_screen: !args.no_clear,
            input_mode,
        })
    }

    /// Raw mode turns off newline translation, so log lines written to a
    /// terminal would stair-step across the redrawn screen. Logging then
    /// only reaches a redirected stderr.
    pub fn effective_log_filter(&self, stderr_is_terminal: bool) -> &str {
        if self.input_mode == InputMode::Raw && stderr_is_terminal {
            "off"
        } else {
            &self.log_filter
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
