use std::{
    io::{self, IsTerminal},
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use stopwatch_core::Stopwatch;
use tracing_subscriber::EnvFilter;

mod config;
mod console;
mod display;
mod input;
mod session;
mod terminal;

use config::{Args, Settings};
use console::Console;
use input::{InputMode, InputPump};
use session::SessionOptions;
use terminal::TerminalSession;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::from_args(args, io::stdin().is_terminal())?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(
            settings.effective_log_filter(io::stderr().is_terminal()),
        )?)
        .with_writer(io::stderr)
        .init();

    let raw_mode = settings.input_mode == InputMode::Raw;
    let _terminal = if raw_mode {
        Some(TerminalSession::enter()?)
    } else {
        None
    };

    let stopwatch = Arc::new(Stopwatch::with_tick_interval(settings.tick_interval));
    let mut input = InputPump::spawn(settings.input_mode);
    let result = session::run(
        stopwatch,
        Console::stdout(raw_mode),
        &mut input,
        &SessionOptions::from_settings(&settings),
    )
    .await;
    input.shutdown().await;

    result
}
