//! Shared console writer used by the command loop, notification observers
//! and the display task.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

use crossterm::{
    cursor::MoveTo,
    terminal::{Clear, ClearType},
    QueueableCommand,
};

#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
    line_ending: &'static str,
}

impl Console {
    /// Raw mode disables the terminal's newline translation, so lines must
    /// end with `\r\n` there.
    pub fn stdout(raw_mode: bool) -> Self {
        Self::new(io::stdout(), if raw_mode { "\r\n" } else { "\n" })
    }

    pub fn new(writer: impl Write + Send + 'static, line_ending: &'static str) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
            line_ending,
        }
    }

    pub fn print_lines<I, S>(&self, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = self.lock();
        for line in lines {
            out.write_all(line.as_ref().as_bytes())?;
            out.write_all(self.line_ending.as_bytes())?;
        }
        out.flush()
    }

    /// Writes without a trailing line ending, for prompts.
    pub fn print(&self, text: &str) -> io::Result<()> {
        let mut out = self.lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    pub fn end_line(&self) -> io::Result<()> {
        self.print(self.line_ending)
    }

    /// Writes a whole frame under one lock so concurrent notifications never
    /// land in the middle of it.
    pub fn redraw(&self, lines: &[String], trailer: &str, clear: bool) -> io::Result<()> {
        let mut guard = self.lock();
        let out: &mut Box<dyn Write + Send> = &mut guard;
        if clear {
            out.queue(Clear(ClearType::All))?.queue(MoveTo(0, 0))?;
        }
        for line in lines {
            out.write_all(line.as_bytes())?;
            out.write_all(self.line_ending.as_bytes())?;
        }
        out.write_all(trailer.as_bytes())?;
        out.flush()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Box<dyn Write + Send>> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory writer for capturing console output in tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl CaptureBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("capture lock")).into_owned()
    }
}

#[cfg(test)]
impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("capture lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
