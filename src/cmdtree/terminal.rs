//! Injected input and output streams.
//!
//! The framework never touches stdin/stdout directly; it talks to a [`Terminal`].
//! [`StdTerminal`] is the process-backed implementation used by binaries, and
//! [`MemoryTerminal`] scripts input and captures output for tests.

use console::Term;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal};

/// Line-oriented output sinks plus a line-oriented input source.
pub trait Terminal {
    fn write_out(&mut self, text: &str) -> io::Result<()>;

    fn write_err(&mut self, text: &str) -> io::Result<()>;

    /// Reads one line without its terminator. `None` means the input is closed.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Like [`Terminal::read_line`], but the entered characters are not echoed.
    fn read_secret_line(&mut self) -> io::Result<Option<String>>;
}

/// Process stdout/stderr (via `console`) and stdin.
pub struct StdTerminal {
    out: Term,
    err: Term,
}

impl StdTerminal {
    pub fn new() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
        }
    }
}

impl Default for StdTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for StdTerminal {
    fn write_out(&mut self, text: &str) -> io::Result<()> {
        self.out.write_str(text)
    }

    fn write_err(&mut self, text: &str) -> io::Result<()> {
        self.err.write_str(text)
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(line)))
    }

    fn read_secret_line(&mut self) -> io::Result<Option<String>> {
        // Piped input has no echo to suppress.
        if !io::stdin().is_terminal() {
            return self.read_line();
        }
        self.out.read_secure_line().map(Some)
    }
}

fn strip_line_ending(mut line: String) -> String {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

/// Scripted input and captured output.
///
/// Lines read with [`Terminal::read_line`] are echoed into the captured output,
/// as a real terminal would show them; secret lines are not.
#[derive(Debug, Default)]
pub struct MemoryTerminal {
    input: VecDeque<String>,
    out: String,
    err: String,
}

impl MemoryTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues every line of `text` as input.
    pub fn with_input(text: &str) -> Self {
        let mut term = Self::new();
        for line in text.lines() {
            term.push_line(line);
        }
        term
    }

    pub fn push_line(&mut self, line: &str) {
        self.input.push_back(line.to_string());
    }

    pub fn output(&self) -> &str {
        &self.out
    }

    pub fn errors(&self) -> &str {
        &self.err
    }

    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}

impl Terminal for MemoryTerminal {
    fn write_out(&mut self, text: &str) -> io::Result<()> {
        self.out.push_str(text);
        Ok(())
    }

    fn write_err(&mut self, text: &str) -> io::Result<()> {
        self.err.push_str(text);
        Ok(())
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let line = self.input.pop_front();
        if let Some(line) = &line {
            self.out.push_str(line);
            self.out.push('\n');
        }
        Ok(line)
    }

    fn read_secret_line(&mut self) -> io::Result<Option<String>> {
        let line = self.input.pop_front();
        if line.is_some() {
            self.out.push('\n');
        }
        Ok(line)
    }
}
