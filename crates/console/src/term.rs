//! Screen output and prompts

use crate::input::LineSource;
use chrono::Local;
use std::io::{self, Write};

pub const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

pub const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

pub const PRESS_ENTER_CONTINUE: &str = "Press Enter to continue...";
pub const PRESS_ENTER_BACK: &str = "Press Enter to go back...";
pub const PRESS_ENTER_MAIN: &str = "Press Enter to return to the main menu...";

/// Horizontal rule of `width` copies of `ch`
pub fn rule(ch: char, width: usize) -> String {
    std::iter::repeat(ch).take(width).collect()
}

/// Title block shown on top of every screen
pub fn write_header(out: &mut impl Write, server_url: &str) -> io::Result<()> {
    writeln!(out, "{}", rule('=', 60))?;
    writeln!(out, "🤖 TRADING BOT CONFIG MANAGER  v{}", APP_VERSION)?;
    writeln!(out, "{}", rule('=', 60))?;
    writeln!(out, "📡 Server: {}", server_url)?;
    writeln!(out, "⏰ Time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out, "{}", rule('-', 60))
}

/// Operator terminal: a line source plus an output stream
pub struct Console<I, W> {
    input: I,
    out: W,
}

impl<I: LineSource, W: Write> Console<I, W> {
    pub fn new(input: I, out: W) -> Self {
        Self { input, out }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Borrow input and output separately
    pub fn parts(&mut self) -> (&mut I, &mut W) {
        (&mut self.input, &mut self.out)
    }

    pub fn clear_screen(&mut self) -> io::Result<()> {
        self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        self.out.flush()
    }

    pub fn header(&mut self, server_url: &str) -> io::Result<()> {
        write_header(&mut self.out, server_url)
    }

    /// Print `label`, read one trimmed line. `None` at end of input.
    pub async fn read_line(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        let line = self.input.next_line().await;
        if line.is_none() {
            writeln!(self.out)?;
        }
        Ok(line.map(|l| l.trim().to_string()))
    }

    /// Menu selection; end of input reads as "0"
    pub async fn choice(&mut self, label: &str) -> io::Result<String> {
        Ok(self
            .read_line(label)
            .await?
            .unwrap_or_else(|| "0".to_string()))
    }

    /// Wait for Enter. Returns false when input is closed.
    pub async fn pause(&mut self, label: &str) -> io::Result<bool> {
        Ok(self.read_line(label).await?.is_some())
    }

    /// `(y/n)` question; only `y` confirms
    pub async fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.read_line(&format!("{} (y/n): ", question)).await?;
        Ok(matches!(answer, Some(a) if a.eq_ignore_ascii_case("y")))
    }
}

impl<I, W: Write> Write for Console<I, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
