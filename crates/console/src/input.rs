//! Line-oriented operator input
//!
//! Menus read whole lines through [`LineSource`]. The terminal source reads
//! stdin on a detached thread so a pending read never blocks the runtime
//! or process exit.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::BufRead;
use tokio::sync::mpsc;
use tracing::debug;

#[async_trait]
pub trait LineSource: Send {
    /// Next input line without its line ending. `None` once input is closed.
    async fn next_line(&mut self) -> Option<String>;
}

/// Standard input, forwarded line by line over a channel
pub struct StdinLines {
    rx: mpsc::UnboundedReceiver<String>,
}

impl StdinLines {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        });

        Self { rx }
    }
}

#[async_trait]
impl LineSource for StdinLines {
    async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// Fixed script of input lines, then end of input
#[derive(Debug, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Lines not consumed yet
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl LineSource for ScriptedLines {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}
