//! Terminal input for [`HumanPrompt`](tickworld_core::HumanPrompt).
//!
//! Lines are read on a tokio task and handed over through a channel, so
//! `accept` never blocks the caller.

use std::io::Write;

use tickworld_core::LineInput;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// Lines typed on standard input.
#[derive(Debug)]
pub struct StdinLines {
    lines: mpsc::UnboundedReceiver<String>,
}

impl StdinLines {
    /// Start reading standard input on the current runtime.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        });
        Self { lines: rx }
    }
}

impl LineInput for StdinLines {
    fn print(&mut self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        if stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()).is_err() {
            debug!("stdout closed");
        }
    }

    fn accept(&mut self) -> Option<String> {
        self.lines.try_recv().ok()
    }
}
