//! Interactive restart trigger.
//!
//! Active only while watchers exist. A dedicated thread reads stdin lines
//! so the async runtime never blocks on a TTY; `r` requests a restart of
//! the whole pipeline.

use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::debug;

/// Start listening for shortcuts. The receiver yields one unit per restart
/// request; it closes when stdin does.
pub fn listen() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "r" | "restart" => {
                    if tx.blocking_send(()).is_err() {
                        break;
                    }
                }
                "" => {}
                other => debug!("unrecognized shortcut: {other}"),
            }
        }
    });
    rx
}
