//! Spinner shown on stderr while a model call is in flight

use std::io::Write;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

const FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
const FRAME_INTERVAL: Duration = Duration::from_millis(120);

/// Handle to a running spinner task
pub struct Spinner {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner with `message`; a disabled spinner prints nothing
    pub fn start(message: impl Into<String>, enabled: bool) -> Self {
        if !enabled {
            return Self {
                stop_tx: None,
                handle: None,
            };
        }

        let message = message.into();
        debug!(%message, "Spinner::start: called");
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let mut frame = 0usize;
            loop {
                let mut stderr = std::io::stderr();
                let _ = write!(
                    stderr,
                    "\r{} {} ({}s)",
                    FRAMES[frame % FRAMES.len()],
                    message,
                    started.elapsed().as_secs()
                );
                let _ = stderr.flush();
                frame = frame.wrapping_add(1);

                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = tokio::time::sleep(FRAME_INTERVAL) => {}
                }
            }
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r\x1b[2K");
            let _ = stderr.flush();
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the spinner and wait until its line is cleared
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        debug!("Spinner::stop: stopped");
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}
