use super::store::Shared;
use crate::error::Result;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Background thread running periodic sweep passes until stopped.
pub(super) struct Sweeper {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub(super) fn spawn(shared: Arc<Shared>, interval: Duration) -> Result<Self> {
        let (shutdown, signal) = channel();
        let handle = thread::Builder::new()
            .name("session-sweeper".to_owned())
            .spawn(move || run(&shared, &signal, interval))?;
        Ok(Self { shutdown, handle })
    }

    /// Disconnects the shutdown channel and joins the thread.
    pub(super) fn stop(self) {
        let Self { shutdown, handle } = self;
        drop(shutdown);
        if handle.join().is_err() {
            warn!("Session sweeper thread panicked");
        }
    }
}

fn run(shared: &Shared, signal: &Receiver<()>, interval: Duration) {
    debug!(interval_secs = interval.as_secs_f64(), "Session sweeper started");
    loop {
        match signal.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                // A failed pass is retried on the next tick.
                if let Err(e) = shared.sweep() {
                    error!(error = %e, "Session sweep failed");
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("Session sweeper stopped");
}
