//! Periodic background workers.
//!
//! A worker thread waits on a stop channel with `recv_timeout`; each timeout
//! is a tick. Dropping the handle disconnects the channel, which ends the
//! loop, and joins the thread.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

pub struct PeriodicWorker {
    name: String,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicWorker {
    /// Spawns a thread that calls `tick` after `initial_delay` and then every
    /// `interval`. The worker stops when `tick` returns `false` or the handle
    /// is dropped.
    pub fn spawn<F>(
        name: impl Into<String>,
        initial_delay: Duration,
        interval: Duration,
        mut tick: F,
    ) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let name = name.into();
        let (stop, stopped) = mpsc::channel::<()>();
        let thread_name = name.clone();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            let mut wait = initial_delay;
            loop {
                match stopped.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !tick() {
                            debug!(worker = %thread_name, "worker finished");
                            break;
                        }
                        wait = interval;
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(worker = %name, error = %err, "failed to spawn worker thread");
                None
            }
        };

        Self {
            name,
            stop: Some(stop),
            handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the worker and waits for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(worker = %self.name, "worker thread panicked");
            }
        }
    }
}

impl Drop for PeriodicWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
