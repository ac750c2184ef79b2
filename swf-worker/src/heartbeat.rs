use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use swf_common::prelude::*;

/// Calls a heartbeat closure on its own thread, once per interval, until stopped.
///
/// The first beat is sent right away. `stop` waits for the thread to exit, so no beat is sent
/// once it returns.
pub struct Heart {
    name: InlineStr,
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Heart {
    pub fn start<F>(name: impl Into<InlineStr>, interval: Duration, mut beat: F) -> SwfResult<Self>
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        if interval.is_zero() {
            return str_err!(IllegalArgument, "heartbeat interval must be positive");
        }

        let name = name.into();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let thread_name = name.clone();
        let handle = thread::Builder::new()
            .name(format!("heart-{}", name))
            .spawn(move || Self::run(&thread_name, interval, &mut beat, stop_rx))?;

        debug!("heart {} started, beating every {:?}", name, interval);
        Ok(Self {
            name,
            stop_tx,
            handle,
        })
    }

    fn run<F>(name: &str, interval: Duration, beat: &mut F, stop_rx: Receiver<()>)
    where
        F: FnMut() -> anyhow::Result<()>,
    {
        loop {
            if let Err(e) = beat() {
                warn!("heart {} failed to beat: {}", name, e);
            }
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        trace!("heart {} stopped", name);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops beating and joins the beating thread.
    pub fn stop(self) -> SwfResult<()> {
        let _ = self.stop_tx.send(());
        self.handle.join().map_err(|_| {
            ErrorCode::UnknownException(format!("heart {} panicked while beating", self.name))
        })
    }

    /// Ties the heart to a scope: it stops when the guard is dropped.
    pub fn guard(self) -> HeartbeatGuard {
        HeartbeatGuard { heart: Some(self) }
    }
}

impl std::fmt::Debug for Heart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heart").field("name", &self.name).finish()
    }
}

#[derive(Debug)]
pub struct HeartbeatGuard {
    heart: Option<Heart>,
}

impl HeartbeatGuard {
    pub fn stop(mut self) -> SwfResult<()> {
        match self.heart.take() {
            Some(heart) => heart.stop(),
            None => Ok(()),
        }
    }
}

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        if let Some(heart) = self.heart.take() {
            if let Err(e) = heart.stop() {
                error!("{}", e.display_text());
            }
        }
    }
}
