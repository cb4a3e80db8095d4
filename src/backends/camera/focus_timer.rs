// SPDX-License-Identifier: GPL-3.0-only

//! Re-armable one-shot timer for the tap-to-focus reset
//!
//! A single thread waits on a control channel with a deadline slot. Arming
//! again replaces the pending deadline, so any number of taps keeps exactly
//! one timer alive.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

enum TimerMessage {
    Arm { token: u64, deadline: Instant },
    Cancel,
    Stop,
}

/// One pending deadline at most; expiry hands its token to the callback
pub struct FocusResetTimer {
    sender: mpsc::Sender<TimerMessage>,
    thread_handle: Option<JoinHandle<()>>,
}

impl FocusResetTimer {
    /// Spawn the timer thread; `on_expired` runs on it
    pub fn start<F>(name: &str, mut on_expired: F) -> std::io::Result<Self>
    where
        F: FnMut(u64) + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<TimerMessage>();
        let name_clone = name.to_string();

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut pending: Option<(u64, Instant)> = None;
                loop {
                    let message = match pending {
                        Some((_, deadline)) => receiver
                            .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                        None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
                    };
                    match message {
                        Ok(TimerMessage::Arm { token, deadline }) => {
                            pending = Some((token, deadline));
                        }
                        Ok(TimerMessage::Cancel) => pending = None,
                        Ok(TimerMessage::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {
                            if let Some((token, _)) = pending.take() {
                                trace!(token, "Focus reset timer expired");
                                on_expired(token);
                            }
                        }
                    }
                }
                debug!(name = %name_clone, "Focus reset timer exiting");
            })?;

        Ok(Self {
            sender,
            thread_handle: Some(thread_handle),
        })
    }

    /// Fire `token` after `delay`, replacing any pending deadline
    pub fn arm(&self, token: u64, delay: Duration) {
        let deadline = Instant::now() + delay;
        let _ = self.sender.send(TimerMessage::Arm { token, deadline });
    }

    /// Drop the pending deadline, if any
    pub fn cancel(&self) {
        let _ = self.sender.send(TimerMessage::Cancel);
    }

    /// Stop the timer thread and wait for it
    pub fn stop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = self.sender.send(TimerMessage::Stop);
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if let Err(e) = handle.join() {
                warn!("Focus reset timer panicked: {:?}", e);
            }
        }
    }
}

impl Drop for FocusResetTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
