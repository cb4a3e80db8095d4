// SPDX-License-Identifier: GPL-3.0-only
//! Single-threaded device worker
//!
//! Every device operation (open, configure, capture, record, close) runs on
//! one dedicated thread that owns the backend. Tasks are executed strictly in
//! submission order, so at most one device operation is in flight and a new
//! open always runs after the teardown of the previous session.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Unit of work executed against the worker-owned state
pub type DeviceTask<S> = Box<dyn FnOnce(&mut S) + Send>;

enum Message<S> {
    Run(DeviceTask<S>),
    Stop,
}

/// Cloneable submission side of a [`DeviceWorker`]
pub struct WorkerHandle<S> {
    sender: mpsc::Sender<Message<S>>,
    name: String,
}

impl<S> Clone for WorkerHandle<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            name: self.name.clone(),
        }
    }
}

impl<S: 'static> WorkerHandle<S> {
    /// Queue a task; returns `false` when the worker has already stopped
    pub fn submit<F>(&self, task: F) -> bool
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        let queued = self.sender.send(Message::Run(Box::new(task))).is_ok();
        if !queued {
            warn!(name = %self.name, "Device worker stopped, dropping task");
        }
        queued
    }

    /// Run a task and block until its result is available
    pub fn call<R, F>(&self, task: F) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        self.call_timeout(task, None)
    }

    /// Like [`call`](Self::call), giving up after `timeout`
    pub fn call_timeout<R, F>(&self, task: F, timeout: Option<Duration>) -> Option<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut S) -> R + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        if !self.submit(move |state| {
            let _ = tx.send(task(state));
        }) {
            return None;
        }
        match timeout {
            None => rx.recv().ok(),
            Some(timeout) => match rx.recv_timeout(timeout) {
                Ok(value) => Some(value),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(name = %self.name, ?timeout, "Device worker did not answer in time");
                    None
                }
                Err(RecvTimeoutError::Disconnected) => None,
            },
        }
    }

    /// Block until every task queued before this call has run
    pub fn wait_idle(&self) -> bool {
        self.call(|_| ()).is_some()
    }

    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        self.call_timeout(|_| (), Some(timeout)).is_some()
    }
}

/// Owner of the worker thread
///
/// Dropping the worker drains the queue, then joins the thread.
pub struct DeviceWorker<S> {
    handle: WorkerHandle<S>,
    thread_handle: Option<JoinHandle<()>>,
}

impl<S: Send + 'static> DeviceWorker<S> {
    /// Spawn the worker thread, moving `state` onto it
    pub fn start(name: &str, mut state: S) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Message<S>>();
        let name_clone = name.to_string();

        info!(name = %name, "Starting device worker");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %name_clone, "Device worker thread started");
                while let Ok(message) = receiver.recv() {
                    match message {
                        Message::Run(task) => task(&mut state),
                        Message::Stop => {
                            debug!(name = %name_clone, "Stop message received");
                            break;
                        }
                    }
                }
                info!(name = %name_clone, "Device worker thread exiting");
            })?;

        Ok(Self {
            handle: WorkerHandle {
                sender,
                name: name.to_string(),
            },
            thread_handle: Some(thread_handle),
        })
    }
}

impl<S> DeviceWorker<S> {
    pub fn handle(&self) -> WorkerHandle<S> {
        self.handle.clone()
    }

    /// Check if the worker thread is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Finish queued tasks, then stop the thread and wait for it
    pub fn stop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.handle.name, "Stopping device worker");
            let _ = self.handle.sender.send(Message::Stop);
            if handle.thread().id() == thread::current().id() {
                // Dropped from one of its own tasks; the loop ends on the Stop message
                return;
            }
            if let Err(e) = handle.join() {
                warn!(name = %self.handle.name, "Device worker thread panicked: {:?}", e);
            } else {
                debug!(name = %self.handle.name, "Device worker thread finished");
            }
        }
    }
}

impl<S> Drop for DeviceWorker<S> {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.handle.name, "DeviceWorker dropped, stopping thread");
            self.stop();
        }
    }
}
