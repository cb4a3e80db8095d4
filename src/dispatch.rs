// SPDX-License-Identifier: GPL-3.0-only

//! Callback delivery
//!
//! User callbacks never run on the device worker. The worker posts them into
//! an unbounded queue, tagged with the generation of the session that issued
//! them, and a delivery context drains the queue in order. A callback whose
//! generation is no longer current is dropped at delivery, which is how a
//! release silences everything the old session still had in flight.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

type Callback = Box<dyn FnOnce() + Send>;

struct Envelope {
    /// `None` for callbacks that outlive sessions (diagnostics)
    generation: Option<u64>,
    callback: Callback,
}

/// Where queued callbacks are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// A background thread owned by the camera drains the queue
    #[default]
    DedicatedThread,
    /// The caller drains the queue through [`CallbackQueue`]
    CallerThread,
}

/// Monotonic session counter shared by the session and the queue
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter(Arc<AtomicU64>);

impl GenerationCounter {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Start a new generation and return it
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Posting side of the callback queue
#[derive(Clone)]
pub struct CallbackSender {
    tx: UnboundedSender<Envelope>,
    generation: GenerationCounter,
}

impl CallbackSender {
    pub fn generation(&self) -> &GenerationCounter {
        &self.generation
    }

    /// Queue a callback belonging to `generation`
    pub fn post<F>(&self, generation: u64, callback: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(Envelope {
            generation: Some(generation),
            callback: Box::new(callback),
        })
    }

    /// Queue a callback that is delivered regardless of generation
    pub fn post_always<F>(&self, callback: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.send(Envelope {
            generation: None,
            callback: Box::new(callback),
        })
    }

    fn send(&self, envelope: Envelope) -> bool {
        let sent = self.tx.send(envelope).is_ok();
        if !sent {
            debug!("Callback queue closed, dropping callback");
        }
        sent
    }
}

/// Receiving side of the callback queue
pub struct CallbackQueue {
    rx: UnboundedReceiver<Envelope>,
    generation: GenerationCounter,
}

impl CallbackQueue {
    fn deliver(&self, envelope: Envelope) -> bool {
        if let Some(generation) = envelope.generation {
            if !self.generation.is_current(generation) {
                trace!(
                    generation,
                    current = self.generation.current(),
                    "Dropping stale callback"
                );
                return false;
            }
        }
        (envelope.callback)();
        true
    }

    /// Run every callback already queued; returns how many were executed
    pub fn dispatch_pending(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            if self.deliver(envelope) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Wait for the next queued callback and run it (unless stale).
    ///
    /// Returns `false` once every sender is gone and the queue is empty.
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(envelope) => {
                self.deliver(envelope);
                true
            }
            None => false,
        }
    }

    /// Drain the queue on the current thread until every sender is gone
    ///
    /// Must not be called from inside an async runtime.
    pub fn run(mut self) {
        while let Some(envelope) = self.rx.blocking_recv() {
            self.deliver(envelope);
        }
        debug!("Callback queue closed");
    }
}

/// Create a connected sender/queue pair with a fresh generation counter
pub fn callback_channel() -> (CallbackSender, CallbackQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    let generation = GenerationCounter::default();
    (
        CallbackSender {
            tx,
            generation: generation.clone(),
        },
        CallbackQueue { rx, generation },
    )
}

/// Drain `queue` on a named background thread
pub fn spawn_delivery_thread(queue: CallbackQueue) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("camhal-callbacks".to_string())
        .spawn(move || queue.run())
}
