// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The fan-out hub: broadcast of child output to every connected viewer.
//!
//! Each viewer owns a bounded FIFO of byte chunks ([`ViewerQueue`]) under
//! its own mutex; the hub holds the id -> queue map under the hub mutex.
//! Chunks are [`Bytes`], so a broadcast to N viewers is N reference bumps,
//! not N copies. A viewer that cannot drain fast enough loses its *oldest*
//! chunks once the queue passes 1 MiB; back-pressuring the PTY instead
//! would stall every other viewer.
//!
//! The hub also carries the keystroke path back to the child: sessions call
//! [`Hub::send_keys`], the PTY supervisor drains the channel into the PTY
//! master.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::Notify;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Drop-oldest boundary per viewer queue.
const QUEUE_CAP_BYTES: usize = 1024 * 1024;

#[derive(Debug, Default)]
struct QueueInner {
    chunks: VecDeque<Bytes>,
    queued_bytes: usize,
    dropped_chunks: u64,
}

#[derive(Debug, Default)]
pub struct ViewerQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
}

impl ViewerQueue {
    fn push(&self, chunk: Bytes) {
        {
            let mut inner = self.inner.lock().expect("viewer queue lock poisoned");
            inner.queued_bytes += chunk.len();
            inner.chunks.push_back(chunk);
            while inner.queued_bytes > QUEUE_CAP_BYTES {
                match inner.chunks.pop_front() {
                    Some(dropped) => {
                        inner.queued_bytes -= dropped.len();
                        inner.dropped_chunks += 1;
                    }
                    None => break,
                }
            }
        }
        self.notify.notify_one();
    }

    fn try_pop(&self) -> Option<Bytes> {
        let mut inner = self.inner.lock().expect("viewer queue lock poisoned");
        let chunk = inner.chunks.pop_front()?;
        inner.queued_bytes -= chunk.len();
        Some(chunk)
    }

    /// Wait for the next chunk; `None` when the session should end.
    pub async fn recv(&self, stop: &CancellationToken) -> Option<Bytes> {
        loop {
            if let Some(chunk) = self.try_pop() {
                return Some(chunk);
            }
            tokio::select! {
                () = self.notify.notified() => {}
                () = stop.cancelled() => return None,
            }
        }
    }

    /// Discard everything queued (dumb-telnet refresh coalescing). Returns
    /// whether anything was pending.
    pub fn drain(&self) -> bool {
        let mut inner = self.inner.lock().expect("viewer queue lock poisoned");
        let had_any = !inner.chunks.is_empty();
        inner.chunks.clear();
        inner.queued_bytes = 0;
        had_any
    }

    #[must_use]
    pub fn dropped_chunks(&self) -> u64 {
        self.inner
            .lock()
            .expect("viewer queue lock poisoned")
            .dropped_chunks
    }
}

#[derive(Debug)]
pub struct Hub {
    clients: Mutex<HashMap<String, Arc<ViewerQueue>>>,
    keystrokes: mpsc::UnboundedSender<Vec<u8>>,
    ignore_keypresses: bool,
}

impl Hub {
    /// Returns the hub and the receiving end of the keystroke channel (the
    /// PTY supervisor holds the receiver).
    #[must_use]
    pub fn new(ignore_keypresses: bool) -> (Arc<Hub>, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (keystrokes, rx) = mpsc::unbounded_channel();
        let hub = Arc::new(Hub {
            clients: Mutex::new(HashMap::new()),
            keystrokes,
            ignore_keypresses,
        });
        (hub, rx)
    }

    pub fn register(&self, id: &str) -> Arc<ViewerQueue> {
        let queue = Arc::new(ViewerQueue::default());
        let mut clients = self.clients.lock().expect("hub lock poisoned");
        clients.insert(id.to_string(), queue.clone());
        tracing::info!(viewer = id, total = clients.len(), "viewer registered");
        queue
    }

    pub fn unregister(&self, id: &str) {
        let mut clients = self.clients.lock().expect("hub lock poisoned");
        if let Some(queue) = clients.remove(id) {
            let dropped = queue.dropped_chunks();
            if dropped > 0 {
                tracing::warn!(viewer = id, dropped, "viewer was slow, chunks were dropped");
            }
        }
        tracing::info!(viewer = id, total = clients.len(), "viewer unregistered");
    }

    /// Append one chunk of child output to every viewer queue, in PTY
    /// order.
    pub fn broadcast(&self, chunk: &Bytes) {
        if chunk.is_empty() {
            return;
        }
        let clients = self.clients.lock().expect("hub lock poisoned");
        for queue in clients.values() {
            queue.push(chunk.clone());
        }
    }

    /// Forward viewer keystrokes to the child, unless the configuration
    /// says viewers are watch-only.
    pub fn send_keys(&self, bytes: Vec<u8>) {
        if self.ignore_keypresses || bytes.is_empty() {
            return;
        }
        // The receiver only disappears at shutdown; losing keystrokes then
        // is fine.
        let _ = self.keystrokes.send(bytes);
    }

    #[must_use]
    pub fn viewer_count(&self) -> usize {
        self.clients.lock().expect("hub lock poisoned").len()
    }
}
