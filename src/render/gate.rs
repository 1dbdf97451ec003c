// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The render gate: couples parser mutations to renderers.
//!
//! `latest_update` is a monotonic millisecond stamp bumped on every parser
//! mutation; renderers wait on it with a per-request deadline. The wait is a
//! first-class async wait (a `watch` channel) with cancellation, so a
//! streaming client parked in [`RenderGate::wait_for_update`] wakes
//! immediately on a change, on shutdown, or when its deadline expires,
//! whichever comes first.
//!
//! The gate also owns the blink phase: a flag that flips whenever 400 ms
//! have passed since the last flip (~150 blinks per minute), sampled by the
//! rasterizer.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

const BLINK_INTERVAL: Duration = Duration::from_millis(400);

#[derive(Debug)]
struct BlinkState {
    phase: bool,
    switch_ts: Instant,
}

#[derive(Debug)]
pub struct RenderGate {
    latest_update: watch::Sender<u64>,
    start: Instant,
    blink: Mutex<BlinkState>,
    stop: CancellationToken,
}

impl RenderGate {
    #[must_use]
    pub fn new(stop: CancellationToken) -> RenderGate {
        let (latest_update, _) = watch::channel(0);
        RenderGate {
            latest_update,
            start: Instant::now(),
            blink: Mutex::new(BlinkState {
                phase: false,
                switch_ts: Instant::now(),
            }),
            stop,
        }
    }

    fn now_ms(&self) -> u64 { self.start.elapsed().as_millis() as u64 }

    /// Record one parser mutation. The stamp is strictly increasing so a
    /// waiter never misses a change that landed within the same
    /// millisecond.
    pub fn notify_update(&self) {
        let now = self.now_ms();
        self.latest_update
            .send_modify(|ts| *ts = (*ts + 1).max(now));
    }

    /// Current value of `latest_update`; 0 means nothing was ever parsed.
    #[must_use]
    pub fn latest(&self) -> u64 { *self.latest_update.borrow() }

    #[must_use]
    pub fn is_stopped(&self) -> bool { self.stop.is_cancelled() }

    /// Block until `latest_update > after_ts`, the stop token fires, or
    /// `max_wait` elapses (`None` = no deadline). Returns the current
    /// `latest_update`, which equals `after_ts` when nothing changed.
    pub async fn wait_for_update(&self, after_ts: u64, max_wait: Option<Duration>) -> u64 {
        let mut rx = self.latest_update.subscribe();
        let deadline = max_wait.map(|d| tokio::time::Instant::now() + d);

        loop {
            let current = *rx.borrow_and_update();
            if current > after_ts {
                return current;
            }

            let woke_on_change = tokio::select! {
                result = rx.changed() => result.is_ok(),
                () = self.stop.cancelled() => false,
                () = sleep_until_or_forever(deadline) => false,
            };
            if !woke_on_change {
                // Stop, deadline, or sender gone: report what we have.
                return *rx.borrow();
            }
        }
    }

    /// Sample the blink phase, flipping it when the interval has passed.
    #[must_use]
    pub fn blink_phase(&self) -> bool {
        let mut blink = self.blink.lock().expect("blink lock poisoned");
        if blink.switch_ts.elapsed() >= BLINK_INTERVAL {
            blink.phase = !blink.phase;
            blink.switch_ts = Instant::now();
        }
        blink.phase
    }
}

async fn sleep_until_or_forever(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
