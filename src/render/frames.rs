// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The cached frame source shared by every HTTP consumer.
//!
//! One cache slot per output format holds the last encoded bytes together
//! with the `latest_update` stamp they were rendered from. A request whose
//! gate wait resolves to an already-encoded stamp gets the cached bytes; a
//! newer stamp re-renders and re-encodes. Two racing requests may both
//! encode the same frame; at most one artifact is retained, and since
//! rendering is idempotent the race is harmless.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use crate::term::{Palette, TerminalEmulator};

use super::encode::{ImageFormat, encode};
use super::font::FontSet;
use super::gate::RenderGate;
use super::rasterizer::rasterize;

#[derive(Debug, Default)]
struct CacheSlot {
    source_ts: u64,
    bytes: Option<Bytes>,
}

pub struct FrameSource {
    emulator: Arc<Mutex<TerminalEmulator>>,
    gate: Arc<RenderGate>,
    fonts: Arc<FontSet>,
    palette: Palette,
    compression: u8,
    max_wait: Option<Duration>,
    slots: [Mutex<CacheSlot>; 4],
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSource")
            .field("compression", &self.compression)
            .field("max_wait", &self.max_wait)
            .finish_non_exhaustive()
    }
}

impl FrameSource {
    #[must_use]
    pub fn new(
        emulator: Arc<Mutex<TerminalEmulator>>,
        gate: Arc<RenderGate>,
        fonts: Arc<FontSet>,
        compression: u8,
        max_wait: Option<Duration>,
    ) -> FrameSource {
        FrameSource {
            emulator,
            gate,
            fonts,
            palette: Palette::new(),
            compression,
            max_wait,
            slots: [
                Mutex::new(CacheSlot::default()),
                Mutex::new(CacheSlot::default()),
                Mutex::new(CacheSlot::default()),
                Mutex::new(CacheSlot::default()),
            ],
        }
    }

    fn slot(&self, format: ImageFormat) -> &Mutex<CacheSlot> {
        &self.slots[match format {
            ImageFormat::Png => 0,
            ImageFormat::Jpeg => 1,
            ImageFormat::Bmp => 2,
            ImageFormat::Tga => 3,
        }]
    }

    /// Wait for a change past `after_ts` (bounded by the configured
    /// `max_wait`), then return one encoded frame and advance `after_ts`.
    ///
    /// Peek mode (HTTP HEAD) returns `None` instead of rendering when no
    /// frame has ever existed or nothing changed. A failed encode falls
    /// back to the previously cached artifact; `None` with an empty cache
    /// becomes the caller's `304`.
    pub async fn get_frame(
        &self,
        format: ImageFormat,
        after_ts: &mut u64,
        peek: bool,
    ) -> Option<Bytes> {
        if peek && self.gate.latest() == 0 {
            return None;
        }

        let new_ts = self.gate.wait_for_update(*after_ts, self.max_wait).await;
        if peek && new_ts <= *after_ts {
            return None;
        }

        // Someone may already have encoded this exact frame.
        {
            let slot = self.slot(format).lock().expect("frame cache lock poisoned");
            if slot.source_ts == new_ts {
                if let Some(cached) = &slot.bytes {
                    *after_ts = new_ts;
                    return Some(cached.clone());
                }
            }
        }

        let snapshot = {
            let emulator = self.emulator.lock().expect("emulator lock poisoned");
            emulator.snapshot()
        };
        let frame = rasterize(&snapshot, &self.fonts, &self.palette, self.gate.blink_phase());

        match encode(format, &frame, self.compression) {
            Ok(encoded) => {
                let encoded = Bytes::from(encoded);
                let mut slot = self.slot(format).lock().expect("frame cache lock poisoned");
                if new_ts >= slot.source_ts {
                    slot.source_ts = new_ts;
                    slot.bytes = Some(encoded.clone());
                }
                *after_ts = new_ts;
                Some(encoded)
            }
            Err(error) => {
                tracing::error!(%format, %error, "frame encode failed");
                let slot = self.slot(format).lock().expect("frame cache lock poisoned");
                *after_ts = new_ts;
                slot.bytes.clone()
            }
        }
    }

    /// Snapshot accessor for the character-stream sessions (initial screen
    /// replay).
    #[must_use]
    pub fn screen_snapshot(&self) -> crate::term::ScreenSnapshot {
        self.emulator
            .lock()
            .expect("emulator lock poisoned")
            .snapshot()
    }
}
