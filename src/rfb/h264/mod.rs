//! H.264 tiles.
//!
//! Each rectangle update carries a 4 byte big-endian payload length, 4 bytes of flags
//! and an Annex-B payload. The server encodes every rectangle as its own video stream, so
//! the decoder keeps a [`RegionContext`] per exact rectangle, bounded by
//! [`MAX_CONTEXTS`] with least-recently-used eviction.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::av::DecoderFactory;
use crate::config::{self, Config};
use crate::error::Result;
use crate::rfb::{Display, Rect, RectDecoder, RfbStream};

mod context;

pub use context::RegionContext;

/// Hard cap on live decode contexts
pub const MAX_CONTEXTS: usize = 64;

/// Flag bit: drop the context of this rectangle before decoding
pub const RESET_CONTEXT: u32 = 1 << 0;
/// Flag bit: drop every context before decoding
pub const RESET_ALL_CONTEXTS: u32 = 1 << 1;

const HEADER_LEN: usize = 8;

/// Per-rectangle H.264 decoding for one connection
pub struct H264Decoder {
    contexts: HashMap<Rect, RegionContext>,
    tick: u64,
    factory: Arc<dyn DecoderFactory>,
    config: Config,
}

impl fmt::Debug for H264Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("H264Decoder")
            .field("contexts", &self.contexts.len())
            .field("tick", &self.tick)
            .field("config", &self.config)
            .finish()
    }
}

impl H264Decoder {
    /// Creates a decoder using the process-wide configuration.
    pub fn new(factory: Arc<dyn DecoderFactory>) -> Self {
        Self::with_config(factory, config::current())
    }

    pub fn with_config(factory: Arc<dyn DecoderFactory>, mut config: Config) -> Self {
        config.max_contexts = config.max_contexts.clamp(1, MAX_CONTEXTS);
        Self {
            contexts: HashMap::new(),
            tick: 0,
            factory,
            config,
        }
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    pub fn contains(&self, rect: &Rect) -> bool {
        self.contexts.contains_key(rect)
    }

    pub fn context(&self, rect: &Rect) -> Option<&RegionContext> {
        self.contexts.get(rect)
    }

    /// Tears down every context.
    pub fn reset(&mut self) {
        log::debug!("resetting {} decode contexts", self.contexts.len());
        for (_, mut context) in self.contexts.drain() {
            context.close();
        }
    }

    fn reset_rect(&mut self, rect: &Rect) {
        if let Some(mut context) = self.contexts.remove(rect) {
            log::debug!("resetting decode context for {:?}", rect);
            context.close();
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .contexts
            .iter()
            .min_by_key(|(_, context)| context.last_used())
            .map(|(rect, _)| *rect);

        if let Some(rect) = oldest {
            if let Some(mut context) = self.contexts.remove(&rect) {
                log::debug!(
                    "evicting decode context for {:?} (last used at tick {})",
                    rect,
                    context.last_used()
                );
                context.close();
            }
        }
    }

    fn context_for(&mut self, rect: Rect) -> &mut RegionContext {
        if !self.contexts.contains_key(&rect) && self.contexts.len() >= self.config.max_contexts {
            self.evict_oldest();
        }

        let tick = self.tick;
        self.tick += 1;

        let context = match self.contexts.entry(rect) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                log::debug!("creating decode context for {:?}", rect);
                entry.insert(RegionContext::new(
                    rect,
                    self.factory.clone(),
                    self.config.optimize_for_latency,
                ))
            }
        };
        context.touch(tick);
        context
    }
}

impl RectDecoder for H264Decoder {
    fn decode_rect(
        &mut self,
        rect: Rect,
        stream: &mut dyn RfbStream,
        display: &mut dyn Display,
    ) -> Result<bool> {
        if !stream.has_enough("h264 header", HEADER_LEN) {
            return Ok(false);
        }
        let length = stream.peek_u32()? as usize;
        if !stream.has_enough("h264 payload", HEADER_LEN + length) {
            return Ok(false);
        }

        stream.read_u32()?;
        let flags = stream.read_u32()?;

        if flags & RESET_ALL_CONTEXTS != 0 {
            self.reset();
        } else if flags & RESET_CONTEXT != 0 {
            self.reset_rect(&rect);
        }

        let context = self.context_for(rect);

        if length > 0 {
            let payload = stream.read_bytes(length)?;
            if let Some(frame) = context.decode(payload)? {
                display.show_frame(rect, frame);
            }
        }

        Ok(true)
    }
}
