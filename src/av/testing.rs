//! A scriptable stand-in for a hardware decoder.
//!
//! Sessions never complete anything on their own: tests decide when each submitted chunk
//! finishes, in which order, and whether the session fails. Released images are counted
//! so ownership mistakes show up as wrong counts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{
    DecodedImage, DecoderFactory, DecoderOutput, EncodedVideoChunk, HardwareDecoder,
    SessionState, VideoDecoderConfig,
};
use crate::error::{Result, RfbError};

/// Image whose release is recorded in a shared counter
#[derive(Debug)]
pub struct FakeImage {
    timestamp: i64,
    width: u32,
    height: u32,
    released: Arc<AtomicUsize>,
}

impl FakeImage {
    pub fn new(timestamp: i64, width: u32, height: u32, released: Arc<AtomicUsize>) -> Self {
        Self {
            timestamp,
            width,
            height,
            released,
        }
    }
}

impl DecodedImage for FakeImage {
    fn timestamp(&self) -> i64 {
        self.timestamp
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl Drop for FakeImage {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Everything one fake session has seen
#[derive(Debug)]
pub struct SessionRecord {
    pub state: SessionState,
    pub configs: Vec<VideoDecoderConfig>,
    pub submitted: Vec<EncodedVideoChunk>,
    in_flight: VecDeque<EncodedVideoChunk>,
    output: DecoderOutput,
}

#[derive(Debug, Default)]
struct FakeHardware {
    sessions: Vec<SessionRecord>,
    fail_configure: bool,
    fail_submit: bool,
}

/// Factory handing out fake sessions; clones share the same recorded state.
#[derive(Debug, Clone, Default)]
pub struct FakeDecoderFactory {
    hardware: Arc<Mutex<FakeHardware>>,
    released: Arc<AtomicUsize>,
}

impl FakeDecoderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions_created(&self) -> usize {
        self.hardware.lock().sessions.len()
    }

    pub fn session_state(&self, session: usize) -> Option<SessionState> {
        self.hardware.lock().sessions.get(session).map(|s| s.state)
    }

    pub fn configs(&self, session: usize) -> Vec<VideoDecoderConfig> {
        self.hardware
            .lock()
            .sessions
            .get(session)
            .map(|s| s.configs.clone())
            .unwrap_or_default()
    }

    pub fn submitted(&self, session: usize) -> Vec<EncodedVideoChunk> {
        self.hardware
            .lock()
            .sessions
            .get(session)
            .map(|s| s.submitted.clone())
            .unwrap_or_default()
    }

    pub fn in_flight(&self, session: usize) -> usize {
        self.hardware
            .lock()
            .sessions
            .get(session)
            .map_or(0, |s| s.in_flight.len())
    }

    /// Number of images dropped so far, wherever they ended up
    pub fn released_images(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn set_fail_configure(&self, fail: bool) {
        self.hardware.lock().fail_configure = fail;
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.hardware.lock().fail_submit = fail;
    }

    /// Completes the oldest in-flight chunk of `session`.
    pub fn complete_next(&self, session: usize) -> Result<()> {
        self.complete_at(session, 0)
    }

    /// Completes the in-flight chunk at `position`, allowing out-of-order completions.
    pub fn complete_at(&self, session: usize, position: usize) -> Result<()> {
        let (output, image) = {
            let mut hardware = self.hardware.lock();
            let record = hardware
                .sessions
                .get_mut(session)
                .ok_or_else(|| RfbError::InvalidData(format!("no session {}", session)))?;
            let chunk = record.in_flight.remove(position).ok_or_else(|| {
                RfbError::InvalidData(format!("no chunk {} in flight", position))
            })?;
            let (width, height) = record
                .configs
                .last()
                .map_or((0, 0), |c| (c.coded_width, c.coded_height));
            let image = FakeImage::new(chunk.timestamp, width, height, self.released.clone());
            (record.output.clone(), image)
        };
        output.output(Box::new(image))
    }

    /// Completes every in-flight chunk of `session` in submission order.
    pub fn complete_all(&self, session: usize) -> Result<()> {
        while self.in_flight(session) > 0 {
            self.complete_next(session)?;
        }
        Ok(())
    }

    /// Emits an image nobody asked for.
    pub fn emit_spurious(&self, session: usize, timestamp: i64) -> Result<()> {
        let output = self
            .hardware
            .lock()
            .sessions
            .get(session)
            .map(|s| s.output.clone())
            .ok_or_else(|| RfbError::InvalidData(format!("no session {}", session)))?;
        output.output(Box::new(FakeImage::new(
            timestamp,
            0,
            0,
            self.released.clone(),
        )))
    }

    /// Closes `session` without reporting an error, as when the platform reclaims it.
    pub fn reclaim(&self, session: usize) {
        if let Some(record) = self.hardware.lock().sessions.get_mut(session) {
            record.state = SessionState::Closed;
            record.in_flight.clear();
        }
    }

    /// Fails `session` the way a lost device would: error callback, then closed.
    pub fn fail(&self, session: usize, message: &str) -> RfbError {
        let output = {
            let mut hardware = self.hardware.lock();
            match hardware.sessions.get_mut(session) {
                Some(record) => {
                    record.state = SessionState::Closed;
                    record.in_flight.clear();
                    record.output.clone()
                }
                None => return RfbError::InvalidData(format!("no session {}", session)),
            }
        };
        output.error(message)
    }
}

impl DecoderFactory for FakeDecoderFactory {
    fn create(&self, output: DecoderOutput) -> Result<Box<dyn HardwareDecoder>> {
        let mut hardware = self.hardware.lock();
        hardware.sessions.push(SessionRecord {
            state: SessionState::Unconfigured,
            configs: Vec::new(),
            submitted: Vec::new(),
            in_flight: VecDeque::new(),
            output,
        });
        Ok(Box::new(FakeDecoder {
            index: hardware.sessions.len() - 1,
            hardware: self.hardware.clone(),
        }))
    }
}

struct FakeDecoder {
    index: usize,
    hardware: Arc<Mutex<FakeHardware>>,
}

impl FakeDecoder {
    fn with_record<T>(&self, f: impl FnOnce(&mut SessionRecord, bool, bool) -> T) -> T {
        let mut hardware = self.hardware.lock();
        let (fail_configure, fail_submit) = (hardware.fail_configure, hardware.fail_submit);
        f(&mut hardware.sessions[self.index], fail_configure, fail_submit)
    }
}

impl HardwareDecoder for FakeDecoder {
    fn state(&self) -> SessionState {
        self.with_record(|record, _, _| record.state)
    }

    fn configure(&mut self, config: &VideoDecoderConfig) -> Result<()> {
        self.with_record(|record, fail_configure, _| {
            if record.state == SessionState::Closed {
                return Err(RfbError::Codec("configure on a closed session".into()));
            }
            if fail_configure {
                return Err(RfbError::Codec(format!("unsupported codec {}", config.codec)));
            }
            record.configs.push(config.clone());
            record.state = SessionState::Configured;
            Ok(())
        })
    }

    fn submit(&mut self, chunk: EncodedVideoChunk) -> Result<()> {
        self.with_record(|record, _, fail_submit| {
            if record.state != SessionState::Configured {
                return Err(RfbError::Codec("submit on an unconfigured session".into()));
            }
            if fail_submit {
                return Err(RfbError::Codec("submission rejected".into()));
            }
            record.submitted.push(chunk.clone());
            record.in_flight.push_back(chunk);
            Ok(())
        })
    }

    fn close(&mut self) {
        self.with_record(|record, _, _| {
            record.state = SessionState::Closed;
            record.in_flight.clear();
        })
    }
}
