use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use lazy_static::lazy_static;

use crate::av::pending::PendingTicket;
use crate::av::{
    DecoderFactory, DecoderOutput, EncodedVideoChunk, HardwareDecoder, PendingFrame,
    SessionState, VideoDecoderConfig,
};
use crate::codec::h264::{EncodedFrame, H264Parser, SpsParams};
use crate::error::{Result, RfbError};
use crate::rfb::Rect;

lazy_static! {
    static ref CLOCK_EPOCH: Instant = Instant::now();
}

/// Decode state of one screen rectangle: a hardware session, the parameters needed to
/// configure it, and the queue of frames it is still working on.
pub struct RegionContext {
    rect: Rect,
    factory: Arc<dyn DecoderFactory>,
    optimize_for_latency: bool,
    session: Option<Box<dyn HardwareDecoder>>,
    output: DecoderOutput,
    sps: Option<SpsParams>,
    last_timestamp: i64,
    last_used: u64,
    closed: bool,
}

impl fmt::Debug for RegionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionContext")
            .field("rect", &self.rect)
            .field("sps", &self.sps)
            .field("configured", &self.is_configured())
            .field("pending", &self.output.pending_len())
            .field("last_used", &self.last_used)
            .field("closed", &self.closed)
            .finish()
    }
}

impl RegionContext {
    pub fn new(rect: Rect, factory: Arc<dyn DecoderFactory>, optimize_for_latency: bool) -> Self {
        Self {
            rect,
            factory,
            optimize_for_latency,
            session: None,
            output: DecoderOutput::new(),
            sps: None,
            last_timestamp: 0,
            last_used: 0,
            closed: false,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// SPS parameters most recently seen by this context
    pub fn sps(&self) -> Option<SpsParams> {
        self.sps
    }

    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    pub(crate) fn touch(&mut self, tick: u64) {
        self.last_used = tick;
    }

    /// Frames submitted to the hardware and not yet completed
    pub fn pending_len(&self) -> usize {
        self.output.pending_len()
    }

    pub fn is_configured(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| s.state() == SessionState::Configured)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Submits every frame in `payload` and returns the newest one.
    ///
    /// Older frames of the same payload are decoded only to keep the reference chain
    /// intact; their images are released as soon as they complete.
    pub fn decode(&mut self, payload: Bytes) -> Result<Option<PendingFrame>> {
        if self.closed {
            return Err(RfbError::Protocol(format!(
                "decode context for {:?} has been closed",
                self.rect
            )));
        }
        self.output.check()?;

        let mut parser = H264Parser::new(payload);
        let mut submitted = Vec::new();
        let result = self.submit_frames(&mut parser, &mut submitted);

        let newest = submitted.pop();
        for ticket in submitted {
            ticket.release();
        }

        match result {
            Ok(()) => Ok(newest.map(|ticket| {
                log::trace!("retaining frame {} for {:?}", ticket.timestamp(), self.rect);
                ticket.retain()
            })),
            Err(e) => {
                if let Some(ticket) = newest {
                    ticket.release();
                }
                Err(e)
            }
        }
    }

    fn submit_frames(
        &mut self,
        parser: &mut H264Parser,
        submitted: &mut Vec<PendingTicket>,
    ) -> Result<()> {
        while let Some(frame) = parser.next_frame()? {
            if let Some(sps) = parser.sps() {
                self.sps = Some(sps);
            }
            if !frame.picture {
                log::debug!(
                    "skipping {} trailing bytes without a slice for {:?}",
                    frame.data.len(),
                    self.rect
                );
                continue;
            }

            if !self.is_configured() {
                if !frame.key {
                    log::warn!(
                        "dropping non-key frame for {:?}: decoder not configured",
                        self.rect
                    );
                    continue;
                }
                let Some(sps) = self.sps else {
                    log::warn!(
                        "dropping key frame for {:?}: no sequence parameters yet",
                        self.rect
                    );
                    continue;
                };
                if let Err(e) = self.configure(sps) {
                    log::warn!("failed to configure decoder for {:?}: {}", self.rect, e);
                    continue;
                }
            }

            if let Some(ticket) = self.submit(frame) {
                submitted.push(ticket);
            }
        }
        Ok(())
    }

    fn configure(&mut self, sps: SpsParams) -> Result<()> {
        let reusable = self
            .session
            .as_ref()
            .map_or(false, |s| s.state() != SessionState::Closed);

        if !reusable {
            if let Some(mut old) = self.session.take() {
                old.close();
            }
            let cancelled = self.output.cancel_pending();
            if cancelled > 0 {
                log::debug!(
                    "cancelled {} frames of a closed session for {:?}",
                    cancelled,
                    self.rect
                );
            }
            self.session = Some(self.factory.create(self.output.clone())?);
        }

        let config = VideoDecoderConfig {
            codec: sps.codec_string(),
            coded_width: u32::from(self.rect.width),
            coded_height: u32::from(self.rect.height),
            optimize_for_latency: self.optimize_for_latency,
        };
        log::info!(
            "configuring {} decoder {}x{} for {:?}",
            config.codec,
            config.coded_width,
            config.coded_height,
            self.rect
        );

        match self.session.as_mut() {
            Some(session) => session.configure(&config),
            None => Err(RfbError::Codec("no decoder session".into())),
        }
    }

    fn submit(&mut self, frame: EncodedFrame) -> Option<PendingTicket> {
        let timestamp = self.next_timestamp();
        let session = self.session.as_mut()?;

        let ticket = self.output.enqueue(timestamp);
        let chunk = EncodedVideoChunk::new(frame.data)
            .with_timestamp(timestamp)
            .with_key_flag(frame.key);

        match session.submit(chunk) {
            Ok(()) => Some(ticket),
            Err(e) => {
                log::warn!(
                    "failed to submit frame {} for {:?}: {}",
                    timestamp,
                    self.rect,
                    e
                );
                self.output.withdraw(timestamp);
                None
            }
        }
    }

    /// Microseconds on a monotonic clock, strictly increasing per context.
    fn next_timestamp(&mut self) -> i64 {
        let now = CLOCK_EPOCH.elapsed().as_micros() as i64;
        self.last_timestamp = now.max(self.last_timestamp + 1);
        self.last_timestamp
    }

    /// Closes the session and cancels in-flight frames. Runs at most once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(mut session) = self.session.take() {
            session.close();
        }
        let cancelled = self.output.shutdown();
        log::debug!(
            "closed decode context for {:?}, {} frames cancelled",
            self.rect,
            cancelled
        );
    }
}

impl Drop for RegionContext {
    fn drop(&mut self) {
        self.close();
    }
}
