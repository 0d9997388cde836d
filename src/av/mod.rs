//! Hardware video decode session abstractions.
//!
//! A [`HardwareDecoder`] is an asynchronous service: `configure` and `submit` return
//! immediately and decoded images arrive later, in submission order, through the
//! [`DecoderOutput`] handle the session was created with.

use std::fmt;

use crate::error::Result;

mod chunk;
pub mod pending;
pub mod testing;

pub use chunk::*;
pub use pending::{DecoderOutput, PendingFrame};

/// Lifecycle state of a hardware decode session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, waiting for a configuration
    Unconfigured,
    /// Accepting chunks
    Configured,
    /// Torn down, either explicitly or after an error
    Closed,
}

/// Configuration handed to a session before the first chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDecoderConfig {
    /// RFC 6381 codec string, e.g. `avc1.640028`
    pub codec: String,
    pub coded_width: u32,
    pub coded_height: u32,
    pub optimize_for_latency: bool,
}

/// A decoded picture owned by whoever holds the box.
///
/// Implementations release the underlying hardware surface in `Drop`, so ownership of
/// the box is ownership of the surface.
pub trait DecodedImage: Send + fmt::Debug {
    /// Timestamp of the chunk this image was decoded from
    fn timestamp(&self) -> i64;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// One hardware decode session
pub trait HardwareDecoder: Send {
    fn state(&self) -> SessionState;
    fn configure(&mut self, config: &VideoDecoderConfig) -> Result<()>;
    fn submit(&mut self, chunk: EncodedVideoChunk) -> Result<()>;
    fn close(&mut self);
}

/// Creates sessions bound to the output handle of one decode context
pub trait DecoderFactory: Send + Sync {
    fn create(&self, output: DecoderOutput) -> Result<Box<dyn HardwareDecoder>>;
}
