//! # Remote framebuffer tile decoders
//!
//! Every rectangle update carries an encoding number chosen by the server. The client
//! keeps one decoder per encoding for the whole connection and calls
//! [`RectDecoder::decode_rect`] with the rectangle, the receive stream and the display.
//!
//! A decoder returns `Ok(false)` when the stream does not yet hold the whole rectangle.
//! It is called again with the same rectangle once more bytes arrive, and keeps whatever
//! it already consumed as its own state. `Ok(true)` means the rectangle is finished.
//!
//! ## Example: H.264 tiles
//!
//! ```rust
//! use std::sync::Arc;
//! use rfbdecode::av::testing::FakeDecoderFactory;
//! use rfbdecode::rfb::{Rect, RectDecoder, ReceiveQueue, RecordingDisplay, TileDecoder, ENCODING_H264};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let factory = Arc::new(FakeDecoderFactory::new());
//! let mut decoder = TileDecoder::for_encoding(ENCODING_H264, factory)?;
//!
//! let mut stream = ReceiveQueue::new();
//! let mut display = RecordingDisplay::new();
//! let rect = Rect::new(0, 0, 64, 64);
//!
//! // Header only: 4 byte length, then 4 byte flags
//! stream.push(&[0, 0, 0, 8]);
//! assert!(!decoder.decode_rect(rect, &mut stream, &mut display)?);
//! stream.push(&[0, 0, 0, 0]);
//! assert!(!decoder.decode_rect(rect, &mut stream, &mut display)?);
//!
//! stream.push(&[0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x28]);
//! assert!(decoder.decode_rect(rect, &mut stream, &mut display)?);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::av::DecoderFactory;
use crate::error::{Result, RfbError};

pub mod display;
pub mod h264;
pub mod stream;
pub mod zlib;

pub use display::{Display, RecordingDisplay};
pub use h264::H264Decoder;
pub use stream::{ReceiveQueue, RfbStream};
pub use zlib::ZlibDecoder;

/// RFB encoding number of zlib-compressed raw tiles
pub const ENCODING_ZLIB: i32 = 6;
/// RFB encoding number of H.264 tiles
pub const ENCODING_H264: i32 = 50;

/// A screen rectangle. Decode state is keyed by the exact tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }
}

/// Shared contract of all tile decoders
pub trait RectDecoder {
    /// Decodes one rectangle, or returns `Ok(false)` to be called again with more data.
    fn decode_rect(
        &mut self,
        rect: Rect,
        stream: &mut dyn RfbStream,
        display: &mut dyn Display,
    ) -> Result<bool>;
}

/// The decoders this crate provides, selected by encoding number
#[derive(Debug)]
pub enum TileDecoder {
    Zlib(ZlibDecoder),
    H264(H264Decoder),
}

impl TileDecoder {
    /// Creates the decoder for a server-advertised encoding.
    pub fn for_encoding(encoding: i32, factory: Arc<dyn DecoderFactory>) -> Result<Self> {
        match encoding {
            ENCODING_ZLIB => Ok(TileDecoder::Zlib(ZlibDecoder::new())),
            ENCODING_H264 => Ok(TileDecoder::H264(H264Decoder::new(factory))),
            other => Err(RfbError::InvalidData(format!(
                "unsupported encoding {}",
                other
            ))),
        }
    }

    pub fn encoding(&self) -> i32 {
        match self {
            TileDecoder::Zlib(_) => ENCODING_ZLIB,
            TileDecoder::H264(_) => ENCODING_H264,
        }
    }
}

impl RectDecoder for TileDecoder {
    fn decode_rect(
        &mut self,
        rect: Rect,
        stream: &mut dyn RfbStream,
        display: &mut dyn Display,
    ) -> Result<bool> {
        match self {
            TileDecoder::Zlib(decoder) => decoder.decode_rect(rect, stream, display),
            TileDecoder::H264(decoder) => decoder.decode_rect(rect, stream, display),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::av::testing::FakeDecoderFactory;

    #[test]
    fn test_rect_identity() {
        let a = Rect::new(0, 0, 64, 64);
        assert_eq!(a, Rect::new(0, 0, 64, 64));
        assert_ne!(a, Rect::new(0, 0, 64, 32));
        assert_eq!(a.area(), 4096);
        assert!(Rect::new(5, 5, 0, 10).is_empty());
    }

    #[test]
    fn test_for_encoding() {
        let factory = Arc::new(FakeDecoderFactory::new());
        let zlib = TileDecoder::for_encoding(ENCODING_ZLIB, factory.clone()).unwrap();
        assert!(matches!(zlib, TileDecoder::Zlib(_)));
        assert_eq!(zlib.encoding(), ENCODING_ZLIB);

        let h264 = TileDecoder::for_encoding(ENCODING_H264, factory.clone()).unwrap();
        assert_eq!(h264.encoding(), ENCODING_H264);

        assert!(matches!(
            TileDecoder::for_encoding(7, factory),
            Err(RfbError::InvalidData(_))
        ));
    }
}
