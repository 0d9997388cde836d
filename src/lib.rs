#![doc(html_root_url = "https://docs.rs/rfbdecode/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::missing_crate_level_docs)]

//! # rfbdecode - remote framebuffer tile decoding
//!
//! `rfbdecode` turns the rectangle updates of a remote framebuffer (VNC/RFB) connection
//! into pixels. H.264 tiles are decoded through hardware sessions, one per screen
//! rectangle; zlib tiles are inflated in software.
//!
//! ## Features
//!
//! - Annex-B start code scanning and NAL unit classification
//! - Frame assembly with zero-copy views into the received payload
//! - Per-rectangle decode contexts with a bounded, least-recently-used registry
//! - Strict in-order pairing of hardware completions with submissions
//! - Server-driven reset of one or all contexts
//! - Persistent-stream zlib tiles
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use rfbdecode::av::testing::FakeDecoderFactory;
//! use rfbdecode::rfb::{Rect, RectDecoder, ReceiveQueue, RecordingDisplay, TileDecoder, ENCODING_H264};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // A real client passes its platform's hardware decoder factory here
//! let factory = Arc::new(FakeDecoderFactory::new());
//! let mut decoder = TileDecoder::for_encoding(ENCODING_H264, factory.clone())?;
//!
//! let payload = [
//!     0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x28, // SPS
//!     0x00, 0x00, 0x00, 0x01, 0x68, 0xEE, 0x3C, 0x80, // PPS
//!     0x00, 0x00, 0x01, 0x65, 0x88, 0x84,             // IDR slice
//! ];
//! let mut stream = ReceiveQueue::new();
//! stream.push(&(payload.len() as u32).to_be_bytes());
//! stream.push(&0u32.to_be_bytes());
//! stream.push(&payload);
//!
//! let mut display = RecordingDisplay::new();
//! assert!(decoder.decode_rect(Rect::new(0, 0, 64, 64), &mut stream, &mut display)?);
//!
//! factory.complete_all(0)?;
//! let (_, mut frame) = display.frames.remove(0);
//! assert!(frame.try_take().is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - `rfb`: rectangle decoders, the receive stream and display seams
//! - `codec`: H.264 Annex-B scanning, classification and frame assembly
//! - `av`: hardware decode session traits, in-flight frame bookkeeping and a fake
//!   session for tests
//! - `config`: process-wide settings from the environment and `rfbdecode.toml`
//! - `error`: error taxonomy and `Result` alias
//! - `utils`: bit reading

/// Hardware decode sessions and decoded frames
pub mod av;

/// Elementary stream parsing
pub mod codec;

/// Configuration module
pub mod config;

/// Error types and utilities
pub mod error;

/// Remote framebuffer rectangle decoders
pub mod rfb;

/// Common utilities and helper functions
pub mod utils;

pub use error::{Result, RfbError};
