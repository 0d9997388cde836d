//! # H.264/AVC Annex-B framing
//!
//! Just enough of H.264 to feed a hardware decoder from a byte stream:
//!
//! - start code scanning over Annex-B payloads
//! - NAL unit classification (slices, parameter sets, SEI)
//! - the profile, constraint and level bytes of the sequence parameter set
//! - grouping units into displayable frames
//!
//! Slice headers, VUI and emulation prevention bytes are never interpreted.
//!
//! ## Example: Splitting a payload into frames
//!
//! ```rust
//! use bytes::Bytes;
//! use rfbdecode::codec::h264::H264Parser;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let payload = Bytes::from_static(&[
//!     0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x28, // SPS
//!     0x00, 0x00, 0x00, 0x01, 0x68, 0xEE,             // PPS
//!     0x00, 0x00, 0x01, 0x65, 0x88,                   // IDR slice
//!     0x00, 0x00, 0x01, 0x41, 0x9A,                   // non-IDR slice
//! ]);
//!
//! let mut parser = H264Parser::new(payload);
//! while let Some(frame) = parser.next_frame()? {
//!     println!("{} byte frame, key={}", frame.data.len(), frame.key);
//!     if let Some(sps) = parser.sps() {
//!         println!("codec {}", sps.codec_string());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// Frame assembly and NAL unit classification
pub mod parser;
/// Start code detection
pub mod scanner;
/// NAL unit and parameter set types
pub mod types;

#[doc(inline)]
pub use parser::*;
#[doc(inline)]
pub use scanner::{find_start_code, start_code_length};
#[doc(inline)]
pub use types::*;
