pub mod h264;

// Re-export common types and functions
pub use h264::parser::{EncodedFrame, H264Parser};
pub use h264::types::SpsParams;
