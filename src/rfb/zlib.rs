use std::fmt;

use flate2::{Decompress, FlushDecompress};

use super::{Display, Rect, RectDecoder, RfbStream};
use crate::error::{Result, RfbError};

const BYTES_PER_PIXEL: usize = 4;

/// Zlib-compressed raw pixels.
///
/// The server keeps one deflate stream for the whole connection, so the inflater lives as
/// long as the decoder and is fed every rectangle in order.
pub struct ZlibDecoder {
    inflater: Decompress,
    /// Length read by an earlier call that then ran out of payload bytes
    pending_length: Option<usize>,
}

impl fmt::Debug for ZlibDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZlibDecoder")
            .field("total_in", &self.inflater.total_in())
            .field("total_out", &self.inflater.total_out())
            .field("pending_length", &self.pending_length)
            .finish()
    }
}

impl Default for ZlibDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ZlibDecoder {
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new(true),
            pending_length: None,
        }
    }

    fn inflate(&mut self, input: &[u8], expected: usize) -> Result<Vec<u8>> {
        let mut pixels = Vec::with_capacity(expected);
        let mut offset = 0;

        while pixels.len() < expected {
            let before_in = self.inflater.total_in();
            let before_out = self.inflater.total_out();
            self.inflater
                .decompress_vec(&input[offset..], &mut pixels, FlushDecompress::Sync)?;
            offset += (self.inflater.total_in() - before_in) as usize;

            if self.inflater.total_out() == before_out && self.inflater.total_in() == before_in {
                break;
            }
        }

        if pixels.len() < expected {
            return Err(RfbError::Codec(format!(
                "zlib tile inflated to {} bytes, expected {}",
                pixels.len(),
                expected
            )));
        }
        Ok(pixels)
    }
}

impl RectDecoder for ZlibDecoder {
    fn decode_rect(
        &mut self,
        rect: Rect,
        stream: &mut dyn RfbStream,
        display: &mut dyn Display,
    ) -> Result<bool> {
        if rect.is_empty() {
            return Ok(true);
        }

        let length = match self.pending_length {
            Some(length) => length,
            None => {
                if !stream.has_enough("zlib length", 4) {
                    return Ok(false);
                }
                let length = stream.read_u32()? as usize;
                self.pending_length = Some(length);
                length
            }
        };

        if !stream.has_enough("zlib data", length) {
            return Ok(false);
        }
        let data = stream.read_bytes(length)?;
        self.pending_length = None;

        let mut pixels = self.inflate(&data, rect.area() * BYTES_PER_PIXEL)?;
        pixels.truncate(rect.area() * BYTES_PER_PIXEL);
        for pixel in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel[3] = 0xFF;
        }

        display.blit_image(rect, &pixels);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfb::{ReceiveQueue, RecordingDisplay};
    use flate2::{Compress, Compression, FlushCompress};
    use pretty_assertions::assert_eq;

    /// Deflates `chunks` as consecutive sync-flushed pieces of one stream.
    fn deflate_stream(chunks: &[&[u8]]) -> Vec<Vec<u8>> {
        let mut compress = Compress::new(Compression::default(), true);
        chunks
            .iter()
            .map(|chunk| {
                let mut out = Vec::with_capacity(chunk.len() * 2 + 64);
                compress
                    .compress_vec(chunk, &mut out, FlushCompress::Sync)
                    .unwrap();
                out
            })
            .collect()
    }

    fn framed(data: &[u8]) -> Vec<u8> {
        let mut out = (data.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn test_decodes_and_forces_opacity() {
        let rect = Rect::new(3, 4, 2, 1);
        let raw = [10u8, 20, 30, 0, 40, 50, 60, 7];
        let compressed = deflate_stream(&[&raw]);

        let mut stream = ReceiveQueue::new();
        stream.push(&framed(&compressed[0]));
        let mut display = RecordingDisplay::new();
        let mut decoder = ZlibDecoder::new();

        assert!(decoder.decode_rect(rect, &mut stream, &mut display).unwrap());
        assert_eq!(
            display.blits,
            vec![(rect, vec![10, 20, 30, 255, 40, 50, 60, 255])]
        );
        assert!(stream.is_empty());
    }

    #[test]
    fn test_resumes_after_partial_input() {
        let rect = Rect::new(0, 0, 2, 2);
        let raw = [1u8; 16];
        let bytes = framed(&deflate_stream(&[&raw])[0]);

        let mut stream = ReceiveQueue::new();
        let mut display = RecordingDisplay::new();
        let mut decoder = ZlibDecoder::new();

        stream.push(&bytes[..2]);
        assert!(!decoder.decode_rect(rect, &mut stream, &mut display).unwrap());
        assert_eq!(stream.consumed(), 0);

        stream.push(&bytes[2..6]);
        assert!(!decoder.decode_rect(rect, &mut stream, &mut display).unwrap());
        assert_eq!(stream.consumed(), 4);
        assert!(!decoder.decode_rect(rect, &mut stream, &mut display).unwrap());

        stream.push(&bytes[6..]);
        assert!(decoder.decode_rect(rect, &mut stream, &mut display).unwrap());
        assert_eq!(display.blits.len(), 1);
        assert_eq!(display.blits[0].1, vec![1, 1, 1, 255].repeat(4));
    }

    #[test]
    fn test_stream_persists_across_rectangles() {
        let first = [9u8; 4];
        let second = [8u8; 8];
        let compressed = deflate_stream(&[&first, &second]);

        let mut stream = ReceiveQueue::new();
        stream.push(&framed(&compressed[0]));
        stream.push(&framed(&compressed[1]));
        let mut display = RecordingDisplay::new();
        let mut decoder = ZlibDecoder::new();

        assert!(decoder
            .decode_rect(Rect::new(0, 0, 1, 1), &mut stream, &mut display)
            .unwrap());
        assert!(decoder
            .decode_rect(Rect::new(1, 0, 2, 1), &mut stream, &mut display)
            .unwrap());
        assert_eq!(display.blits[0].1, vec![9, 9, 9, 255]);
        assert_eq!(display.blits[1].1, vec![8, 8, 8, 255, 8, 8, 8, 255]);
    }

    #[test]
    fn test_empty_rect_reads_nothing() {
        let mut stream = ReceiveQueue::new();
        stream.push(&[0, 0, 0, 4]);
        let mut display = RecordingDisplay::new();
        let mut decoder = ZlibDecoder::new();

        assert!(decoder
            .decode_rect(Rect::new(0, 0, 0, 5), &mut stream, &mut display)
            .unwrap());
        assert_eq!(stream.len(), 4);
        assert!(display.blits.is_empty());
    }

    #[test]
    fn test_short_output_is_an_error() {
        let compressed = deflate_stream(&[&[1u8, 2, 3, 4]]);
        let mut stream = ReceiveQueue::new();
        stream.push(&framed(&compressed[0]));
        let mut display = RecordingDisplay::new();
        let mut decoder = ZlibDecoder::new();

        let err = decoder
            .decode_rect(Rect::new(0, 0, 2, 2), &mut stream, &mut display)
            .unwrap_err();
        assert!(matches!(err, RfbError::Codec(_)));
        assert!(display.blits.is_empty());
    }

    #[test]
    fn test_corrupt_data_is_an_error() {
        let mut stream = ReceiveQueue::new();
        stream.push(&framed(&[0xFF, 0xFF, 0xFF, 0xFF]));
        let mut display = RecordingDisplay::new();
        let mut decoder = ZlibDecoder::new();

        assert!(decoder
            .decode_rect(Rect::new(0, 0, 1, 1), &mut stream, &mut display)
            .is_err());
    }
}
