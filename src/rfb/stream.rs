use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Result, RfbError};

/// Buffered view of the server-to-client byte stream.
///
/// Tile decoders only consume bytes once [`has_enough`](Self::has_enough) said they are
/// there; otherwise they return `false` and are called again when more data arrives.
pub trait RfbStream {
    /// True when at least `n` bytes are buffered. `label` names what is being waited for.
    fn has_enough(&self, label: &str, n: usize) -> bool;

    /// Big-endian u32 at the head of the buffer, without consuming it
    fn peek_u32(&self) -> Result<u32>;

    fn read_u32(&mut self) -> Result<u32>;

    fn read_bytes(&mut self, n: usize) -> Result<Bytes>;
}

/// In-memory receive queue fed by whatever owns the socket.
#[derive(Debug, Default)]
pub struct ReceiveQueue {
    buffer: BytesMut,
    consumed: u64,
}

impl ReceiveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends bytes received from the network
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Total bytes read out of the queue since it was created
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    fn underflow(&self, what: &str, n: usize) -> RfbError {
        RfbError::Protocol(format!(
            "{} needs {} bytes, {} buffered",
            what,
            n,
            self.buffer.len()
        ))
    }
}

impl RfbStream for ReceiveQueue {
    fn has_enough(&self, label: &str, n: usize) -> bool {
        let enough = self.buffer.len() >= n;
        if !enough {
            log::trace!(
                "{}: waiting for {} bytes, {} buffered",
                label,
                n,
                self.buffer.len()
            );
        }
        enough
    }

    fn peek_u32(&self) -> Result<u32> {
        match self.buffer.get(..4) {
            Some(&[a, b, c, d]) => Ok(u32::from_be_bytes([a, b, c, d])),
            _ => Err(self.underflow("peek_u32", 4)),
        }
    }

    fn read_u32(&mut self) -> Result<u32> {
        if self.buffer.len() < 4 {
            return Err(self.underflow("read_u32", 4));
        }
        self.consumed += 4;
        Ok(self.buffer.get_u32())
    }

    fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        if self.buffer.len() < n {
            return Err(self.underflow("read_bytes", n));
        }
        self.consumed += n as u64;
        Ok(self.buffer.split_to(n).freeze())
    }
}
