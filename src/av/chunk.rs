use bytes::Bytes;

/// Whether a chunk can be decoded on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Key,
    Delta,
}

/// Encoded data handed to a hardware session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedVideoChunk {
    pub data: Bytes,
    pub timestamp: i64,
    pub kind: ChunkKind,
}

impl EncodedVideoChunk {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            timestamp: 0,
            kind: ChunkKind::Delta,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_key_flag(mut self, is_key: bool) -> Self {
        self.kind = if is_key {
            ChunkKind::Key
        } else {
            ChunkKind::Delta
        };
        self
    }

    pub fn is_key(&self) -> bool {
        self.kind == ChunkKind::Key
    }
}
