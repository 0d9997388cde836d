use bytes::Bytes;

use super::scanner::{find_start_code, start_code_length};
use super::types::{NALUnitType, NalUnitInfo, SpsParams};
use crate::error::{Result, RfbError};
use crate::utils::BitReader;

/// Classifies the NAL unit whose header byte sits at `offset`, the first byte after a
/// start code.
///
/// Only the header byte is interpreted, plus the first three payload bytes of an SPS.
/// A set forbidden-zero-bit means the stream is corrupt and is reported as a parser
/// error.
pub fn classify_nal_unit(data: &[u8], offset: usize) -> Result<NalUnitInfo> {
    let unit = data
        .get(offset..)
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| RfbError::Parser(format!("missing NAL header at offset {}", offset)))?;

    let mut reader = BitReader::new(unit);
    if reader.read_bit()? {
        return Err(RfbError::Parser(format!(
            "forbidden_zero_bit set in NAL header 0x{:02x} at offset {}",
            unit[0], offset
        )));
    }
    let nal_ref_idc = reader.read_bits(2)? as u8;
    let nal_type = NALUnitType::from(reader.read_bits(5)? as u8);

    let sps = match nal_type {
        NALUnitType::SPS => Some(parse_sps(&mut reader)?),
        NALUnitType::Other(code) => {
            log::debug!("ignoring NAL unit type {} at offset {}", code, offset);
            None
        }
        _ => None,
    };

    Ok(NalUnitInfo {
        nal_type,
        nal_ref_idc,
        sps,
    })
}

fn parse_sps(reader: &mut BitReader) -> Result<SpsParams> {
    let truncated = |_| RfbError::Parser("truncated sequence parameter set".into());
    let profile_idc = reader.read_u8().map_err(truncated)?;
    let constraint_flags = reader.read_u8().map_err(truncated)?;
    let level_idc = reader.read_u8().map_err(truncated)?;

    log::debug!(
        "SPS profile_idc={:#04x} constraints={:#04x} level_idc={:#04x}",
        profile_idc,
        constraint_flags,
        level_idc
    );

    Ok(SpsParams {
        profile_idc,
        constraint_flags,
        level_idc,
    })
}

/// One displayable access unit: every NAL unit up to and including a slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    /// Zero-copy view into the payload the parser was created with
    pub data: Bytes,
    /// An IDR slice was part of the frame
    pub key: bool,
    /// The frame ends in a slice; false for trailing parameter sets or SEI
    pub picture: bool,
}

/// Splits an Annex-B payload into frames, one per [`next_frame`](Self::next_frame) call.
///
/// Non-slice units (parameter sets, SEI) are grouped with the slice that follows them, so
/// a frame is self-contained enough to seed a fresh decoder when it carries an IDR slice.
#[derive(Debug)]
pub struct H264Parser {
    data: Bytes,
    index: usize,
    sps: Option<SpsParams>,
    failed: bool,
}

impl H264Parser {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            index: 0,
            sps: None,
            failed: false,
        }
    }

    /// SPS parameters seen while assembling the most recent frame
    pub fn sps(&self) -> Option<SpsParams> {
        self.sps
    }

    /// Byte offset of the next unread unit
    pub fn position(&self) -> usize {
        self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.data.len()
    }

    /// Assembles the next frame, or `Ok(None)` once the payload is drained.
    pub fn next_frame(&mut self) -> Result<Option<EncodedFrame>> {
        if self.is_exhausted() {
            return Ok(None);
        }

        let start = self.index;
        let mut key = false;
        let mut picture = false;
        self.sps = None;

        while self.index < self.data.len() {
            let start_code = start_code_length(&self.data, self.index);
            if start_code == 0 {
                return Err(RfbError::Parser(format!(
                    "expected start code at offset {}",
                    self.index
                )));
            }

            let header = self.index + start_code;
            let info = classify_nal_unit(&self.data, header)?;
            if let Some(sps) = info.sps {
                self.sps = Some(sps);
            }

            self.index = find_start_code(&self.data, header).unwrap_or(self.data.len());

            key |= info.is_key();
            if info.is_slice() {
                picture = true;
                break;
            }
        }

        Ok(Some(EncodedFrame {
            data: self.data.slice(start..self.index),
            key,
            picture,
        }))
    }
}

impl Iterator for H264Parser {
    type Item = Result<EncodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_frame() {
            Ok(frame) => frame.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod parser_test;
